//! Per-host robots.txt cache
//!
//! Each host gets one `OnceCell`. The first worker to ask for a host runs the
//! fetch; every concurrent caller for that host awaits the same cell, so
//! robots.txt is downloaded at most once per host for the life of the cache.
//! Entries never expire.

use crate::crawler::Downloader;
use crate::robots::RobotsRules;
use crate::url::{host_and_path, robots_url};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

type RulesCell = Arc<OnceCell<Arc<RobotsRules>>>;

/// Shared robots.txt cache keyed by host
pub struct RobotsCache {
    downloader: Arc<dyn Downloader>,

    /// Identity matched against `User-agent:` lines
    identity: String,

    hosts: Mutex<HashMap<String, RulesCell>>,

    /// Number of robots.txt downloads started
    fetches: AtomicUsize,
}

impl RobotsCache {
    pub fn new(downloader: Arc<dyn Downloader>, identity: impl Into<String>) -> Self {
        Self {
            downloader,
            identity: identity.into(),
            hosts: Mutex::new(HashMap::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Checks whether `url` may be crawled
    ///
    /// A URL that cannot be decomposed into host and path is not allowed.
    pub async fn is_allowed(&self, url: &str) -> bool {
        let (host, path) = match host_and_path(url) {
            Ok(parts) => parts,
            Err(e) => {
                tracing::debug!("Malformed URL in robots check {}: {}", url, e);
                return false;
            }
        };

        let rules = self.rules_for(&host).await;
        rules.is_allowed(&path)
    }

    /// Returns the rules for a host, fetching robots.txt on first access
    pub async fn rules_for(&self, host: &str) -> Arc<RobotsRules> {
        let cell = {
            let mut hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
            hosts.entry(host.to_string()).or_default().clone()
        };

        cell.get_or_init(|| self.fetch_rules(host)).await.clone()
    }

    async fn fetch_rules(&self, host: &str) -> Arc<RobotsRules> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let url = robots_url(host);
        tracing::debug!("Fetching robots.txt for: {}", host);

        let rules = match self.downloader.fetch(&url).await {
            Ok(content) => RobotsRules::parse(&content, &self.identity),
            Err(e) => {
                tracing::debug!("No usable robots.txt for {} ({}), allowing all", host, e);
                RobotsRules::allow_all()
            }
        };

        if !rules.is_empty() {
            tracing::debug!(
                "robots.txt for {} disallows {} prefix(es)",
                host,
                rules.disallowed().len()
            );
        }

        Arc::new(rules)
    }

    /// Number of robots.txt downloads that have been started
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of hosts with a cache entry
    pub fn cached_hosts(&self) -> usize {
        self.hosts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
