//! Robots.txt parser implementation
//!
//! Only `User-agent:` and `Disallow:` directives are understood. Everything
//! else (Allow, Crawl-delay, Sitemap, wildcards) is ignored.

/// Disallowed path prefixes for one host, as seen by one crawler identity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsRules {
    /// Prefixes in file order
    disallowed: Vec<String>,
}

impl RobotsRules {
    /// Creates a permissive rule set that allows everything
    ///
    /// This is used when robots.txt is missing or cannot be fetched.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Parses robots.txt content for the given crawler identity
    ///
    /// # Parsing rules
    ///
    /// - Every `User-agent:` line opens a new block. The block applies when
    ///   the agent is `*` or equals `identity` exactly, so only the last of
    ///   several consecutive `User-agent:` lines decides.
    /// - `Disallow:` lines inside an applicable block add a path prefix.
    ///   Empty values and lines outside any applicable block are ignored.
    /// - A blank line closes the current block.
    /// - Directive names are case-insensitive; `#` starts a comment.
    ///
    /// # Example
    ///
    /// ```
    /// use polite_crawler::robots::RobotsRules;
    ///
    /// let rules = RobotsRules::parse("User-agent: *\nDisallow: /private/", "Bot/1.0");
    /// assert!(!rules.is_allowed("/private/x"));
    /// assert!(rules.is_allowed("/public/y"));
    /// ```
    pub fn parse(content: &str, identity: &str) -> Self {
        let mut disallowed = Vec::new();
        let mut applicable = false;

        for raw in content.lines() {
            let line = raw.trim();

            if line.is_empty() {
                applicable = false;
                continue;
            }

            if line.starts_with('#') {
                continue;
            }

            let line = match line.split_once('#') {
                Some((before, _)) => before.trim(),
                None => line,
            };

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    applicable = value == "*" || value == identity;
                }
                "disallow" => {
                    if applicable && !value.is_empty() {
                        disallowed.push(value.to_string());
                    }
                }
                _ => {}
            }
        }

        Self { disallowed }
    }

    /// Returns false iff `path` starts with any disallowed prefix
    pub fn is_allowed(&self, path: &str) -> bool {
        !self
            .disallowed
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// The disallowed prefixes in file order
    pub fn disallowed(&self) -> &[String] {
        &self.disallowed
    }

    pub fn is_empty(&self) -> bool {
        self.disallowed.is_empty()
    }
}
