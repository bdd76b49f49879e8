use std::fmt;

/// How the processing of one claimed URL ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlOutcome {
    /// Page fetched, parsed and written to the output sink
    Recorded,

    /// robots.txt disallows the path; nothing was fetched
    Disallowed,

    /// Download failed (non-200, network error, timeout, malformed URL)
    FetchFailed,

    /// Page fetched but the record could not be written
    SinkFailed,
}

impl UrlOutcome {
    /// Returns true if a record was produced
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Recorded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recorded => "recorded",
            Self::Disallowed => "disallowed",
            Self::FetchFailed => "fetch_failed",
            Self::SinkFailed => "sink_failed",
        }
    }
}

impl fmt::Display for UrlOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
