//! Error types for the tiered-search crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling.

/// Errors that can occur during search and retrieval operations.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// A request did not complete before its deadline.
    #[error("search timed out: {0}")]
    Timeout(String),

    /// An HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Failed to parse a response into usable content.
    #[error("parse error: {0}")]
    Parse(String),

    /// The headless browser runtime is missing or could not be launched.
    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The browser was running but navigation or in-page extraction failed.
    #[error("browser error: {0}")]
    Browser(String),

    /// The caller supplied an argument that cannot be used.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl SearchError {
    /// Whether this error is a network failure (timeout or bad response).
    pub fn is_network_failure(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Http(_))
    }

    /// Short machine-readable label used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Http(_) => "http",
            Self::Parse(_) => "parse",
            Self::EngineUnavailable(_) => "engine_unavailable",
            Self::Browser(_) => "browser",
            Self::InvalidInput(_) => "invalid_input",
            Self::Config(_) => "config",
        }
    }
}

/// Convenience type alias for tiered-search results.
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_timeout() {
        let err = SearchError::Timeout("exceeded 1800ms budget".into());
        assert_eq!(err.to_string(), "search timed out: exceeded 1800ms budget");
    }

    #[test]
    fn display_http() {
        let err = SearchError::Http("connection refused".into());
        assert_eq!(err.to_string(), "HTTP error: connection refused");
    }

    #[test]
    fn display_engine_unavailable() {
        let err = SearchError::EngineUnavailable("chrome not found".into());
        assert_eq!(err.to_string(), "engine unavailable: chrome not found");
    }

    #[test]
    fn display_invalid_input() {
        let err = SearchError::InvalidInput("title must not be empty".into());
        assert_eq!(err.to_string(), "invalid input: title must not be empty");
    }

    #[test]
    fn network_failure_classification() {
        assert!(SearchError::Timeout("t".into()).is_network_failure());
        assert!(SearchError::Http("h".into()).is_network_failure());
        assert!(!SearchError::EngineUnavailable("e".into()).is_network_failure());
        assert!(!SearchError::Browser("b".into()).is_network_failure());
        assert!(!SearchError::Parse("p".into()).is_network_failure());
    }

    #[test]
    fn kind_labels_are_stable() {
        assert_eq!(SearchError::Timeout(String::new()).kind(), "timeout");
        assert_eq!(
            SearchError::EngineUnavailable(String::new()).kind(),
            "engine_unavailable"
        );
        assert_eq!(SearchError::Config(String::new()).kind(), "config");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchError>();
    }
}
