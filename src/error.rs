//! Error types for driver-locator

use thiserror::Error;

/// Main error type for driver-locator operations
///
/// "No matches" and partial bulk failures are not errors; they are
/// reported through `SearchOutcome`, `MatchOutcome` and `BulkResult`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid radius: {0}")]
    InvalidRadius(String),

    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    #[error("CSV parse error at line {line}: {reason}")]
    Parse { line: u64, reason: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server error: {0}")]
    Server(String),
}

impl Error {
    /// True for errors caused by bad caller input, rejected before any I/O
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidCoordinates(_)
                | Error::InvalidRadius(_)
                | Error::InvalidBatch(_)
                | Error::Parse { .. }
        )
    }
}

/// Result type alias for driver-locator operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(Error::InvalidRadius("0".into()).is_validation());
        assert!(Error::Parse { line: 3, reason: "bad".into() }.is_validation());
        assert!(!Error::Store("down".into()).is_validation());
        assert!(!Error::Transport("timeout".into()).is_validation());
    }

    #[test]
    fn test_parse_error_display() {
        let err = Error::Parse {
            line: 2,
            reason: "invalid latitude 'invalid'".into(),
        };
        assert_eq!(
            err.to_string(),
            "CSV parse error at line 2: invalid latitude 'invalid'"
        );
    }
}
