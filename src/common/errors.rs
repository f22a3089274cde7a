//! Error types for the runner

use thiserror::Error;

/// Result type alias using our RunnerError
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Main error type for runner operations
#[derive(Error, Debug)]
pub enum RunnerError {
    /// Malformed or inconsistent configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An index mnemonic has no mapping for a provider
    #[error("Unknown code for {provider}: {code}")]
    UnknownCode {
        provider: &'static str,
        code: String,
    },

    /// HTTP transport errors
    #[error("HTTP request error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-200 response
    #[error("Server returned status {0}")]
    HttpStatus(u16),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    Parse(String),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RunnerError {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        RunnerError::Parse(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_code_message() {
        let err = RunnerError::UnknownCode {
            provider: "sohu",
            code: "HSI".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown code for sohu: HSI");
    }

    #[test]
    fn test_status_message() {
        assert_eq!(
            RunnerError::HttpStatus(503).to_string(),
            "Server returned status 503"
        );
    }
}
