use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Startup and configuration errors.
///
/// Request-time failures never surface through this type: unmatched
/// security errors are handed back to the caller as they were raised.
#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "No enabled security exception handler found. Enable at least one entry under `handlers`"
    )]
    NoEnabledHandlers,

    #[error("Invalid URL pattern `{pattern}`: {reason}")]
    InvalidPattern {
        pattern: String,
        reason: &'static str,
    },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig { key: String, message: String },

    #[error("Handler is missing its {0}")]
    IncompleteHandler(&'static str),

    #[error("Failed to parse handler configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            message: message.into(),
        }
    }
}
