use thiserror::Error;

/// Main error type for Chorus
#[derive(Error, Debug)]
pub enum ChorusError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid turn record: {0}")]
    InvalidTurn(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Failure reported by a model adapter.
///
/// The orchestrator never lets these escape a submission: each one becomes a
/// synthetic assistant turn in the conversation.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("No API key found in ${0}")]
    MissingApiKey(String),

    #[error("No adapter configured for {0}")]
    NotConfigured(String),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Authentication rejected ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl AdapterError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => AdapterError::Unauthorized { status, message },
            _ => AdapterError::Upstream { status, message },
        }
    }
}
