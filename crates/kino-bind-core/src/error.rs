//! Error types for Kino Bind

use thiserror::Error;

/// Result type alias for binder operations
pub type Result<T> = std::result::Result<T, Error>;

/// Binder error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Capability errors
    #[error("Neither a software streaming engine nor native HLS playback is supported")]
    Unsupported,

    // Playback errors
    #[error("Autoplay was rejected: {0}")]
    AutoplayRejected(String),

    // Input errors
    #[error("Source URL must not be empty")]
    EmptySource,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Engine errors
    #[error("Failed to construct streaming engine: {0}")]
    EngineConstruct(String),

    // Surface errors
    #[error("Playback surface error: {0}")]
    Surface(String),
}

impl Error {
    /// Returns true if playback can continue after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::AutoplayRejected(_) | Error::Surface(_))
    }

    /// Returns the error code for diagnostics
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Unsupported => "UNSUPPORTED",
            Error::AutoplayRejected(_) => "AUTOPLAY_REJECTED",
            Error::EmptySource => "EMPTY_SOURCE",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::EngineConstruct(_) => "ENGINE_CONSTRUCT",
            Error::Surface(_) => "SURFACE",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidConfig(err.to_string())
    }
}
