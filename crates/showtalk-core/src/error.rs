use thiserror::Error;

/// Top-level error type for the showtalk system.
///
/// Subsystem crates define their own error types and implement
/// `From<ShowtalkError>` where they need `?` across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ShowtalkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for ShowtalkError {
    fn from(err: toml::de::Error) -> Self {
        ShowtalkError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ShowtalkError {
    fn from(err: toml::ser::Error) -> Self {
        ShowtalkError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ShowtalkError {
    fn from(err: serde_json::Error) -> Self {
        ShowtalkError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for showtalk operations.
pub type Result<T> = std::result::Result<T, ShowtalkError>;
