//! Error types for the unzip bot

use thiserror::Error;

/// Result type alias for bot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving updates
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Telegram Bot API error (transport failure or `ok: false` response)
    #[error("channel error: {0}")]
    Channel(String),

    /// Archive could not be opened or read
    #[error("archive error: {0}")]
    Archive(String),

    /// Remote file is over the size limit
    #[error("file exceeds the size limit of {limit} bytes")]
    TooLarge { limit: u64 },

    /// Document could not be parsed
    #[error("document error: {0}")]
    Document(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
