//! Error types for the CLI

use thiserror::Error;

/// Main CLI error type
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cache error
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Portal client error
    #[error("Librus error: {0}")]
    Librus(#[from] librus_client::LibrusError),

    /// Token supplied through the environment is malformed
    #[error("Invalid session token: {0}")]
    Token(#[from] librus_client::FormatError),
}

/// Token cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache directory creation failed
    #[error("Cache directory creation failed: {0}")]
    DirCreation(String),
}
