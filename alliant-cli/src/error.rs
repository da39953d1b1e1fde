//! Error types for the CLI

use thiserror::Error;

/// Main CLI error type
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Alliant client error
    #[error("{0}")]
    Client(#[from] alliant_client::AlliantError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
