//! Error types for Remote Build.

use thiserror::Error;

use crate::TokenKind;

/// Main error type for Remote Build operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The transport process could not be started
    #[error("Launch failed: {0}")]
    Launch(String),

    /// Write to a closed or broken session stream
    #[error("Write failed: {0}")]
    Write(String),

    /// User supplied a pattern that does not compile
    #[error("invalid regex '{pattern}': {message}")]
    FilterCompile {
        /// The rejected pattern
        pattern: String,
        /// Compiler diagnostic
        message: String,
    },

    /// A log line did not match the expected token pattern
    #[error("Couldn't extract {0}")]
    Extraction(TokenKind),

    /// The remote process exited or its output could not be read
    #[error("Session output stream ended")]
    StreamEnded,

    /// Prompt-synchronised read requested while the steady-state loop owns the reader
    #[error("Session output is already attached to the steady-state read loop")]
    ReaderAttached,

    /// Display sink rejected an operation
    #[error("Display error: {0}")]
    Display(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
