//! Error types for the mutscore library.

use thiserror::Error;

/// Result type alias using mutscore's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving an evaluation run.
///
/// Failures *inside* a sandboxed call (raised errors, timeouts) are not
/// `Error`s; they are classified outcomes in the data model.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Subject-language parse error.
    #[error("Parse error in {unit}: {message}")]
    Parse { unit: String, message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Evaluation-specific error.
    #[error("Evaluation error: {message}")]
    Evaluation { message: String },

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Create a new parse error.
    pub fn parse(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            unit: unit.into(),
            message: message.into(),
        }
    }

    /// Create a new evaluation error.
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }

    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
