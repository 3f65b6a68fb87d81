//! Error types for registry operations.

use std::fmt;
use thiserror::Error;

/// Failure to convert encoded text into a typed value.
///
/// Produced by decode functions when the text does not parse as the
/// declared type. Kept separate from [`ConfigError`] so codec callers can
/// handle conversion failures without matching the whole config taxonomy.
#[derive(Debug, Error)]
#[error("invalid {type_name} value {input:?}: {message}")]
pub struct DecodeError {
    /// Canonical identifier of the type that rejected the text.
    pub type_name: String,
    /// The offending input text.
    pub input: String,
    /// Why the text was rejected.
    pub message: String,
}

impl DecodeError {
    pub fn new(
        type_name: impl Into<String>,
        input: impl Into<String>,
        message: impl fmt::Display,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            input: input.into(),
            message: message.to_string(),
        }
    }
}

/// Errors that can occur during config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Strict mode rejected an option that is absent from the schema.
    #[error("unknown option: {0}")]
    UnknownOption(String),

    /// A flat key did not contain the section delimiter.
    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    /// Attempted to unregister a type that was never registered.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// Encoded text could not be converted to its declared type.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// IO failure while reading or writing a source.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A source line did not match the format grammar.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl ConfigError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Result type for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
