//! Error type shared by the registry and every format adapter.

use std::fmt;

/// Failure surfaced by the conversion layer.
///
/// The core parsers never fail on user input; errors here come from the
/// layer around them: unknown format names, directions a format does not
/// implement, imports whose source is structurally broken, and foreign
/// serializers.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    /// No format registered under this name.
    FormatNotFound(String),
    /// The source could not be imported.
    ParseError(String),
    /// The document could not be written in the target format.
    SerializationError(String),
    /// The format does not implement the requested direction.
    NotSupported(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::FormatNotFound(name) => write!(f, "Format '{name}' not found"),
            FormatError::ParseError(msg) => write!(f, "Parse error: {msg}"),
            FormatError::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
            FormatError::NotSupported(msg) => write!(f, "Operation not supported: {msg}"),
        }
    }
}

impl std::error::Error for FormatError {}
