use peechy_schema::CodecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PeechyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Syntax error at line {line}, column {column}: {msg}")]
    Syntax {
        msg:    String,
        line:   usize,
        column: usize,
    },

    #[error("Semantic error at line {line}, column {column}: {msg}")]
    Semantic {
        msg:    String,
        line:   usize,
        column: usize,
    },

    #[error("Binary schema error: {0}")]
    BinaryFormat(String),

    #[error("Schema encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Invalid enum variant \"{0}\"")]
    InvalidEnumVariant(String),

    #[error("Missing required field \"{0}\"")]
    MissingField(String),

    #[error("Expected {expected} for \"{field}\"")]
    UnexpectedValue {
        field:    String,
        expected: &'static str,
    },
}

/// The broad category of a [`PeechyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Semantic,
    BinaryFormat,
    CodecRuntime,
    Io,
}

impl PeechyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PeechyError::Io(_) => ErrorKind::Io,
            PeechyError::Syntax { .. } => ErrorKind::Syntax,
            PeechyError::Semantic { .. } => ErrorKind::Semantic,
            PeechyError::BinaryFormat(_) => ErrorKind::BinaryFormat,
            PeechyError::Encode(_)
            | PeechyError::Codec(_)
            | PeechyError::InvalidEnumVariant(_)
            | PeechyError::MissingField(_)
            | PeechyError::UnexpectedValue { .. } => ErrorKind::CodecRuntime,
        }
    }

    /// `(line, column)` for errors raised against schema text.
    pub fn position(&self) -> Option<(usize, usize)> {
        match *self {
            PeechyError::Syntax { line, column, .. } | PeechyError::Semantic { line, column, .. } => {
                Some((line, column))
            }
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PeechyError {
    fn from(err: serde_json::Error) -> Self {
        PeechyError::Encode(err.to_string())
    }
}
