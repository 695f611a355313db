use thiserror::Error;

/// Failures raised while reading or writing Peechy data, either by the raw
/// [`ByteBuffer`](crate::ByteBuffer) primitives or by the codec interpreter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("Index out of bounds: wanted {wanted} byte(s) at {index} but the buffer holds {len}")]
    IndexOutOfBounds {
        index:  usize,
        wanted: usize,
        len:    usize,
    },

    #[error("Non-ascii character at char {index} :{text}")]
    NonAscii {
        index: usize,
        text:  String,
    },

    #[error("Byte length {len} is not a multiple of the element width {width}")]
    InvalidArrayLength {
        len:   usize,
        width: usize,
    },

    #[error("Array of {count} empty elements claims more than the {remaining} byte(s) left")]
    EmptyElementCount {
        count:     u32,
        remaining: usize,
    },

    #[error("Attempted to parse invalid message \"{definition}\": unknown field tag {tag}")]
    UnknownMessageTag {
        definition: String,
        tag:        u8,
    },

    #[error("Attempted to parse invalid union \"{definition}\": unknown member tag {tag}")]
    UnknownUnionTag {
        definition: String,
        tag:        u32,
    },

    #[error("Missing required field \"{field}\" in \"{definition}\"")]
    MissingRequiredField {
        definition: String,
        field:      String,
    },

    #[error("Invalid value {value} for enum \"{definition}\"")]
    InvalidEnumValue {
        definition: String,
        value:      String,
    },

    #[error("Expected \"{field}\" to name one of the members of union \"{definition}\"")]
    MissingUnionType {
        definition: String,
        field:      String,
    },

    #[error("Expected {expected} for \"{field}\"")]
    TypeMismatch {
        field:    String,
        expected: &'static str,
    },

    #[error("Value for \"{field}\" does not fit in {expected}")]
    OutOfRange {
        field:    String,
        expected: &'static str,
    },

    #[error("Unknown definition \"{0}\"")]
    UnknownDefinition(String),

    #[error("No codec linked for \"{definition}\" (expected one from \"{path}\")")]
    MissingExternalCodec {
        definition: String,
        path:       String,
    },

    #[error("Definition \"{definition}\" cannot be encoded or decoded directly")]
    InvalidDefinition {
        definition: String,
    },
}
