use crate::error::PeechyError;
use peechy_schema::Value;

/// Conversion from a decoded [`Value`] into a typed Rust value. Code emitted
/// by [`compile_schema_to_rust`](crate::gen_rust::compile_schema_to_rust)
/// implements this for every generated type.
pub trait FromPeechy: Sized {
    fn from_peechy(value: &Value) -> Result<Self, PeechyError>;
}

fn unexpected(expected: &'static str) -> PeechyError {
    PeechyError::UnexpectedValue {
        field: String::new(),
        expected,
    }
}

/// Names the field in errors raised without one.
fn in_field(field: &str, err: PeechyError) -> PeechyError {
    match err {
        PeechyError::UnexpectedValue { field: ref inner, expected } if inner.is_empty() => {
            PeechyError::UnexpectedValue {
                field: field.to_owned(),
                expected,
            }
        }
        other => other,
    }
}

/// Reads a field that must be present on `value`.
pub fn required<T: FromPeechy>(value: &Value, field: &str) -> Result<T, PeechyError> {
    match value.get(field) {
        Some(inner) => T::from_peechy(inner).map_err(|err| in_field(field, err)),
        None => Err(PeechyError::MissingField(field.to_owned())),
    }
}

/// Reads a field that may be absent, as message fields are.
pub fn optional<T: FromPeechy>(value: &Value, field: &str) -> Result<Option<T>, PeechyError> {
    value
        .get(field)
        .map(|inner| T::from_peechy(inner).map_err(|err| in_field(field, err)))
        .transpose()
}

impl FromPeechy for bool {
    fn from_peechy(value: &Value) -> Result<Self, PeechyError> {
        match *value {
            Value::Bool(value) => Ok(value),
            _ => Err(unexpected("a bool")),
        }
    }
}

impl FromPeechy for f32 {
    fn from_peechy(value: &Value) -> Result<Self, PeechyError> {
        match *value {
            Value::Float(value) => Ok(value),
            _ => Err(unexpected("a float")),
        }
    }
}

impl FromPeechy for String {
    fn from_peechy(value: &Value) -> Result<Self, PeechyError> {
        match *value {
            Value::String(ref value) => Ok(value.clone()),
            _ => Err(unexpected("a string")),
        }
    }
}

macro_rules! integer_from_peechy {
    ($($ty:ty => $expected:literal),* $(,)?) => {
        $(
            impl FromPeechy for $ty {
                fn from_peechy(value: &Value) -> Result<Self, PeechyError> {
                    value
                        .integer()
                        .and_then(|n| <$ty>::try_from(n).ok())
                        .ok_or_else(|| unexpected($expected))
                }
            }
        )*
    };
}

integer_from_peechy! {
    u8 => "a byte",
    i8 => "an int8",
    i16 => "an int16",
    u16 => "a uint16",
    i32 => "an int",
    u32 => "a uint",
}

impl<T: FromPeechy> FromPeechy for Vec<T> {
    fn from_peechy(value: &Value) -> Result<Self, PeechyError> {
        match *value {
            Value::Array(ref values) => values.iter().map(T::from_peechy).collect(),
            Value::Bytes(ref bytes) => bytes.iter().map(|&b| T::from_peechy(&Value::Byte(b))).collect(),
            _ => Err(unexpected("an array")),
        }
    }
}

impl<T: FromPeechy> FromPeechy for Box<T> {
    fn from_peechy(value: &Value) -> Result<Self, PeechyError> {
        T::from_peechy(value).map(Box::new)
    }
}
