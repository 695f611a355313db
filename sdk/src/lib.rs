//! peechy
//!
//! Runtime support for working with Peechy-encoded data.
//!
//! - `load_schema` / `load_binary_schema` build runtime codecs from schema
//!   text or a binary schema,
//! - `Value` and the codec handles read and write the wire format,
//! - `FromPeechy` (re-exported from the compiler) backs generated Rust types.
//!
//! ```
//! use peechy::{load_schema, Value};
//!
//! let schema = load_schema("struct Point { int32 x = 1; int32 y = 2; }").unwrap();
//! let point = Value::object("Point", [("x", Value::Int32(3)), ("y", Value::Int32(-4))]);
//!
//! let bytes = point.encode(&schema, "Point").unwrap();
//! assert_eq!(Value::decode(&schema, "Point", &bytes).unwrap(), point);
//! ```

use log::debug;

pub use peechy_compiler::error::{ErrorKind, PeechyError};
pub use peechy_compiler::options::CompileOptions;
pub use peechy_compiler::traits::FromPeechy;
pub use peechy_schema::{ByteBuffer, ByteBufferMut, Codec, CodecError, ExternalCodec, LookupTable, Schema, Value};

/// Tokenize, parse, verify and lower schema text into runtime codecs.
pub fn load_schema(text: &str) -> Result<Schema, PeechyError> {
    load_schema_with(text, &CompileOptions::default())
}

pub fn load_schema_with(text: &str, options: &CompileOptions) -> Result<Schema, PeechyError> {
    let parsed = peechy_compiler::parse_and_verify(text, options)?;
    let schema = peechy_compiler::compile_schema_to_codecs(&parsed)?;
    debug!("loaded schema with {} definitions", schema.defs.len());
    Ok(schema)
}

/// Build runtime codecs from a binary schema. Binary schemas are trusted:
/// they are decoded and lowered without verification.
pub fn load_binary_schema(buffer: &[u8]) -> Result<Schema, PeechyError> {
    let parsed = peechy_compiler::decode_binary_schema(buffer)?;
    peechy_compiler::compile_schema_to_codecs(&parsed)
}

/// Decode a binary schema into a pretty-printed JSON string.
pub fn decode_to_json(buffer: &[u8]) -> Result<String, PeechyError> {
    let schema = peechy_compiler::decode_binary_schema(buffer)?;
    Ok(serde_json::to_string_pretty(&schema)?)
}

pub mod traits {
    pub use peechy_compiler::traits::{optional, required, FromPeechy};
}

pub mod error {
    pub use peechy_compiler::error::{ErrorKind, PeechyError};
    pub use peechy_schema::CodecError;
}

pub mod schema {
    pub use peechy_schema::{Def, DefKind, Field, FieldType, Primitive, Schema, Value};
}

pub mod compiler {
    pub use peechy_compiler::{
        compile_schema, compile_schema_to_rust, compile_schema_to_rust_with, compile_schema_with,
        encode_binary_schema, types,
    };
}
