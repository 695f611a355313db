//! peechy-compiler
//!
//! This crate implements:
//!  1) A tokenizer + parser for `.peechy` schema files, including struct
//!     extensions and `pick` definitions,
//!  2) A schema verifier (duplicate types, recursive structs, missing types, field ids),
//!  3) `encode_binary_schema` / `decode_binary_schema`,
//!  4) Lowering to runtime codecs (`compile_schema_to_codecs` → `peechy_schema::Schema`),
//!  5) Rust code generation (`compile_schema_to_rust` → `String`),
//!  6) Error types (`PeechyError`), `CompileOptions` and the `FromPeechy` trait.

pub mod compiler;
pub mod error;
pub mod gen_codec;
pub mod gen_rust;
pub mod options;
pub mod parser;
pub mod tokenizer;
pub mod traits;
pub mod types;
pub mod utils;
pub mod verifier;

pub use compiler::{compile_schema, compile_schema_with, decode_binary_schema, encode_binary_schema, parse_and_verify};
pub use error::{ErrorKind, PeechyError};
pub use gen_codec::compile_schema_to_codecs;
pub use gen_rust::{compile_schema_to_rust, compile_schema_to_rust_with};
pub use options::CompileOptions;
pub use traits::FromPeechy;
