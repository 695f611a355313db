use serde::Deserialize;

use crate::error::PeechyError;

/// Knobs for verification and code generation. Every field has a default,
/// so a partial JSON object is enough:
///
/// ```
/// use peechy_compiler::options::CompileOptions;
///
/// let options = CompileOptions::from_json(r#"{ "dense_field_ids": false }"#).unwrap();
/// assert!(!options.dense_field_ids);
/// assert!(options.rust_derive_serialize);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    /// Reject field ids larger than the number of fields in their definition.
    pub dense_field_ids:       bool,
    /// Add `#[derive(Serialize)]` to generated Rust types.
    pub rust_derive_serialize: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            dense_field_ids:       true,
            rust_derive_serialize: true,
        }
    }
}

impl CompileOptions {
    pub fn from_json(text: &str) -> Result<CompileOptions, PeechyError> {
        Ok(serde_json::from_str(text)?)
    }
}
