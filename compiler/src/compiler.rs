use std::collections::HashMap;

use log::debug;
use peechy_schema::{ByteBuffer, ByteBufferMut, CodecError};

use crate::{
    error::PeechyError,
    options::CompileOptions,
    parser::parse_schema,
    tokenizer::tokenize_schema,
    types::{Definition, DefinitionKind, Field, Schema},
    verifier::verify_schema_with,
};

/// Primitive names in binary schemas. A negative type `t` names
/// `BINARY_TYPES[!t]`; the order is part of the format.
pub const BINARY_TYPES: [&str; 13] = [
    "bool", "byte", "float", "int", "uint8", "uint16", "uint32", "int8", "int16", "int32", "float32", "string",
    "uint",
];

/// Definition kinds in binary schemas, indexed by the kind byte.
pub const BINARY_KINDS: [DefinitionKind; 6] = [
    DefinitionKind::Enum,
    DefinitionKind::Struct,
    DefinitionKind::Message,
    DefinitionKind::Union,
    DefinitionKind::Smol,
    DefinitionKind::Alias,
];

/// Parse and verify a schema. The result is ready for code generation.
pub fn parse_and_verify(text: &str, options: &CompileOptions) -> Result<Schema, PeechyError> {
    let tokens = tokenize_schema(text)?;
    let schema = parse_schema(&tokens)?;
    verify_schema_with(&schema, options)?;
    Ok(schema)
}

/// Compile a textual schema into `(Schema, Vec<u8>)`.
/// Returns `Err(PeechyError)` if tokenization/parsing/verification fails.
pub fn compile_schema(text: &str) -> Result<(Schema, Vec<u8>), PeechyError> {
    compile_schema_with(text, &CompileOptions::default())
}

pub fn compile_schema_with(text: &str, options: &CompileOptions) -> Result<(Schema, Vec<u8>), PeechyError> {
    let schema = parse_and_verify(text, options)?;
    let bin = encode_binary_schema(&schema)?;
    Ok((schema, bin))
}

fn read_error(what: &str) -> impl Fn(CodecError) -> PeechyError + '_ {
    move |e| PeechyError::BinaryFormat(format!("Failed to read {}: {}", what, e))
}

/// Decode a binary schema buffer back into a `Schema`.
///
/// Nothing is verified beyond the type and kind indices, so the result may
/// break rules that [`verify_schema`](crate::verifier::verify_schema) enforces.
pub fn decode_binary_schema(buffer: &[u8]) -> Result<Schema, PeechyError> {
    struct FieldTemp {
        field:    Field,
        type_num: i32,
    }

    let mut bb = ByteBuffer::new(buffer);

    let definition_count = bb.read_var_uint().map_err(read_error("definition count"))?;

    // The counts come from the input, so vectors grow as data is actually read.
    let mut definitions = Vec::new();
    let mut pending = Vec::new();

    for _ in 0..definition_count {
        let name = bb.read_string().map_err(read_error("definition name"))?.into_owned();

        let kind_byte = bb.read_byte().map_err(read_error("kind byte"))?;
        let kind = *BINARY_KINDS
            .get(kind_byte as usize)
            .ok_or_else(|| PeechyError::BinaryFormat(format!("Invalid definition kind {} for {}", kind_byte, name)))?;

        let field_count = bb.read_var_uint().map_err(read_error("field count"))?;
        let mut fields = Vec::new();
        for _ in 0..field_count {
            let field_name = bb.read_string().map_err(read_error("field name"))?.into_owned();
            let type_num = bb.read_var_int().map_err(read_error("field type"))?;
            let is_array = bb.read_byte().map_err(read_error("is_array byte"))? & 1 != 0;
            let is_required = bb.read_byte().map_err(read_error("is_required byte"))? & 1 != 0;
            let value = bb.read_var_uint().map_err(read_error("field value"))?;

            fields.push(FieldTemp {
                field: Field {
                    name: field_name,
                    line: 0,
                    column: 0,
                    type_: None,
                    is_array,
                    is_required,
                    is_deprecated: false,
                    value: value as i32,
                },
                type_num,
            });
        }

        let serializer_path = bb.read_string().map_err(read_error("serializer path"))?.into_owned();

        definitions.push(Definition {
            name,
            line: 0,
            column: 0,
            kind,
            fields: Vec::new(),
            extensions: Vec::new(),
            serializer_path: Some(serializer_path).filter(|path| !path.is_empty()),
        });
        pending.push(fields);
    }

    // Resolve type numbers now that every definition name is known
    let names: Vec<String> = definitions.iter().map(|def| def.name.clone()).collect();
    for (def, fields) in definitions.iter_mut().zip(pending) {
        let is_enum = matches!(def.kind, DefinitionKind::Enum | DefinitionKind::Smol);
        for FieldTemp { mut field, type_num } in fields {
            if !is_enum {
                let resolved = if type_num < 0 {
                    BINARY_TYPES.get(!type_num as usize).map(|name| name.to_string())
                } else {
                    names.get(type_num as usize).cloned()
                };
                field.type_ = Some(resolved.ok_or_else(|| {
                    PeechyError::BinaryFormat(format!("Invalid type {} for field {}", type_num, field.name))
                })?);
            }
            def.fields.push(field);
        }
    }

    debug!("decoded binary schema with {} definitions", definitions.len());

    // Package is never encoded in the binary format
    Ok(Schema {
        package: None,
        definitions,
    })
}

/// Encode a `Schema` into the binary schema format. Returns
/// `Err(PeechyError::Encode)` for types and kinds the format cannot express.
pub fn encode_binary_schema(schema: &Schema) -> Result<Vec<u8>, PeechyError> {
    let mut bb = ByteBufferMut::new();
    bb.write_var_uint(schema.definitions.len() as u32);

    let definition_index_map: HashMap<&str, usize> = schema
        .definitions
        .iter()
        .enumerate()
        .map(|(i, def)| (def.name.as_str(), i))
        .collect();

    for def in &schema.definitions {
        bb.write_string(&def.name);

        let kind_byte = BINARY_KINDS.iter().position(|&kind| kind == def.kind).ok_or_else(|| {
            PeechyError::Encode(format!(
                "Definition kind {} of {} has no binary form",
                def.kind.as_str(),
                def.name
            ))
        })?;
        bb.write_byte(kind_byte as u8);

        bb.write_var_uint(def.fields.len() as u32);
        for field in &def.fields {
            bb.write_string(&field.name);

            let type_num: i32 = match field.type_.as_deref() {
                _ if matches!(def.kind, DefinitionKind::Enum | DefinitionKind::Smol) => 0,
                None => 0,
                Some(type_str) => {
                    if let Some(native_idx) = BINARY_TYPES.iter().position(|&t| t == type_str) {
                        !(native_idx as i32) // negative for native type
                    } else if let Some(&def_idx) = definition_index_map.get(type_str) {
                        def_idx as i32 // positive for user defs
                    } else {
                        return Err(PeechyError::Encode(format!(
                            "Type '{}' of field '{}' has no binary form",
                            type_str, field.name
                        )));
                    }
                }
            };

            bb.write_var_int(type_num);
            bb.write_byte(field.is_array as u8);
            bb.write_byte(field.is_required as u8);
            bb.write_var_uint(field.value as u32);
        }

        bb.write_string(def.serializer_path.as_deref().unwrap_or(""));
    }

    Ok(bb.data())
}
