use std::collections::{HashMap, HashSet};

use log::debug;

use crate::{
    error::PeechyError,
    options::CompileOptions,
    types::{Definition, DefinitionKind, Field, Schema},
    utils::{quote, semantic_error},
};

pub const RESERVED_NAMES: [&str; 3] = ["ByteBuffer", "package", "Allocator"];
pub const NATIVE_TYPES: [&str; 16] = [
    "bool", "byte", "float", "int", "uint8", "uint16", "uint32", "int8", "int16", "lowp", "int32", "float32",
    "string", "uint", "discriminator", "alphanumeric",
];

#[derive(Clone, Copy, PartialEq)]
pub(crate) enum Visit {
    Visiting,
    Done,
}

fn field_error(msg: String, field: &Field) -> PeechyError {
    semantic_error(&msg, field.line, field.column)
}

pub fn verify_schema(schema: &Schema) -> Result<(), PeechyError> {
    verify_schema_with(schema, &CompileOptions::default())
}

/// Returns `Ok(())` if verification passed, or the first violation as a
/// `PeechyError::Semantic` pointing at the offending definition or field.
pub fn verify_schema_with(schema: &Schema, options: &CompileOptions) -> Result<(), PeechyError> {
    let mut defined_types: HashSet<&str> = NATIVE_TYPES.iter().copied().collect();
    let mut definitions_map: HashMap<&str, &Definition> = HashMap::new();

    // 1) Check duplicate / reserved type names
    for def in &schema.definitions {
        if defined_types.contains(def.name.as_str()) {
            return Err(semantic_error(
                &format!("The type {} is defined twice", quote(&def.name)),
                def.line,
                def.column,
            ));
        }
        if RESERVED_NAMES.contains(&def.name.as_str()) {
            return Err(semantic_error(
                &format!("The type name {} is reserved", quote(&def.name)),
                def.line,
                def.column,
            ));
        }
        defined_types.insert(&def.name);
        definitions_map.insert(&def.name, def);
    }

    // 2) Check fields inside each non-enum definition
    for def in &schema.definitions {
        if matches!(def.kind, DefinitionKind::Enum | DefinitionKind::Smol) || def.fields.is_empty() {
            continue;
        }

        match def.kind {
            DefinitionKind::Union => verify_union(def, &defined_types)?,
            DefinitionKind::Alias => verify_alias(def, &definitions_map)?,
            _ => {
                for field in &def.fields {
                    let ty = field.type_.as_deref().unwrap_or_default();
                    if !defined_types.contains(ty) {
                        return Err(field_error(
                            format!("The type {} is not defined for field {}", quote(ty), quote(&field.name)),
                            field,
                        ));
                    }
                    if ty == "discriminator" {
                        return Err(field_error(
                            "discriminator is only available inside of unions.".to_string(),
                            field,
                        ));
                    }
                }
            }
        }

        verify_ids(def, options)?;
    }

    // 3) Check that structs do not contain themselves recursively
    let mut state: HashMap<&str, Visit> = HashMap::new();
    for def in &schema.definitions {
        check_recursion(&def.name, &definitions_map, &mut state)?;
    }

    debug!("verified {} definitions", schema.definitions.len());
    Ok(())
}

fn verify_union(def: &Definition, defined_types: &HashSet<&str>) -> Result<(), PeechyError> {
    let mut seen = HashSet::new();
    for field in &def.fields {
        let ty = field.type_.as_deref().unwrap_or_default();
        if !seen.insert(field.name.as_str()) {
            return Err(field_error(
                format!("The type {} can only appear in {} once.", quote(ty), quote(&def.name)),
                field,
            ));
        }
        if !defined_types.contains(ty) {
            return Err(field_error(
                format!("The type {} is not defined for union {}", quote(ty), quote(&def.name)),
                field,
            ));
        }
    }
    Ok(())
}

fn verify_alias(def: &Definition, definitions_map: &HashMap<&str, &Definition>) -> Result<(), PeechyError> {
    let target = match def.fields.first() {
        Some(field) => field.name.as_str(),
        None => return Err(semantic_error("Expected alias name", def.line, def.column)),
    };
    if !definitions_map.contains_key(target) && !NATIVE_TYPES.contains(&target) {
        return Err(semantic_error(
            "Expected type used in alias to exist.",
            def.line,
            def.column,
        ));
    }
    Ok(())
}

fn verify_ids(def: &Definition, options: &CompileOptions) -> Result<(), PeechyError> {
    let mut values = HashSet::new();
    for field in &def.fields {
        if !values.insert(field.value) {
            return Err(field_error(
                format!("The id for field {} is used twice", quote(&field.name)),
                field,
            ));
        }
        if field.value <= 0 && field.type_.as_deref() != Some("discriminator") {
            return Err(field_error(
                format!("The id for field {} must be positive", quote(&field.name)),
                field,
            ));
        }
        if options.dense_field_ids && field.value as usize > def.fields.len() {
            return Err(field_error(
                format!(
                    "The id for field {} cannot be larger than {}",
                    quote(&field.name),
                    def.fields.len()
                ),
                field,
            ));
        }
    }
    Ok(())
}

fn check_recursion<'a>(
    name: &str,
    definitions_map: &HashMap<&'a str, &'a Definition>,
    state: &mut HashMap<&'a str, Visit>,
) -> Result<(), PeechyError> {
    let mut definition = match definitions_map.get(name) {
        Some(def) => *def,
        None => return Ok(()),
    };
    // Look through aliases; a chain longer than the schema is an alias loop,
    // which lowering reports.
    let mut hops = 0;
    while definition.kind == DefinitionKind::Alias && hops <= definitions_map.len() {
        definition = match definition.fields.first().and_then(|target| definitions_map.get(target.name.as_str())) {
            Some(def) => *def,
            None => return Ok(()),
        };
        hops += 1;
    }
    if definition.kind != DefinitionKind::Struct {
        return Ok(());
    }

    let name = definition.name.as_str();
    match state.get(name) {
        Some(Visit::Visiting) => {
            return Err(semantic_error(
                &format!("Recursive nesting of {} is not allowed", quote(name)),
                definition.line,
                definition.column,
            ))
        }
        Some(Visit::Done) => return Ok(()),
        None => {}
    }

    state.insert(name, Visit::Visiting);
    for field in &definition.fields {
        if !field.is_array {
            if let Some(ref ty) = field.type_ {
                check_recursion(ty, definitions_map, state)?;
            }
        }
    }
    state.insert(name, Visit::Done);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::parse_schema, tokenizer::tokenize_schema};

    fn verify(text: &str) -> Result<(), PeechyError> {
        verify_schema(&parse_schema(&tokenize_schema(text)?)?)
    }

    fn message(text: &str) -> String {
        match verify(text) {
            Err(PeechyError::Semantic { msg, .. }) => msg,
            other => panic!("expected a semantic error, got {:?}", other),
        }
    }

    #[test]
    fn accepts_valid_schemas() {
        verify(
            "enum Color { RED = 100; }
             struct Point { int32 x; int32 y; }
             struct Path { Point[] points; Path[] children; }
             message Shape { Color color = 1; Point origin = 2; }
             union Any = Point | Shape { kind; }
             alias Id = uint;",
        )
        .unwrap();
    }

    #[test]
    fn rejects_duplicate_and_reserved_names() {
        assert_eq!(message("struct A {} struct A {}"), "The type \"A\" is defined twice");
        assert_eq!(message("struct int {}"), "The type \"int\" is defined twice");
        assert_eq!(message("struct Allocator {}"), "The type name \"Allocator\" is reserved");
    }

    #[test]
    fn rejects_unknown_types() {
        assert_eq!(
            message("struct A { Missing m; }"),
            "The type \"Missing\" is not defined for field \"m\""
        );
        assert_eq!(
            message("union U = A | Missing; struct A {}"),
            "The type \"Missing\" is not defined for union \"U\""
        );
        assert_eq!(message("union U = A | A; struct A {}"), "The type \"A\" can only appear in \"U\" once.");
        assert_eq!(message("alias X = Missing;"), "Expected type used in alias to exist.");
    }

    #[test]
    fn rejects_discriminator_outside_unions() {
        assert_eq!(
            message("message M { discriminator kind = 1; }"),
            "discriminator is only available inside of unions."
        );
    }

    #[test]
    fn checks_field_ids() {
        assert_eq!(
            message("message M { int a = 1; int b = 5; int c = 3; }"),
            "The id for field \"b\" cannot be larger than 3"
        );
        assert_eq!(
            message("message M { int a = 1; int b = 1; }"),
            "The id for field \"b\" is used twice"
        );
        assert_eq!(
            message("message M { int a = 0; }"),
            "The id for field \"a\" must be positive"
        );

        let schema = parse_schema(&tokenize_schema("message M { int a = 1; int b = 5; }").unwrap()).unwrap();
        let sparse = CompileOptions {
            dense_field_ids: false,
            ..CompileOptions::default()
        };
        assert!(verify_schema_with(&schema, &sparse).is_ok());
    }

    #[test]
    fn detects_struct_cycles() {
        assert_eq!(message("struct A { A a; }"), "Recursive nesting of \"A\" is not allowed");
        assert_eq!(
            message("struct A { B b; } struct B { A a; }"),
            "Recursive nesting of \"A\" is not allowed"
        );
        verify("struct A { A[] a; }").unwrap();
        verify("struct A { B b; } struct B { A[] a; }").unwrap();
        verify("message A { A a = 1; }").unwrap();
    }

    #[test]
    fn struct_cycles_through_aliases() {
        assert_eq!(
            message("alias X = A; struct A { X x; }"),
            "Recursive nesting of \"A\" is not allowed"
        );
        assert_eq!(
            message("alias X = Y; alias Y = A; struct A { X x; }"),
            "Recursive nesting of \"A\" is not allowed"
        );
        assert_eq!(
            message("struct A { Y b; } alias Y = B; struct B { A a; }"),
            "Recursive nesting of \"A\" is not allowed"
        );
        verify("alias X = A; struct A { X[] x; }").unwrap();
    }

    #[test]
    fn errors_carry_positions() {
        let err = verify("struct A {}\nstruct A {}").unwrap_err();
        assert_eq!(err.position(), Some((2, 8)));
    }
}
