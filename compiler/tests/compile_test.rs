use peechy_compiler::{
    compile_schema, compile_schema_to_codecs, compile_schema_to_rust, decode_binary_schema,
    parser::parse_schema,
    tokenizer::tokenize_schema,
    types::DefinitionKind,
    CompileOptions, ErrorKind, PeechyError,
};
use peechy_schema::{CodecError, Value};
use serde_json::json;

const EXAMPLE: &str = r#"
    enum Type {
      FLAT = 0;
      ROUND = 1;
      POINTED = 2;
    }

    struct Color {
      byte red;
      byte green;
      byte blue;
      byte alpha;
    }

    message Example {
      uint clientID = 1;
      Type type = 2;
      Color[] colors = 3;
    }
    "#;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn color(red: u8, green: u8, blue: u8, alpha: u8) -> Value {
    Value::object(
        "Color",
        [
            ("red", Value::Byte(red)),
            ("green", Value::Byte(green)),
            ("blue", Value::Byte(blue)),
            ("alpha", Value::Byte(alpha)),
        ],
    )
}

#[test]
fn test_parse_schema() {
    init_logger();
    let tokens = tokenize_schema(EXAMPLE).expect("tokenize_schema failed");
    let schema = parse_schema(&tokens).expect("parse_schema failed");

    assert!(schema.package.is_none());
    assert_eq!(schema.definitions.len(), 3);

    let type_def = &schema.definitions[0];
    assert_eq!(type_def.kind, DefinitionKind::Enum);
    assert_eq!(type_def.name, "Type");
    let members: Vec<_> = type_def.fields.iter().map(|f| (f.name.as_str(), f.value)).collect();
    assert_eq!(members, [("FLAT", 0), ("ROUND", 1), ("POINTED", 2)]);

    let color_def = &schema.definitions[1];
    assert_eq!(color_def.kind, DefinitionKind::Struct);
    for (i, (field, name)) in color_def.fields.iter().zip(["red", "green", "blue", "alpha"]).enumerate() {
        assert_eq!(field.name, name);
        assert_eq!(field.type_.as_deref(), Some("byte"));
        assert!(!field.is_array);
        assert!(field.is_required);
        assert_eq!(field.value, i as i32 + 1);
    }

    let message_def = &schema.definitions[2];
    assert_eq!(message_def.kind, DefinitionKind::Message);
    assert_eq!(message_def.fields[1].name, "type");
    assert_eq!(message_def.fields[1].type_.as_deref(), Some("Type"));
    assert!(message_def.fields[2].is_array);
    assert_eq!(message_def.fields[2].value, 3);
}

#[test]
fn test_message_round_trip() {
    init_logger();
    let (schema, _) = compile_schema(EXAMPLE).unwrap();
    let codecs = compile_schema_to_codecs(&schema).unwrap();

    let example = Value::object(
        "Example",
        [
            ("clientID", Value::UInt(123)),
            ("type", Value::Enum("Type".to_owned(), "ROUND".to_owned())),
            ("colors", Value::Array(vec![color(10, 20, 30, 255)])),
        ],
    );

    let bytes = example.encode(&codecs, "Example").unwrap();
    assert_eq!(
        bytes,
        [1, 123, 0, 0, 0, 2, 1, 0, 0, 0, 3, 1, 0, 0, 0, 10, 20, 30, 255, 0]
    );

    let decoded = Value::decode(&codecs, "Example", &bytes).unwrap();
    assert_eq!(decoded, example);
    assert_eq!(
        serde_json::to_value(&decoded).unwrap(),
        json!({
            "clientID": 123,
            "type": "ROUND",
            "colors": [{ "red": 10, "green": 20, "blue": 30, "alpha": 255 }],
        })
    );

    // Absent message fields stay absent
    let empty = Value::object("Example", Vec::<(String, Value)>::new());
    assert_eq!(empty.encode(&codecs, "Example").unwrap(), [0]);
    assert_eq!(Value::decode(&codecs, "Example", &[0]).unwrap(), empty);

    assert_eq!(
        Value::decode(&codecs, "Example", &[9]),
        Err(CodecError::UnknownMessageTag {
            definition: "Example".to_owned(),
            tag:        9,
        })
    );
}

#[test]
fn test_unions() {
    let (schema, _) = compile_schema(
        "struct Circle { float radius; }
         message Square { float side = 1; }
         union Shape = Circle | Square { kind; }",
    )
    .unwrap();
    let codecs = compile_schema_to_codecs(&schema).unwrap();
    let shape = codecs.codec("Shape").unwrap();

    let circle = Value::object("Circle", [("radius", Value::Float(2.0))]);
    let bytes = shape.encode_to_vec(&circle).unwrap();
    assert_eq!(bytes, [1, 128, 0, 0, 0]);

    let mut expected = circle.clone();
    expected.set("kind", Value::Byte(1));
    assert_eq!(shape.decode_from_slice(&bytes).unwrap(), expected);

    let table = codecs.table("Shape").unwrap();
    assert_eq!(table.value_of("Square"), Some(2));
    assert_eq!(table.name_of(1), Some("Circle"));
}

#[test]
fn test_binary_schema_round_trip() {
    let (schema, bin) = compile_schema(EXAMPLE).unwrap();
    let decoded = decode_binary_schema(&bin).unwrap();
    assert_eq!(
        decoded.definitions.iter().map(|d| (&d.name, d.kind)).collect::<Vec<_>>(),
        schema.definitions.iter().map(|d| (&d.name, d.kind)).collect::<Vec<_>>()
    );

    // Runtime codecs built from either form agree on the wire
    let from_text = compile_schema_to_codecs(&schema).unwrap();
    let from_binary = compile_schema_to_codecs(&decoded).unwrap();
    let value = color(1, 2, 3, 4);
    assert_eq!(value.encode(&from_text, "Color"), value.encode(&from_binary, "Color"));
}

#[test]
fn test_error_kinds() {
    let err = compile_schema("struct A { int x }").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(err.position(), Some((1, 18)));

    let err = compile_schema("struct A { B b; }").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Semantic);

    let err = decode_binary_schema(&[1, 0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BinaryFormat);

    let (schema, _) = compile_schema("struct P { int32 x; }").unwrap();
    let codecs = compile_schema_to_codecs(&schema).unwrap();
    let err = PeechyError::from(Value::decode(&codecs, "P", &[1, 2]).unwrap_err());
    assert_eq!(err.kind(), ErrorKind::CodecRuntime);
}

#[test]
fn test_sparse_ids_option() {
    let text = "message M { int a = 1; int b = 9; }";
    assert!(compile_schema(text).is_err());

    let options = CompileOptions::from_json(r#"{ "dense_field_ids": false }"#).unwrap();
    let (schema, _) = peechy_compiler::compile_schema_with(text, &options).unwrap();
    let codecs = compile_schema_to_codecs(&schema).unwrap();
    let value = Value::object("M", [("b", Value::Int(-1))]);
    assert_eq!(value.encode(&codecs, "M").unwrap(), [9, 255, 255, 255, 255, 0]);
}

#[test]
fn test_compile_schema_to_rust() {
    let (schema, _) = compile_schema(EXAMPLE).unwrap();
    let rust_code = compile_schema_to_rust(&schema).unwrap();

    assert!(rust_code.contains("pub enum Type {"));
    assert!(rust_code.contains("pub struct Color {"));
    assert!(rust_code.contains("    pub red: u8,"));
    assert!(rust_code.contains("    pub client_id: Option<u32>,"));
    assert!(rust_code.contains("    pub type_: Option<Type>,"));
    assert!(rust_code.contains("    pub colors: Option<Vec<Color>>,"));
    assert!(rust_code.contains("impl FromPeechy for Example {"));
}

#[test]
fn test_example_app_is_generated() {
    let (schema, _) = compile_schema(include_str!("../../example/schema/simple.peechy")).unwrap();
    assert_eq!(
        compile_schema_to_rust(&schema).unwrap(),
        include_str!("../../example/src/generated.rs")
    );
}
