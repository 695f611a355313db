// example/src/main.rs

mod generated;

use log::info;
use peechy::{compiler::compile_schema, decode_to_json, load_binary_schema, FromPeechy, PeechyError, Value};

// Bring the generated types into scope:
use generated::{Color, Example, Type};

const SCHEMA: &str = include_str!("../schema/simple.peechy");

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

fn main() -> Result<(), PeechyError> {
    env_logger::init();

    // Compile once to the binary schema, then build codecs from that alone
    let (_, binary_schema) = compile_schema(SCHEMA)?;
    info!("binary schema is {} bytes", binary_schema.len());
    let schema = load_binary_schema(&binary_schema)?;

    let example = Value::object(
        "Example",
        [
            ("clientID", Value::UInt(123)),
            ("type", Value::Enum("Type".to_owned(), "ROUND".to_owned())),
            ("colors", Value::Array(vec![color(10, 20, 30, 255), color(200, 100, 50, 128)])),
        ],
    );

    let bytes = example.encode(&schema, "Example")?;
    println!("encoded {} bytes: {:?}", bytes.len(), bytes);

    let decoded = Value::decode(&schema, "Example", &bytes)?;
    println!("decoded {:?}", decoded);

    // Because Example is a "message", its fields are `Option<…>`.
    let typed = Example::from_peechy(&decoded)?;
    let client_id = typed.client_id.unwrap_or_default();
    let typ = typed.type_.unwrap_or(Type::Flat);
    let colors: Vec<Color> = typed.colors.clone().unwrap_or_default();

    println!("clientID = {}", client_id);
    println!("type     = {:?}", typ);
    for (i, c) in colors.iter().enumerate() {
        println!("  Color[{}] = (r={}, g={}, b={}, a={})", i, c.red, c.green, c.blue, c.alpha);
    }

    println!("{}", serde_json::to_string_pretty(&typed)?);
    println!("{}", decode_to_json(&binary_schema)?);

    Ok(())
}
