use std::collections::{HashMap, HashSet};

use log::debug;

use crate::{
    error::PeechyError,
    options::CompileOptions,
    types::{Definition, DefinitionKind, Field, Schema},
    utils::{quote, semantic_error},
};

/// Converts a string to PascalCase.
/// - If the string contains underscores, it splits on underscores and converts each word
///   so that its first letter is uppercase and the rest lowercase.
/// - If the string does not contain underscores and is fully uppercase, it converts it
///   so that only the first letter is uppercase and the rest are lowercase.
/// - Otherwise, it ensures only the first letter is uppercase.
fn to_pascal_case(s: &str) -> String {
    fn capitalize(word: &str, lower_rest: bool) -> String {
        let mut chars = word.chars();
        match chars.next() {
            None => String::new(),
            Some(first) if lower_rest => first.to_uppercase().to_string() + &chars.as_str().to_lowercase(),
            Some(first) => first.to_uppercase().to_string() + chars.as_str(),
        }
    }

    if s.contains('_') {
        s.split('_')
            .filter(|word| !word.is_empty())
            .map(|word| capitalize(word, true))
            .collect()
    } else {
        capitalize(s, s == s.to_uppercase())
    }
}

/// Converts a string to snake_case without splitting acronyms, so
/// `"sessionID"` becomes `"session_id"`.
fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut snake = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                if !prev.is_uppercase() || chars.get(i + 1).map_or(false, |next| next.is_lowercase()) {
                    snake.push('_');
                }
            }
            snake.extend(c.to_lowercase());
        } else {
            snake.push(c);
        }
    }
    snake
}

/// Escapes Rust reserved keywords by suffixing with an underscore.
fn escape_rust_keyword(s: &str) -> String {
    const KEYWORDS: [&str; 38] = [
        "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern", "false",
        "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
        "self", "Self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use", "where", "while",
    ];
    if KEYWORDS.contains(&s) {
        format!("{}_", s)
    } else {
        s.to_string()
    }
}

/// Maps native schema types to Rust types; anything else is a definition.
fn native_type(type_name: &str) -> Option<&'static str> {
    Some(match type_name {
        "bool" => "bool",
        "byte" | "uint8" => "u8",
        "int8" => "i8",
        "int16" => "i16",
        "uint16" => "u16",
        "int" | "int32" => "i32",
        "uint" | "uint32" | "discriminator" => "u32",
        "float" | "float32" | "lowp" => "f32",
        "string" | "alphanumeric" => "String",
        _ => return None,
    })
}

struct Generator<'a> {
    definitions: HashMap<&'a str, &'a Definition>,
    options:     &'a CompileOptions,
}

impl<'a> Generator<'a> {
    fn derives(&self, base: &str) -> String {
        if self.options.rust_derive_serialize {
            format!("#[derive({}, Serialize)]", base)
        } else {
            format!("#[derive({})]", base)
        }
    }

    /// Follows aliases to the definition name they stand for.
    fn resolve(&self, name: &'a str) -> &'a str {
        let mut current = name;
        for _ in 0..=self.definitions.len() {
            match self.definitions.get(current) {
                Some(def) if def.kind == DefinitionKind::Alias => match def.fields.first() {
                    Some(target) => current = target.name.as_str(),
                    None => break,
                },
                _ => break,
            }
        }
        current
    }

    /// Definitions held inline by `def`; arrays live on the heap already.
    fn inline_children(&self, def: &'a Definition) -> Vec<&'a str> {
        match def.kind {
            DefinitionKind::Union => def.members().iter().map(|member| self.resolve(&member.name)).collect(),
            DefinitionKind::Struct | DefinitionKind::Message => def
                .fields
                .iter()
                .filter(|field| !field.is_array)
                .filter_map(|field| field.type_.as_deref())
                .map(|name| self.resolve(name))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whether a value of type `from` can contain a `target` without indirection.
    fn reaches(&self, from: &'a str, target: &str, seen: &mut HashSet<&'a str>) -> bool {
        if from == target {
            return true;
        }
        if !seen.insert(from) {
            return false;
        }
        match self.definitions.get(from) {
            Some(def) => self
                .inline_children(def)
                .into_iter()
                .any(|child| self.reaches(child, target, seen)),
            None => false,
        }
    }

    fn needs_box(&self, type_name: &'a str, owner: &str) -> bool {
        native_type(type_name).is_none() && self.reaches(self.resolve(type_name), owner, &mut HashSet::new())
    }

    fn rust_type(&self, type_name: &str) -> String {
        native_type(type_name).map_or_else(|| to_pascal_case(type_name), str::to_string)
    }

    fn field_type(&self, owner: &Definition, field: &'a Field) -> String {
        let type_name = field.type_.as_deref().unwrap_or_default();
        let mut rust_type = self.rust_type(type_name);
        if field.is_array {
            rust_type = format!("Vec<{}>", rust_type);
        } else if self.needs_box(type_name, &owner.name) {
            rust_type = format!("Box<{}>", rust_type);
        }
        if owner.kind == DefinitionKind::Message {
            rust_type = format!("Option<{}>", rust_type);
        }
        rust_type
    }

    fn generate(&self, definition: &'a Definition) -> Result<String, PeechyError> {
        match definition.kind {
            DefinitionKind::Enum | DefinitionKind::Smol => Ok(self.generate_enum(definition)),
            DefinitionKind::Struct | DefinitionKind::Message => Ok(self.generate_struct(definition)),
            DefinitionKind::Union => Ok(self.generate_union(definition)),
            DefinitionKind::Alias => Ok(generate_alias(definition)),
            DefinitionKind::Pick | DefinitionKind::Entity => Err(semantic_error(
                &format!("Invalid definition kind {}", quote(definition.kind.as_str())),
                definition.line,
                definition.column,
            )),
        }
    }

    /// Generates a fieldless enum whose `FromPeechy` impl matches member names.
    fn generate_enum(&self, definition: &Definition) -> String {
        let enum_name = to_pascal_case(&definition.name);
        let mut variants = Vec::new();
        let mut match_arms = Vec::new();

        for field in &definition.fields {
            let variant_name = escape_rust_keyword(&to_pascal_case(&field.name));
            if self.options.rust_derive_serialize && variant_name != field.name {
                variants.push(format!("    #[serde(rename = {})]", quote(&field.name)));
            }
            variants.push(format!("    {},", variant_name));
            match_arms.push(format!(
                "            {} => Ok({}::{}),",
                quote(&field.name),
                enum_name,
                variant_name
            ));
        }
        match_arms.push("            other => Err(PeechyError::InvalidEnumVariant(other.to_owned())),".to_string());

        format!(
            "{}\npub enum {} {{\n{}\n}}\n\nimpl FromPeechy for {} {{\n    fn from_peechy(value: &Value) -> Result<Self, PeechyError> {{\n        match value.as_string() {{\n{}\n        }}\n    }}\n}}\n",
            self.derives("Debug, Clone, Copy, PartialEq, Eq, Hash"),
            enum_name,
            variants.join("\n"),
            enum_name,
            match_arms.join("\n")
        )
    }

    /// Generates a struct for a STRUCT or MESSAGE. Message fields are optional;
    /// deprecated fields never reach a decoded value, so they are left out.
    fn generate_struct(&self, definition: &'a Definition) -> String {
        let struct_name = to_pascal_case(&definition.name);
        let is_message = definition.kind == DefinitionKind::Message;
        let mut fields = Vec::new();
        let mut assignments = Vec::new();

        for field in definition.fields.iter().filter(|field| !field.is_deprecated) {
            let rust_field_name = escape_rust_keyword(&to_snake_case(&field.name));
            if self.options.rust_derive_serialize {
                if rust_field_name != field.name {
                    fields.push(format!("    #[serde(rename = {})]", quote(&field.name)));
                }
                if is_message {
                    fields.push("    #[serde(skip_serializing_if = \"Option::is_none\")]".to_string());
                }
            }
            fields.push(format!("    pub {}: {},", rust_field_name, self.field_type(definition, field)));
            assignments.push(format!(
                "            {}: {}(value, {})?,",
                rust_field_name,
                if is_message { "optional" } else { "required" },
                quote(&field.name)
            ));
        }

        let (body, init) = if fields.is_empty() {
            (" {}".to_string(), format!("{} {{}}", struct_name))
        } else {
            (
                format!(" {{\n{}\n}}", fields.join("\n")),
                format!("{} {{\n{}\n        }}", struct_name, assignments.join("\n")),
            )
        };

        format!(
            "{}\npub struct {}{}\n\nimpl FromPeechy for {} {{\n    fn from_peechy(value: &Value) -> Result<Self, PeechyError> {{\n        Ok({})\n    }}\n}}\n",
            self.derives("Debug, Clone, PartialEq"),
            struct_name,
            body,
            struct_name,
            init
        )
    }

    /// Generates an enum with one tuple variant per member. A decoded union is
    /// the member's object, so the impl dispatches on the object's definition.
    fn generate_union(&self, definition: &'a Definition) -> String {
        let enum_name = to_pascal_case(&definition.name);
        let mut variants = Vec::new();
        let mut match_arms = Vec::new();

        for member in definition.members() {
            let variant_name = escape_rust_keyword(&to_pascal_case(&member.name));
            let mut inner = to_pascal_case(&member.name);
            let mut convert = format!("{}::from_peechy(value)?", inner);
            if self.needs_box(&member.name, &definition.name) {
                inner = format!("Box<{}>", inner);
                convert = format!("Box::new({})", convert);
            }
            variants.push(format!("    {}({}),", variant_name, inner));
            match_arms.push(format!(
                "            {} => Ok({}::{}({})),",
                quote(self.resolve(&member.name)),
                enum_name,
                variant_name,
                convert
            ));
        }
        match_arms.push("            other => Err(PeechyError::InvalidEnumVariant(other.to_owned())),".to_string());

        let mut attributes = self.derives("Debug, Clone, PartialEq");
        if self.options.rust_derive_serialize {
            attributes.push_str("\n#[serde(untagged)]");
        }

        format!(
            "{}\npub enum {} {{\n{}\n}}\n\nimpl FromPeechy for {} {{\n    fn from_peechy(value: &Value) -> Result<Self, PeechyError> {{\n        let name = match *value {{\n            Value::Object(ref name, _) => name.as_str(),\n            _ => \"\",\n        }};\n        match name {{\n{}\n        }}\n    }}\n}}\n",
            attributes,
            enum_name,
            variants.join("\n"),
            enum_name,
            match_arms.join("\n")
        )
    }
}

fn generate_alias(definition: &Definition) -> String {
    let target = definition.fields.first().map_or("", |field| field.name.as_str());
    format!(
        "pub type {} = {};\n",
        to_pascal_case(&definition.name),
        native_type(target).map_or_else(|| to_pascal_case(target), str::to_string)
    )
}

/// Compiles a verified schema into Rust type definitions with `FromPeechy`
/// implementations, using the default options.
pub fn compile_schema_to_rust(schema: &Schema) -> Result<String, PeechyError> {
    compile_schema_to_rust_with(schema, &CompileOptions::default())
}

pub fn compile_schema_to_rust_with(schema: &Schema, options: &CompileOptions) -> Result<String, PeechyError> {
    let generator = Generator {
        definitions: schema
            .definitions
            .iter()
            .map(|def| (def.name.as_str(), def))
            .collect(),
        options,
    };
    let mut rust_code: Vec<String> = Vec::new();

    if let Some(ref name) = schema.package {
        rust_code.push(format!("pub mod {} {{", escape_rust_keyword(&to_snake_case(name))));
    }

    rust_code.push("use peechy::traits::{optional, required, FromPeechy};".to_string());
    rust_code.push("use peechy::{PeechyError, Value};".to_string());
    if options.rust_derive_serialize {
        rust_code.push("use serde::Serialize;".to_string());
    }
    rust_code.push(String::new());

    for definition in &schema.definitions {
        rust_code.push(generator.generate(definition)?);
    }

    if schema.package.is_some() {
        rust_code.push("}".to_string());
    }

    debug!("generated Rust source for {} definitions", schema.definitions.len());
    Ok(rust_code.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parse_and_verify;

    fn generate(text: &str) -> String {
        let schema = parse_and_verify(text, &CompileOptions::default()).unwrap();
        compile_schema_to_rust(&schema).unwrap()
    }

    #[test]
    fn case_conversions() {
        assert_eq!(to_pascal_case("SIGNAL"), "Signal");
        assert_eq!(to_pascal_case("TWO_WORDS"), "TwoWords");
        assert_eq!(to_pascal_case("point"), "Point");
        assert_eq!(to_pascal_case("HttpRequest"), "HttpRequest");
        assert_eq!(to_snake_case("sessionID"), "session_id");
        assert_eq!(to_snake_case("clientID"), "client_id");
        assert_eq!(to_snake_case("x"), "x");
        assert_eq!(escape_rust_keyword("type"), "type_");
        assert_eq!(escape_rust_keyword("kind"), "kind");
    }

    #[test]
    fn structs_and_messages() {
        let code = generate(
            "struct Point { int32 x; int32 y; }
             message Example { uint clientID = 1; Point[] points = 2; string type = 3; int old = 4 [deprecated]; }",
        );

        assert!(code.contains("#[derive(Debug, Clone, PartialEq, Serialize)]\npub struct Point {\n    pub x: i32,\n    pub y: i32,\n}"));
        assert!(code.contains("            x: required(value, \"x\")?,"));
        assert!(code.contains("    #[serde(rename = \"clientID\")]"));
        assert!(code.contains("    pub client_id: Option<u32>,"));
        assert!(code.contains("    pub points: Option<Vec<Point>>,"));
        assert!(code.contains("    pub type_: Option<String>,"));
        assert!(code.contains("            type_: optional(value, \"type\")?,"));
        assert!(!code.contains("old"));
    }

    #[test]
    fn enums_unions_and_aliases() {
        let code = generate(
            "enum Color { RED = 1; DARK_BLUE = 2; }
             struct Circle { float radius; }
             message Square { float side = 1; }
             alias Round = Circle;
             union Shape = Round | Square { kind; }",
        );

        assert!(code.contains("    #[serde(rename = \"DARK_BLUE\")]\n    DarkBlue,"));
        assert!(code.contains("            \"RED\" => Ok(Color::Red),"));
        assert!(code.contains("pub type Round = Circle;"));
        assert!(code.contains("#[serde(untagged)]\npub enum Shape {\n    Round(Round),\n    Square(Square),\n}"));
        assert!(code.contains("            \"Circle\" => Ok(Shape::Round(Round::from_peechy(value)?)),"));
        assert!(!code.contains("Kind"));
    }

    #[test]
    fn recursive_fields_are_boxed() {
        let code = generate(
            "message Node { Node next = 1; Node[] children = 2; Leaf leaf = 3; }
             struct Leaf { int value; }
             union Tree = Branch | Leaf;
             message Branch { Tree left = 1; }",
        );

        assert!(code.contains("    pub next: Option<Box<Node>>,"));
        assert!(code.contains("    pub children: Option<Vec<Node>>,"));
        assert!(code.contains("    pub leaf: Option<Leaf>,"));
        assert!(code.contains("    pub left: Option<Box<Tree>>,"));
        assert!(code.contains("    Branch(Box<Branch>),"));
        assert!(code.contains("Ok(Tree::Branch(Box::new(Branch::from_peechy(value)?)))"));
    }

    #[test]
    fn packages_and_options() {
        let schema = parse_and_verify("package Game; struct Empty {}", &CompileOptions::default()).unwrap();
        let options = CompileOptions {
            rust_derive_serialize: false,
            ..CompileOptions::default()
        };
        let code = compile_schema_to_rust_with(&schema, &options).unwrap();

        assert!(code.starts_with("pub mod game {\n"));
        assert!(code.ends_with("\n}"));
        assert!(!code.contains("Serialize"));
        assert!(code.contains("#[derive(Debug, Clone, PartialEq)]\npub struct Empty {}"));
        assert!(code.contains("        Ok(Empty {})"));
    }

    #[test]
    fn entities_are_rejected() {
        let schema = parse_and_verify("entity Thing { uint id; }", &CompileOptions::default()).unwrap();
        assert!(compile_schema_to_rust(&schema).is_err());
    }
}
