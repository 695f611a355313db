use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{
    bb::{ByteBuffer, ByteBufferMut},
    error::CodecError,
    value::Value,
};

/// The built-in field types. The declaration order is the order of the
/// native type table and is significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    Byte,
    Float,
    Int,
    Uint8,
    Uint16,
    Uint32,
    Int8,
    Int16,
    Lowp,
    Int32,
    Float32,
    String,
    Uint,
    Discriminator,
    Alphanumeric,
}

impl Primitive {
    pub const ALL: [Primitive; 16] = [
        Primitive::Bool,
        Primitive::Byte,
        Primitive::Float,
        Primitive::Int,
        Primitive::Uint8,
        Primitive::Uint16,
        Primitive::Uint32,
        Primitive::Int8,
        Primitive::Int16,
        Primitive::Lowp,
        Primitive::Int32,
        Primitive::Float32,
        Primitive::String,
        Primitive::Uint,
        Primitive::Discriminator,
        Primitive::Alphanumeric,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Byte => "byte",
            Primitive::Float => "float",
            Primitive::Int => "int",
            Primitive::Uint8 => "uint8",
            Primitive::Uint16 => "uint16",
            Primitive::Uint32 => "uint32",
            Primitive::Int8 => "int8",
            Primitive::Int16 => "int16",
            Primitive::Lowp => "lowp",
            Primitive::Int32 => "int32",
            Primitive::Float32 => "float32",
            Primitive::String => "string",
            Primitive::Uint => "uint",
            Primitive::Discriminator => "discriminator",
            Primitive::Alphanumeric => "alphanumeric",
        }
    }

    pub fn from_name(name: &str) -> Option<Primitive> {
        Primitive::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// Element width of the types whose arrays are stored as one
    /// length-prefixed block of raw little-endian bytes.
    pub fn packed_width(self) -> Option<usize> {
        match self {
            Primitive::Byte | Primitive::Int8 => Some(1),
            Primitive::Uint16 | Primitive::Int16 => Some(2),
            Primitive::Uint32 | Primitive::Int32 | Primitive::Float32 => Some(4),
            _ => None,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Primitive(Primitive),
    /// Index into [`Schema::defs`].
    Def(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefKind {
    Enum,
    Smol,
    Struct,
    Message,
    Union,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    /// `None` for enum and smol members.
    pub type_: Option<FieldType>,
    pub is_array: bool,
    pub is_required: bool,
    pub is_deprecated: bool,
    pub value: u32,
}

impl Field {
    pub fn new(name: &str, type_: Option<FieldType>, value: u32) -> Field {
        Field {
            name: name.to_owned(),
            type_,
            is_array: false,
            is_required: false,
            is_deprecated: false,
            value,
        }
    }

    pub fn array(mut self) -> Field {
        self.is_array = true;
        self
    }

    pub fn required(mut self) -> Field {
        self.is_required = true;
        self
    }

    pub fn deprecated(mut self) -> Field {
        self.is_deprecated = true;
        self
    }

    /// Key of the companion property that carries the member tag of a
    /// union-typed field whose union has no discriminator.
    pub fn type_key(&self) -> String {
        format!("{}Type", self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Def {
    pub name: String,
    pub index: usize,
    pub kind: DefKind,
    /// Members for enums, smols and unions; fields otherwise.
    pub fields: Vec<Field>,
    /// Name of the property that carries a union's member tag.
    pub discriminator: Option<String>,
    /// Set when the codec for this definition is supplied from outside.
    pub serializer_path: Option<String>,
    pub field_value_to_index: HashMap<u32, usize>,
    pub field_name_to_index: HashMap<String, usize>,
}

impl Def {
    pub fn new(name: String, kind: DefKind, fields: Vec<Field>) -> Def {
        let mut field_value_to_index = HashMap::new();
        let mut field_name_to_index = HashMap::new();
        for (i, field) in fields.iter().enumerate() {
            field_value_to_index.insert(field.value, i);
            field_name_to_index.insert(field.name.clone(), i);
        }
        Def {
            name,
            index: 0,
            kind,
            fields,
            discriminator: None,
            serializer_path: None,
            field_value_to_index,
            field_name_to_index,
        }
    }

    pub fn with_discriminator(mut self, name: &str) -> Def {
        self.discriminator = Some(name.to_owned());
        self
    }

    pub fn with_serializer_path(mut self, path: &str) -> Def {
        self.serializer_path = Some(path.to_owned());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.field_name_to_index.get(name).map(|&i| &self.fields[i])
    }

    pub fn field_by_value(&self, value: u32) -> Option<&Field> {
        self.field_value_to_index.get(&value).map(|&i| &self.fields[i])
    }

    /// True for unions whose member tag travels outside the union value.
    pub fn is_plain_union(&self) -> bool {
        self.kind == DefKind::Union && self.discriminator.is_none()
    }

    /// The bidirectional name/value table of an enum, smol or union.
    pub fn table(&self) -> Option<LookupTable<'_>> {
        match self.kind {
            DefKind::Enum | DefKind::Smol | DefKind::Union => Some(LookupTable { def: self }),
            DefKind::Struct | DefKind::Message => None,
        }
    }
}

/// Maps member names to wire values and back (the `D` and `DKeys` tables).
#[derive(Debug, Clone, Copy)]
pub struct LookupTable<'a> {
    def: &'a Def,
}

impl<'a> LookupTable<'a> {
    pub fn value_of(&self, name: &str) -> Option<u32> {
        self.def.field(name).map(|field| field.value)
    }

    pub fn name_of(&self, value: u32) -> Option<&'a str> {
        self.def
            .field_value_to_index
            .get(&value)
            .map(|&i| self.def.fields[i].name.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&'a str, u32)> + 'a {
        self.def.fields.iter().map(|field| (field.name.as_str(), field.value))
    }

    /// Resolves a member given either by name or by wire value.
    pub fn resolve(&self, value: &Value) -> Option<u32> {
        match value {
            Value::String(name) => self.value_of(name),
            Value::Enum(_, name) => self.value_of(name),
            other => other
                .integer()
                .and_then(|n| u32::try_from(n).ok())
                .filter(|&n| self.name_of(n).is_some()),
        }
    }
}

/// A codec implemented outside the schema, installed with [`Schema::link`]
/// for definitions that carry a serializer path.
pub trait ExternalCodec: fmt::Debug + Send + Sync {
    fn encode(&self, schema: &Schema, value: &Value, bb: &mut ByteBufferMut) -> Result<(), CodecError>;

    fn decode(&self, schema: &Schema, bb: &mut ByteBuffer) -> Result<Value, CodecError>;
}

/// A lowered schema: every definition resolved to indices and ready to be
/// interpreted by the codecs in [`value`](crate::value).
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub package: Option<String>,
    pub defs: Vec<Def>,
    pub def_name_to_index: HashMap<String, usize>,
    exports: Vec<String>,
    externals: HashMap<usize, Arc<dyn ExternalCodec>>,
}

impl Schema {
    pub fn new(mut defs: Vec<Def>) -> Schema {
        let mut def_name_to_index = HashMap::new();
        let mut exports = Vec::new();
        for (i, def) in defs.iter_mut().enumerate() {
            def.index = i;
            def_name_to_index.insert(def.name.clone(), i);
            match def.kind {
                DefKind::Enum | DefKind::Smol => {
                    exports.push(def.name.clone());
                    exports.push(format!("{}Keys", def.name));
                }
                DefKind::Union => {
                    exports.push(def.name.clone());
                    exports.push(format!("{}Keys", def.name));
                    exports.push(format!("{}Type", def.name));
                    exports.push(format!("decode{}", def.name));
                    exports.push(format!("encode{}", def.name));
                }
                DefKind::Struct | DefKind::Message => {
                    exports.push(format!("decode{}", def.name));
                    exports.push(format!("encode{}", def.name));
                }
            }
        }
        Schema {
            package: None,
            defs,
            def_name_to_index,
            exports,
            externals: HashMap::new(),
        }
    }

    pub fn with_package(mut self, package: Option<String>) -> Schema {
        self.package = package;
        self
    }

    pub fn def(&self, name: &str) -> Option<&Def> {
        self.def_name_to_index.get(name).map(|&i| &self.defs[i])
    }

    /// Every exported name, in definition order.
    pub fn exports(&self) -> &[String] {
        &self.exports
    }

    /// `(definition, serializer path)` for each externally supplied codec.
    pub fn imports(&self) -> impl Iterator<Item = (&str, &str)> {
        self.defs.iter().filter_map(|def| {
            def.serializer_path
                .as_deref()
                .map(|path| (def.name.as_str(), path))
        })
    }

    pub fn table(&self, name: &str) -> Option<LookupTable<'_>> {
        self.def(name).and_then(Def::table)
    }

    /// Installs the codec for a definition that carries a serializer path.
    pub fn link(&mut self, name: &str, codec: Arc<dyn ExternalCodec>) -> Result<(), CodecError> {
        let index = *self
            .def_name_to_index
            .get(name)
            .ok_or_else(|| CodecError::UnknownDefinition(name.to_owned()))?;
        debug!("linked external codec {:?} for {}", codec, name);
        self.externals.insert(index, codec);
        Ok(())
    }

    pub(crate) fn external(&self, index: usize) -> Option<&Arc<dyn ExternalCodec>> {
        self.externals.get(&index)
    }

    /// The encode/decode pair of a struct, message or union.
    pub fn codec(&self, name: &str) -> Option<Codec<'_>> {
        let def = self.def(name)?;
        match def.kind {
            DefKind::Struct | DefKind::Message | DefKind::Union => Some(Codec { schema: self, def }),
            DefKind::Enum | DefKind::Smol => None,
        }
    }
}

/// The `encodeD`/`decodeD` pair of one definition.
#[derive(Debug, Clone, Copy)]
pub struct Codec<'a> {
    schema: &'a Schema,
    def: &'a Def,
}

impl<'a> Codec<'a> {
    pub fn def(&self) -> &'a Def {
        self.def
    }

    /// `tag` selects the member of a union that has no discriminator.
    pub fn encode(&self, value: &Value, bb: &mut ByteBufferMut, tag: Option<u8>) -> Result<(), CodecError> {
        value.encode_bb(self.schema, self.def.index, bb, tag)
    }

    /// `tag` is the member tag of a union that has no discriminator when the
    /// caller has already consumed it.
    pub fn decode(&self, bb: &mut ByteBuffer, tag: Option<u8>) -> Result<Value, CodecError> {
        Value::decode_bb(self.schema, self.def.index, bb, tag)
    }

    pub fn encode_to_vec(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let mut bb = ByteBufferMut::new();
        self.encode(value, &mut bb, None)?;
        Ok(bb.data())
    }

    pub fn decode_from_slice(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        self.decode(&mut ByteBuffer::new(bytes), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_schema() -> Schema {
        Schema::new(vec![
            Def::new(
                "Color".to_owned(),
                DefKind::Enum,
                vec![Field::new("RED", None, 1), Field::new("GREEN", None, 2)],
            ),
            Def::new(
                "Paint".to_owned(),
                DefKind::Struct,
                vec![Field::new("color", Some(FieldType::Def(0)), 1).required()],
            ),
            Def::new(
                "Blob".to_owned(),
                DefKind::Message,
                vec![Field::new("data", Some(FieldType::Primitive(Primitive::Byte)), 1).array()],
            )
            .with_serializer_path("./blob"),
        ])
    }

    #[test]
    fn primitive_table_order() {
        let names: Vec<_> = Primitive::ALL.iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            [
                "bool", "byte", "float", "int", "uint8", "uint16", "uint32", "int8", "int16",
                "lowp", "int32", "float32", "string", "uint", "discriminator", "alphanumeric",
            ]
        );
        assert_eq!(Primitive::from_name("lowp"), Some(Primitive::Lowp));
        assert_eq!(Primitive::from_name("Point"), None);
    }

    #[test]
    fn exports_and_imports() {
        let schema = color_schema();
        assert_eq!(
            schema.exports(),
            ["Color", "ColorKeys", "decodePaint", "encodePaint", "decodeBlob", "encodeBlob"]
        );
        assert_eq!(schema.imports().collect::<Vec<_>>(), [("Blob", "./blob")]);
    }

    #[test]
    fn lookup_tables_are_bidirectional() {
        let schema = color_schema();
        let table = schema.table("Color").unwrap();
        assert_eq!(table.value_of("GREEN"), Some(2));
        assert_eq!(table.name_of(1), Some("RED"));
        assert_eq!(table.name_of(3), None);
        assert_eq!(table.resolve(&Value::UInt(2)), Some(2));
        assert_eq!(table.resolve(&Value::String("RED".to_owned())), Some(1));
        assert_eq!(table.resolve(&Value::Int(7)), None);
        assert!(schema.table("Paint").is_none());
    }

    #[test]
    fn codecs_exist_only_for_records_and_unions() {
        let schema = color_schema();
        assert!(schema.codec("Paint").is_some());
        assert!(schema.codec("Color").is_none());
        assert!(schema.codec("Missing").is_none());
    }

    #[test]
    fn link_rejects_unknown_definitions() {
        #[derive(Debug)]
        struct Noop;
        impl ExternalCodec for Noop {
            fn encode(&self, _: &Schema, _: &Value, _: &mut ByteBufferMut) -> Result<(), CodecError> {
                Ok(())
            }
            fn decode(&self, _: &Schema, _: &mut ByteBuffer) -> Result<Value, CodecError> {
                Ok(Value::Bool(true))
            }
        }

        let mut schema = color_schema();
        assert_eq!(
            schema.link("Nope", Arc::new(Noop)),
            Err(CodecError::UnknownDefinition("Nope".to_owned()))
        );
        assert_eq!(schema.link("Blob", Arc::new(Noop)), Ok(()));
        let blob = schema.codec("Blob").unwrap();
        assert_eq!(blob.decode_from_slice(&[]), Ok(Value::Bool(true)));
    }
}
