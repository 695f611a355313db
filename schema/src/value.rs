use crate::{
    bb::{ByteBuffer, ByteBufferMut},
    error::CodecError,
    schema::{Def, DefKind, Field, FieldType, Primitive, Schema},
};

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::ops::Index;

/// This type holds dynamic Peechy data.
///
/// Values can represent anything in a Peechy schema and can be converted to
/// and from byte arrays using the corresponding [Schema](struct.Schema.html).
/// Enum members and objects remember the name of the definition they came
/// from, so a decoded value can be re-encoded without extra context.
#[derive(Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(u8),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int(i32),
    UInt16(u16),
    UInt32(u32),
    UInt(u32),
    Float(f32),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Enum(String, String),
    Object(String, HashMap<String, Value>),
}

impl Value {
    /// Builds an [Object](#variant.Object) from `(name, value)` pairs.
    pub fn object<K, I>(name: &str, fields: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(
            name.to_owned(),
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )
    }

    /// A convenience method to extract the value out of a [Bool](#variant.Bool).
    /// Returns `false` for other value kinds.
    pub fn as_bool(&self) -> bool {
        match *self {
            Value::Bool(value) => value,
            _ => false,
        }
    }

    /// A convenience method to extract the value out of a [Byte](#variant.Byte).
    /// Returns `0` for other value kinds.
    pub fn as_byte(&self) -> u8 {
        match *self {
            Value::Byte(value) => value,
            _ => 0,
        }
    }

    /// Returns any signed integer kind widened to `i32`, or `0`.
    pub fn as_int(&self) -> i32 {
        match *self {
            Value::Int8(value) => value.into(),
            Value::Int16(value) => value.into(),
            Value::Int32(value) | Value::Int(value) => value,
            _ => 0,
        }
    }

    /// Returns any unsigned integer kind widened to `u32`, or `0`.
    pub fn as_uint(&self) -> u32 {
        match *self {
            Value::Byte(value) => value.into(),
            Value::UInt16(value) => value.into(),
            Value::UInt32(value) | Value::UInt(value) => value,
            _ => 0,
        }
    }

    /// A convenience method to extract the value out of a [Float](#variant.Float).
    /// Returns `0.0` for other value kinds.
    pub fn as_float(&self) -> f32 {
        match *self {
            Value::Float(value) => value,
            _ => 0.0,
        }
    }

    /// A convenience method to extract the value out of a [String](#variant.String)
    /// or the member name of an [Enum](#variant.Enum). Returns `""` for other
    /// value kinds.
    pub fn as_string(&self) -> &str {
        match *self {
            Value::String(ref value) => value.as_str(),
            Value::Enum(_, ref value) => value.as_str(),
            _ => "",
        }
    }

    /// A convenience method to extract the value out of [Bytes](#variant.Bytes).
    /// Returns an empty slice for other value kinds.
    pub fn as_bytes(&self) -> &[u8] {
        match *self {
            Value::Bytes(ref value) => value.as_slice(),
            _ => &[],
        }
    }

    /// A convenience method to get an array of values out of an [Array](#variant.Array).
    /// Returns an empty array for other value kinds.
    pub fn as_array(&self) -> &[Value] {
        match *self {
            Value::Array(ref values) => values.as_slice(),
            _ => &[],
        }
    }

    /// A convenience method to extract the value out of an [Enum](#variant.Enum).
    /// Returns `("", "")` for other value kinds.
    pub fn as_enum(&self) -> (&str, &str) {
        match *self {
            Value::Enum(ref name, ref value) => (name.as_str(), value.as_str()),
            _ => ("", ""),
        }
    }

    /// Any integer kind widened to `i64`. `None` for everything else.
    pub fn integer(&self) -> Option<i64> {
        match *self {
            Value::Byte(value) => Some(value.into()),
            Value::Int8(value) => Some(value.into()),
            Value::Int16(value) => Some(value.into()),
            Value::Int32(value) | Value::Int(value) => Some(value.into()),
            Value::UInt16(value) => Some(value.into()),
            Value::UInt32(value) | Value::UInt(value) => Some(value.into()),
            _ => None,
        }
    }

    /// A convenience method to extract the length out of an [Array](#variant.Array)
    /// or [Bytes](#variant.Bytes). Returns `0` for other value kinds.
    pub fn len(&self) -> usize {
        match *self {
            Value::Array(ref values) => values.len(),
            Value::Bytes(ref values) => values.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A convenience method to append to an [Array](#variant.Array). Does
    /// nothing for other value kinds.
    pub fn push(&mut self, value: Value) {
        if let Value::Array(ref mut values) = *self {
            values.push(value);
        }
    }

    /// A convenience method to extract a field out of an [Object](#variant.Object).
    /// Returns `None` for other value kinds or if the field isn't present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match *self {
            Value::Object(_, ref fields) => fields.get(name),
            _ => None,
        }
    }

    /// A convenience method to update a field on an [Object](#variant.Object).
    /// Does nothing for other value kinds.
    pub fn set(&mut self, name: &str, value: Value) {
        if let Value::Object(_, ref mut fields) = *self {
            fields.insert(name.to_owned(), value);
        }
    }

    /// A convenience method to remove a field on an [Object](#variant.Object).
    /// Does nothing for other value kinds.
    pub fn remove(&mut self, name: &str) {
        if let Value::Object(_, ref mut fields) = *self {
            fields.remove(name);
        }
    }

    /// Decodes the definition called `name` from `bytes`.
    pub fn decode(schema: &Schema, name: &str, bytes: &[u8]) -> Result<Value, CodecError> {
        let index = def_index(schema, name)?;
        Value::decode_bb(schema, index, &mut ByteBuffer::new(bytes), None)
    }

    /// Encodes this value as the definition called `name`.
    pub fn encode(&self, schema: &Schema, name: &str) -> Result<Vec<u8>, CodecError> {
        let index = def_index(schema, name)?;
        let mut bb = ByteBufferMut::new();
        self.encode_bb(schema, index, &mut bb, None)?;
        Ok(bb.data())
    }

    /// Decodes the definition at `def_index` from `bb` starting at the current
    /// index. After this function returns, the current index will be advanced
    /// by the amount of data that was successfully parsed.
    ///
    /// `tag` is only consulted for unions. When it is `Some` the caller has
    /// already consumed the member tag byte; otherwise it is read here.
    pub fn decode_bb(
        schema: &Schema,
        def_index: usize,
        bb: &mut ByteBuffer,
        tag: Option<u8>,
    ) -> Result<Value, CodecError> {
        let def = lookup(schema, def_index)?;

        if let Some(ref path) = def.serializer_path {
            return match schema.external(def.index) {
                Some(codec) => codec.decode(schema, bb),
                None => Err(missing_external(def, path)),
            };
        }

        match def.kind {
            DefKind::Enum => {
                let value = bb.read_var_uint()?;
                enum_member(def, value)
            }

            DefKind::Smol => {
                let value = bb.read_byte()?;
                enum_member(def, value.into())
            }

            DefKind::Struct => {
                let mut fields = HashMap::new();
                for field in &def.fields {
                    decode_record_field(schema, field, bb, &mut fields)?;
                }
                Ok(Value::Object(def.name.clone(), fields))
            }

            DefKind::Message => {
                let mut fields = HashMap::new();
                loop {
                    let tag = bb.read_byte()?;
                    if tag == 0 {
                        return Ok(Value::Object(def.name.clone(), fields));
                    }
                    match def.field_by_value(tag.into()) {
                        Some(field) => decode_record_field(schema, field, bb, &mut fields)?,
                        None => {
                            return Err(CodecError::UnknownMessageTag {
                                definition: def.name.clone(),
                                tag,
                            })
                        }
                    }
                }
            }

            DefKind::Union => {
                let tag = match tag {
                    Some(tag) => tag,
                    None => bb.read_byte()?,
                };
                let member = def
                    .field_by_value(tag.into())
                    .ok_or_else(|| CodecError::UnknownUnionTag {
                        definition: def.name.clone(),
                        tag: tag.into(),
                    })?;
                let mut result = Value::decode_bb(schema, member_index(def, member)?, bb, None)?;
                if let (Some(discriminator), Value::Object(_, fields)) = (&def.discriminator, &mut result) {
                    fields.insert(discriminator.clone(), Value::Byte(tag));
                }
                Ok(result)
            }
        }
    }

    /// Decodes the value of `field` from `bb` starting at the current index.
    /// Arrays of byte, int8, int16, int32, uint16, uint32 and float32 are read
    /// as a single block.
    pub fn decode_field_bb(schema: &Schema, field: &Field, bb: &mut ByteBuffer) -> Result<Value, CodecError> {
        let type_ = field_type(field)?;
        if !field.is_array {
            return decode_type(schema, type_, bb);
        }

        Ok(match type_ {
            FieldType::Primitive(Primitive::Byte) => Value::Bytes(bb.read_byte_array()?.to_vec()),
            FieldType::Primitive(Primitive::Int8) => {
                Value::Array(bb.read_int8_array()?.into_iter().map(Value::Int8).collect())
            }
            FieldType::Primitive(Primitive::Int16) => {
                Value::Array(bb.read_int16_array()?.into_iter().map(Value::Int16).collect())
            }
            FieldType::Primitive(Primitive::Uint16) => {
                Value::Array(bb.read_uint16_array()?.into_iter().map(Value::UInt16).collect())
            }
            FieldType::Primitive(Primitive::Int32) => {
                Value::Array(bb.read_int32_array()?.into_iter().map(Value::Int32).collect())
            }
            FieldType::Primitive(Primitive::Uint32) => {
                Value::Array(bb.read_uint32_array()?.into_iter().map(Value::UInt32).collect())
            }
            FieldType::Primitive(Primitive::Float32) => {
                Value::Array(bb.read_float32_array()?.into_iter().map(Value::Float).collect())
            }
            _ => {
                let len = bb.read_var_uint()?;
                let remaining = bb.remaining();
                // The count comes off the wire, so don't preallocate from it.
                let mut array = Vec::new();
                for _ in 0..len {
                    let start = bb.index();
                    array.push(decode_type(schema, type_, bb)?);
                    // Empty structs read nothing, so the count alone can't be trusted
                    if bb.index() == start && len as usize > remaining {
                        return Err(CodecError::EmptyElementCount { count: len, remaining });
                    }
                }
                Value::Array(array)
            }
        })
    }

    /// Encodes this value as the definition at `def_index` to the end of `bb`.
    ///
    /// `tag` selects the member of a union. When it is `None` the member is
    /// taken from the discriminator property, then from the name of the
    /// object itself.
    pub fn encode_bb(
        &self,
        schema: &Schema,
        def_index: usize,
        bb: &mut ByteBufferMut,
        tag: Option<u8>,
    ) -> Result<(), CodecError> {
        let def = lookup(schema, def_index)?;

        if let Some(ref path) = def.serializer_path {
            return match schema.external(def.index) {
                Some(codec) => codec.encode(schema, self, bb),
                None => Err(missing_external(def, path)),
            };
        }

        match def.kind {
            DefKind::Enum => bb.write_var_uint(enum_value(def, self)?),

            DefKind::Smol => {
                let value = u8::try_from(enum_value(def, self)?).map_err(|_| CodecError::OutOfRange {
                    field:    def.name.clone(),
                    expected: "a byte",
                })?;
                bb.write_byte(value);
            }

            DefKind::Struct => {
                let fields = self.record_fields(def)?;
                for field in &def.fields {
                    match fields.get(&field.name) {
                        Some(value) => value.encode_record_field(schema, field, fields, bb)?,
                        None => return Err(missing_field(def, field)),
                    }
                }
            }

            DefKind::Message => {
                let fields = self.record_fields(def)?;
                // Loop over all fields to ensure consistent encoding order
                for field in &def.fields {
                    if field.is_deprecated {
                        continue;
                    }
                    match fields.get(&field.name) {
                        Some(value) => {
                            bb.write_byte(field_tag(field)?);
                            value.encode_record_field(schema, field, fields, bb)?;
                        }
                        None if field.is_required => return Err(missing_field(def, field)),
                        None => {}
                    }
                }
                bb.write_byte(0);
            }

            DefKind::Union => {
                let tag = match tag {
                    Some(tag) => tag,
                    None => {
                        let selector = def.discriminator.as_deref();
                        member_tag(
                            def,
                            selector.and_then(|name| self.get(name)),
                            self,
                            selector.unwrap_or(&def.name),
                        )?
                    }
                };
                let member = def
                    .field_by_value(tag.into())
                    .ok_or_else(|| CodecError::UnknownUnionTag {
                        definition: def.name.clone(),
                        tag: tag.into(),
                    })?;
                bb.write_byte(tag);
                self.encode_bb(schema, member_index(def, member)?, bb, None)?;
            }
        }

        Ok(())
    }

    /// Encodes this value as the contents of `field` to the end of `bb`.
    pub fn encode_field_bb(&self, schema: &Schema, field: &Field, bb: &mut ByteBufferMut) -> Result<(), CodecError> {
        let type_ = field_type(field)?;
        if !field.is_array {
            return self.encode_type(schema, type_, &field.name, bb);
        }

        let name = field.name.as_str();
        match type_ {
            FieldType::Primitive(Primitive::Byte) => match *self {
                Value::Bytes(ref bytes) => bb.write_byte_array(bytes),
                _ => bb.write_byte_array(&self.integers(name, "a byte")?),
            },
            FieldType::Primitive(Primitive::Int8) => bb.write_int8_array(&self.integers(name, "an int8")?),
            FieldType::Primitive(Primitive::Int16) => bb.write_int16_array(&self.integers(name, "an int16")?),
            FieldType::Primitive(Primitive::Uint16) => bb.write_uint16_array(&self.integers(name, "a uint16")?),
            FieldType::Primitive(Primitive::Int32) => bb.write_int32_array(&self.integers(name, "an int32")?),
            FieldType::Primitive(Primitive::Uint32) => bb.write_uint32_array(&self.integers(name, "a uint32")?),
            FieldType::Primitive(Primitive::Float32) => {
                let values = self
                    .elements(name)?
                    .iter()
                    .map(|value| value.to_float(name))
                    .collect::<Result<Vec<_>, _>>()?;
                bb.write_float32_array(&values);
            }
            _ => {
                let values = self.elements(name)?;
                bb.write_var_uint(values.len() as u32);
                for value in values {
                    value.encode_type(schema, type_, name, bb)?;
                }
            }
        }
        Ok(())
    }

    fn encode_record_field(
        &self,
        schema: &Schema,
        field: &Field,
        siblings: &HashMap<String, Value>,
        bb: &mut ByteBufferMut,
    ) -> Result<(), CodecError> {
        match plain_union(schema, field) {
            Some(union) => {
                let key = field.type_key();
                let tag = member_tag(union, siblings.get(&key), self, &key)?;
                self.encode_bb(schema, union.index, bb, Some(tag))
            }
            None => self.encode_field_bb(schema, field, bb),
        }
    }

    fn encode_type(
        &self,
        schema: &Schema,
        type_: FieldType,
        field: &str,
        bb: &mut ByteBufferMut,
    ) -> Result<(), CodecError> {
        let primitive = match type_ {
            FieldType::Primitive(primitive) => primitive,
            FieldType::Def(index) => return self.encode_bb(schema, index, bb, None),
        };

        match primitive {
            Primitive::Bool => bb.write_bool(self.to_bool(field)?),
            Primitive::Byte | Primitive::Uint8 => bb.write_byte(self.to_integer(field, "a byte")?),
            Primitive::Int8 => bb.write_int8(self.to_integer(field, "an int8")?),
            Primitive::Int16 => bb.write_int16(self.to_integer(field, "an int16")?),
            Primitive::Uint16 => bb.write_uint16(self.to_integer(field, "a uint16")?),
            Primitive::Int32 => bb.write_int32(self.to_integer(field, "an int32")?),
            Primitive::Uint32 => bb.write_uint32(self.to_integer(field, "a uint32")?),
            Primitive::Int => bb.write_var_int(self.to_integer(field, "an int")?),
            Primitive::Uint | Primitive::Discriminator => bb.write_var_uint(self.to_integer(field, "a uint")?),
            Primitive::Float => bb.write_var_float(self.to_float(field)?),
            Primitive::Float32 => bb.write_float32(self.to_float(field)?),
            Primitive::Lowp => bb.write_low_precision_float(self.to_float(field)?),
            Primitive::String => bb.write_string(self.to_str(field)?),
            Primitive::Alphanumeric => bb.write_alphanumeric(self.to_str(field)?)?,
        }
        Ok(())
    }

    fn record_fields(&self, def: &Def) -> Result<&HashMap<String, Value>, CodecError> {
        match *self {
            Value::Object(_, ref fields) => Ok(fields),
            _ => Err(CodecError::TypeMismatch {
                field:    def.name.clone(),
                expected: "an object",
            }),
        }
    }

    fn elements(&self, field: &str) -> Result<&[Value], CodecError> {
        match *self {
            Value::Array(ref values) => Ok(values),
            _ => Err(CodecError::TypeMismatch {
                field:    field.to_owned(),
                expected: "an array",
            }),
        }
    }

    fn integers<T: TryFrom<i64>>(&self, field: &str, expected: &'static str) -> Result<Vec<T>, CodecError> {
        self.elements(field)?
            .iter()
            .map(|value| value.to_integer(field, expected))
            .collect()
    }

    fn to_integer<T: TryFrom<i64>>(&self, field: &str, expected: &'static str) -> Result<T, CodecError> {
        let value = self.integer().ok_or_else(|| CodecError::TypeMismatch {
            field: field.to_owned(),
            expected,
        })?;
        T::try_from(value).map_err(|_| CodecError::OutOfRange {
            field: field.to_owned(),
            expected,
        })
    }

    fn to_bool(&self, field: &str) -> Result<bool, CodecError> {
        match *self {
            Value::Bool(value) => Ok(value),
            _ => self.integer().map(|value| value != 0).ok_or_else(|| CodecError::TypeMismatch {
                field:    field.to_owned(),
                expected: "a bool",
            }),
        }
    }

    fn to_float(&self, field: &str) -> Result<f32, CodecError> {
        match *self {
            Value::Float(value) => Ok(value),
            _ => self.integer().map(|value| value as f32).ok_or_else(|| CodecError::TypeMismatch {
                field:    field.to_owned(),
                expected: "a float",
            }),
        }
    }

    fn to_str(&self, field: &str) -> Result<&str, CodecError> {
        match *self {
            Value::String(ref value) => Ok(value),
            _ => Err(CodecError::TypeMismatch {
                field:    field.to_owned(),
                expected: "a string",
            }),
        }
    }
}

fn def_index(schema: &Schema, name: &str) -> Result<usize, CodecError> {
    schema
        .def_name_to_index
        .get(name)
        .copied()
        .ok_or_else(|| CodecError::UnknownDefinition(name.to_owned()))
}

fn lookup(schema: &Schema, index: usize) -> Result<&Def, CodecError> {
    schema
        .defs
        .get(index)
        .ok_or_else(|| CodecError::UnknownDefinition(format!("#{}", index)))
}

fn field_type(field: &Field) -> Result<FieldType, CodecError> {
    field.type_.ok_or_else(|| CodecError::InvalidDefinition {
        definition: field.name.clone(),
    })
}

fn member_index(def: &Def, member: &Field) -> Result<usize, CodecError> {
    match member.type_ {
        Some(FieldType::Def(index)) => Ok(index),
        _ => Err(CodecError::InvalidDefinition {
            definition: def.name.clone(),
        }),
    }
}

fn field_tag(field: &Field) -> Result<u8, CodecError> {
    u8::try_from(field.value).map_err(|_| CodecError::OutOfRange {
        field:    field.name.clone(),
        expected: "a one-byte tag",
    })
}

fn missing_field(def: &Def, field: &Field) -> CodecError {
    CodecError::MissingRequiredField {
        definition: def.name.clone(),
        field:      field.name.clone(),
    }
}

fn missing_external(def: &Def, path: &str) -> CodecError {
    CodecError::MissingExternalCodec {
        definition: def.name.clone(),
        path:       path.to_owned(),
    }
}

fn enum_member(def: &Def, value: u32) -> Result<Value, CodecError> {
    match def.field_by_value(value) {
        Some(field) => Ok(Value::Enum(def.name.clone(), field.name.clone())),
        None => Err(CodecError::InvalidEnumValue {
            definition: def.name.clone(),
            value:      value.to_string(),
        }),
    }
}

fn enum_value(def: &Def, value: &Value) -> Result<u32, CodecError> {
    def.table()
        .and_then(|table| table.resolve(value))
        .ok_or_else(|| CodecError::InvalidEnumValue {
            definition: def.name.clone(),
            value:      format!("{:?}", value),
        })
}

/// The union behind a non-array field whose union carries no discriminator.
/// Such fields keep their member tag in a `<field>Type` companion property.
fn plain_union<'a>(schema: &'a Schema, field: &Field) -> Option<&'a Def> {
    match field.type_ {
        Some(FieldType::Def(index)) if !field.is_array => {
            schema.defs.get(index).filter(|def| def.is_plain_union())
        }
        _ => None,
    }
}

fn member_tag(union: &Def, selector: Option<&Value>, value: &Value, field: &str) -> Result<u8, CodecError> {
    let table = union.table().ok_or_else(|| CodecError::InvalidDefinition {
        definition: union.name.clone(),
    })?;
    let by_selector = selector.and_then(|selector| table.resolve(selector));
    let by_name = match *value {
        Value::Object(ref name, _) => table.value_of(name),
        _ => None,
    };
    by_selector
        .or(by_name)
        .and_then(|tag| u8::try_from(tag).ok())
        .ok_or_else(|| CodecError::MissingUnionType {
            definition: union.name.clone(),
            field:      field.to_owned(),
        })
}

fn decode_record_field(
    schema: &Schema,
    field: &Field,
    bb: &mut ByteBuffer,
    fields: &mut HashMap<String, Value>,
) -> Result<(), CodecError> {
    let value = match plain_union(schema, field) {
        Some(union) => {
            let tag = bb.read_byte()?;
            if !field.is_deprecated {
                fields.insert(field.type_key(), Value::Byte(tag));
            }
            Value::decode_bb(schema, union.index, bb, Some(tag))?
        }
        None => Value::decode_field_bb(schema, field, bb)?,
    };
    // Deprecated fields are still consumed so older data stays readable.
    if !field.is_deprecated {
        fields.insert(field.name.clone(), value);
    }
    Ok(())
}

fn decode_type(schema: &Schema, type_: FieldType, bb: &mut ByteBuffer) -> Result<Value, CodecError> {
    let primitive = match type_ {
        FieldType::Primitive(primitive) => primitive,
        FieldType::Def(index) => return Value::decode_bb(schema, index, bb, None),
    };

    Ok(match primitive {
        Primitive::Bool => Value::Bool(bb.read_bool()?),
        Primitive::Byte | Primitive::Uint8 => Value::Byte(bb.read_byte()?),
        Primitive::Int8 => Value::Int8(bb.read_int8()?),
        Primitive::Int16 => Value::Int16(bb.read_int16()?),
        Primitive::Uint16 => Value::UInt16(bb.read_uint16()?),
        Primitive::Int32 => Value::Int32(bb.read_int32()?),
        Primitive::Uint32 => Value::UInt32(bb.read_uint32()?),
        Primitive::Int => Value::Int(bb.read_var_int()?),
        Primitive::Uint | Primitive::Discriminator => Value::UInt(bb.read_var_uint()?),
        Primitive::Float => Value::Float(bb.read_var_float()?),
        Primitive::Float32 => Value::Float(bb.read_float32()?),
        Primitive::Lowp => Value::Float(bb.read_low_precision_float()?),
        Primitive::String => Value::String(bb.read_string()?.into_owned()),
        Primitive::Alphanumeric => Value::String(bb.read_alphanumeric()?),
    })
}

impl Index<usize> for Value {
    type Output = Value;

    /// A convenience method that adds support for `self[index]` expressions.
    /// It will panic if this value isn't an [Array](#variant.Array) or if the
    /// provided index is out of bounds.
    fn index(&self, index: usize) -> &Value {
        match *self {
            Value::Array(ref values) => &values[index],
            _ => panic!("cannot index into a non-array value"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match *self {
            Value::Bool(value) => value.fmt(f),
            Value::Byte(value) => value.fmt(f),
            Value::Int8(value) => value.fmt(f),
            Value::Int16(value) => value.fmt(f),
            Value::Int32(value) | Value::Int(value) => value.fmt(f),
            Value::UInt16(value) => value.fmt(f),
            Value::UInt32(value) | Value::UInt(value) => value.fmt(f),
            Value::Float(value) => value.fmt(f),
            Value::String(ref value) => value.fmt(f),
            Value::Bytes(ref values) => values.fmt(f),
            Value::Array(ref values) => values.fmt(f),
            Value::Enum(ref name, ref value) => write!(f, "{}::{}", name, value),

            Value::Object(ref name, ref fields) => {
                let mut keys: Vec<_> = fields.keys().collect();
                let mut first = true;
                keys.sort();
                write!(f, "{} {{", name)?;

                for key in keys {
                    if first {
                        first = false;
                    } else {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {:?}", key, fields[key])?;
                }

                write!(f, "}}")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Value::Bool(value) => serializer.serialize_bool(value),
            Value::Byte(value) => serializer.serialize_u8(value),
            Value::Int8(value) => serializer.serialize_i8(value),
            Value::Int16(value) => serializer.serialize_i16(value),
            Value::Int32(value) | Value::Int(value) => serializer.serialize_i32(value),
            Value::UInt16(value) => serializer.serialize_u16(value),
            Value::UInt32(value) | Value::UInt(value) => serializer.serialize_u32(value),
            Value::Float(value) => serializer.serialize_f32(value),
            Value::String(ref value) => serializer.serialize_str(value),
            Value::Bytes(ref values) => serializer.collect_seq(values),
            Value::Array(ref values) => serializer.collect_seq(values),
            Value::Enum(_, ref value) => serializer.serialize_str(value),
            Value::Object(_, ref fields) => {
                let mut keys: Vec<_> = fields.keys().collect();
                keys.sort();
                let mut map = serializer.serialize_map(Some(keys.len()))?;
                for key in keys {
                    map.serialize_entry(key, &fields[key])?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Def, ExternalCodec};
    use std::sync::Arc;

    fn prim(primitive: Primitive) -> Option<FieldType> {
        Some(FieldType::Primitive(primitive))
    }

    fn def(index: usize) -> Option<FieldType> {
        Some(FieldType::Def(index))
    }

    fn test_schema() -> Schema {
        Schema::new(vec![
            Def::new(
                "Enum".to_owned(),
                DefKind::Enum,
                vec![Field::new("FOO", None, 100), Field::new("BAR", None, 200)],
            ),
            Def::new(
                "Size".to_owned(),
                DefKind::Smol,
                vec![Field::new("SMALL", None, 1), Field::new("LARGE", None, 2)],
            ),
            Def::new(
                "Point".to_owned(),
                DefKind::Struct,
                vec![
                    Field::new("x", prim(Primitive::Int32), 1).required(),
                    Field::new("y", prim(Primitive::Int32), 2).required(),
                ],
            ),
            Def::new(
                "Message".to_owned(),
                DefKind::Message,
                vec![
                    Field::new("v_bool", prim(Primitive::Bool), 1),
                    Field::new("v_uint", prim(Primitive::Uint), 2),
                    Field::new("v_string", prim(Primitive::String), 3),
                    Field::new("v_enum", def(0), 4),
                    Field::new("v_size", def(1), 5),
                    Field::new("v_point", def(2), 6),
                    Field::new("old", prim(Primitive::Float), 7).deprecated(),
                    Field::new("a_bytes", prim(Primitive::Byte), 8).array(),
                    Field::new("a_int16", prim(Primitive::Int16), 9).array(),
                    Field::new("a_points", def(2), 10).array(),
                    Field::new("v_lowp", prim(Primitive::Lowp), 11),
                ],
            ),
            Def::new(
                "Circle".to_owned(),
                DefKind::Struct,
                vec![Field::new("radius", prim(Primitive::Float), 1).required()],
            ),
            Def::new(
                "Square".to_owned(),
                DefKind::Struct,
                vec![Field::new("side", prim(Primitive::Float), 1).required()],
            ),
            Def::new(
                "Shape".to_owned(),
                DefKind::Union,
                vec![Field::new("Circle", def(4), 1), Field::new("Square", def(5), 2)],
            )
            .with_discriminator("kind"),
            Def::new(
                "Body".to_owned(),
                DefKind::Union,
                vec![Field::new("Circle", def(4), 1), Field::new("Square", def(5), 2)],
            ),
            Def::new(
                "Scene".to_owned(),
                DefKind::Message,
                vec![
                    Field::new("shape", def(6), 1),
                    Field::new("body", def(7), 2),
                    Field::new("bodies", def(7), 3).array(),
                    Field::new("name", prim(Primitive::Alphanumeric), 4).required(),
                ],
            ),
        ])
    }

    fn point(x: i32, y: i32) -> Value {
        Value::object("Point", [("x", Value::Int32(x)), ("y", Value::Int32(y))])
    }

    #[test]
    fn value_basic() {
        let value = Value::Array(vec![
            Value::Bool(true),
            Value::Byte(255),
            Value::Int(-1),
            Value::UInt(1),
            Value::Float(0.5),
            Value::String("abc".to_owned()),
            Value::Enum("Foo".to_owned(), "FOO".to_owned()),
            Value::object(
                "Obj",
                [
                    ("key1", Value::String("value1".to_owned())),
                    ("key2", Value::String("value2".to_owned())),
                ],
            ),
            Value::Bytes(vec![1, 2]),
        ]);

        assert_eq!(value.len(), 9);

        assert_eq!(value[0], Value::Bool(true));
        assert_eq!(value[1], Value::Byte(255));
        assert_eq!(value[2], Value::Int(-1));
        assert_eq!(value[3], Value::UInt(1));
        assert_eq!(value[4], Value::Float(0.5));
        assert_eq!(value[5], Value::String("abc".to_owned()));
        assert_eq!(value[6], Value::Enum("Foo".to_owned(), "FOO".to_owned()));

        assert!(value[0].as_bool());
        assert_eq!(value[1].as_byte(), 255);
        assert_eq!(value[1].as_uint(), 255);
        assert_eq!(value[2].as_int(), -1);
        assert_eq!(value[3].as_uint(), 1);
        assert_eq!(value[4].as_float(), 0.5);
        assert_eq!(value[5].as_string(), "abc");
        assert_eq!(value[6].as_string(), "FOO");
        assert_eq!(value[6].as_enum(), ("Foo", "FOO"));
        assert_eq!(value[8].as_bytes(), [1, 2]);
        assert_eq!(value.get("key1"), None);
        assert_eq!(value[7].get("key1"), Some(&Value::String("value1".to_owned())));

        assert_eq!(
            format!("{:?}", value),
            "[true, 255, -1, 1, 0.5, \"abc\", Foo::FOO, Obj {key1: \"value1\", key2: \"value2\"}, [1, 2]]"
        );
    }

    #[test]
    fn value_push() {
        let mut value = Value::Array(vec![]);
        assert!(value.is_empty());

        value.push(Value::Int(123));
        assert_eq!(value.len(), 1);
        assert_eq!(value[0], Value::Int(123));

        value.push(Value::Int(456));
        assert_eq!(value.len(), 2);
        assert_eq!(value[1], Value::Int(456));
    }

    #[test]
    fn value_set_and_remove() {
        let mut value = Value::Object("Foo".to_owned(), HashMap::new());
        assert_eq!(value.get("x"), None);

        value.set("x", Value::Int(123));
        value.set("y", Value::Int(456));
        assert_eq!(value.get("x"), Some(&Value::Int(123)));
        assert_eq!(value.get("y"), Some(&Value::Int(456)));

        value.set("x", Value::Int(789));
        assert_eq!(value.get("x"), Some(&Value::Int(789)));

        value.remove("x");
        assert_eq!(value.get("x"), None);
        assert_eq!(value.get("y"), Some(&Value::Int(456)));
    }

    #[test]
    fn enum_and_smol() {
        let schema = test_schema();

        assert_eq!(
            Value::decode(&schema, "Enum", &[100, 0, 0, 0]),
            Ok(Value::Enum("Enum".to_owned(), "FOO".to_owned()))
        );
        assert_eq!(
            Value::decode(&schema, "Enum", &[200, 0, 0, 0]),
            Ok(Value::Enum("Enum".to_owned(), "BAR".to_owned()))
        );
        assert_eq!(
            Value::decode(&schema, "Enum", &[0, 0, 0, 0]),
            Err(CodecError::InvalidEnumValue {
                definition: "Enum".to_owned(),
                value:      "0".to_owned(),
            })
        );
        assert_eq!(
            Value::Enum("Enum".to_owned(), "BAR".to_owned()).encode(&schema, "Enum"),
            Ok(vec![200, 0, 0, 0])
        );
        assert_eq!(Value::String("FOO".to_owned()).encode(&schema, "Enum"), Ok(vec![100, 0, 0, 0]));
        assert!(matches!(
            Value::String("BAZ".to_owned()).encode(&schema, "Enum"),
            Err(CodecError::InvalidEnumValue { .. })
        ));

        assert_eq!(
            Value::decode(&schema, "Size", &[2]),
            Ok(Value::Enum("Size".to_owned(), "LARGE".to_owned()))
        );
        assert_eq!(Value::String("SMALL".to_owned()).encode(&schema, "Size"), Ok(vec![1]));
    }

    #[test]
    fn struct_fields_are_required_and_ordered() {
        let schema = test_schema();
        let bytes = [3, 0, 0, 0, 252, 255, 255, 255];

        assert_eq!(point(3, -4).encode(&schema, "Point"), Ok(bytes.to_vec()));
        assert_eq!(Value::decode(&schema, "Point", &bytes), Ok(point(3, -4)));

        let loose = Value::object("Point", [("x", Value::Int(3)), ("y", Value::Byte(0))]);
        assert_eq!(loose.encode(&schema, "Point"), Ok(vec![3, 0, 0, 0, 0, 0, 0, 0]));

        let partial = Value::object("Point", [("x", Value::Int32(3))]);
        assert_eq!(
            partial.encode(&schema, "Point"),
            Err(CodecError::MissingRequiredField {
                definition: "Point".to_owned(),
                field:      "y".to_owned(),
            })
        );

        assert!(matches!(
            Value::decode(&schema, "Point", &bytes[..6]),
            Err(CodecError::IndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn message_fields_are_tagged() {
        let schema = test_schema();
        let message = Value::object(
            "Message",
            [("v_bool", Value::Bool(true)), ("v_string", Value::String("hi".to_owned()))],
        );

        assert_eq!(
            message.encode(&schema, "Message"),
            Ok(vec![1, 1, 3, 2, 0, 0, 0, 104, 105, 0])
        );
        assert_eq!(
            Value::decode(&schema, "Message", &[3, 2, 0, 0, 0, 104, 105, 1, 1, 0]),
            Ok(message)
        );
        assert_eq!(
            Value::decode(&schema, "Message", &[0]),
            Ok(Value::Object("Message".to_owned(), HashMap::new()))
        );
        assert_eq!(
            Value::decode(&schema, "Message", &[12, 0]),
            Err(CodecError::UnknownMessageTag {
                definition: "Message".to_owned(),
                tag:        12,
            })
        );
    }

    #[test]
    fn message_deprecated_fields() {
        let schema = test_schema();

        let old = Value::object("Message", [("old", Value::Float(1.0))]);
        assert_eq!(old.encode(&schema, "Message"), Ok(vec![0]));

        assert_eq!(
            Value::decode(&schema, "Message", &[7, 0, 1, 1, 0]),
            Ok(Value::object("Message", [("v_bool", Value::Bool(true))]))
        );
    }

    #[test]
    fn message_nested_and_array_fields() {
        let schema = test_schema();
        let message = Value::object(
            "Message",
            [
                ("v_enum", Value::Enum("Enum".to_owned(), "FOO".to_owned())),
                ("v_size", Value::Enum("Size".to_owned(), "LARGE".to_owned())),
                ("a_bytes", Value::Bytes(vec![1, 2])),
                ("a_int16", Value::Array(vec![Value::Int16(-2)])),
                ("a_points", Value::Array(vec![point(3, -4)])),
            ],
        );
        let bytes = vec![
            4, 100, 0, 0, 0, //
            5, 2, //
            8, 2, 0, 0, 0, 1, 2, //
            9, 2, 0, 0, 0, 254, 255, //
            10, 1, 0, 0, 0, 3, 0, 0, 0, 252, 255, 255, 255, //
            0,
        ];

        assert_eq!(message.encode(&schema, "Message"), Ok(bytes.clone()));
        assert_eq!(Value::decode(&schema, "Message", &bytes), Ok(message));

        assert_eq!(
            Value::decode(&schema, "Message", &[9, 3, 0, 0, 0, 1, 2, 3, 0]),
            Err(CodecError::InvalidArrayLength { len: 3, width: 2 })
        );
    }

    #[test]
    fn empty_struct_arrays_are_bounded_by_input() {
        let schema = Schema::new(vec![
            Def::new("Empty".to_owned(), DefKind::Struct, vec![]),
            Def::new(
                "Bag".to_owned(),
                DefKind::Message,
                vec![Field::new("items", def(0), 1).array()],
            ),
        ]);

        assert_eq!(
            Value::decode(&schema, "Bag", &[1, 255, 255, 255, 255, 0]),
            Err(CodecError::EmptyElementCount {
                count:     u32::MAX,
                remaining: 1,
            })
        );
        assert_eq!(
            Value::decode(&schema, "Bag", &[1, 0, 225, 245, 5, 0]),
            Err(CodecError::EmptyElementCount {
                count:     100_000_000,
                remaining: 1,
            })
        );

        let empty = Value::object("Empty", Vec::<(String, Value)>::new());
        assert_eq!(
            Value::decode(&schema, "Bag", &[1, 1, 0, 0, 0, 0]).unwrap(),
            Value::object("Bag", [("items", Value::Array(vec![empty]))])
        );
    }

    #[test]
    fn message_lowp_field() {
        let schema = test_schema();
        let message = Value::object("Message", [("v_lowp", Value::Float(1.2345))]);
        let bytes = message.encode(&schema, "Message").unwrap();
        assert_eq!(bytes, [11, 211, 4, 0, 0, 0]);

        let decoded = Value::decode(&schema, "Message", &bytes).unwrap();
        let v_lowp = decoded.get("v_lowp").unwrap().as_float();
        assert!((v_lowp - 1.235).abs() < 1e-6);
    }

    #[test]
    fn discriminated_union() {
        let schema = test_schema();
        let shape = schema.codec("Shape").unwrap();

        let square = Value::object("Square", [("side", Value::Float(2.0))]);
        assert_eq!(shape.encode_to_vec(&square), Ok(vec![2, 128, 0, 0, 0]));
        assert_eq!(
            shape.decode_from_slice(&[2, 128, 0, 0, 0]),
            Ok(Value::object("Square", [("side", Value::Float(2.0)), ("kind", Value::Byte(2))]))
        );

        // the discriminator property wins over the object's own name
        let tagged = Value::object("Shape", [("kind", Value::String("Circle".to_owned())), ("radius", Value::Float(0.0))]);
        assert_eq!(shape.encode_to_vec(&tagged), Ok(vec![1, 0]));

        assert_eq!(
            shape.decode_from_slice(&[3]),
            Err(CodecError::UnknownUnionTag {
                definition: "Shape".to_owned(),
                tag:        3,
            })
        );
        assert_eq!(
            shape.encode_to_vec(&Value::object("Shape", Vec::<(String, Value)>::new())),
            Err(CodecError::MissingUnionType {
                definition: "Shape".to_owned(),
                field:      "kind".to_owned(),
            })
        );
    }

    #[test]
    fn union_field_carries_its_type() {
        let schema = test_schema();
        let name = ("name", Value::String("s".to_owned()));

        let scene = Value::object(
            "Scene",
            [("body", Value::object("Circle", [("radius", Value::Float(0.0))])), name.clone()],
        );
        let bytes = vec![2, 1, 0, 4, 115, 0, 0];
        assert_eq!(scene.encode(&schema, "Scene"), Ok(bytes.clone()));

        let mut decoded = scene.clone();
        decoded.set("bodyType", Value::Byte(1));
        assert_eq!(Value::decode(&schema, "Scene", &bytes), Ok(decoded));

        let by_companion = Value::object(
            "Scene",
            [
                ("body", Value::object("Anything", [("side", Value::Float(0.0))])),
                ("bodyType", Value::UInt(2)),
                name.clone(),
            ],
        );
        assert_eq!(by_companion.encode(&schema, "Scene"), Ok(vec![2, 2, 0, 4, 115, 0, 0]));

        let untyped = Value::object("Scene", [("body", Value::object("Other", Vec::<(String, Value)>::new())), name]);
        assert_eq!(
            untyped.encode(&schema, "Scene"),
            Err(CodecError::MissingUnionType {
                definition: "Body".to_owned(),
                field:      "bodyType".to_owned(),
            })
        );
    }

    #[test]
    fn union_arrays_tag_each_element() {
        let schema = test_schema();
        let scene = Value::object(
            "Scene",
            [
                (
                    "bodies",
                    Value::Array(vec![Value::object("Circle", [("radius", Value::Float(0.0))])]),
                ),
                ("name", Value::String("".to_owned())),
            ],
        );
        let bytes = vec![3, 1, 0, 0, 0, 1, 0, 4, 0, 0];

        assert_eq!(scene.encode(&schema, "Scene"), Ok(bytes.clone()));
        assert_eq!(Value::decode(&schema, "Scene", &bytes), Ok(scene));
    }

    #[test]
    fn required_message_fields_and_alphanumerics() {
        let schema = test_schema();

        assert_eq!(
            Value::object("Scene", Vec::<(String, Value)>::new()).encode(&schema, "Scene"),
            Err(CodecError::MissingRequiredField {
                definition: "Scene".to_owned(),
                field:      "name".to_owned(),
            })
        );
        assert_eq!(
            Value::object("Scene", [("name", Value::String("caf\u{e9}".to_owned()))]).encode(&schema, "Scene"),
            Err(CodecError::NonAscii {
                index: 3,
                text:  "caf\u{e9}".to_owned(),
            })
        );
    }

    #[test]
    fn type_mismatches() {
        let schema = test_schema();

        assert_eq!(
            Value::object("Point", [("x", Value::String("3".to_owned())), ("y", Value::Int32(0))])
                .encode(&schema, "Point"),
            Err(CodecError::TypeMismatch {
                field:    "x".to_owned(),
                expected: "an int32",
            })
        );
        assert_eq!(
            Value::object("Message", [("v_uint", Value::Int(-1))]).encode(&schema, "Message"),
            Err(CodecError::OutOfRange {
                field:    "v_uint".to_owned(),
                expected: "a uint",
            })
        );
        assert_eq!(
            Value::Int(1).encode(&schema, "Point"),
            Err(CodecError::TypeMismatch {
                field:    "Point".to_owned(),
                expected: "an object",
            })
        );
        assert_eq!(
            Value::decode(&schema, "Missing", &[]),
            Err(CodecError::UnknownDefinition("Missing".to_owned()))
        );
    }

    #[test]
    fn external_codecs() {
        #[derive(Debug)]
        struct Raw;

        impl ExternalCodec for Raw {
            fn encode(&self, _: &Schema, value: &Value, bb: &mut ByteBufferMut) -> Result<(), CodecError> {
                bb.write_byte_array(value.as_bytes());
                Ok(())
            }

            fn decode(&self, _: &Schema, bb: &mut ByteBuffer) -> Result<Value, CodecError> {
                Ok(Value::Bytes(bb.read_byte_array()?.to_vec()))
            }
        }

        let mut defs = test_schema().defs;
        defs.push(Def::new("Blob".to_owned(), DefKind::Struct, vec![]).with_serializer_path("./blob"));
        let mut schema = Schema::new(defs);

        assert_eq!(
            Value::Bytes(vec![9]).encode(&schema, "Blob"),
            Err(CodecError::MissingExternalCodec {
                definition: "Blob".to_owned(),
                path:       "./blob".to_owned(),
            })
        );

        schema.link("Blob", Arc::new(Raw)).unwrap();
        assert_eq!(Value::Bytes(vec![9]).encode(&schema, "Blob"), Ok(vec![1, 0, 0, 0, 9]));
        assert_eq!(Value::decode(&schema, "Blob", &[1, 0, 0, 0, 9]), Ok(Value::Bytes(vec![9])));
    }

    #[test]
    fn serialize_to_json() {
        let value = Value::object(
            "Message",
            [
                ("point", point(3, -4)),
                ("size", Value::Enum("Size".to_owned(), "LARGE".to_owned())),
                ("bytes", Value::Bytes(vec![1, 2])),
                ("list", Value::Array(vec![Value::Bool(false), Value::Float(0.5)])),
            ],
        );

        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"bytes":[1,2],"list":[false,0.5],"point":{"x":3,"y":-4},"size":"LARGE"}"#
        );
    }
}
