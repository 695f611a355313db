use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub package:     Option<String>,
    pub definitions: Vec<Definition>,
}

impl Schema {
    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.definitions.iter().find(|def| def.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DefinitionKind {
    Enum,
    Smol,
    Struct,
    Message,
    Union,
    Alias,
    /// Only seen while parsing; picks are resolved into structs.
    Pick,
    /// Accepted by the parser but has no codec.
    Entity,
}

impl DefinitionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DefinitionKind::Enum => "ENUM",
            DefinitionKind::Smol => "SMOL",
            DefinitionKind::Struct => "STRUCT",
            DefinitionKind::Message => "MESSAGE",
            DefinitionKind::Union => "UNION",
            DefinitionKind::Alias => "ALIAS",
            DefinitionKind::Pick => "PICK",
            DefinitionKind::Entity => "ENTITY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name:          String,
    pub line:          usize,
    pub column:        usize,
    #[serde(rename = "type")]
    pub type_:         Option<String>,
    pub is_array:      bool,
    pub is_required:   bool,
    pub is_deprecated: bool,
    pub value:         i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    pub name:            String,
    pub line:            usize,
    pub column:          usize,
    pub kind:            DefinitionKind,
    pub fields:          Vec<Field>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extensions:      Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serializer_path: Option<String>,
}

impl Definition {
    /// The discriminator of a union: a leading field of type `discriminator`.
    pub fn discriminator(&self) -> Option<&Field> {
        match self.kind {
            DefinitionKind::Union => self
                .fields
                .first()
                .filter(|field| field.type_.as_deref() == Some("discriminator")),
            _ => None,
        }
    }

    /// The members of a union, without its discriminator.
    pub fn members(&self) -> &[Field] {
        match self.discriminator() {
            Some(_) => &self.fields[1..],
            None => &self.fields,
        }
    }
}
