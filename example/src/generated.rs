use peechy::traits::{optional, required, FromPeechy};
use peechy::{PeechyError, Value};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Type {
    #[serde(rename = "FLAT")]
    Flat,
    #[serde(rename = "ROUND")]
    Round,
    #[serde(rename = "POINTED")]
    Pointed,
}

impl FromPeechy for Type {
    fn from_peechy(value: &Value) -> Result<Self, PeechyError> {
        match value.as_string() {
            "FLAT" => Ok(Type::Flat),
            "ROUND" => Ok(Type::Round),
            "POINTED" => Ok(Type::Pointed),
            other => Err(PeechyError::InvalidEnumVariant(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl FromPeechy for Color {
    fn from_peechy(value: &Value) -> Result<Self, PeechyError> {
        Ok(Color {
            red: required(value, "red")?,
            green: required(value, "green")?,
            blue: required(value, "blue")?,
            alpha: required(value, "alpha")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Example {
    #[serde(rename = "clientID")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<u32>,
    #[serde(rename = "type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_: Option<Type>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<Color>>,
}

impl FromPeechy for Example {
    fn from_peechy(value: &Value) -> Result<Self, PeechyError> {
        Ok(Example {
            client_id: optional(value, "clientID")?,
            type_: optional(value, "type")?,
            colors: optional(value, "colors")?,
        })
    }
}
