//! Runtime support for the Peechy serialization format: the little-endian
//! wire primitives, a lowered schema, and a dynamic [`Value`] that can be
//! encoded and decoded against it.
//!
//! ```
//! use peechy_schema::*;
//!
//! let int32 = Some(FieldType::Primitive(Primitive::Int32));
//! let schema = Schema::new(vec![
//!     Def::new("Point".to_owned(), DefKind::Struct, vec![
//!         Field::new("x", int32, 1).required(),
//!         Field::new("y", int32, 2).required(),
//!     ]),
//! ]);
//!
//! let bytes = [3, 0, 0, 0, 252, 255, 255, 255];
//! let value = Value::decode(&schema, "Point", &bytes).unwrap();
//! assert_eq!(format!("{:?}", value), "Point {x: 3, y: -4}");
//! assert_eq!(value.encode(&schema, "Point").unwrap(), bytes);
//! ```

pub mod bb;
pub mod error;
pub mod schema;
pub mod value;

pub use bb::*;
pub use error::*;
pub use schema::*;
pub use value::*;
