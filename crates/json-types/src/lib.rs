//! JSON conversions for entities.
//!
//! # Modules
//!
//! - [`forward`] - Entity → JSON value conversion
//! - [`reverse`] - JSON text → Entity conversion
//!
//! # Example
//!
//! ```
//! use json_types::{entities_from_json_array, entity_to_json};
//!
//! let entities = entities_from_json_array(r#"[{"Foo": "Hello", "Bar": [1, 2]}]"#).unwrap();
//! assert_eq!(entities[0].to_string(), r#"(Foo: "Hello" Bar: [1, 2])"#);
//!
//! let json = entity_to_json(&entities[0], false).unwrap();
//! assert_eq!(json, r#"{"Foo":"Hello","Bar":[1,2]}"#);
//! ```

pub mod forward;
pub mod reverse;

pub use forward::{entities_to_json, entity_to_json, entity_to_json_value, JsonValue};
pub use reverse::{entities_from_json_array, entity_from_json_object, json_to_entity_value};
