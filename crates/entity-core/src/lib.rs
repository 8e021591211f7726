//! Entity value model for structured-data conversions.
//!
//! This crate provides the types every codec in the workspace shares:
//!
//! - [`Entity`] - Ordered record of named values
//! - [`EntityValue`] - Closed set of value shapes a property may hold
//! - [`ValueKind`] - Scalar kinds for best-value resolution of textual input
//! - [`ConversionError`] - Error taxonomy reported by every conversion
//!
//! # Architecture
//!
//! ```text
//! entity-core (this crate)
//!    │
//!    ├─── delimited-text  (CSV / Concordance reader and writer)
//!    ├─── dre-idx         (IDX/DRE serializer)
//!    └─── json-types      (JSON array <-> entities)
//! ```
//!
//! # Example
//!
//! ```rust
//! use entity_core::{Entity, EntityValue, ValueKind};
//!
//! let entity = Entity::new()
//!     .with_property("Foo", "Hello")
//!     .with_property("Count", "42");
//!
//! assert_eq!(entity.get_as("Count", &ValueKind::Integer), Some(EntityValue::Integer(42)));
//! assert_eq!(entity.to_string(), "(Foo: \"Hello\" Count: \"42\")");
//! ```

pub mod entity;
pub mod error;
pub mod value;

pub use entity::Entity;
pub use error::{ConversionError, ErrorCode, Result};
pub use value::{parse_datetime_string, EntityValue, ValueKind};
