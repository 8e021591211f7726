//! Reverse conversion: JSON text → Entity.

use entity_core::{ConversionError, Entity, EntityValue, Result};
use serde_json::{Map, Value};
use tracing::debug;

/// Parse a JSON array of objects into entities.
///
/// Invalid JSON or a top level other than an array is a `ParseFailure`; an
/// array element that is not an object is an `UnsupportedShape`.
pub fn entities_from_json_array(text: &str) -> Result<Vec<Entity>> {
    let value: Value = serde_json::from_str(text).map_err(|e| ConversionError::ParseFailure {
        line: e.line(),
        reason: format!("invalid JSON: {e}"),
    })?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(ConversionError::parse(
                1,
                format!("expected a JSON array, found {}", json_shape(&other)),
            ))
        }
    };

    let entities = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(obj) => Ok(entity_from_json_object(obj)),
            other => Err(ConversionError::UnsupportedShape {
                field: format!("[{i}]"),
                shape: json_shape(&other),
                target: "an entity",
            }),
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("Parsed {} entities from JSON", entities.len());
    Ok(entities)
}

/// Convert a JSON object into an entity, keeping key order.
pub fn entity_from_json_object(obj: Map<String, Value>) -> Entity {
    obj.into_iter()
        .map(|(key, value)| (key, json_to_entity_value(value)))
        .collect()
}

/// Convert any JSON value into the matching [`EntityValue`].
pub fn json_to_entity_value(value: Value) -> EntityValue {
    match value {
        Value::Null => EntityValue::Null,
        Value::Bool(b) => EntityValue::Boolean(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => EntityValue::Integer(i),
            // u64 beyond i64::MAX and fractional numbers
            None => EntityValue::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => EntityValue::String(s),
        Value::Array(items) => {
            EntityValue::NestedList(items.into_iter().map(json_to_entity_value).collect())
        }
        Value::Object(obj) => EntityValue::NestedEntity(entity_from_json_object(obj)),
    }
}

fn json_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
