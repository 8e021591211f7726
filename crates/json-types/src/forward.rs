//! Forward conversion: Entity → JSON.

use entity_core::{ConversionError, Entity, EntityValue, Result};
use serde_json::{json, Map, Value};

/// Wrapper for JSON values converted from [`EntityValue`].
#[derive(Debug, Clone, PartialEq)]
pub struct JsonValue(pub Value);

impl JsonValue {
    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl From<&EntityValue> for JsonValue {
    fn from(value: &EntityValue) -> Self {
        match value {
            EntityValue::Null => JsonValue(Value::Null),
            EntityValue::String(s) => JsonValue(json!(s)),
            EntityValue::Integer(i) => JsonValue(json!(i)),
            // NaN and infinities have no JSON representation
            EntityValue::Double(d) => JsonValue(
                serde_json::Number::from_f64(*d)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
            ),
            EntityValue::Boolean(b) => JsonValue(json!(b)),
            EntityValue::Enumeration { value, .. } => JsonValue(json!(value)),
            EntityValue::DateTime(dt) => JsonValue(json!(dt.to_rfc3339())),
            EntityValue::NestedEntity(entity) => JsonValue(entity_to_json_value(entity)),
            EntityValue::NestedList(items) => JsonValue(Value::Array(
                items.iter().map(|v| JsonValue::from(v).into_inner()).collect(),
            )),
        }
    }
}

impl From<EntityValue> for JsonValue {
    fn from(value: EntityValue) -> Self {
        JsonValue::from(&value)
    }
}

/// Convert an entity to a JSON object, keeping property order.
pub fn entity_to_json_value(entity: &Entity) -> Value {
    let mut obj = Map::with_capacity(entity.len());
    for (name, value) in entity.iter() {
        obj.insert(name.to_string(), JsonValue::from(value).into_inner());
    }
    Value::Object(obj)
}

/// Serialize one entity as a JSON object.
pub fn entity_to_json(entity: &Entity, pretty: bool) -> Result<String> {
    render(&entity_to_json_value(entity), pretty)
}

/// Serialize entities as a JSON array of objects.
pub fn entities_to_json(entities: &[Entity], pretty: bool) -> Result<String> {
    let array = Value::Array(entities.iter().map(entity_to_json_value).collect());
    render(&array, pretty)
}

fn render(value: &Value, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    rendered.map_err(|e| ConversionError::EncodingFailure {
        encoding: "json",
        reason: e.to_string(),
    })
}
