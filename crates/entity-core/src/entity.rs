//! The ordered, uniquely-keyed record every codec reads from and writes to.

use crate::value::{EntityValue, ValueKind};
use std::collections::HashMap;
use std::fmt;

/// Ordered collection of named values.
///
/// Names are unique. Insertion order is preserved and drives column order in
/// delimited output and trailing-field order in IDX output. Setting an existing
/// name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entity {
    properties: Vec<(String, EntityValue)>,
    index: HashMap<String, usize>,
}

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            properties: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Add a property with a builder pattern.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<EntityValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a property, returning the value it replaced.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl Into<EntityValue>,
    ) -> Option<EntityValue> {
        let name = name.into();
        let value = value.into();
        match self.index.get(&name) {
            Some(&position) => Some(std::mem::replace(&mut self.properties[position].1, value)),
            None => {
                self.index.insert(name.clone(), self.properties.len());
                self.properties.push((name, value));
                None
            }
        }
    }

    /// Get a property value by name.
    pub fn get(&self, name: &str) -> Option<&EntityValue> {
        self.index.get(name).map(|&position| &self.properties[position].1)
    }

    /// Get a property resolved to the requested kind.
    pub fn get_as(&self, name: &str, kind: &ValueKind) -> Option<EntityValue> {
        self.get(name).map(|value| value.best_value(kind))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Property names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(name, _)| name.as_str())
    }

    /// Properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityValue)> {
        self.properties
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for Entity
where
    K: Into<String>,
    V: Into<EntityValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut entity = Entity::new();
        for (name, value) in iter {
            entity.set(name, value);
        }
        entity
    }
}

impl IntoIterator for Entity {
    type Item = (String, EntityValue);
    type IntoIter = std::vec::IntoIter<(String, EntityValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.into_iter()
    }
}

/// Renders as `(Foo: "Hello" Bar: ["World", "Earth"])`.
impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, (name, value)) in self.properties.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_is_preserved() {
        let entity = Entity::new()
            .with_property("Zeta", 1)
            .with_property("Alpha", 2)
            .with_property("Mid", 3);

        assert_eq!(entity.names().collect::<Vec<_>>(), vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(entity.len(), 3);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut entity: Entity = [("Foo", "a"), ("Bar", "b")].into_iter().collect();
        let old = entity.set("Foo", "c");

        assert_eq!(old, Some(EntityValue::from("a")));
        assert_eq!(entity.names().collect::<Vec<_>>(), vec!["Foo", "Bar"]);
        assert_eq!(entity.get("Foo"), Some(&EntityValue::from("c")));
        assert_eq!(entity.len(), 2);
    }

    #[test]
    fn test_get_as() {
        let entity = Entity::new().with_property("Count", "12");
        assert_eq!(
            entity.get_as("Count", &ValueKind::Integer),
            Some(EntityValue::Integer(12))
        );
        assert_eq!(entity.get_as("Missing", &ValueKind::Integer), None);
        assert!(entity.contains("Count"));
        assert!(!entity.contains("count"));
    }

    #[test]
    fn test_display() {
        let entity = Entity::new()
            .with_property("Foo", "Hello")
            .with_property("Bar", vec!["World", "Earth"]);
        assert_eq!(entity.to_string(), "(Foo: \"Hello\" Bar: [\"World\", \"Earth\"])");

        let nested = Entity::new().with_property("Inner", entity).with_property("N", 1);
        assert_eq!(
            nested.to_string(),
            "(Inner: (Foo: \"Hello\" Bar: [\"World\", \"Earth\"]) N: 1)"
        );
        assert_eq!(Entity::new().to_string(), "()");
    }

    #[test]
    fn test_into_iter() {
        let entity = Entity::new().with_property("A", true);
        let pairs: Vec<_> = entity.into_iter().collect();
        assert_eq!(pairs, vec![("A".to_string(), EntityValue::Boolean(true))]);
    }
}
