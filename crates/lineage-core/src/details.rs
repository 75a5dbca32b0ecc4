//! Typed extension map carried by every entity
//!
//! Experiment code attaches values such as fitness or generation to entities
//! without new stored fields. Values keep their type, so a fitness written as
//! a float reads back as a float.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key under which agents store their fitness
pub const FITNESS: &str = "fitness";
/// Key under which generational networks store a node's generation
pub const GENERATION: &str = "generation";

/// A single typed detail value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// Named, typed key-value details of an entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Details(BTreeMap<String, Value>);

impl Details {
    /// Create an empty detail map
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a detail, returning the previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Get a detail of any type
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Remove a detail
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Read a float; integers widen
    pub fn float(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.0.get(key)? {
            Value::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_reads() {
        let mut details = Details::new();
        details.set(FITNESS, 2.5);
        details.set(GENERATION, 3i64);
        details.set("exploratory", true);
        details.set("label", "alpha");

        assert_eq!(details.float(FITNESS), Some(2.5));
        assert_eq!(details.int(GENERATION), Some(3));
        assert_eq!(details.float(GENERATION), Some(3.0));
        assert_eq!(details.bool("exploratory"), Some(true));
        assert_eq!(details.text("label"), Some("alpha"));

        // Wrong type reads as absent rather than being coerced
        assert_eq!(details.int(FITNESS), None);
        assert_eq!(details.bool("label"), None);
    }

    #[test]
    fn test_set_returns_previous() {
        let mut details = Details::new();
        assert!(details.set(FITNESS, 1.0).is_none());
        assert_eq!(details.set(FITNESS, 2.0), Some(Value::Float(1.0)));
        assert_eq!(details.len(), 1);
    }

    #[test]
    fn test_json_shape() {
        let mut details = Details::new();
        details.set(FITNESS, 0.5);
        details.set("exploratory", false);

        let json = serde_json::to_string(&details).unwrap();
        assert_eq!(json, r#"{"exploratory":false,"fitness":0.5}"#);

        let back: Details = serde_json::from_str(&json).unwrap();
        assert_eq!(back, details);
    }
}
