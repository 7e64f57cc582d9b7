//! Narrow value type for node and edge property maps.
//!
//! Properties are string-keyed maps holding JSON-representable scalars and
//! collections. The dedicated variant type keeps stored records free of
//! free-form reflection while still round-tripping cleanly through JSON at
//! the API boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// String-keyed property map attached to nodes, edges, and chunks.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// A single property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    /// Interpret as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Interpret as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Interpret as a float. Integers widen losslessly enough for property use.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Interpret as a string slice.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret as a UUID stored in its canonical text form.
    pub fn as_uuid(&self) -> Option<Uuid> {
        self.as_text().and_then(|s| Uuid::parse_str(s).ok())
    }

    /// Interpret as a nested map.
    pub fn as_map(&self) -> Option<&BTreeMap<String, PropertyValue>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Convert a `serde_json::Value` into a property value.
    ///
    /// Numbers that fit i64 become `Int`; everything else numeric becomes `Float`.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    Self::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(fields) => Self::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert back into a `serde_json::Value` for API output.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(x) => {
                serde_json::Number::from_f64(*x).map_or(serde_json::Value::Null, serde_json::Value::Number)
            }
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Convert a whole JSON object into a property map. Non-objects yield an empty map.
pub fn map_from_json(value: serde_json::Value) -> PropertyMap {
    match PropertyValue::from_json(value) {
        PropertyValue::Map(m) => m,
        _ => PropertyMap::new(),
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<u32> for PropertyValue {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for PropertyValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<f32> for PropertyValue {
    fn from(x: f32) -> Self {
        Self::Float(f64::from(x))
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Uuid> for PropertyValue {
    fn from(id: Uuid) -> Self {
        Self::Text(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_variants() {
        assert_eq!(PropertyValue::from(true).as_bool(), Some(true));
        assert_eq!(PropertyValue::from(42i64).as_int(), Some(42));
        assert_eq!(PropertyValue::from(0.5f64).as_float(), Some(0.5));
        assert_eq!(PropertyValue::from("hi").as_text(), Some("hi"));
        assert_eq!(PropertyValue::Null.as_int(), None);
    }

    #[test]
    fn int_widens_to_float() {
        assert_eq!(PropertyValue::Int(3).as_float(), Some(3.0));
    }

    #[test]
    fn uuid_round_trips_through_text() {
        let id = Uuid::new_v4();
        let value = PropertyValue::from(id);
        assert_eq!(value.as_uuid(), Some(id));
        assert_eq!(PropertyValue::from("not a uuid").as_uuid(), None);
    }

    #[test]
    fn json_round_trip() {
        let json = serde_json::json!({
            "source": "crawler",
            "page": 3,
            "score": 0.91,
            "tags": ["a", "b"],
            "nested": {"ok": true}
        });
        let map = map_from_json(json.clone());
        assert_eq!(map.get("page").and_then(PropertyValue::as_int), Some(3));
        assert_eq!(
            map.get("nested")
                .and_then(PropertyValue::as_map)
                .and_then(|m| m.get("ok"))
                .and_then(PropertyValue::as_bool),
            Some(true)
        );

        let back = PropertyValue::Map(map).to_json();
        assert_eq!(back, json);
    }

    #[test]
    fn non_object_json_yields_empty_map() {
        assert!(map_from_json(serde_json::json!([1, 2, 3])).is_empty());
        assert!(map_from_json(serde_json::json!("text")).is_empty());
    }
}
