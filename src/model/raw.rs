// src/model/raw.rs
//! The upstream wire format.
//!
//! ALM's REST interface wraps every entity in a `Fields` array of
//! name/values pairs:
//!
//! ```json
//! {
//!   "entities": [
//!     {
//!       "Type": "test",
//!       "Fields": [
//!         {"Name": "id", "values": [{"value": "1001"}]},
//!         {"Name": "name", "values": [{"value": "Login Test"}]}
//!       ]
//!     }
//!   ],
//!   "TotalResults": 1
//! }
//! ```
//!
//! `TotalResults` is documented as unreliable under combined filters, so
//! nothing here exposes it for pagination decisions; completion is judged
//! from observed page size alone.

use serde::Deserialize;
use serde_json::Value;

/// One cell of a field's `values` array.
#[derive(Debug, Clone, Deserialize)]
pub struct RawValue {
    #[serde(default)]
    pub value: Option<Value>,
}

/// A single named field on an upstream entity.
#[derive(Debug, Clone, Deserialize)]
pub struct RawField {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(default)]
    pub values: Vec<RawValue>,
}

/// One entity exactly as the upstream returned it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntity {
    #[serde(rename = "Type", default)]
    pub entity_type: Option<String>,
    #[serde(rename = "Fields", default)]
    pub fields: Vec<RawField>,
}

impl RawEntity {
    /// Builds a raw entity from (name, value) pairs. Used by fixtures and
    /// anywhere a synthetic upstream record is needed.
    pub fn from_pairs<I, K>(entity_type: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            entity_type: Some(entity_type.to_string()),
            fields: pairs
                .into_iter()
                .map(|(name, value)| RawField {
                    name: name.into(),
                    values: vec![RawValue { value: Some(value) }],
                })
                .collect(),
        }
    }

    /// First value of the named field, if present and non-null.
    pub fn field_value(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.values.first())
            .and_then(|v| v.value.as_ref())
            .filter(|v| !v.is_null())
    }

    /// First value of the named field rendered as a string. Numeric ids
    /// arrive as JSON numbers from some server versions; both spellings
    /// must compare equal.
    pub fn field_str(&self, name: &str) -> Option<String> {
        self.field_value(name).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// One page of an `entities`-format list response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityPage {
    #[serde(default)]
    pub entities: Vec<RawEntity>,
    #[serde(rename = "TotalResults", default)]
    pub total_results: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_documented_wire_shape() {
        let page: EntityPage = serde_json::from_value(json!({
            "entities": [{
                "Type": "test",
                "Fields": [
                    {"Name": "id", "values": [{"value": "1001"}]},
                    {"Name": "name", "values": [{"value": "Login Test"}]},
                    {"Name": "description", "values": []}
                ]
            }],
            "TotalResults": 1
        }))
        .unwrap();

        assert_eq!(page.entities.len(), 1);
        let entity = &page.entities[0];
        assert_eq!(entity.field_str("id").as_deref(), Some("1001"));
        assert_eq!(entity.field_str("name").as_deref(), Some("Login Test"));
        assert_eq!(entity.field_value("description"), None);
        assert_eq!(entity.field_value("missing"), None);
    }

    #[test]
    fn numeric_ids_stringify() {
        let entity = RawEntity::from_pairs("test", [("id", serde_json::json!(1001))]);
        assert_eq!(entity.field_str("id").as_deref(), Some("1001"));
    }

    #[test]
    fn empty_page_deserializes() {
        let page: EntityPage = serde_json::from_str("{}").unwrap();
        assert!(page.entities.is_empty());
        assert_eq!(page.total_results, 0);
    }
}
