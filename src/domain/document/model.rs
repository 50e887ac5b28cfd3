//! Generic document shape shared by every store backend

use serde_json::{Map, Value};

/// Field name → value mapping of a document
pub type Fields = Map<String, Value>;

/// A stored document: identifier plus its field values
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Merge `patch` into this document, overwriting existing keys
    pub fn merge(&mut self, patch: Fields) {
        for (key, value) in patch {
            self.fields.insert(key, value);
        }
    }

    /// Whether every condition of `filter` matches this document
    pub fn matches(&self, filter: &Filter) -> bool {
        filter
            .conditions()
            .iter()
            .all(|(field, expected)| self.fields.get(field) == Some(expected))
    }

    /// Fields plus the identifier under `$id`, ready for typed decoding
    pub fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert("$id".to_string(), Value::String(self.id.clone()));
        Value::Object(map)
    }
}

/// Identifier requested when creating a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentId {
    /// Let the store generate one
    Unique,
    /// Use this exact identifier
    Custom(String),
}

impl DocumentId {
    pub fn as_request(&self) -> &str {
        match self {
            Self::Unique => "unique()",
            Self::Custom(id) => id,
        }
    }
}

/// Conjunction of field equality conditions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::default().and_equal(field, value)
    }

    pub fn and_equal(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Document {
        let Value::Object(fields) = json!({"stationId": "st1", "status": "available"}) else {
            unreachable!()
        };
        Document::new("s1", fields)
    }

    #[test]
    fn filter_matches_all_conditions() {
        let d = doc();
        assert!(d.matches(&Filter::equal("stationId", "st1")));
        assert!(d.matches(&Filter::equal("stationId", "st1").and_equal("status", "available")));
        assert!(!d.matches(&Filter::equal("stationId", "st1").and_equal("status", "occupied")));
        assert!(d.matches(&Filter::default()));
    }

    #[test]
    fn merge_overwrites_fields() {
        let mut d = doc();
        let Value::Object(patch) = json!({"status": "occupied", "batteryStatus": "charging"}) else {
            unreachable!()
        };
        d.merge(patch);
        assert_eq!(d.get_str("status"), Some("occupied"));
        assert_eq!(d.get_str("batteryStatus"), Some("charging"));
        assert_eq!(d.get_str("stationId"), Some("st1"));
    }

    #[test]
    fn to_value_carries_id() {
        assert_eq!(doc().to_value()["$id"], json!("s1"));
    }
}
