//! Record Entity
//!
//! A backend record is one flat JSON object: an `id` key plus named fields.
//! Relationships between resources are plain field values (a team member's
//! `project` names a project); nothing checks them client-side.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::entity::Entity;

/// Identifier assigned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Num(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Num(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Num(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId::Text(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        RecordId::Text(id)
    }
}

/// Value of a single field
///
/// Variant order matters for untagged decoding: integers are tried before
/// floats, and anything structured falls through to `Json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
    Json(serde_json::Value),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(n) => Some(*n as f64),
            FieldValue::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Plain-text rendering used for search, filters and form inputs
    pub fn display_text(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Integer(n) => n.to_string(),
            FieldValue::Float(n) => n.to_string(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(", "),
            FieldValue::Json(v) => v.to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Float(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

/// Field name to value
pub type FieldMap = BTreeMap<String, FieldValue>;

/// One entry of a remote collection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(flatten)]
    pub fields: FieldMap,
}

impl Record {
    /// A persisted record
    pub fn new(id: impl Into<RecordId>, fields: FieldMap) -> Self {
        Self {
            id: Some(id.into()),
            fields,
        }
    }

    /// An unpersisted record
    pub fn draft(fields: FieldMap) -> Self {
        Self { id: None, fields }
    }

    /// Builder-style field setter
    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Display text of a field, empty when absent
    pub fn text(&self, field: &str) -> String {
        self.get(field).map(FieldValue::display_text).unwrap_or_default()
    }
}

impl Entity for Record {
    type Id = RecordId;

    fn id(&self) -> Option<&Self::Id> {
        self.id.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_decodes_flat_object() {
        let record: Record = serde_json::from_value(json!({
            "id": 1,
            "title": "Neon Nights",
            "budget": 4000000,
            "rating": 4.8,
            "tasks": ["Storyboard", "Casting"]
        }))
        .unwrap();

        assert_eq!(record.id, Some(RecordId::Num(1)));
        assert_eq!(record.get("title"), Some(&FieldValue::Text("Neon Nights".into())));
        assert_eq!(record.get("budget"), Some(&FieldValue::Integer(4_000_000)));
        assert_eq!(record.get("rating"), Some(&FieldValue::Float(4.8)));
        assert_eq!(record.text("tasks"), "Storyboard, Casting");
        assert!(!record.fields.contains_key("id"));
    }

    #[test]
    fn test_string_ids_and_nested_values() {
        let record: Record = serde_json::from_value(json!({
            "id": "64f0c2",
            "estimatedDuration": { "weeks": 6 },
            "note": null
        }))
        .unwrap();

        assert_eq!(record.id, Some(RecordId::Text("64f0c2".into())));
        assert!(matches!(record.get("estimatedDuration"), Some(FieldValue::Json(_))));
        assert_eq!(record.get("note"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_draft_has_no_id_on_the_wire() {
        let draft = Record::draft(FieldMap::new()).with("title", "Echoes");
        assert!(draft.is_draft());

        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value, json!({ "title": "Echoes" }));
    }

    #[test]
    fn test_has_id() {
        let record = Record::new(2, FieldMap::new());
        assert!(record.has_id(&RecordId::Num(2)));
        assert!(!record.has_id(&RecordId::Text("2".into())));
        assert_eq!(RecordId::Num(2).to_string(), "2");
    }
}
