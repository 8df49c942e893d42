//! Filter/Search Reducer
//!
//! The visible list is a pure function of the loaded collection and the
//! current query. Nothing edits it directly.

use std::collections::BTreeMap;

use crate::domain::{Record, ResourceSchema, ALL_SENTINELS};

/// Search text, exact-match filters keyed by field, and the active tab
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub search: String,
    pub filters: BTreeMap<String, String>,
    pub tab: Option<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: &str) -> Self {
        self.search = text.to_string();
        self
    }

    pub fn filter(mut self, field: &str, value: &str) -> Self {
        self.filters.insert(field.to_string(), value.to_string());
        self
    }

    pub fn tab(mut self, name: &str) -> Self {
        self.tab = Some(name.to_string());
        self
    }

    pub fn set_search(&mut self, text: &str) {
        self.search = text.to_string();
    }

    pub fn set_filter(&mut self, field: &str, value: &str) {
        self.filters.insert(field.to_string(), value.to_string());
    }

    pub fn set_tab(&mut self, name: &str) {
        self.tab = Some(name.to_string());
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn is_all(schema: &ResourceSchema, field: &str, value: &str) -> bool {
    match schema.filter_spec(field) {
        Some(spec) => spec.is_all(value),
        None => value.is_empty() || ALL_SENTINELS.contains(&value),
    }
}

fn matches_search(record: &Record, schema: &ResourceSchema, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let hit = |text: String| text.to_lowercase().contains(needle);
    if schema.search_fields.is_empty() {
        record.fields.values().any(|v| hit(v.display_text()))
    } else {
        schema.search_fields.iter().any(|f| hit(record.text(f)))
    }
}

fn matches_filters(record: &Record, schema: &ResourceSchema, query: &Query) -> bool {
    query.filters.iter().all(|(field, value)| {
        is_all(schema, field, value) || record.get(field).map_or(false, |v| v.display_text() == *value)
    })
}

/// Unknown tabs and tabs without a predicate show everything
fn matches_tab(record: &Record, schema: &ResourceSchema, query: &Query) -> bool {
    let Some(tab) = query.tab.as_deref().and_then(|name| schema.tab_spec(name)) else {
        return true;
    };
    match &tab.predicate {
        Some((field, value)) => record.get(field).map_or(false, |v| v.display_text() == *value),
        None => true,
    }
}

fn matches_all(record: &Record, schema: &ResourceSchema, query: &Query, needle: &str) -> bool {
    matches_search(record, schema, needle) && matches_filters(record, schema, query) && matches_tab(record, schema, query)
}

/// Does `record` satisfy every predicate of `query`?
///
/// The search text is matched as typed, ignoring case only; just the empty
/// string matches everything.
pub fn matches(record: &Record, schema: &ResourceSchema, query: &Query) -> bool {
    matches_all(record, schema, query, &query.search.to_lowercase())
}

/// Ordered subsequence of `records` matching `query`
pub fn visible(records: &[Record], schema: &ResourceSchema, query: &Query) -> Vec<Record> {
    let needle = query.search.to_lowercase();
    records
        .iter()
        .filter(|record| matches_all(record, schema, query, &needle))
        .cloned()
        .collect()
}
