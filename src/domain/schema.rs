//! Resource Schema
//!
//! Describes one resource screen: where it lives on the backend, which
//! fields its form edits, which fields search looks at and which fields
//! can be filtered. One schema per resource replaces a hand-written screen
//! per resource.

use std::collections::BTreeMap;

/// Input constraint of a form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    /// `YYYY-MM-DD`
    Date,
    Email,
    Choice(Vec<String>),
    /// Comma separated input, sent as a list of strings
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<String>,
}

impl FieldSpec {
    fn with_kind(name: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            required: false,
            default: None,
        }
    }

    pub fn text(name: &str, label: &str) -> Self {
        Self::with_kind(name, label, FieldKind::Text)
    }

    pub fn number(name: &str, label: &str) -> Self {
        Self::with_kind(name, label, FieldKind::Number)
    }

    pub fn date(name: &str, label: &str) -> Self {
        Self::with_kind(name, label, FieldKind::Date)
    }

    pub fn email(name: &str, label: &str) -> Self {
        Self::with_kind(name, label, FieldKind::Email)
    }

    pub fn choice(name: &str, label: &str, options: &[&str]) -> Self {
        let options = options.iter().map(|o| o.to_string()).collect();
        Self::with_kind(name, label, FieldKind::Choice(options))
    }

    pub fn list(name: &str, label: &str) -> Self {
        Self::with_kind(name, label, FieldKind::List)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: &str) -> Self {
        self.default = Some(value.to_string());
        self
    }
}

/// Sentinels that disable a filter
pub const ALL_SENTINELS: [&str; 2] = ["All", "all"];

/// Exact-match filter offered on a screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub field: String,
    /// Value shown for "no filter"
    pub all: String,
    pub options: Vec<String>,
}

impl FilterSpec {
    pub fn new(field: &str, all: &str, options: &[&str]) -> Self {
        Self {
            field: field.to_string(),
            all: all.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    /// Does `value` mean "match everything"?
    pub fn is_all(&self, value: &str) -> bool {
        value.is_empty() || value == self.all || ALL_SENTINELS.contains(&value)
    }
}

/// Named view tab; its predicate ANDs with search and filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSpec {
    pub name: String,
    /// `(field, value)` a record must carry, `None` for "show everything"
    pub predicate: Option<(String, String)>,
}

impl TabSpec {
    pub fn all(name: &str) -> Self {
        Self {
            name: name.to_string(),
            predicate: None,
        }
    }

    pub fn only(name: &str, field: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            predicate: Some((field.to_string(), value.to_string())),
        }
    }
}

/// Configuration of one resource collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSchema {
    /// Short name used in notification keys and logs
    pub key: String,
    /// Collection path on the backend, e.g. `/team`
    pub endpoint: String,
    /// In-app path of the screen
    pub route: String,
    pub singular: String,
    pub plural: String,
    pub fields: Vec<FieldSpec>,
    pub search_fields: Vec<String>,
    pub filters: Vec<FilterSpec>,
    pub tabs: Vec<TabSpec>,
}

impl ResourceSchema {
    pub fn new(key: &str, endpoint: &str, route: &str) -> Self {
        Self {
            key: key.to_string(),
            endpoint: endpoint.to_string(),
            route: route.to_string(),
            singular: key.to_string(),
            plural: key.to_string(),
            fields: Vec::new(),
            search_fields: Vec::new(),
            filters: Vec::new(),
            tabs: Vec::new(),
        }
    }

    pub fn labels(mut self, singular: &str, plural: &str) -> Self {
        self.singular = singular.to_string();
        self.plural = plural.to_string();
        self
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn search(mut self, fields: &[&str]) -> Self {
        self.search_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn filter(mut self, spec: FilterSpec) -> Self {
        self.filters.push(spec);
        self
    }

    pub fn tab(mut self, spec: TabSpec) -> Self {
        self.tabs.push(spec);
        self
    }

    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn filter_spec(&self, field: &str) -> Option<&FilterSpec> {
        self.filters.iter().find(|f| f.field == field)
    }

    pub fn tab_spec(&self, name: &str) -> Option<&TabSpec> {
        self.tabs.iter().find(|t| t.name == name)
    }

    /// Names of required fields, in form order
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter(|f| f.required).map(|f| f.name.as_str())
    }

    /// Raw input values a fresh create form starts from
    pub fn empty_template(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.default.clone().unwrap_or_default()))
            .collect()
    }
}
