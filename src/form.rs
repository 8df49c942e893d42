//! Form Controller
//!
//! Holds one draft per form session, either a fresh create draft or an
//! edit draft seeded from an existing record. Inputs are kept as raw
//! strings and only converted to typed field values on submit.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use thiserror::Error;

use crate::api::RemoteCollection;
use crate::domain::{ClientError, FieldKind, FieldMap, FieldSpec, FieldValue, Record, RecordId, ResourceSchema};
use crate::store::CollectionStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(RecordId),
}

/// Why one input cannot be submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    fn new(spec: &FieldSpec, message: &str) -> Self {
        Self {
            field: spec.name.clone(),
            message: format!("{} {}", spec.label, message),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues.iter().map(|i| i.message.as_str()).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// A previous submit from this form has not resolved yet
    #[error("a submission is already in progress")]
    Busy,
    #[error("invalid input: {}", join_issues(.0))]
    Invalid(Vec<FieldIssue>),
    /// Edit requested for a record the backend never assigned an id to
    #[error("record has no identifier")]
    Unpersisted,
    #[error("record {0} is not in the collection")]
    Missing(RecordId),
    #[error(transparent)]
    Client(#[from] ClientError),
}

struct Draft {
    mode: FormMode,
    values: BTreeMap<String, String>,
}

/// Clears the busy flag when the submit finishes or is dropped
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct FormController {
    schema: Arc<ResourceSchema>,
    draft: Mutex<Draft>,
    busy: AtomicBool,
}

impl FormController {
    /// A form in create mode
    pub fn new(schema: Arc<ResourceSchema>) -> Self {
        let values = schema.empty_template();
        Self {
            schema,
            draft: Mutex::new(Draft { mode: FormMode::Create, values }),
            busy: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Draft> {
        self.draft.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn mode(&self) -> FormMode {
        self.lock().mode.clone()
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.lock().mode, FormMode::Edit(_))
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Raw input values
    pub fn values(&self) -> BTreeMap<String, String> {
        self.lock().values.clone()
    }

    pub fn value(&self, field: &str) -> String {
        self.lock().values.get(field).cloned().unwrap_or_default()
    }

    pub fn set_field(&self, field: &str, value: impl Into<String>) {
        self.lock().values.insert(field.to_string(), value.into());
    }

    /// Switch to edit mode, seeding the draft from `record`
    pub fn edit(&self, record: &Record) -> Result<(), FormError> {
        let id = record.id.clone().ok_or(FormError::Unpersisted)?;
        let values = self
            .schema
            .fields
            .iter()
            .map(|spec| (spec.name.clone(), record.text(&spec.name)))
            .collect();
        *self.lock() = Draft { mode: FormMode::Edit(id), values };
        Ok(())
    }

    /// Discard the draft and start a fresh create draft
    pub fn reset(&self) {
        *self.lock() = Draft {
            mode: FormMode::Create,
            values: self.schema.empty_template(),
        };
    }

    /// Check the draft without submitting
    pub fn validate(&self) -> Result<FieldMap, Vec<FieldIssue>> {
        let values = self.values();
        typed_fields(&self.schema, &values)
    }

    /// Send the draft through `store`.
    ///
    /// On success the form resets to a fresh create draft. On failure the
    /// draft is kept for another attempt.
    pub async fn submit<C: RemoteCollection>(&self, store: &CollectionStore<C>) -> Result<Option<Record>, FormError> {
        self.submit_with(|fields, mode| async move {
            let saved = match &mode {
                FormMode::Create => store.create(&fields).await?,
                FormMode::Edit(id) => store.update(id, &fields).await?,
            };
            Ok::<_, FormError>(saved)
        })
        .await
    }

    /// Validate the draft and hand the typed fields to `send`.
    ///
    /// Holds the busy flag until `send` resolves; nothing is sent when the
    /// draft is invalid. The form resets only when `send` succeeds.
    pub async fn submit_with<F, Fut>(&self, send: F) -> Result<Option<Record>, FormError>
    where
        F: FnOnce(FieldMap, FormMode) -> Fut,
        Fut: Future<Output = Result<Option<Record>, FormError>>,
    {
        if self.busy.swap(true, Ordering::SeqCst) {
            log::debug!("[{}] submit ignored, form busy", self.schema.key);
            return Err(FormError::Busy);
        }
        let _busy = BusyGuard(&self.busy);

        let (mode, values) = {
            let draft = self.lock();
            (draft.mode.clone(), draft.values.clone())
        };
        let fields = typed_fields(&self.schema, &values).map_err(FormError::Invalid)?;

        let saved = send(fields, mode).await?;
        self.reset();
        Ok(saved)
    }
}

fn is_email(text: &str) -> bool {
    match text.split_once('@') {
        Some((user, domain)) => {
            !user.is_empty() && domain.contains('.') && !domain.starts_with('.') && !text.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn parse_number(text: &str) -> Option<FieldValue> {
    if let Ok(n) = text.parse::<i64>() {
        return Some(FieldValue::Integer(n));
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite()).map(FieldValue::Float)
}

fn convert(spec: &FieldSpec, raw: &str) -> Result<FieldValue, FieldIssue> {
    let text = raw.trim();
    if text.is_empty() {
        if spec.required {
            return Err(FieldIssue::new(spec, "is required"));
        }
        return Ok(match spec.kind {
            FieldKind::Number => FieldValue::Null,
            FieldKind::List => FieldValue::List(Vec::new()),
            _ => FieldValue::Text(String::new()),
        });
    }

    match &spec.kind {
        FieldKind::Text => Ok(FieldValue::Text(text.to_string())),
        FieldKind::Number => parse_number(text).ok_or_else(|| FieldIssue::new(spec, "must be a number")),
        FieldKind::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(|_| FieldValue::Text(text.to_string()))
            .map_err(|_| FieldIssue::new(spec, "must be a date (YYYY-MM-DD)")),
        FieldKind::Email if is_email(text) => Ok(FieldValue::Text(text.to_string())),
        FieldKind::Email => Err(FieldIssue::new(spec, "must be an email address")),
        FieldKind::Choice(options) if options.iter().any(|o| o == text) => Ok(FieldValue::Text(text.to_string())),
        FieldKind::Choice(options) => Err(FieldIssue::new(spec, &format!("must be one of {}", options.join(", ")))),
        FieldKind::List => Ok(FieldValue::List(
            text.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        )),
    }
}

/// Convert raw inputs into the payload, collecting every problem
fn typed_fields(schema: &ResourceSchema, values: &BTreeMap<String, String>) -> Result<FieldMap, Vec<FieldIssue>> {
    let mut fields = FieldMap::new();
    let mut issues = Vec::new();

    for spec in &schema.fields {
        let raw = values.get(&spec.name).map(String::as_str).unwrap_or_default();
        match convert(spec, raw) {
            Ok(value) => {
                fields.insert(spec.name.clone(), value);
            }
            Err(issue) => issues.push(issue),
        }
    }
    // Inputs outside the schema go through as text
    for (name, raw) in values {
        if schema.field_spec(name).is_none() {
            fields.insert(name.clone(), FieldValue::Text(raw.clone()));
        }
    }

    if issues.is_empty() {
        Ok(fields)
    } else {
        Err(issues)
    }
}
