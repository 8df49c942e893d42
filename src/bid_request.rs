//! Bid Requests
//!
//! The producer's create-bid form. Only the deadline and the duration in
//! weeks are required. The week count is not sent as typed; the payload
//! carries the shooting window derived from it instead.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::api::{HttpCollection, RemoteCollection, Transport};
use crate::context::Session;
use crate::domain::{ClientError, FieldMap, FieldValue, Record};
use crate::form::{FieldIssue, FormController, FormError};
use crate::notify::{Notice, NoticeKey, NotificationSink, Operation};
use crate::resources;

const DEADLINE: &str = "bidDeadline";
const WEEKS: &str = "estimatedDurationWeeks";

pub const REQUIRED_MESSAGE: &str = "Bid deadline and estimated duration are required.";
const LOADING: &str = "Creating bid...";
const SUCCESS: &str = "Bid created successfully!";
const FAILURE: &str = "Failed to create bid. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredRole {
    pub role: String,
    pub quantity: u32,
    pub requirements: String,
}

impl RequiredRole {
    pub fn new(role: &str, quantity: u32) -> Self {
        Self {
            role: role.to_string(),
            quantity,
            requirements: String::new(),
        }
    }

    pub fn requirements(mut self, text: &str) -> Self {
        self.requirements = text.to_string();
        self
    }
}

/// Shooting window that opens on the bid deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedDuration {
    pub weeks: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl EstimatedDuration {
    /// `None` when the end date falls outside the calendar
    pub fn from_deadline(deadline: NaiveDate, weeks: u32) -> Option<Self> {
        let end_date = deadline.checked_add_days(Days::new(u64::from(weeks) * 7))?;
        Some(Self {
            weeks,
            start_date: deadline,
            end_date,
        })
    }
}

fn invalid(field: &str, message: &str) -> FormError {
    FormError::Invalid(vec![FieldIssue {
        field: field.to_string(),
        message: message.to_string(),
    }])
}

/// Swap the typed week count for `estimatedDuration` and attach the roles
pub fn bid_payload(mut fields: FieldMap, roles: &[RequiredRole]) -> Result<FieldMap, FormError> {
    let weeks = match fields.remove(WEEKS) {
        Some(FieldValue::Integer(n)) if n > 0 => u32::try_from(n).ok(),
        _ => None,
    }
    .ok_or_else(|| invalid(WEEKS, "Estimated Duration (weeks) must be a positive whole number"))?;

    let deadline = fields
        .get(DEADLINE)
        .and_then(FieldValue::as_text)
        .and_then(|text| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok())
        .ok_or_else(|| invalid(DEADLINE, "Bid Deadline is required"))?;

    let duration = EstimatedDuration::from_deadline(deadline, weeks)
        .ok_or_else(|| invalid(WEEKS, "Estimated Duration (weeks) is out of range"))?;

    let duration = serde_json::to_value(duration).map_err(|e| ClientError::Decode(e.to_string()))?;
    let roles = serde_json::to_value(roles).map_err(|e| ClientError::Decode(e.to_string()))?;
    fields.insert("estimatedDuration".to_string(), FieldValue::Json(duration));
    fields.insert("requiredRoles".to_string(), FieldValue::Json(roles));
    Ok(fields)
}

/// Create-bid screen: draft, requested roles and the outcome toasts
pub struct BidRequestForm<T> {
    form: FormController,
    remote: HttpCollection<T>,
    sink: Arc<dyn NotificationSink>,
    roles: Mutex<Vec<RequiredRole>>,
    cancel: CancellationToken,
}

impl<T> BidRequestForm<T> {
    pub fn form(&self) -> &FormController {
        &self.form
    }

    fn lock_roles(&self) -> MutexGuard<'_, Vec<RequiredRole>> {
        self.roles.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_role(&self, role: RequiredRole) {
        self.lock_roles().push(role);
    }

    pub fn roles(&self) -> Vec<RequiredRole> {
        self.lock_roles().clone()
    }

    /// Abandon an in-flight submit; its outcome is not reported
    pub fn teardown(&self) {
        self.cancel.cancel();
    }
}

impl<T: Transport> BidRequestForm<T> {
    pub fn new(transport: T, session: Session, sink: Arc<dyn NotificationSink>) -> Self {
        let schema = Arc::new(resources::producer_bid());
        let remote = HttpCollection::for_schema(transport, session, &schema);
        Self {
            form: FormController::new(schema),
            remote,
            sink,
            roles: Mutex::new(Vec::new()),
            cancel: CancellationToken::new(),
        }
    }

    fn key(&self) -> NoticeKey {
        NoticeKey::new(&resources::producer_bid().key, Operation::Create)
    }

    /// Post the bid. A missing deadline or duration is reported without
    /// sending anything; on success the draft and roles are cleared.
    pub async fn submit(&self) -> Result<Option<Record>, FormError> {
        let key = self.key();
        let loading = key.clone();
        let roles = self.roles();
        let result = self
            .form
            .submit_with(|fields, _| async move {
                let payload = bid_payload(fields, &roles)?;
                self.sink.notify(Notice::loading(loading, LOADING));
                let cancel = self.cancel.child_token();
                let created = self.remote.create(&payload, &cancel).await?;
                Ok::<_, FormError>(created)
            })
            .await;

        match &result {
            Ok(_) => {
                log::info!("bid request created");
                self.lock_roles().clear();
                self.sink.notify(Notice::success(key, SUCCESS));
            }
            Err(FormError::Busy) => {}
            Err(FormError::Invalid(issues)) => {
                let message = if issues.iter().any(|i| i.field == DEADLINE || i.field == WEEKS) {
                    REQUIRED_MESSAGE.to_string()
                } else {
                    join_messages(issues)
                };
                self.sink.notify(Notice::error(key, message));
            }
            Err(FormError::Client(ClientError::Cancelled)) => self.sink.dismiss(&key),
            Err(err) => {
                log::warn!("bid request failed: {}", err);
                self.sink.notify(Notice::error(key, FAILURE));
            }
        }
        result
    }
}

fn join_messages(issues: &[FieldIssue]) -> String {
    issues.iter().map(|i| i.message.as_str()).collect::<Vec<_>>().join(", ")
}

impl<T> Drop for BidRequestForm<T> {
    fn drop(&mut self) {
        self.teardown();
    }
}
