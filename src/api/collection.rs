//! Remote Collection Client
//!
//! CRUD over one REST collection:
//! `GET /{resource}`, `POST /{resource}`, `PUT /{resource}/{id}`,
//! `DELETE /{resource}/{id}`, each carrying the session's bearer credential.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tokio_util::sync::CancellationToken;

use super::transport::{ApiRequest, ApiResponse, Transport};
use crate::context::Session;
use crate::domain::{ClientError, ClientResult, FieldMap, Record, RecordId, ResourceSchema};

/// Characters left alone in an id path segment
const ID_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Core trait for a remote collection
///
/// No retries and no deduplication: every failure ends that attempt.
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    /// Full current collection
    async fn list(&self, cancel: &CancellationToken) -> ClientResult<Vec<Record>>;

    /// Create a record; the backend assigns the identifier.
    /// Returns the created record when the backend echoes it.
    async fn create(&self, draft: &FieldMap, cancel: &CancellationToken) -> ClientResult<Option<Record>>;

    async fn update(&self, id: &RecordId, draft: &FieldMap, cancel: &CancellationToken) -> ClientResult<Option<Record>>;

    async fn remove(&self, id: &RecordId, cancel: &CancellationToken) -> ClientResult<()>;
}

pub struct HttpCollection<T> {
    transport: T,
    session: Session,
    endpoint: String,
}

impl<T: Transport> HttpCollection<T> {
    pub fn new(transport: T, session: Session, endpoint: &str) -> Self {
        Self {
            transport,
            session,
            endpoint: format!("/{}", endpoint.trim_matches('/')),
        }
    }

    pub fn for_schema(transport: T, session: Session, schema: &ResourceSchema) -> Self {
        Self::new(transport, session, &schema.endpoint)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn item_path(&self, id: &RecordId) -> String {
        format!("{}/{}", self.endpoint, utf8_percent_encode(&id.to_string(), ID_SEGMENT))
    }

    /// Attach the credential, send, and fail on non-2xx
    async fn exchange(&self, request: ApiRequest, cancel: &CancellationToken) -> ClientResult<ApiResponse> {
        let token = self
            .session
            .credential()
            .ok_or_else(|| ClientError::Auth("not signed in".to_string()))?;
        let method = request.method;
        let path = request.path.clone();

        let response = self.transport.send(request.with_bearer(token), cancel).await?;
        if !response.is_success() {
            log::warn!("{} {} -> {}", method.as_str(), path, response.status);
        }
        response.into_result()
    }
}

fn draft_body(draft: &FieldMap) -> ClientResult<serde_json::Value> {
    serde_json::to_value(draft).map_err(|e| ClientError::Decode(e.to_string()))
}

/// The created/updated record when the body holds one
fn echoed_record(response: &ApiResponse) -> Option<Record> {
    if response.body.trim().is_empty() {
        return None;
    }
    response.json::<Record>().ok().filter(|record| record.id.is_some())
}

#[async_trait]
impl<T: Transport> RemoteCollection for HttpCollection<T> {
    async fn list(&self, cancel: &CancellationToken) -> ClientResult<Vec<Record>> {
        let response = self.exchange(ApiRequest::get(self.endpoint.clone()), cancel).await?;
        response.json()
    }

    async fn create(&self, draft: &FieldMap, cancel: &CancellationToken) -> ClientResult<Option<Record>> {
        let request = ApiRequest::post(self.endpoint.clone(), draft_body(draft)?);
        let response = self.exchange(request, cancel).await?;
        Ok(echoed_record(&response))
    }

    async fn update(&self, id: &RecordId, draft: &FieldMap, cancel: &CancellationToken) -> ClientResult<Option<Record>> {
        let request = ApiRequest::put(self.item_path(id), draft_body(draft)?);
        let response = self.exchange(request, cancel).await?;
        Ok(echoed_record(&response))
    }

    async fn remove(&self, id: &RecordId, cancel: &CancellationToken) -> ClientResult<()> {
        self.exchange(ApiRequest::delete(self.item_path(id)), cancel).await?;
        Ok(())
    }
}
