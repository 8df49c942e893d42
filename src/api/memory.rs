//! In-Memory Backend
//!
//! An in-process stand-in for the REST API: the four collection routes per
//! registered resource plus the `/auth/*` routes. Tests and offline demos
//! run the real `HttpCollection`/`AuthClient` code against it.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use super::transport::{ApiRequest, ApiResponse, Method, Transport};
use crate::domain::{ClientError, ClientResult, Entity, FieldMap, Record, RecordId, ResourceSchema};

/// Failure injected into the next matching request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The request never reaches the server
    Network,
    /// The server answers with this status
    Status(u16),
}

struct Collection {
    required: Vec<String>,
    records: Vec<Record>,
    next_id: i64,
}

impl Collection {
    fn missing_required(&self, fields: &FieldMap) -> Option<&str> {
        self.required
            .iter()
            .find(|name| fields.get(name.as_str()).map_or(true, |v| v.is_blank()))
            .map(String::as_str)
    }
}

struct Account {
    password: String,
    verified: bool,
    verification_code: String,
    reset_code: Option<String>,
}

#[derive(Default)]
struct BackendState {
    collections: BTreeMap<String, Collection>,
    accounts: BTreeMap<String, Account>,
    tokens: BTreeSet<String>,
    failures: VecDeque<(Method, Failure)>,
    requests: Vec<(Method, String)>,
    issued: u64,
}

impl BackendState {
    fn next_code(&mut self) -> String {
        self.issued += 1;
        format!("{:06}", 100_000 + self.issued)
    }

    fn take_failure(&mut self, method: Method) -> Option<Failure> {
        let pos = self.failures.iter().position(|(m, _)| *m == method)?;
        self.failures.remove(pos).map(|(_, failure)| failure)
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<BackendState>,
    latency: Option<Duration>,
}

fn reply(status: u16, body: Value) -> ApiResponse {
    ApiResponse::new(status, body.to_string())
}

fn reject(status: u16, message: &str) -> ApiResponse {
    reply(status, json!({ "message": message }))
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response, so overlapping calls can be observed
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Serve the schema's endpoint, enforcing its required fields
    pub fn register(&self, schema: &ResourceSchema) {
        let required: Vec<&str> = schema.required_fields().collect();
        self.register_endpoint(&schema.endpoint, &required);
    }

    /// Serve an empty collection at `endpoint`
    pub fn register_endpoint(&self, endpoint: &str, required: &[&str]) {
        self.lock().collections.insert(
            format!("/{}", endpoint.trim_matches('/')),
            Collection {
                required: required.iter().map(|f| f.to_string()).collect(),
                records: Vec::new(),
                next_id: 1,
            },
        );
    }

    /// Insert records as if they had been created earlier; drafts get ids
    pub fn seed(&self, endpoint: &str, records: Vec<Record>) {
        let mut state = self.lock();
        let collection = state.collections.entry(endpoint.to_string()).or_insert_with(|| Collection {
            required: Vec::new(),
            records: Vec::new(),
            next_id: 1,
        });
        for mut record in records {
            match record.id {
                Some(RecordId::Num(n)) => collection.next_id = collection.next_id.max(n + 1),
                Some(RecordId::Text(_)) => {}
                None => {
                    record.id = Some(RecordId::Num(collection.next_id));
                    collection.next_id += 1;
                }
            }
            collection.records.push(record);
        }
    }

    /// Mint a bearer token the backend will accept
    pub fn issue_token(&self) -> String {
        let mut state = self.lock();
        state.issued += 1;
        let token = format!("mem-token-{}", state.issued);
        state.tokens.insert(token.clone());
        token
    }

    pub fn revoke_tokens(&self) {
        self.lock().tokens.clear();
    }

    /// Verified account that can log in straight away
    pub fn add_account(&self, email: &str, password: &str) {
        self.lock().accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                verified: true,
                verification_code: String::new(),
                reset_code: None,
            },
        );
    }

    /// Code a registration would have emailed
    pub fn verification_code(&self, email: &str) -> Option<String> {
        self.lock().accounts.get(email).map(|a| a.verification_code.clone())
    }

    /// Code a reset request would have emailed
    pub fn reset_code(&self, email: &str) -> Option<String> {
        self.lock().accounts.get(email).and_then(|a| a.reset_code.clone())
    }

    /// Fail the next request using `method`
    pub fn fail_next(&self, method: Method, failure: Failure) {
        self.lock().failures.push_back((method, failure));
    }

    /// Every request received, in order
    pub fn requests(&self) -> Vec<(Method, String)> {
        self.lock().requests.clone()
    }

    pub fn request_count(&self, method: Method) -> usize {
        self.lock().requests.iter().filter(|(m, _)| *m == method).count()
    }

    pub fn records(&self, endpoint: &str) -> Vec<Record> {
        self.lock()
            .collections
            .get(endpoint)
            .map(|c| c.records.clone())
            .unwrap_or_default()
    }

    fn handle(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let mut state = self.lock();
        state.requests.push((request.method, request.path.clone()));

        match state.take_failure(request.method) {
            Some(Failure::Network) => return Err(ClientError::Network("connection reset by peer".into())),
            Some(Failure::Status(status)) => return Ok(reject(status, "injected failure")),
            None => {}
        }

        if let Some(route) = request.path.strip_prefix("/auth/") {
            return Ok(handle_auth(&mut state, request.method, route, request.body.as_ref()));
        }

        let authorized = request
            .bearer
            .as_ref()
            .map_or(false, |token| state.tokens.contains(token));
        if !authorized {
            return Ok(reject(401, "invalid or missing token"));
        }

        let Some((endpoint, id)) = route(&state.collections, &request.path) else {
            return Ok(reject(404, "unknown resource"));
        };
        let Some(collection) = state.collections.get_mut(&endpoint) else {
            return Ok(reject(404, "unknown resource"));
        };

        let response = match (request.method, id) {
            (Method::Get, None) => reply(200, json!(collection.records)),
            (Method::Post, None) => {
                let fields = match body_fields(request.body) {
                    Ok(fields) => fields,
                    Err(response) => return Ok(response),
                };
                if let Some(missing) = collection.missing_required(&fields) {
                    return Ok(reject(422, &format!("{} is required", missing)));
                }
                let record = Record::new(collection.next_id, fields);
                collection.next_id += 1;
                collection.records.push(record.clone());
                reply(201, json!(record))
            }
            (Method::Put, Some(id)) => {
                let fields = match body_fields(request.body) {
                    Ok(fields) => fields,
                    Err(response) => return Ok(response),
                };
                if let Some(missing) = collection.missing_required(&fields) {
                    return Ok(reject(422, &format!("{} is required", missing)));
                }
                match collection.records.iter_mut().find(|r| matches_id(r, &id)) {
                    Some(record) => {
                        record.fields.extend(fields);
                        reply(200, json!(record))
                    }
                    None => reject(404, "record not found"),
                }
            }
            (Method::Delete, Some(id)) => {
                let before = collection.records.len();
                collection.records.retain(|r| !matches_id(r, &id));
                if collection.records.len() == before {
                    reject(404, "record not found")
                } else {
                    ApiResponse::new(204, "")
                }
            }
            _ => reject(405, "method not allowed"),
        };
        Ok(response)
    }
}

/// Registered endpoint and decoded item id of `path`.
///
/// Endpoints may span several segments (`/api/producerbids`); an item path is
/// a registered endpoint followed by exactly one segment.
fn route(collections: &BTreeMap<String, Collection>, path: &str) -> Option<(String, Option<String>)> {
    let path = format!("/{}", path.trim_matches('/'));
    if collections.contains_key(&path) {
        return Some((path, None));
    }
    let (endpoint, raw) = path.rsplit_once('/')?;
    if raw.is_empty() || !collections.contains_key(endpoint) {
        return None;
    }
    let id = percent_decode_str(raw).decode_utf8_lossy().to_string();
    Some((endpoint.to_string(), Some(id)))
}

fn matches_id(record: &Record, raw: &str) -> bool {
    record.id().map_or(false, |id| id.to_string() == raw)
}

/// Payload fields, ignoring any client-supplied `id`
fn body_fields(body: Option<Value>) -> Result<FieldMap, ApiResponse> {
    match body {
        Some(value @ Value::Object(_)) => serde_json::from_value::<Record>(value)
            .map(|record| record.fields)
            .map_err(|e| reject(400, &e.to_string())),
        _ => Err(reject(400, "expected a JSON object")),
    }
}

fn str_field<'a>(body: Option<&'a Value>, key: &str) -> &'a str {
    body.and_then(|b| b.get(key)).and_then(Value::as_str).unwrap_or_default()
}

fn handle_auth(state: &mut BackendState, method: Method, route: &str, body: Option<&Value>) -> ApiResponse {
    if method != Method::Post {
        return reject(405, "method not allowed");
    }
    let email = str_field(body, "email").to_string();

    match route {
        "register" => {
            let password = str_field(body, "password");
            if email.is_empty() || password.is_empty() {
                return reject(422, "email and password are required");
            }
            if state.accounts.contains_key(&email) {
                return reject(409, "account already exists");
            }
            let code = state.next_code();
            state.accounts.insert(
                email,
                Account {
                    password: password.to_string(),
                    verified: false,
                    verification_code: code,
                    reset_code: None,
                },
            );
            reply(201, json!({ "message": "verification code sent" }))
        }
        "verify-email" => {
            let code = str_field(body, "verificationCode");
            match state.accounts.get_mut(&email) {
                Some(account) if account.verification_code == code => {
                    account.verified = true;
                    reply(200, json!({ "message": "email verified" }))
                }
                _ => reject(400, "invalid verification code"),
            }
        }
        "login" => {
            let password = str_field(body, "password");
            let accepted = state
                .accounts
                .get(&email)
                .map_or(false, |a| a.verified && a.password == password);
            if !accepted {
                return reject(401, "invalid email or password");
            }
            state.issued += 1;
            let token = format!("mem-token-{}", state.issued);
            state.tokens.insert(token.clone());
            reply(200, json!({ "token": token }))
        }
        "request-password-reset" => {
            let code = state.next_code();
            if let Some(account) = state.accounts.get_mut(&email) {
                account.reset_code = Some(code);
            }
            // Same answer for unknown emails
            reply(200, json!({ "message": "reset instructions sent" }))
        }
        "reset-password" => {
            let code = str_field(body, "resetCode");
            let new_password = str_field(body, "newPassword");
            match state.accounts.get_mut(&email) {
                Some(account) if account.reset_code.as_deref() == Some(code) && !new_password.is_empty() => {
                    account.password = new_password.to_string();
                    account.reset_code = None;
                    reply(200, json!({ "message": "password reset" }))
                }
                _ => reject(400, "invalid reset code or email"),
            }
        }
        _ => reject(404, "not found"),
    }
}

#[async_trait]
impl Transport for MemoryBackend {
    async fn send(&self, request: ApiRequest, cancel: &CancellationToken) -> ClientResult<ApiResponse> {
        if let Some(latency) = self.latency {
            tokio::select! {
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                _ = tokio::time::sleep(latency) => {}
            }
        }
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        self.handle(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldSpec;

    fn schema() -> ResourceSchema {
        ResourceSchema::new("projects", "/projects", "/dashboard/Projects")
            .field(FieldSpec::text("title", "Title").required())
    }

    fn backend() -> (MemoryBackend, String) {
        let backend = MemoryBackend::new();
        backend.register(&schema());
        let token = backend.issue_token();
        (backend, token)
    }

    #[tokio::test]
    async fn test_post_assigns_sequential_ids() {
        let (backend, token) = backend();
        let cancel = CancellationToken::new();

        for title in ["Starfall", "Sands of Time"] {
            let req = ApiRequest::post("/projects", json!({ "title": title })).with_bearer(&token);
            assert_eq!(backend.send(req, &cancel).await.unwrap().status, 201);
        }

        let ids: Vec<_> = backend.records("/projects").into_iter().filter_map(|r| r.id).collect();
        assert_eq!(ids, vec![RecordId::Num(1), RecordId::Num(2)]);
    }

    #[tokio::test]
    async fn test_requires_token() {
        let (backend, _) = backend();
        let resp = backend.send(ApiRequest::get("/projects"), &CancellationToken::new()).await.unwrap();
        assert_eq!(resp.status, 401);
    }

    #[tokio::test]
    async fn test_missing_required_field_is_422() {
        let (backend, token) = backend();
        let req = ApiRequest::post("/projects", json!({ "title": "  " })).with_bearer(&token);
        let resp = backend.send(req, &CancellationToken::new()).await.unwrap();
        assert_eq!(resp.status, 422);
        assert!(backend.records("/projects").is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure_applies_once_per_method() {
        let (backend, token) = backend();
        backend.fail_next(Method::Delete, Failure::Network);
        let cancel = CancellationToken::new();

        let list = backend.send(ApiRequest::get("/projects").with_bearer(&token), &cancel).await;
        assert!(list.is_ok());

        let first = backend.send(ApiRequest::delete("/projects/1").with_bearer(&token), &cancel).await;
        assert!(matches!(first, Err(ClientError::Network(_))));

        let second = backend.send(ApiRequest::delete("/projects/1").with_bearer(&token), &cancel).await;
        assert_eq!(second.unwrap().status, 404);
    }

    #[tokio::test]
    async fn test_nested_endpoint_routes_items() {
        let (backend, token) = backend();
        backend.register_endpoint("/api/producerbids", &["bidDeadline"]);
        let cancel = CancellationToken::new();

        let req = ApiRequest::post("/api/producerbids", json!({ "bidDeadline": "2025-03-01" })).with_bearer(&token);
        assert_eq!(backend.send(req, &cancel).await.unwrap().status, 201);
        assert_eq!(backend.records("/api/producerbids").len(), 1);

        let gone = backend.send(ApiRequest::delete("/api/producerbids/1").with_bearer(&token), &cancel).await;
        assert_eq!(gone.unwrap().status, 204);

        for path in ["/api", "/api/other", "/projects/1/tasks"] {
            let resp = backend.send(ApiRequest::get(path).with_bearer(&token), &cancel).await.unwrap();
            assert_eq!(resp.status, 404, "{path}");
        }
    }

    #[tokio::test]
    async fn test_seed_keeps_ids_ahead() {
        let (backend, token) = backend();
        backend.seed("/projects", vec![Record::new(7, FieldMap::new()).with("title", "Starfall")]);

        let req = ApiRequest::post("/projects", json!({ "title": "Echoes" })).with_bearer(&token);
        let resp = backend.send(req, &CancellationToken::new()).await.unwrap();
        let created: Record = resp.json().unwrap();
        assert_eq!(created.id, Some(RecordId::Num(8)));
    }
}
