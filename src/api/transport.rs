//! Transport Layer - Core Trait
//!
//! One request in, one response out. Implementations decide how the bytes
//! travel (HTTP, or an in-process backend for tests).

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::domain::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the base URL, starting with `/`
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>, body: Option<serde_json::Value>) -> Self {
        Self {
            method,
            path: path.into(),
            bearer: None,
            body,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path, None)
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::Post, path, Some(body))
    }

    pub fn put(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::Put, path, Some(body))
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path, None)
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into the matching error
    pub fn into_result(self) -> ClientResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::from_status(self.status, error_message(self.status, &self.body)))
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        serde_json::from_str(&self.body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Pull a human readable message out of an error body
///
/// Backends answer with `{"message": ..}` or `{"error": ..}`; anything else
/// is used verbatim.
fn error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(msg) = value.get(key).and_then(|m| m.as_str()) {
                return msg.to_string();
            }
        }
    }
    let body = body.trim();
    if body.is_empty() {
        format!("status {}", status)
    } else {
        body.to_string()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request. Resolves to `Cancelled` once `cancel` fires.
    async fn send(&self, request: ApiRequest, cancel: &CancellationToken) -> ClientResult<ApiResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: ApiRequest, cancel: &CancellationToken) -> ClientResult<ApiResponse> {
        (**self).send(request, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_json_message() {
        let resp = ApiResponse::new(422, r#"{"message":"title is required"}"#);
        assert_eq!(
            resp.into_result().unwrap_err(),
            ClientError::Validation("title is required".into())
        );
    }

    #[test]
    fn test_error_message_falls_back_to_body_or_status() {
        let resp = ApiResponse::new(502, "Bad Gateway");
        assert_eq!(
            resp.into_result().unwrap_err(),
            ClientError::Server { status: 502, message: "Bad Gateway".into() }
        );

        let resp = ApiResponse::new(401, "");
        assert_eq!(resp.into_result().unwrap_err(), ClientError::Auth("status 401".into()));
    }

    #[test]
    fn test_success_passes_through() {
        let resp = ApiResponse::new(204, "");
        assert!(resp.into_result().is_ok());
    }

    #[test]
    fn test_bad_json_is_decode_error() {
        let resp = ApiResponse::new(200, "<html>");
        let err = resp.json::<Vec<u32>>().unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }
}
