//! HTTP Transport
//!
//! `reqwest` client rooted at the configured base URL. A fired cancellation
//! token drops the in-flight request.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::transport::{ApiRequest, ApiResponse, Method, Transport};
use crate::config::ClientConfig;
use crate::domain::{ClientError, ClientResult};

pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        Self::with_timeout(&config.api_url, config.request_timeout())
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> ClientResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest, cancel: &CancellationToken) -> ClientResult<ApiResponse> {
        let url = self.url(&request.path);
        log::debug!("{} {}", request.method.as_str(), url);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let exchange = async move {
            let response = builder
                .send()
                .await
                .map_err(|e| ClientError::Network(e.to_string()))?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| ClientError::Network(e.to_string()))?;
            Ok(ApiResponse { status, body })
        };

        tokio::select! {
            _ = cancel.cancelled() => {
                log::debug!("{} {} cancelled", request.method.as_str(), url);
                Err(ClientError::Cancelled)
            }
            result = exchange => result,
        }
    }
}
