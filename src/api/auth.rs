//! Auth Client
//!
//! Account endpoints under `/auth`. A successful login stores the returned
//! token in the shared `Session`. Each action posts a loading notice that is
//! replaced by its outcome.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::transport::{ApiRequest, ApiResponse, Transport};
use crate::context::Session;
use crate::domain::{ClientError, ClientResult};
use crate::notify::{Notice, NoticeKey, NotificationSink, Operation};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(alias = "accessToken")]
    token: Option<String>,
}

/// Loading, success and failure text of one account action
struct Messages {
    loading: &'static str,
    success: &'static str,
    failure: &'static str,
}

const LOGIN: Messages = Messages {
    loading: "Logging you in...",
    success: "Welcome back!",
    failure: "Invalid email or password",
};
const REGISTER: Messages = Messages {
    loading: "Creating your account...",
    success: "Welcome to the film community!",
    failure: "Something went wrong. Please try again.",
};
const VERIFY_EMAIL: Messages = Messages {
    loading: "Verifying email...",
    success: "Email verified successfully!",
    failure: "Invalid verification code",
};
const REQUEST_RESET: Messages = Messages {
    loading: "Sending reset instructions...",
    success: "Reset instructions sent to your email!",
    failure: "Something went wrong. Please try again.",
};
const RESET_PASSWORD: Messages = Messages {
    loading: "Resetting password...",
    success: "Password reset successful!",
    failure: "Invalid reset code or email",
};

/// Resource name in the notice keys of account actions
pub const AUTH_RESOURCE: &str = "auth";

pub struct AuthClient<T> {
    transport: T,
    session: Session,
    sink: Arc<dyn NotificationSink>,
}

impl<T: Transport> AuthClient<T> {
    pub fn new(transport: T, session: Session, sink: Arc<dyn NotificationSink>) -> Self {
        Self { transport, session, sink }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn post(&self, route: &str, body: serde_json::Value, cancel: &CancellationToken) -> ClientResult<ApiResponse> {
        let request = ApiRequest::post(format!("/auth/{}", route), body);
        self.transport.send(request, cancel).await?.into_result()
    }

    /// Post a loading notice, run `action`, then replace the notice with the outcome
    async fn reported<R>(
        &self,
        operation: Operation,
        messages: &Messages,
        action: impl Future<Output = ClientResult<R>>,
    ) -> ClientResult<R> {
        let key = NoticeKey::new(AUTH_RESOURCE, operation);
        self.sink.notify(Notice::loading(key.clone(), messages.loading));
        match action.await {
            Ok(value) => {
                self.sink.notify(Notice::success(key, messages.success));
                Ok(value)
            }
            Err(ClientError::Cancelled) => {
                self.sink.dismiss(&key);
                Err(ClientError::Cancelled)
            }
            Err(err) => {
                log::warn!("{} failed: {}", operation.as_str(), err);
                self.sink.notify(Notice::error(key, messages.failure));
                Err(err)
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str, cancel: &CancellationToken) -> ClientResult<()> {
        let action = async {
            let response = self
                .post("login", json!({ "email": email, "password": password }), cancel)
                .await?;
            response
                .json::<LoginResponse>()?
                .token
                .ok_or_else(|| ClientError::Decode("login response carries no token".to_string()))
        };
        let token = self.reported(Operation::Login, &LOGIN, action).await?;
        self.session.sign_in(token);
        log::info!("signed in as {}", email);
        Ok(())
    }

    pub async fn register(&self, registration: &Registration, cancel: &CancellationToken) -> ClientResult<()> {
        let action = async {
            let body = serde_json::to_value(registration).map_err(|e| ClientError::Decode(e.to_string()))?;
            self.post("register", body, cancel).await
        };
        self.reported(Operation::Register, &REGISTER, action).await?;
        Ok(())
    }

    pub async fn verify_email(&self, email: &str, code: &str, cancel: &CancellationToken) -> ClientResult<()> {
        let action = self.post("verify-email", json!({ "email": email, "verificationCode": code }), cancel);
        self.reported(Operation::VerifyEmail, &VERIFY_EMAIL, action).await?;
        Ok(())
    }

    pub async fn request_password_reset(&self, email: &str, cancel: &CancellationToken) -> ClientResult<()> {
        let action = self.post("request-password-reset", json!({ "email": email }), cancel);
        self.reported(Operation::RequestReset, &REQUEST_RESET, action).await?;
        Ok(())
    }

    pub async fn reset_password(
        &self,
        email: &str,
        reset_code: &str,
        new_password: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<()> {
        let body = json!({ "email": email, "resetCode": reset_code, "newPassword": new_password });
        let action = self.post("reset-password", body, cancel);
        self.reported(Operation::ResetPassword, &RESET_PASSWORD, action).await?;
        Ok(())
    }

    /// Drop the credential for every client sharing the session
    pub fn logout(&self) {
        self.session.invalidate();
    }
}
