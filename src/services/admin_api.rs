// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the server-side admin endpoints.
//!
//! Both endpoints take a bearer token and answer with
//! `{ ok, message?, successCount?, failedCount? }`.

use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Response body shared by the admin endpoints.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub success_count: Option<u32>,
    #[serde(default)]
    pub failed_count: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteAuthUserRequest<'a> {
    user_id: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct SendSmsRequest<'a> {
    recipients: &'a [String],
    message: &'a str,
}

/// Admin operations the client cannot perform with its own credentials.
#[async_trait]
pub trait AdminEndpoints: Send + Sync {
    /// `POST /api/admin/delete-auth-user`
    async fn delete_auth_user(
        &self,
        token: &str,
        user_id: &str,
        email: &str,
    ) -> Result<AdminApiResponse, AppError>;

    /// `POST /api/admin/send-sms`
    async fn send_sms(
        &self,
        token: &str,
        recipients: &[String],
        message: &str,
    ) -> Result<AdminApiResponse, AppError>;
}

/// HTTP client for the admin endpoints.
#[derive(Clone)]
pub struct AdminApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl AdminApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        token: &str,
        body: &B,
    ) -> Result<AdminApiResponse, AppError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Database(format!("admin endpoint unreachable: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AppError::Unauthorized);
        }
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(AppError::Forbidden("admin endpoint".to_string()));
        }

        // Error statuses still carry the `{ ok: false, message }` body.
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<AdminApiResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if status.is_success() => Ok(AdminApiResponse {
                ok: true,
                ..AdminApiResponse::default()
            }),
            Err(_) => Err(AppError::Database(format!(
                "admin endpoint {} returned {}",
                path, status
            ))),
        }
    }
}

#[async_trait]
impl AdminEndpoints for AdminApiClient {
    async fn delete_auth_user(
        &self,
        token: &str,
        user_id: &str,
        email: &str,
    ) -> Result<AdminApiResponse, AppError> {
        let body = DeleteAuthUserRequest { user_id, email };
        self.post("/api/admin/delete-auth-user", token, &body).await
    }

    async fn send_sms(
        &self,
        token: &str,
        recipients: &[String],
        message: &str,
    ) -> Result<AdminApiResponse, AppError> {
        let body = SendSmsRequest {
            recipients,
            message,
        };
        self.post("/api/admin/send-sms", token, &body).await
    }
}

/// Recorded admin call.
#[derive(Debug, Clone, PartialEq)]
pub enum AdminCall {
    DeleteAuthUser { user_id: String },
    SendSms { recipients: Vec<String>, message: String },
}

/// Admin endpoints that record calls and always succeed (offline mode and tests).
#[derive(Default)]
pub struct MemoryAdminApi {
    calls: Mutex<Vec<AdminCall>>,
}

impl MemoryAdminApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<AdminCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: AdminCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl AdminEndpoints for MemoryAdminApi {
    async fn delete_auth_user(
        &self,
        _token: &str,
        user_id: &str,
        _email: &str,
    ) -> Result<AdminApiResponse, AppError> {
        self.record(AdminCall::DeleteAuthUser {
            user_id: user_id.to_string(),
        });
        Ok(AdminApiResponse {
            ok: true,
            ..AdminApiResponse::default()
        })
    }

    async fn send_sms(
        &self,
        _token: &str,
        recipients: &[String],
        message: &str,
    ) -> Result<AdminApiResponse, AppError> {
        self.record(AdminCall::SendSms {
            recipients: recipients.to_vec(),
            message: message.to_string(),
        });
        let sent = u32::try_from(recipients.len()).unwrap_or(u32::MAX);
        Ok(AdminApiResponse {
            ok: true,
            message: None,
            success_count: Some(sent),
            failed_count: Some(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_optional_counts() {
        let r: AdminApiResponse = serde_json::from_str(r#"{"ok":true}"#).unwrap();
        assert!(r.ok);
        assert_eq!(r.success_count, None);

        let r: AdminApiResponse = serde_json::from_str(
            r#"{"ok":false,"message":"quota","successCount":3,"failedCount":2}"#,
        )
        .unwrap();
        assert_eq!(r.message.as_deref(), Some("quota"));
        assert_eq!((r.success_count, r.failed_count), (Some(3), Some(2)));
    }
}
