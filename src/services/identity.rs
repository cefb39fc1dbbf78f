// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider client.
//!
//! Handles:
//! - Identifier normalization and the synthetic email mapping
//! - Registered-identifier checks, sign-up, password sign-in, account deletion
//! - Typed provider error codes for callers to branch on

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Default token lifetime when the provider does not say.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

// ─── Identifier Mapping ──────────────────────────────────────

/// Normalize a login identifier to its undecorated document-key form.
///
/// Strips a trailing `@{domain}` (case-insensitive) and then every
/// non-alphanumeric character. Case is preserved. Idempotent.
pub fn normalize_identifier(raw: &str, domain: &str) -> String {
    let trimmed = raw.trim();
    let suffix = format!("@{}", domain);
    let base = trimmed
        .len()
        .checked_sub(suffix.len())
        .and_then(|split| {
            let (head, tail) = (trimmed.get(..split)?, trimmed.get(split..)?);
            tail.eq_ignore_ascii_case(&suffix).then_some(head)
        })
        .unwrap_or(trimmed);
    base.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// The identity-provider email for a user identifier.
pub fn auth_email(user_id: &str, domain: &str) -> String {
    format!("{}@{}", normalize_identifier(user_id, domain), domain)
}

// ─── Errors ──────────────────────────────────────────────────

/// Provider error codes the application distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorCode {
    EmailExists,
    EmailNotFound,
    InvalidPassword,
    /// Merged "wrong password or no such user" code of enumeration-protected projects
    InvalidLoginCredentials,
    InvalidEmail,
    WeakPassword,
    UserDisabled,
    TooManyAttempts,
    TokenExpired,
    Network,
    Other(String),
}

impl AuthErrorCode {
    /// Parse the provider's error message (`"WEAK_PASSWORD : Password should be..."`).
    pub fn from_provider_message(message: &str) -> Self {
        let code = message.split(':').next().unwrap_or("").trim();
        match code {
            "EMAIL_EXISTS" => AuthErrorCode::EmailExists,
            "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => AuthErrorCode::EmailNotFound,
            "INVALID_PASSWORD" => AuthErrorCode::InvalidPassword,
            "INVALID_LOGIN_CREDENTIALS" => AuthErrorCode::InvalidLoginCredentials,
            "INVALID_EMAIL" | "MISSING_EMAIL" => AuthErrorCode::InvalidEmail,
            "WEAK_PASSWORD" | "MISSING_PASSWORD" => AuthErrorCode::WeakPassword,
            "USER_DISABLED" => AuthErrorCode::UserDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthErrorCode::TooManyAttempts,
            "TOKEN_EXPIRED" | "INVALID_ID_TOKEN" | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => {
                AuthErrorCode::TokenExpired
            }
            other => AuthErrorCode::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AuthErrorCode::EmailExists => "EMAIL_EXISTS",
            AuthErrorCode::EmailNotFound => "EMAIL_NOT_FOUND",
            AuthErrorCode::InvalidPassword => "INVALID_PASSWORD",
            AuthErrorCode::InvalidLoginCredentials => "INVALID_LOGIN_CREDENTIALS",
            AuthErrorCode::InvalidEmail => "INVALID_EMAIL",
            AuthErrorCode::WeakPassword => "WEAK_PASSWORD",
            AuthErrorCode::UserDisabled => "USER_DISABLED",
            AuthErrorCode::TooManyAttempts => "TOO_MANY_ATTEMPTS_TRY_LATER",
            AuthErrorCode::TokenExpired => "TOKEN_EXPIRED",
            AuthErrorCode::Network => "NETWORK_ERROR",
            AuthErrorCode::Other(code) => code,
        }
    }
}

/// Error from a credential or sign-in operation, carrying the provider code.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("identity provider error {}: {message}", code.as_str())]
pub struct AuthError {
    pub code: AuthErrorCode,
    pub message: String,
}

impl AuthError {
    pub fn new(code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::Network, message)
    }

    /// The account does not exist at the provider.
    pub fn is_not_found(&self) -> bool {
        self.code == AuthErrorCode::EmailNotFound
    }

    /// The provider rejected the password (or, when merged, the account).
    pub fn is_invalid_credential(&self) -> bool {
        matches!(
            self.code,
            AuthErrorCode::InvalidPassword | AuthErrorCode::InvalidLoginCredentials
        )
    }

    /// A definite answer from the provider about these credentials.
    pub fn is_rejection(&self) -> bool {
        self.is_not_found() || self.is_invalid_credential() || self.code == AuthErrorCode::UserDisabled
    }

    /// Fixed user-facing message for this error.
    pub fn user_message(&self) -> &'static str {
        match self.code {
            AuthErrorCode::EmailExists => "This ID is already registered",
            AuthErrorCode::EmailNotFound => "No account exists with this ID",
            AuthErrorCode::InvalidPassword | AuthErrorCode::InvalidLoginCredentials => {
                "The ID or password is incorrect"
            }
            AuthErrorCode::InvalidEmail => "The ID contains characters that cannot be used",
            AuthErrorCode::WeakPassword => "The password must be at least 6 characters",
            AuthErrorCode::UserDisabled => "This account has been disabled",
            AuthErrorCode::TooManyAttempts => "Too many attempts, please try again later",
            AuthErrorCode::TokenExpired => "Your login has expired, please log in again",
            AuthErrorCode::Network | AuthErrorCode::Other(_) => {
                "Could not reach the server, please try again"
            }
        }
    }
}

// ─── Provider Interface ──────────────────────────────────────

/// Bearer token issued by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub id_token: String,
    /// Provider-side account id
    pub local_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Operations used against the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Whether an account exists for `email`.
    ///
    /// `None` when the provider withholds the answer (enumeration protection).
    async fn is_registered(&self, email: &str) -> Result<Option<bool>, AuthError>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;
    async fn delete_account(&self, id_token: &str) -> Result<(), AuthError>;
}

// ─── REST Client ─────────────────────────────────────────────

/// Identity provider REST client.
#[derive(Clone)]
pub struct FirebaseAuthClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
    #[serde(default)]
    local_id: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Deserialize)]
struct RegisteredResponse {
    /// Omitted by providers with enumeration protection enabled
    #[serde(default)]
    registered: Option<bool>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

impl FirebaseAuthClient {
    /// Create a client. Honors FIREBASE_AUTH_EMULATOR_HOST for local development.
    pub fn new(api_key: &str) -> Self {
        let base_url = match std::env::var("FIREBASE_AUTH_EMULATOR_HOST") {
            Ok(host) => format!("http://{}/identitytoolkit.googleapis.com/v1", host),
            Err(_) => "https://identitytoolkit.googleapis.com/v1".to_string(),
        };
        Self::with_base_url(&base_url, api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    async fn post<B, T>(&self, method: &str, body: &B) -> Result<T, AuthError>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/accounts:{}", self.base_url, method);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}", status));
            tracing::debug!(method, status = %status, message = %message, "Identity call rejected");
            return Err(AuthError::new(
                AuthErrorCode::from_provider_message(&message),
                message,
            ));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::network(format!("JSON parse error: {}", e)))
    }

    fn session_from(response: TokenResponse) -> AuthSession {
        let lifetime = response
            .expires_in
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        AuthSession {
            id_token: response.id_token,
            local_id: response.local_id,
            expires_at: Utc::now() + Duration::seconds(lifetime),
        }
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthClient {
    async fn is_registered(&self, email: &str) -> Result<Option<bool>, AuthError> {
        let body = serde_json::json!({
            "identifier": email,
            "continueUri": "http://localhost",
        });
        let response: RegisteredResponse = self.post("createAuthUri", &body).await?;
        Ok(response.registered)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let response: TokenResponse = self.post("signUp", &body).await?;
        Ok(Self::session_from(response))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let response: TokenResponse = self.post("signInWithPassword", &body).await?;
        Ok(Self::session_from(response))
    }

    async fn delete_account(&self, id_token: &str) -> Result<(), AuthError> {
        let body = serde_json::json!({ "idToken": id_token });
        let _: serde_json::Value = self.post("delete", &body).await?;
        Ok(())
    }
}

// ─── In-Memory Provider ──────────────────────────────────────

#[derive(Debug, Clone)]
struct MemoryAccount {
    password: String,
    local_id: String,
}

/// In-process identity provider for offline mode and tests.
#[derive(Default)]
pub struct MemoryIdentity {
    accounts: DashMap<String, MemoryAccount>,
    /// token -> email
    tokens: DashMap<String, String>,
    offline: AtomicBool,
    enumeration_protection: AtomicBool,
    issued: AtomicU64,
    sign_ins: AtomicU64,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account directly.
    pub fn add_account(&self, email: &str, password: &str) {
        let local_id = format!("uid-{}", self.accounts.len() + 1);
        self.accounts.insert(
            email.to_string(),
            MemoryAccount {
                password: password.to_string(),
                local_id,
            },
        );
    }

    /// Delete an account behind the application's back.
    pub fn remove_account(&self, email: &str) {
        self.accounts.remove(email);
    }

    pub fn set_password(&self, email: &str, password: &str) {
        if let Some(mut account) = self.accounts.get_mut(email) {
            account.password = password.to_string();
        }
    }

    pub fn has_account(&self, email: &str) -> bool {
        self.accounts.contains_key(email)
    }

    /// Simulate an unreachable provider.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Report wrong-password and unknown-account alike as `INVALID_LOGIN_CREDENTIALS`
    /// and withhold the answer to registration lookups.
    pub fn set_enumeration_protection(&self, enabled: bool) {
        self.enumeration_protection.store(enabled, Ordering::SeqCst);
    }

    /// Number of password sign-ins attempted.
    pub fn sign_in_count(&self) -> u64 {
        self.sign_ins.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> Result<(), AuthError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AuthError::network("provider unreachable"));
        }
        Ok(())
    }

    fn issue(&self, email: &str, local_id: &str) -> AuthSession {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let id_token = format!("token-{}-{}", local_id, n);
        self.tokens.insert(id_token.clone(), email.to_string());
        AuthSession {
            id_token,
            local_id: local_id.to_string(),
            expires_at: Utc::now() + Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS),
        }
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn is_registered(&self, email: &str) -> Result<Option<bool>, AuthError> {
        self.check_reachable()?;
        if self.enumeration_protection.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(self.accounts.contains_key(email)))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        self.check_reachable()?;
        if password.chars().count() < 6 {
            return Err(AuthError::new(AuthErrorCode::WeakPassword, "WEAK_PASSWORD"));
        }
        if self.accounts.contains_key(email) {
            return Err(AuthError::new(AuthErrorCode::EmailExists, "EMAIL_EXISTS"));
        }
        self.add_account(email, password);
        let local_id = self
            .accounts
            .get(email)
            .map(|a| a.local_id.clone())
            .unwrap_or_default();
        Ok(self.issue(email, &local_id))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        self.sign_ins.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        let protected = self.enumeration_protection.load(Ordering::SeqCst);

        let account = match self.accounts.get(email) {
            Some(account) => account.clone(),
            None if protected => {
                return Err(AuthError::new(
                    AuthErrorCode::InvalidLoginCredentials,
                    "INVALID_LOGIN_CREDENTIALS",
                ))
            }
            None => {
                return Err(AuthError::new(AuthErrorCode::EmailNotFound, "EMAIL_NOT_FOUND"))
            }
        };

        if account.password != password {
            let code = if protected {
                AuthErrorCode::InvalidLoginCredentials
            } else {
                AuthErrorCode::InvalidPassword
            };
            let message = code.as_str().to_string();
            return Err(AuthError::new(code, message));
        }
        Ok(self.issue(email, &account.local_id))
    }

    async fn delete_account(&self, id_token: &str) -> Result<(), AuthError> {
        self.check_reachable()?;
        let (_, email) = self
            .tokens
            .remove(id_token)
            .ok_or_else(|| AuthError::new(AuthErrorCode::TokenExpired, "INVALID_ID_TOKEN"))?;
        self.accounts.remove(&email);
        Ok(())
    }
}
