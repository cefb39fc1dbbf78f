// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types.
//!
//! `AppError` is what every store operation returns. Its `Display` text is
//! the notification shown to the user at the point of failure.

use crate::services::identity::AuthError;

/// Application error type surfaced to the presentation layer.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Login required")]
    NotLoggedIn,

    #[error("Not permitted: {0}")]
    Forbidden(String),

    #[error("Could not obtain an authentication token, please log in again")]
    NoToken,

    #[error("Authentication rejected by the backend")]
    Unauthorized,

    #[error("{0}")]
    Rejected(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{0} failed to save to the backend, please try again")]
    RemoteWrite(String),

    #[error("{}", .0.user_message())]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a failed remote write of the named record kind.
    pub fn write_failed(what: &str) -> Self {
        AppError::RemoteWrite(what.to_string())
    }

    /// Whether the backend rejected the bearer token (or its absence).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Unauthorized)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|k| k.to_string())
            .collect();
        fields.sort();
        AppError::BadRequest(format!("invalid fields: {}", fields.join(", ")))
    }
}

/// Errors decoding a stored document into a typed record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("document has no name")]
    MissingName,

    #[error("document id {id:?} is not a valid {kind} id")]
    InvalidId { kind: &'static str, id: String },
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, AppError>;
