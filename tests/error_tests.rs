// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use civic_portal::error::AppError;
use civic_portal::models::SignUpRequest;
use civic_portal::services::{AuthError, AuthErrorCode};
use validator::Validate;

#[test]
fn test_provider_messages_map_to_codes() {
    assert_eq!(
        AuthErrorCode::from_provider_message("EMAIL_EXISTS"),
        AuthErrorCode::EmailExists
    );
    assert_eq!(
        AuthErrorCode::from_provider_message("INVALID_LOGIN_CREDENTIALS"),
        AuthErrorCode::InvalidLoginCredentials
    );
    assert_eq!(
        AuthErrorCode::from_provider_message("USER_NOT_FOUND"),
        AuthErrorCode::EmailNotFound
    );
    assert!(matches!(
        AuthErrorCode::from_provider_message("SOMETHING_NEW"),
        AuthErrorCode::Other(_)
    ));
}

#[test]
fn test_auth_errors_show_fixed_messages() {
    let err: AppError = AuthError::new(AuthErrorCode::InvalidPassword, "INVALID_PASSWORD").into();
    assert_eq!(err.to_string(), "The ID or password is incorrect");

    let err: AppError = AuthError::network("connection refused").into();
    assert_eq!(err.to_string(), "Could not reach the server, please try again");
}

#[test]
fn test_only_definite_answers_are_rejections() {
    assert!(AuthError::new(AuthErrorCode::EmailNotFound, "EMAIL_NOT_FOUND").is_rejection());
    assert!(AuthError::new(AuthErrorCode::UserDisabled, "USER_DISABLED").is_rejection());
    assert!(!AuthError::new(AuthErrorCode::TooManyAttempts, "TOO_MANY_ATTEMPTS").is_rejection());
    assert!(!AuthError::network("timeout").is_rejection());
}

#[test]
fn test_write_failure_names_record_kind() {
    let err = AppError::write_failed("Poll vote");
    assert_eq!(
        err.to_string(),
        "Poll vote failed to save to the backend, please try again"
    );
    assert!(!err.is_unauthorized());
    assert!(AppError::Unauthorized.is_unauthorized());
}

#[test]
fn test_validation_errors_are_bad_requests() {
    let request = SignUpRequest {
        user_id: "ab".to_string(),
        password: "secret123".to_string(),
        name: "Kim".to_string(),
        phone: String::new(),
        email: Some("not-an-email".to_string()),
        address: String::new(),
    };
    let err: AppError = request.validate().unwrap_err().into();
    assert!(matches!(err, AppError::BadRequest(_)));
}
