// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key sent with every document-store and identity call
    pub firebase_api_key: String,
    /// Project hosting the document store
    pub firebase_project_id: String,
    /// Domain appended to user identifiers to form identity-provider emails
    pub auth_email_domain: String,
    /// The well-known administrator identifier
    pub admin_user_id: String,
    /// Base URL of the admin-only server endpoints
    pub admin_api_base_url: String,
    /// Directory holding the locally persisted key/value state
    pub local_state_dir: PathBuf,
    /// Fixed UTC offset (minutes) used for calendar-day comparisons
    pub site_utc_offset_minutes: i32,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            firebase_api_key: "test_api_key".to_string(),
            firebase_project_id: "test-project".to_string(),
            auth_email_domain: "members.civic.local".to_string(),
            admin_user_id: "admin".to_string(),
            admin_api_base_url: "http://localhost:3000".to_string(),
            local_state_dir: PathBuf::from(".civic-portal"),
            site_utc_offset_minutes: 0,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let site_utc_offset_minutes = match env::var("SITE_UTC_OFFSET_MINUTES") {
            Ok(v) => v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("SITE_UTC_OFFSET_MINUTES", v))?,
            Err(_) => 0,
        };
        if !(-14 * 60..=14 * 60).contains(&site_utc_offset_minutes) {
            return Err(ConfigError::Invalid(
                "SITE_UTC_OFFSET_MINUTES",
                site_utc_offset_minutes.to_string(),
            ));
        }

        Ok(Self {
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            firebase_project_id: env::var("FIREBASE_PROJECT_ID")
                .unwrap_or_else(|_| "local-dev".to_string()),
            auth_email_domain: env::var("AUTH_EMAIL_DOMAIN")
                .unwrap_or_else(|_| "members.civic.local".to_string()),
            admin_user_id: env::var("ADMIN_USER_ID").unwrap_or_else(|_| "admin".to_string()),
            admin_api_base_url: env::var("ADMIN_API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            local_state_dir: env::var("LOCAL_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".civic-portal")),
            site_utc_offset_minutes,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
