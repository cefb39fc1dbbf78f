// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-up, login, logout and session restoration.

use super::Store;
use crate::error::{AppError, Result};
use crate::models::{MembershipLevel, SignUpRequest, User};
use crate::services::{auth_email, normalize_identifier};
use crate::time_utils::now_rfc3339;
use std::sync::atomic::{AtomicBool, Ordering};
use validator::Validate;

impl Store {
    /// Register a new account and log it in.
    ///
    /// The profile document and the clearing of any old deletion marker are
    /// best effort: the account exists once the identity provider accepted it.
    pub async fn sign_up(&mut self, request: SignUpRequest) -> Result<User> {
        request.validate()?;
        let domain = self.config.auth_email_domain.clone();
        let user_id = normalize_identifier(&request.user_id, &domain);
        if user_id.is_empty() {
            return Err(AppError::BadRequest("ID must contain letters or digits".to_string()));
        }
        if self.users.iter().any(|u| u.id == user_id) {
            return Err(AppError::Rejected("This ID is already registered".to_string()));
        }

        let auth = self
            .identity
            .sign_up(&auth_email(&user_id, &domain), &request.password)
            .await?;

        let level = if user_id == self.config.admin_user_id {
            MembershipLevel::Admin
        } else {
            MembershipLevel::Basic
        };
        let user = User {
            id: user_id.clone(),
            name: request.name.trim().to_string(),
            level,
            phone: request.phone.trim().to_string(),
            email: request.email.unwrap_or_default(),
            address: request.address.trim().to_string(),
            has_voting_rights: false,
            upgrade_requested: false,
            created_at: now_rfc3339(),
        };

        self.credentials.remember_proof(&user_id, &request.password);
        self.credentials.open_session(&user_id, &auth);
        self.persist_credentials();

        if !self.remote.update(&user, Some(&auth.id_token)).await {
            tracing::warn!(user_id = %user_id, "Profile document not saved after sign-up");
        }
        if self
            .remote
            .is_marked_deleted(&user_id, Some(&auth.id_token))
            .await
            == Some(true)
            && !self.remote.clear_deletion_marker(&user_id, Some(&auth.id_token)).await
        {
            tracing::warn!(user_id = %user_id, "Failed to clear deletion marker on re-registration");
        }

        tracing::info!(user_id = %user_id, "Signed up");
        self.upsert_user(user.clone());
        self.current_user = Some(user.clone());
        Ok(user)
    }

    /// Log in with an identifier and password.
    ///
    /// Accounts with an admin deletion marker are refused and leave no session.
    pub async fn login(&mut self, raw_user_id: &str, password: &str) -> Result<User> {
        let domain = self.config.auth_email_domain.clone();
        let user_id = normalize_identifier(raw_user_id, &domain);
        if user_id.is_empty() || password.is_empty() {
            return Err(AppError::BadRequest("ID and password are required".to_string()));
        }

        let auth = self
            .identity
            .sign_in(&auth_email(&user_id, &domain), password)
            .await?;

        if self
            .remote
            .is_marked_deleted(&user_id, Some(&auth.id_token))
            .await
            == Some(true)
        {
            tracing::info!(user_id = %user_id, "Login refused for deleted account");
            if self.credentials.session_user() == Some(user_id.as_str()) {
                self.end_session();
            }
            return Err(AppError::Rejected(
                "This account has been deleted by an administrator".to_string(),
            ));
        }

        self.credentials.remember_proof(&user_id, password);
        self.credentials.open_session(&user_id, &auth);
        self.persist_credentials();

        let user = self.resolve_profile(&user_id, &auth.id_token).await;
        tracing::info!(user_id = %user_id, level = user.level.as_str(), "Logged in");
        self.upsert_user(user.clone());
        self.current_user = Some(user.clone());
        Ok(user)
    }

    /// Clear the session and logged-in user. Content collections are kept.
    pub fn logout(&mut self) {
        if let Some(user) = &self.current_user {
            tracing::info!(user_id = %user.id, "Logged out");
        }
        self.end_session();
    }

    /// Re-establish the logged-in user from a persisted session.
    ///
    /// The deletion marker is checked before the session is trusted. If
    /// `cancel` is set by the time a remote read resolves, no state changes.
    pub async fn restore_session(&mut self, cancel: &AtomicBool) -> Option<User> {
        let user_id = self.credentials.session_user()?.to_string();
        let token = self.token_for(&user_id).await;
        if cancel.load(Ordering::SeqCst) {
            return None;
        }

        let marked = self.remote.is_marked_deleted(&user_id, token.as_deref()).await;
        if cancel.load(Ordering::SeqCst) {
            return None;
        }
        if marked == Some(true) {
            tracing::info!(user_id = %user_id, "Discarding session of deleted account");
            self.end_session();
            return None;
        }

        let live = self.remote.fetch_user(&user_id, token.as_deref()).await;
        if cancel.load(Ordering::SeqCst) {
            return None;
        }

        let user = match live {
            Some(user) => {
                self.upsert_user(user.clone());
                user
            }
            None => self.cached_or_synthesized(&user_id),
        };
        tracing::info!(user_id = %user_id, "Session restored");
        self.current_user = Some(user.clone());
        Some(user)
    }

    /// Live profile, else cached copy, else a synthesized one.
    async fn resolve_profile(&self, user_id: &str, token: &str) -> User {
        match self.remote.fetch_user(user_id, Some(token)).await {
            Some(user) => user,
            None => self.cached_or_synthesized(user_id),
        }
    }

    fn cached_or_synthesized(&self, user_id: &str) -> User {
        if let Some(cached) = self.users.iter().find(|u| u.id == user_id) {
            return cached.clone();
        }
        let level = if user_id == self.config.admin_user_id {
            MembershipLevel::Admin
        } else {
            MembershipLevel::Basic
        };
        tracing::debug!(user_id, level = level.as_str(), "Synthesizing profile");
        User::synthesized(user_id, level)
    }
}
