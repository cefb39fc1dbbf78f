// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential proofs and the single active session.
//!
//! A session pairing caches one bearer token with its expiry. Tokens are
//! re-derived from the cached password proof only when the pairing is for
//! another user, is about to expire, or was invalidated after a `401`.

use crate::services::identity::{auth_email, AuthSession, IdentityProvider};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Margin before token expiration when we proactively refresh (5 minutes).
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Active session, persisted under `firebaseSession`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub token: String,
    /// Missing for sessions written before expiry was tracked; those count as expired.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn from_auth(user_id: &str, auth: &AuthSession) -> Self {
        Self {
            user_id: user_id.to_string(),
            token: auth.id_token.clone(),
            expires_at: Some(auth.expires_at),
        }
    }

    /// Token still usable at `now` with the refresh margin applied.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let margin = Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);
        self.expires_at.is_some_and(|expires_at| now + margin < expires_at)
    }
}

/// Cached password proofs plus at most one session.
#[derive(Debug, Clone, Default)]
pub struct CredentialCache {
    proofs: HashMap<String, String>,
    session: Option<Session>,
}

impl CredentialCache {
    pub fn new(proofs: HashMap<String, String>, session: Option<Session>) -> Self {
        Self { proofs, session }
    }

    // ─── Proofs ─────────────────────────────────────────────────

    pub fn proofs(&self) -> &HashMap<String, String> {
        &self.proofs
    }

    pub fn proof(&self, user_id: &str) -> Option<&str> {
        self.proofs.get(user_id).map(String::as_str)
    }

    pub fn has_proof(&self, user_id: &str) -> bool {
        self.proofs.contains_key(user_id)
    }

    pub fn remember_proof(&mut self, user_id: &str, password: &str) {
        self.proofs.insert(user_id.to_string(), password.to_string());
    }

    /// Drop a proof. Returns whether one was held.
    pub fn forget_proof(&mut self, user_id: &str) -> bool {
        self.proofs.remove(user_id).is_some()
    }

    // ─── Session ────────────────────────────────────────────────

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_user(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.user_id.as_str())
    }

    pub fn open_session(&mut self, user_id: &str, auth: &AuthSession) {
        self.session = Some(Session::from_auth(user_id, auth));
    }

    pub fn clear_session(&mut self) {
        self.session = None;
    }

    /// Force the next `token_for` to re-derive (the backend rejected the token).
    pub fn invalidate_token(&mut self, user_id: &str) {
        if let Some(session) = self.session.as_mut().filter(|s| s.user_id == user_id) {
            session.expires_at = None;
        }
    }

    /// Obtain a bearer token for `user_id`.
    ///
    /// 1. A fresh pairing for this user is returned as is.
    /// 2. Otherwise sign in with the cached proof; on success the pairing is
    ///    refreshed if it belongs to this user (or there is none).
    /// 3. If that fails, fall back to the pairing's token for this user, even
    ///    if it looks stale; the backend will say whether it still works.
    ///
    /// A rejected proof is not forgotten here: only the credential sweep
    /// removes proofs, so a transient error never destroys credentials.
    pub async fn token_for(
        &mut self,
        identity: &dyn IdentityProvider,
        email_domain: &str,
        user_id: &str,
    ) -> Option<String> {
        let now = Utc::now();
        let paired = self.session.as_ref().filter(|s| s.user_id == user_id);
        if let Some(session) = paired.filter(|s| s.is_fresh(now)) {
            return Some(session.token.clone());
        }

        if let Some(password) = self.proofs.get(user_id).cloned() {
            let email = auth_email(user_id, email_domain);
            match identity.sign_in(&email, &password).await {
                Ok(auth) => {
                    tracing::debug!(user_id, "Re-derived token from cached proof");
                    let owns_pairing = self
                        .session
                        .as_ref()
                        .map_or(true, |s| s.user_id == user_id);
                    if owns_pairing {
                        self.open_session(user_id, &auth);
                    }
                    return Some(auth.id_token);
                }
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "Token re-derivation failed");
                }
            }
        }

        self.session
            .as_ref()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::identity::MemoryIdentity;

    const DOMAIN: &str = "members.civic.local";

    fn identity_with(user_id: &str, password: &str) -> MemoryIdentity {
        let identity = MemoryIdentity::new();
        identity.add_account(&auth_email(user_id, DOMAIN), password);
        identity
    }

    #[tokio::test]
    async fn test_fresh_token_is_reused() {
        let identity = identity_with("kim01", "secret1");
        let auth = identity
            .sign_in(&auth_email("kim01", DOMAIN), "secret1")
            .await
            .unwrap();
        let mut cache = CredentialCache::default();
        cache.remember_proof("kim01", "secret1");
        cache.open_session("kim01", &auth);

        let token = cache.token_for(&identity, DOMAIN, "kim01").await;
        assert_eq!(token.as_deref(), Some(auth.id_token.as_str()));
        assert_eq!(identity.sign_in_count(), 1);
    }

    #[tokio::test]
    async fn test_expired_token_is_rederived() {
        let identity = identity_with("kim01", "secret1");
        let mut cache = CredentialCache::new(
            HashMap::from([("kim01".to_string(), "secret1".to_string())]),
            Some(Session {
                user_id: "kim01".to_string(),
                token: "old".to_string(),
                expires_at: Some(Utc::now() + Duration::seconds(60)),
            }),
        );

        let token = cache.token_for(&identity, DOMAIN, "kim01").await.unwrap();
        assert_ne!(token, "old");
        assert_eq!(cache.session().unwrap().token, token);
        assert!(cache.session().unwrap().is_fresh(Utc::now()));
    }

    #[tokio::test]
    async fn test_rejected_proof_falls_back_to_pairing() {
        let identity = identity_with("kim01", "changed");
        let mut cache = CredentialCache::new(
            HashMap::from([("kim01".to_string(), "secret1".to_string())]),
            Some(Session {
                user_id: "kim01".to_string(),
                token: "old".to_string(),
                expires_at: None,
            }),
        );

        let token = cache.token_for(&identity, DOMAIN, "kim01").await;
        assert_eq!(token.as_deref(), Some("old"));
        // the proof survives a rejection here
        assert!(cache.has_proof("kim01"));
    }

    #[tokio::test]
    async fn test_no_proof_no_pairing_is_none() {
        let identity = MemoryIdentity::new();
        let mut cache = CredentialCache::default();
        assert!(cache.token_for(&identity, DOMAIN, "nobody").await.is_none());
    }

    #[tokio::test]
    async fn test_other_users_pairing_is_kept() {
        let identity = identity_with("lee02", "secret2");
        let mut cache = CredentialCache::new(
            HashMap::from([("lee02".to_string(), "secret2".to_string())]),
            Some(Session {
                user_id: "admin".to_string(),
                token: "admin-token".to_string(),
                expires_at: None,
            }),
        );

        assert!(cache.token_for(&identity, DOMAIN, "lee02").await.is_some());
        assert_eq!(cache.session_user(), Some("admin"));
    }

    #[test]
    fn test_legacy_session_without_expiry_loads() {
        let session: Session =
            serde_json::from_str(r#"{"userId":"kim01","token":"t"}"#).unwrap();
        assert!(session.expires_at.is_none());
        assert!(!session.is_fresh(Utc::now()));
    }
}
