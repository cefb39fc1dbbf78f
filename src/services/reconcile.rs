// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Drift detection between local users and the identity provider.
//!
//! Nothing here mutates state; the store applies the verdicts.

use crate::models::User;
use crate::services::identity::{auth_email, AuthError, AuthErrorCode, IdentityProvider};
use futures_util::stream::{self, StreamExt};
use std::collections::HashMap;

/// Maximum concurrent sign-ins during a credential sweep.
const MAX_CONCURRENT_SIGN_INS: usize = 8;

/// What a sign-in with a cached proof tells us about the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInVerdict {
    Valid,
    /// The account no longer exists at the provider
    Deleted,
    /// The account exists but the cached password is wrong
    StaleProof,
    /// Network or other failure; never evidence of anything
    Inconclusive,
}

/// Classify a sign-in failure that is unambiguous on its own.
///
/// The merged `INVALID_LOGIN_CREDENTIALS` code needs a registration lookup
/// and is classified by [`verify_proof`].
pub fn classify_sign_in_error(error: &AuthError) -> SignInVerdict {
    match error.code {
        AuthErrorCode::EmailNotFound => SignInVerdict::Deleted,
        AuthErrorCode::InvalidPassword => SignInVerdict::StaleProof,
        _ => SignInVerdict::Inconclusive,
    }
}

/// Sign in with a cached proof and classify the outcome.
pub async fn verify_proof(
    identity: &dyn IdentityProvider,
    email: &str,
    password: &str,
) -> SignInVerdict {
    let error = match identity.sign_in(email, password).await {
        Ok(_) => return SignInVerdict::Valid,
        Err(e) => e,
    };

    if error.code != AuthErrorCode::InvalidLoginCredentials {
        return classify_sign_in_error(&error);
    }

    // Only a definite "not registered" means deleted.
    match identity.is_registered(email).await {
        Ok(Some(false)) => SignInVerdict::Deleted,
        Ok(Some(true)) | Ok(None) => SignInVerdict::StaleProof,
        Err(e) => {
            tracing::debug!(email, error = %e, "Registration lookup failed");
            SignInVerdict::Inconclusive
        }
    }
}

/// Non-admin local users with no cached proof.
pub fn orphaned_users(
    users: &[User],
    proofs: &HashMap<String, String>,
    admin_user_id: &str,
) -> Vec<String> {
    users
        .iter()
        .filter(|u| !u.is_admin() && u.id != admin_user_id && !proofs.contains_key(&u.id))
        .map(|u| u.id.clone())
        .collect()
}

/// Outcome of a credential sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    /// Users whose accounts are gone at the provider
    pub deleted: Vec<String>,
    /// Users whose cached password no longer works
    pub invalid_proof: Vec<String>,
    /// Users left untouched because the check was inconclusive
    pub inconclusive: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.invalid_proof.is_empty()
    }

    /// Every user the sweep says must be purged.
    pub fn purged(&self) -> impl Iterator<Item = &String> {
        self.deleted.iter().chain(self.invalid_proof.iter())
    }
}

/// Sign in with every candidate's cached proof, concurrently.
///
/// `candidates` are `(user id, password)` pairs and should already exclude
/// admins.
pub async fn sweep_credentials(
    identity: &dyn IdentityProvider,
    email_domain: &str,
    candidates: Vec<(String, String)>,
) -> SweepReport {
    let verdicts: Vec<(String, SignInVerdict)> = stream::iter(candidates)
        .map(|(user_id, password)| async move {
            let email = auth_email(&user_id, email_domain);
            let verdict = verify_proof(identity, &email, &password).await;
            (user_id, verdict)
        })
        .buffer_unordered(MAX_CONCURRENT_SIGN_INS)
        .collect()
        .await;

    let mut report = SweepReport::default();
    for (user_id, verdict) in verdicts {
        match verdict {
            SignInVerdict::Valid => {}
            SignInVerdict::Deleted => {
                tracing::info!(user_id = %user_id, "Account deleted at identity provider");
                report.deleted.push(user_id);
            }
            SignInVerdict::StaleProof => {
                tracing::info!(user_id = %user_id, "Cached credential no longer valid");
                report.invalid_proof.push(user_id);
            }
            SignInVerdict::Inconclusive => report.inconclusive += 1,
        }
    }
    report.deleted.sort();
    report.invalid_proof.sort();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MembershipLevel;
    use crate::services::identity::{AuthSession, MemoryIdentity};

    const DOMAIN: &str = "members.civic.local";

    #[test]
    fn test_classification_table() {
        let err = |code| AuthError::new(code, "");
        assert_eq!(
            classify_sign_in_error(&err(AuthErrorCode::EmailNotFound)),
            SignInVerdict::Deleted
        );
        assert_eq!(
            classify_sign_in_error(&err(AuthErrorCode::InvalidPassword)),
            SignInVerdict::StaleProof
        );
        assert_eq!(
            classify_sign_in_error(&err(AuthErrorCode::Network)),
            SignInVerdict::Inconclusive
        );
        assert_eq!(
            classify_sign_in_error(&err(AuthErrorCode::TooManyAttempts)),
            SignInVerdict::Inconclusive
        );
    }

    #[test]
    fn test_orphans_exclude_admins() {
        let users = vec![
            User::synthesized("admin", MembershipLevel::Admin),
            User::synthesized("boss", MembershipLevel::Admin),
            User::synthesized("kim01", MembershipLevel::Basic),
            User::synthesized("lee02", MembershipLevel::Full),
        ];
        let proofs = HashMap::from([("lee02".to_string(), "pw".to_string())]);
        assert_eq!(orphaned_users(&users, &proofs, "admin"), vec!["kim01".to_string()]);
    }

    #[tokio::test]
    async fn test_sweep_sorts_verdicts() {
        let identity = MemoryIdentity::new();
        identity.add_account(&auth_email("ok", DOMAIN), "secret1");
        identity.add_account(&auth_email("moved", DOMAIN), "newpass");

        let report = sweep_credentials(
            &identity,
            DOMAIN,
            vec![
                ("ok".to_string(), "secret1".to_string()),
                ("moved".to_string(), "secret1".to_string()),
                ("gone".to_string(), "secret1".to_string()),
            ],
        )
        .await;

        assert_eq!(report.deleted, vec!["gone".to_string()]);
        assert_eq!(report.invalid_proof, vec!["moved".to_string()]);
        assert_eq!(report.inconclusive, 0);
    }

    /// Signs in through `MemoryIdentity` with enumeration protection on, but
    /// answers registration lookups truthfully.
    struct LookupProvider {
        inner: MemoryIdentity,
    }

    #[async_trait::async_trait]
    impl IdentityProvider for LookupProvider {
        async fn is_registered(&self, email: &str) -> Result<Option<bool>, AuthError> {
            Ok(Some(self.inner.has_account(email)))
        }
        async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
            self.inner.sign_up(email, password).await
        }
        async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
            self.inner.sign_in(email, password).await
        }
        async fn delete_account(&self, id_token: &str) -> Result<(), AuthError> {
            self.inner.delete_account(id_token).await
        }
    }

    #[tokio::test]
    async fn test_merged_code_uses_registration_lookup() {
        let inner = MemoryIdentity::new();
        inner.set_enumeration_protection(true);
        inner.add_account(&auth_email("moved", DOMAIN), "newpass");
        let identity = LookupProvider { inner };

        let stale = verify_proof(&identity, &auth_email("moved", DOMAIN), "old").await;
        let gone = verify_proof(&identity, &auth_email("gone", DOMAIN), "old").await;
        assert_eq!(stale, SignInVerdict::StaleProof);
        assert_eq!(gone, SignInVerdict::Deleted);
    }

    #[tokio::test]
    async fn test_withheld_lookup_means_stale_proof() {
        let identity = MemoryIdentity::new();
        identity.set_enumeration_protection(true);
        identity.add_account(&auth_email("moved", DOMAIN), "newpass");

        let report = sweep_credentials(
            &identity,
            DOMAIN,
            vec![
                ("moved".to_string(), "old".to_string()),
                ("gone".to_string(), "old".to_string()),
            ],
        )
        .await;
        assert!(report.deleted.is_empty());
        assert_eq!(
            report.invalid_proof,
            vec!["gone".to_string(), "moved".to_string()]
        );
    }

    #[tokio::test]
    async fn test_offline_sweep_touches_nobody() {
        let identity = MemoryIdentity::new();
        identity.set_offline(true);
        let report = sweep_credentials(
            &identity,
            DOMAIN,
            vec![("kim01".to_string(), "secret1".to_string())],
        )
        .await;
        assert!(report.is_empty());
        assert_eq!(report.inconclusive, 1);
    }
}
