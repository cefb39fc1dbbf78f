// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Repair local users that drifted from the identity provider.

use super::{Fingerprint, Store};
use crate::services::reconcile::{orphaned_users, sweep_credentials};

/// What a reconciliation removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    /// Non-admin users dropped for having no cached proof
    pub orphans: Vec<String>,
    /// Accounts gone at the identity provider
    pub deleted: Vec<String>,
    /// Users whose cached password stopped working
    pub invalid_proof: Vec<String>,
    /// The logged-in user was among the purged and has been logged out
    pub logged_out: bool,
}

impl Store {
    /// Run the orphan sweep and the credential sweep.
    pub async fn reconcile(&mut self) -> ReconcileReport {
        let admin_id = self.config.admin_user_id.clone();
        let mut report = ReconcileReport {
            orphans: orphaned_users(&self.users, self.credentials.proofs(), &admin_id),
            ..ReconcileReport::default()
        };
        if !report.orphans.is_empty() {
            tracing::info!(orphans = ?report.orphans, "Removing local users without credentials");
            self.users.retain(|u| !report.orphans.contains(&u.id));
            self.persist_users();
        }

        let candidates: Vec<(String, String)> = self
            .users
            .iter()
            .filter(|u| !self.is_admin(u))
            .filter_map(|u| {
                self.credentials
                    .proof(&u.id)
                    .map(|p| (u.id.clone(), p.to_string()))
            })
            .collect();

        let sweep = sweep_credentials(
            self.identity.as_ref(),
            &self.config.auth_email_domain,
            candidates,
        )
        .await;

        for user_id in sweep.purged() {
            self.users.retain(|u| &u.id != user_id);
            self.credentials.forget_proof(user_id);
        }
        if !sweep.is_empty() {
            self.persist_users();
            self.persist_credentials();
        }

        let current = self
            .current_user
            .as_ref()
            .filter(|u| !self.is_admin(u))
            .map(|u| u.id.clone())
            .or_else(|| {
                self.credentials
                    .session_user()
                    .filter(|id| *id != admin_id)
                    .map(str::to_string)
            });
        if let Some(user_id) = current {
            if sweep.purged().any(|id| *id == user_id) {
                tracing::info!(user_id = %user_id, "Logging out purged user");
                self.end_session();
                report.logged_out = true;
            }
        }

        tracing::info!(
            orphans = report.orphans.len(),
            deleted = sweep.deleted.len(),
            invalid_proof = sweep.invalid_proof.len(),
            inconclusive = sweep.inconclusive,
            "Reconciliation finished"
        );
        report.deleted = sweep.deleted;
        report.invalid_proof = sweep.invalid_proof;
        self.last_reconciled = Some(self.fingerprint());
        report
    }

    /// Reconcile only if users or cached proofs changed since the last run.
    pub async fn reconcile_if_changed(&mut self) -> Option<ReconcileReport> {
        if self.last_reconciled.as_ref() == Some(&self.fingerprint()) {
            return None;
        }
        Some(self.reconcile().await)
    }

    fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            users: self.users.iter().map(|u| u.id.clone()).collect(),
            proofs: self
                .credentials
                .proofs()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}
