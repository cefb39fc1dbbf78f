// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profiles, membership management, account deletion, bulk import and SMS.

use super::Store;
use crate::db::remote::Write;
use crate::error::{AppError, Result};
use crate::models::{DeletionMarker, MembershipLevel, ProfileUpdate, User};
use crate::services::{auth_email, normalize_identifier, AdminApiResponse};
use crate::time_utils::now_rfc3339;
use std::collections::HashSet;
use validator::Validate;

/// Minimum number of phone digits usable as an initial password.
const MIN_PASSWORD_DIGITS: usize = 6;

/// Which remote clean-up steps of a deletion succeeded.
///
/// Local removal happens regardless.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteCleanup {
    pub marker_written: bool,
    pub profile_deleted: bool,
    pub account_deleted: bool,
}

/// One row of an admin bulk import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkUserRow {
    pub user_id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

impl BulkUserRow {
    /// Parse `id,name,phone[,email[,address]]` lines.
    ///
    /// Blank lines and a leading header line starting with `id` are skipped.
    pub fn parse_csv(text: &str) -> Vec<Self> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .filter(|(i, line)| {
                let first_cell = line.split(',').next().unwrap_or("").trim();
                !(*i == 0 && first_cell.eq_ignore_ascii_case("id"))
            })
            .map(|(_, line)| {
                let mut cells = line.split(',').map(|c| c.trim().to_string());
                Self {
                    user_id: cells.next().unwrap_or_default(),
                    name: cells.next().unwrap_or_default(),
                    phone: cells.next().unwrap_or_default(),
                    email: cells.next().unwrap_or_default(),
                    address: cells.next().unwrap_or_default(),
                }
            })
            .collect()
    }

    /// Initial password: the digits of the phone number.
    pub fn derived_password(&self) -> String {
        self.phone.chars().filter(char::is_ascii_digit).collect()
    }
}

/// Outcome of a bulk import. Rows fail independently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkCreateResult {
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl Store {
    // ─── Own Profile ────────────────────────────────────────────

    pub async fn update_profile(&mut self, update: ProfileUpdate) -> Result<User> {
        update.validate()?;
        let mut next = self.require_login()?.clone();
        next.name = update.name.trim().to_string();
        next.phone = update.phone.trim().to_string();
        next.email = update.email.unwrap_or_default();
        next.address = update.address.trim().to_string();

        self.authorized_write(Write::Update(&next)).await?;
        self.commit_user(next.clone());
        Ok(next)
    }

    /// Ask an admin for full membership.
    pub async fn request_upgrade(&mut self) -> Result<User> {
        let user = self.require_login()?;
        if user.level != MembershipLevel::Basic {
            return Err(AppError::Rejected("You are already a full member".to_string()));
        }
        if user.upgrade_requested {
            return Err(AppError::Rejected("An upgrade request is already pending".to_string()));
        }
        let next = User {
            upgrade_requested: true,
            ..user.clone()
        };

        self.authorized_write(Write::Update(&next)).await?;
        self.commit_user(next.clone());
        Ok(next)
    }

    // ─── Admin Membership Management ────────────────────────────

    /// Fetch the full member list (admin).
    pub async fn load_directory(&mut self) -> Result<&[User]> {
        let token = self.admin_token().await?;
        let users = self
            .remote
            .fetch_list::<User>(Some(&token))
            .await
            .ok_or_else(|| AppError::Database("member list unavailable".to_string()))?;
        self.directory = users;
        Ok(&self.directory)
    }

    /// Users with a pending upgrade request.
    pub fn upgrade_requests(&self) -> Vec<&User> {
        let mut seen = HashSet::new();
        self.users
            .iter()
            .chain(self.directory.iter())
            .filter(|u| u.upgrade_requested && seen.insert(u.id.as_str()))
            .collect()
    }

    pub async fn approve_upgrade(&mut self, user_id: &str) -> Result<User> {
        self.require_admin()?;
        let user = self.resolve_user(user_id).await?;
        let next = User {
            level: user.level.max(MembershipLevel::Full),
            upgrade_requested: false,
            ..user
        };
        self.save_member(next).await
    }

    pub async fn change_level(&mut self, user_id: &str, level: MembershipLevel) -> Result<User> {
        self.require_admin()?;
        if user_id == self.config.admin_user_id && level != MembershipLevel::Admin {
            return Err(AppError::Rejected(
                "The site administrator cannot be demoted".to_string(),
            ));
        }
        let user = self.resolve_user(user_id).await?;
        let next = User {
            level,
            upgrade_requested: user.upgrade_requested && level == MembershipLevel::Basic,
            ..user
        };
        self.save_member(next).await
    }

    pub async fn set_voting_rights(&mut self, user_id: &str, granted: bool) -> Result<User> {
        self.require_admin()?;
        let user = self.resolve_user(user_id).await?;
        let next = User {
            has_voting_rights: granted,
            ..user
        };
        self.save_member(next).await
    }

    async fn save_member(&mut self, next: User) -> Result<User> {
        self.authorized_write(Write::Update(&next)).await?;
        tracing::info!(user_id = %next.id, level = next.level.as_str(), "Member updated");
        self.commit_user(next.clone());
        Ok(next)
    }

    /// Local copy of a user, falling back to the remote profile.
    async fn resolve_user(&mut self, user_id: &str) -> Result<User> {
        if let Some(user) = self.find_user(user_id) {
            return Ok(user.clone());
        }
        let token = self.admin_token().await?;
        self.remote
            .fetch_user(user_id, Some(&token))
            .await
            .ok_or_else(|| AppError::NotFound(format!("member {}", user_id)))
    }

    // ─── Account Deletion ───────────────────────────────────────

    /// Delete the logged-in user's own account and log out.
    pub async fn withdraw(&mut self) -> Result<RemoteCleanup> {
        let user_id = self.require_login()?.id.clone();
        if user_id == self.config.admin_user_id {
            return Err(AppError::Rejected(
                "The site administrator account cannot be withdrawn".to_string(),
            ));
        }

        let mut cleanup = RemoteCleanup::default();
        match self.token_for(&user_id).await {
            Some(token) => {
                cleanup.profile_deleted = self.remote.delete::<User>(&user_id, Some(&token)).await;
                cleanup.account_deleted = match self.identity.delete_account(&token).await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(user_id = %user_id, error = %e, "Failed to delete auth account");
                        false
                    }
                };
            }
            None => tracing::warn!(user_id = %user_id, "No token; withdrawing locally only"),
        }

        tracing::info!(user_id = %user_id, ?cleanup, "Member withdrew");
        self.remove_user_locally(&user_id);
        self.end_session();
        Ok(cleanup)
    }

    /// Delete another member's account (admin).
    ///
    /// Writes a deletion marker, deletes the profile and asks the admin
    /// endpoint to delete the auth account. Local removal always proceeds.
    pub async fn admin_delete_user(&mut self, user_id: &str) -> Result<RemoteCleanup> {
        let admin_id = self.require_admin()?.id.clone();
        if user_id == admin_id || user_id == self.config.admin_user_id {
            return Err(AppError::Rejected("Administrators cannot be deleted here".to_string()));
        }

        let mut cleanup = RemoteCleanup::default();
        match self.token_for(&admin_id).await {
            Some(token) => {
                let marker = DeletionMarker {
                    user_id: user_id.to_string(),
                    deleted_at: now_rfc3339(),
                    deleted_by: admin_id.clone(),
                };
                cleanup.marker_written = self.remote.mark_deleted(&marker, Some(&token)).await;
                cleanup.profile_deleted = self.remote.delete::<User>(user_id, Some(&token)).await;

                let email = auth_email(user_id, &self.config.auth_email_domain);
                cleanup.account_deleted =
                    match self.admin_api.delete_auth_user(&token, user_id, &email).await {
                        Ok(response) if response.ok => true,
                        Ok(response) => {
                            tracing::warn!(user_id, message = ?response.message, "Auth deletion refused");
                            false
                        }
                        Err(e) => {
                            tracing::warn!(user_id, error = %e, "Auth deletion failed");
                            false
                        }
                    };
            }
            None => tracing::warn!(user_id, "No admin token; deleting locally only"),
        }

        tracing::info!(user_id, deleted_by = %admin_id, ?cleanup, "Member deleted");
        self.remove_user_locally(user_id);
        if self.credentials.session_user() == Some(user_id) {
            self.credentials.clear_session();
            self.persist_credentials();
        }
        Ok(cleanup)
    }

    // ─── Bulk Import ────────────────────────────────────────────

    /// Create accounts for each row (admin). The phone digits become the password.
    pub async fn bulk_create_users(&mut self, rows: &[BulkUserRow]) -> Result<BulkCreateResult> {
        self.require_admin()?;
        let domain = self.config.auth_email_domain.clone();
        let mut result = BulkCreateResult::default();
        let mut seen = HashSet::new();

        for (index, row) in rows.iter().enumerate() {
            let line = index + 1;
            match self.create_row(row, &domain, &mut seen).await {
                Ok(user_id) => {
                    tracing::debug!(line, user_id = %user_id, "Bulk row created");
                    result.success += 1;
                }
                Err(message) => {
                    tracing::info!(line, %message, "Bulk row failed");
                    result.failed += 1;
                    result.errors.push(format!("Row {}: {}", line, message));
                }
            }
        }

        tracing::info!(success = result.success, failed = result.failed, "Bulk import finished");
        Ok(result)
    }

    async fn create_row(
        &mut self,
        row: &BulkUserRow,
        domain: &str,
        seen: &mut HashSet<String>,
    ) -> std::result::Result<String, String> {
        let user_id = normalize_identifier(&row.user_id, domain);
        if user_id.is_empty() {
            return Err("missing ID".to_string());
        }
        if self.find_user(&user_id).is_some() || !seen.insert(user_id.clone()) {
            return Err(format!("{}: ID already exists", user_id));
        }
        let password = row.derived_password();
        if password.len() < MIN_PASSWORD_DIGITS {
            return Err(format!(
                "{}: phone number must have at least {} digits to be used as the password",
                user_id, MIN_PASSWORD_DIGITS
            ));
        }

        let auth = self
            .identity
            .sign_up(&auth_email(&user_id, domain), &password)
            .await
            .map_err(|e| format!("{}: {}", user_id, e.user_message()))?;

        let user = User {
            id: user_id.clone(),
            name: if row.name.is_empty() {
                user_id.clone()
            } else {
                row.name.clone()
            },
            level: MembershipLevel::Basic,
            phone: row.phone.clone(),
            email: row.email.clone(),
            address: row.address.clone(),
            has_voting_rights: false,
            upgrade_requested: false,
            created_at: now_rfc3339(),
        };
        if !self.remote.update(&user, Some(&auth.id_token)).await {
            tracing::warn!(user_id = %user_id, "Profile document not saved for imported member");
        }

        self.credentials.remember_proof(&user_id, &password);
        self.persist_credentials();
        self.upsert_user(user);
        Ok(user_id)
    }

    // ─── SMS ────────────────────────────────────────────────────

    /// Send a text message to phone numbers through the admin endpoint.
    pub async fn send_sms(&mut self, recipients: &[String], message: &str) -> Result<AdminApiResponse> {
        let admin_id = self.require_admin()?.id.clone();
        let recipients: Vec<String> = recipients
            .iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        if recipients.is_empty() || message.trim().is_empty() {
            return Err(AppError::BadRequest("recipients and message are required".to_string()));
        }

        let token = self.token_for(&admin_id).await.ok_or(AppError::NoToken)?;
        let response = self.admin_api.send_sms(&token, &recipients, message).await?;
        if !response.ok {
            return Err(AppError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "SMS sending failed".to_string()),
            ));
        }
        tracing::info!(
            recipients = recipients.len(),
            success = ?response.success_count,
            failed = ?response.failed_count,
            "SMS sent"
        );
        Ok(response)
    }

    /// Phone numbers of every known member, for an SMS broadcast.
    pub fn member_phone_numbers(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.users
            .iter()
            .chain(self.directory.iter())
            .filter(|u| !u.phone.is_empty() && seen.insert(u.phone.clone()))
            .map(|u| u.phone.clone())
            .collect()
    }
}
