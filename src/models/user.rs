// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Member profiles and admin-issued deletion markers.

use crate::db::remote::{string_id, FirestoreRecord};
use crate::db::value::{read_bool, read_string, Document, Fields, FieldsBuilder};
use crate::db::collections;
use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Membership level of a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum MembershipLevel {
    #[default]
    Basic,
    Full,
    Admin,
}

impl MembershipLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipLevel::Basic => "basic",
            MembershipLevel::Full => "full",
            MembershipLevel::Admin => "admin",
        }
    }

    /// Parse a stored level; anything unknown is `Basic`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "full" => MembershipLevel::Full,
            "admin" => MembershipLevel::Admin,
            _ => MembershipLevel::Basic,
        }
    }

    /// Levels allowed to cast poll votes (rights must still be granted).
    pub fn may_vote(&self) -> bool {
        matches!(self, MembershipLevel::Full | MembershipLevel::Admin)
    }
}

/// User profile stored in `users/{id}` and cached locally under `users`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    /// Normalized identifier (also the document ID)
    pub id: String,
    pub name: String,
    pub level: MembershipLevel,
    pub phone: String,
    pub email: String,
    pub address: String,
    /// Must be granted by an admin before the user can vote
    pub has_voting_rights: bool,
    /// Member asked to be upgraded to full membership
    pub upgrade_requested: bool,
    pub created_at: String,
}

impl User {
    /// Minimal profile used when a session has no profile document.
    pub fn synthesized(id: &str, level: MembershipLevel) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            level,
            ..Self::default()
        }
    }

    pub fn is_admin(&self) -> bool {
        self.level == MembershipLevel::Admin
    }
}

impl FirestoreRecord for User {
    const COLLECTION: &'static str = collections::USERS;
    const KIND: &'static str = "Member profile";

    fn document_id(&self) -> String {
        self.id.clone()
    }

    fn to_fields(&self) -> Fields {
        FieldsBuilder::new()
            .string("id", &self.id)
            .string("name", &self.name)
            .string("level", self.level.as_str())
            .string("phone", &self.phone)
            .string("email", &self.email)
            .string("address", &self.address)
            .boolean("hasVotingRights", self.has_voting_rights)
            .boolean("upgradeRequested", self.upgrade_requested)
            .string("createdAt", &self.created_at)
            .build()
    }

    fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        let f = &doc.fields;
        Ok(Self {
            id: string_id(doc)?,
            name: read_string(f, "name"),
            level: MembershipLevel::parse(&read_string(f, "level")),
            phone: read_string(f, "phone"),
            email: read_string(f, "email"),
            address: read_string(f, "address"),
            has_voting_rights: read_bool(f, "hasVotingRights"),
            upgrade_requested: read_bool(f, "upgradeRequested"),
            created_at: read_string(f, "createdAt"),
        })
    }
}

/// Marker in `deletedUsers/{id}` blocking reuse of an admin-deleted account.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletionMarker {
    pub user_id: String,
    pub deleted_at: String,
    pub deleted_by: String,
}

impl FirestoreRecord for DeletionMarker {
    const COLLECTION: &'static str = collections::DELETED_USERS;
    const KIND: &'static str = "Deletion marker";

    fn document_id(&self) -> String {
        self.user_id.clone()
    }

    fn to_fields(&self) -> Fields {
        FieldsBuilder::new()
            .string("userId", &self.user_id)
            .string("deletedAt", &self.deleted_at)
            .string("deletedBy", &self.deleted_by)
            .build()
    }

    fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        Ok(Self {
            user_id: string_id(doc)?,
            deleted_at: read_string(&doc.fields, "deletedAt"),
            deleted_by: read_string(&doc.fields, "deletedBy"),
        })
    }
}

/// Sign-up form.
#[derive(Debug, Clone, Validate)]
pub struct SignUpRequest {
    #[validate(length(min = 3, max = 30))]
    pub user_id: String,
    #[validate(length(min = 6, max = 64))]
    pub password: String,
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(length(max = 20))]
    pub phone: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 200))]
    pub address: String,
}

/// Editable profile fields.
#[derive(Debug, Clone, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(length(max = 20))]
    pub phone: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 200))]
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::value::Value;

    #[test]
    fn test_level_parse_is_lenient() {
        assert_eq!(MembershipLevel::parse("FULL"), MembershipLevel::Full);
        assert_eq!(MembershipLevel::parse("admin"), MembershipLevel::Admin);
        assert_eq!(MembershipLevel::parse("gold"), MembershipLevel::Basic);
        assert_eq!(MembershipLevel::parse(""), MembershipLevel::Basic);
    }

    #[test]
    fn test_user_decode_defaults_malformed_fields() {
        let mut fields = Fields::new();
        fields.insert("name".into(), Value::string("Kim"));
        fields.insert("hasVotingRights".into(), Value::string("yes please"));
        fields.insert("level".into(), Value::integer(3));

        let doc = Document::new("projects/p/databases/(default)/documents/users/kim01", fields);
        let user = User::from_document(&doc).unwrap();

        assert_eq!(user.id, "kim01");
        assert_eq!(user.name, "Kim");
        assert_eq!(user.level, MembershipLevel::Basic);
        assert!(!user.has_voting_rights);
        assert_eq!(user.phone, "");
    }

    #[test]
    fn test_user_without_name_is_rejected() {
        let doc = Document::new("", Fields::new());
        assert_eq!(User::from_document(&doc), Err(DecodeError::MissingName));
    }

    #[test]
    fn test_local_cache_tolerates_missing_fields() {
        let user: User = serde_json::from_str(r#"{"id":"u1","level":"full"}"#).unwrap();
        assert_eq!(user.level, MembershipLevel::Full);
        assert!(!user.upgrade_requested);
    }
}
