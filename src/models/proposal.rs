// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Member proposals to the association board.

use crate::db::collections;
use crate::db::remote::{numeric_id, FirestoreRecord};
use crate::db::value::{read_optional_string, read_string, Document, Fields, FieldsBuilder};
use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    #[default]
    Submitted,
    Reviewing,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Submitted => "submitted",
            ProposalStatus::Reviewing => "reviewing",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "reviewing" => ProposalStatus::Reviewing,
            "accepted" => ProposalStatus::Accepted,
            "rejected" => ProposalStatus::Rejected,
            _ => ProposalStatus::Submitted,
        }
    }
}

/// Proposal in `proposals/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub author_name: String,
    pub created_at: String,
    pub status: ProposalStatus,
    pub admin_reply: Option<String>,
}

impl FirestoreRecord for Proposal {
    const COLLECTION: &'static str = collections::PROPOSALS;
    const KIND: &'static str = "Proposal";

    fn document_id(&self) -> String {
        self.id.to_string()
    }

    fn to_fields(&self) -> Fields {
        FieldsBuilder::new()
            .integer("id", self.id)
            .string("title", &self.title)
            .string("content", &self.content)
            .string("authorId", &self.author_id)
            .string("authorName", &self.author_name)
            .string("createdAt", &self.created_at)
            .string("status", self.status.as_str())
            .optional_string("adminReply", self.admin_reply.as_deref())
            .build()
    }

    fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        let f = &doc.fields;
        Ok(Self {
            id: numeric_id(doc, "proposal")?,
            title: read_string(f, "title"),
            content: read_string(f, "content"),
            author_id: read_string(f, "authorId"),
            author_name: read_string(f, "authorName"),
            created_at: read_string(f, "createdAt"),
            status: ProposalStatus::parse(&read_string(f, "status")),
            admin_reply: read_optional_string(f, "adminReply"),
        })
    }
}

#[derive(Debug, Clone, Validate)]
pub struct ProposalDraft {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}
