// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Online polls with one vote per member.

use crate::db::collections;
use crate::db::remote::{numeric_id, FirestoreRecord};
use crate::db::value::{
    read_count, read_map_list, read_string, read_string_list, Document, Fields, FieldsBuilder,
    Value,
};
use crate::error::DecodeError;
use crate::time_utils::parse_calendar_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PollOption {
    pub id: String,
    pub text: String,
    pub votes: u32,
}

/// Poll in `polls/{id}`.
///
/// `voted_user_ids` is the only de-duplication mechanism: a user id in it
/// has voted, and vote counts never move otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub title: String,
    pub description: String,
    pub options: Vec<PollOption>,
    pub start_date: String,
    pub end_date: String,
    pub total_votes: u32,
    pub voted_user_ids: Vec<String>,
    pub created_by: String,
    pub created_at: String,
}

impl Poll {
    pub fn has_voted(&self, user_id: &str) -> bool {
        self.voted_user_ids.iter().any(|id| id == user_id)
    }

    /// Whether `today` falls inside the poll's inclusive calendar window.
    ///
    /// A missing or unparseable bound leaves that side open.
    pub fn is_open_on(&self, today: NaiveDate) -> bool {
        let started = parse_calendar_date(&self.start_date).map_or(true, |start| start <= today);
        let not_ended = parse_calendar_date(&self.end_date).map_or(true, |end| today <= end);
        started && not_ended
    }

    /// Next state with one vote for `option_id` from `user_id`.
    ///
    /// `None` if the user already voted or the option does not exist.
    pub fn with_vote(&self, option_id: &str, user_id: &str) -> Option<Self> {
        if self.has_voted(user_id) || !self.options.iter().any(|o| o.id == option_id) {
            return None;
        }
        let mut next = self.clone();
        for option in next.options.iter_mut().filter(|o| o.id == option_id) {
            option.votes = option.votes.saturating_add(1);
        }
        next.total_votes = next.total_votes.saturating_add(1);
        next.voted_user_ids.push(user_id.to_string());
        Some(next)
    }

    /// Per-option counts with their share of all votes (0.0 when nobody voted).
    pub fn results(&self) -> Vec<PollOptionResult> {
        self.options
            .iter()
            .map(|o| PollOptionResult {
                id: o.id.clone(),
                text: o.text.clone(),
                votes: o.votes,
                share: if self.total_votes == 0 {
                    0.0
                } else {
                    f64::from(o.votes) / f64::from(self.total_votes)
                },
            })
            .collect()
    }
}

/// Result line for one option.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollOptionResult {
    pub id: String,
    pub text: String,
    pub votes: u32,
    pub share: f64,
}

impl FirestoreRecord for Poll {
    const COLLECTION: &'static str = collections::POLLS;
    const KIND: &'static str = "Poll";

    fn document_id(&self) -> String {
        self.id.to_string()
    }

    fn to_fields(&self) -> Fields {
        let options = self
            .options
            .iter()
            .map(|o| {
                Value::map(
                    FieldsBuilder::new()
                        .string("id", &o.id)
                        .string("text", &o.text)
                        .integer("votes", i64::from(o.votes))
                        .build(),
                )
            })
            .collect();

        FieldsBuilder::new()
            .integer("id", self.id)
            .string("title", &self.title)
            .string("description", &self.description)
            .value("options", Value::array(options))
            .string("startDate", &self.start_date)
            .string("endDate", &self.end_date)
            .integer("totalVotes", i64::from(self.total_votes))
            .string_array("votedUserIds", self.voted_user_ids.iter().cloned())
            .string("createdBy", &self.created_by)
            .string("createdAt", &self.created_at)
            .build()
    }

    fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        let f = &doc.fields;
        Ok(Self {
            id: numeric_id(doc, "poll")?,
            title: read_string(f, "title"),
            description: read_string(f, "description"),
            options: read_map_list(f, "options")
                .into_iter()
                .map(|o| PollOption {
                    id: read_string(o, "id"),
                    text: read_string(o, "text"),
                    votes: read_count(o, "votes"),
                })
                .collect(),
            start_date: read_string(f, "startDate"),
            end_date: read_string(f, "endDate"),
            total_votes: read_count(f, "totalVotes"),
            voted_user_ids: read_string_list(f, "votedUserIds"),
            created_by: read_string(f, "createdBy"),
            created_at: read_string(f, "createdAt"),
        })
    }
}

/// Fields an admin fills in when creating a poll.
#[derive(Debug, Clone, Validate)]
pub struct PollDraft {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: String,
    /// `(option id, option text)` pairs
    #[validate(length(min = 2))]
    pub options: Vec<(String, String)>,
    pub start_date: String,
    pub end_date: String,
}
