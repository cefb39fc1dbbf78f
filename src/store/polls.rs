// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Polls and voting.
//!
//! The backend enforces nothing, so every eligibility rule is checked here
//! before any remote call.

use super::{next_timestamp_id, Store};
use crate::db::remote::Write;
use crate::error::{AppError, Result};
use crate::models::{Poll, PollDraft, PollOption, PollOptionResult};
use crate::time_utils::{now_rfc3339, parse_calendar_date};
use std::collections::HashSet;
use validator::Validate;

impl Store {
    pub fn poll(&self, id: i64) -> Option<&Poll> {
        self.polls.iter().find(|p| p.id == id)
    }

    fn existing_poll(&self, id: i64) -> Result<&Poll> {
        self.poll(id)
            .ok_or_else(|| AppError::NotFound(format!("poll {}", id)))
    }

    /// Create a poll (admin).
    pub async fn create_poll(&mut self, draft: PollDraft) -> Result<Poll> {
        draft.validate()?;
        let admin_id = self.require_admin()?.id.clone();

        let mut ids = HashSet::new();
        for (id, text) in &draft.options {
            if id.trim().is_empty() || text.trim().is_empty() {
                return Err(AppError::BadRequest("every option needs an id and text".to_string()));
            }
            if !ids.insert(id.trim()) {
                return Err(AppError::BadRequest(format!("duplicate option id {}", id)));
            }
        }
        match (
            parse_calendar_date(&draft.start_date),
            parse_calendar_date(&draft.end_date),
        ) {
            (Some(start), Some(end)) if start <= end => {}
            _ => {
                return Err(AppError::BadRequest(
                    "poll needs a start date on or before its end date".to_string(),
                ))
            }
        }

        let poll = Poll {
            id: next_timestamp_id(self.polls.iter().map(|p| p.id)),
            title: draft.title,
            description: draft.description,
            options: draft
                .options
                .into_iter()
                .map(|(id, text)| PollOption {
                    id: id.trim().to_string(),
                    text: text.trim().to_string(),
                    votes: 0,
                })
                .collect(),
            start_date: draft.start_date,
            end_date: draft.end_date,
            total_votes: 0,
            voted_user_ids: Vec::new(),
            created_by: admin_id,
            created_at: now_rfc3339(),
        };

        self.authorized_write(Write::Create(&poll)).await?;
        tracing::info!(poll_id = poll.id, options = poll.options.len(), "Poll created");
        self.polls.insert(0, poll.clone());
        Ok(poll)
    }

    pub async fn delete_poll(&mut self, id: i64) -> Result<()> {
        self.require_admin()?;
        self.existing_poll(id)?;
        let doc_id = id.to_string();
        self.authorized_write(Write::<Poll>::Delete(&doc_id)).await?;
        tracing::info!(poll_id = id, "Poll deleted");
        self.polls.retain(|p| p.id != id);
        Ok(())
    }

    /// Cast the logged-in user's vote.
    ///
    /// Refused without a remote call unless the user is a full member or
    /// admin, was granted voting rights, has not voted yet, and the poll is
    /// open today.
    pub async fn vote(&mut self, poll_id: i64, option_id: &str) -> Result<Poll> {
        let user = self.require_login()?.clone();
        let poll = self.existing_poll(poll_id)?.clone();

        if !user.level.may_vote() {
            return Err(AppError::Forbidden("only full members can vote".to_string()));
        }
        if !user.has_voting_rights {
            return Err(AppError::Forbidden("voting rights have not been granted".to_string()));
        }
        if poll.has_voted(&user.id) {
            return Err(AppError::Rejected("You have already voted in this poll".to_string()));
        }
        if !poll.is_open_on(self.today()) {
            return Err(AppError::Rejected("This poll is not open for voting".to_string()));
        }
        let next = poll
            .with_vote(option_id, &user.id)
            .ok_or_else(|| AppError::BadRequest(format!("unknown option {}", option_id)))?;

        self.authorized_write(Write::Update(&next)).await?;
        tracing::info!(poll_id, user_id = %user.id, option_id, "Vote recorded");
        if let Some(slot) = self.polls.iter_mut().find(|p| p.id == poll_id) {
            *slot = next.clone();
        }
        Ok(next)
    }

    pub fn poll_results(&self, poll_id: i64) -> Result<Vec<PollOptionResult>> {
        Ok(self.existing_poll(poll_id)?.results())
    }
}
