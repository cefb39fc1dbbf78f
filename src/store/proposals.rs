// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Member proposals.

use super::{next_timestamp_id, Store};
use crate::db::remote::Write;
use crate::error::{AppError, Result};
use crate::models::{Proposal, ProposalDraft, ProposalStatus};
use crate::time_utils::now_rfc3339;
use validator::Validate;

impl Store {
    /// The logged-in user's proposals.
    pub fn my_proposals(&self) -> Vec<&Proposal> {
        match &self.current_user {
            Some(user) => self
                .proposals
                .iter()
                .filter(|p| p.author_id == user.id)
                .collect(),
            None => Vec::new(),
        }
    }

    fn existing_proposal(&self, id: i64) -> Result<&Proposal> {
        self.proposals
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("proposal {}", id)))
    }

    pub async fn submit_proposal(&mut self, draft: ProposalDraft) -> Result<Proposal> {
        draft.validate()?;
        let author = self.require_login()?.clone();
        let proposal = Proposal {
            id: next_timestamp_id(self.proposals.iter().map(|p| p.id)),
            title: draft.title,
            content: draft.content,
            author_id: author.id,
            author_name: author.name,
            created_at: now_rfc3339(),
            status: ProposalStatus::Submitted,
            admin_reply: None,
        };

        self.authorized_write(Write::Create(&proposal)).await?;
        tracing::info!(proposal_id = proposal.id, author_id = %proposal.author_id, "Proposal submitted");
        self.proposals.insert(0, proposal.clone());
        Ok(proposal)
    }

    /// Move a proposal through review (admin), optionally replying.
    pub async fn review_proposal(
        &mut self,
        id: i64,
        status: ProposalStatus,
        reply: Option<&str>,
    ) -> Result<Proposal> {
        self.require_admin()?;
        let proposal = self.existing_proposal(id)?.clone();
        let admin_reply = match reply.map(str::trim) {
            Some("") => None,
            Some(text) => Some(text.to_string()),
            None => proposal.admin_reply.clone(),
        };
        let next = Proposal {
            status,
            admin_reply,
            ..proposal
        };

        self.authorized_write(Write::Update(&next)).await?;
        if let Some(slot) = self.proposals.iter_mut().find(|p| p.id == id) {
            *slot = next.clone();
        }
        Ok(next)
    }

    pub async fn delete_proposal(&mut self, id: i64) -> Result<()> {
        let author_id = self.existing_proposal(id)?.author_id.clone();
        self.require_author_or_admin(&author_id)?;
        let doc_id = id.to_string();
        self.authorized_write(Write::<Proposal>::Delete(&doc_id)).await?;
        self.proposals.retain(|p| p.id != id);
        Ok(())
    }
}
