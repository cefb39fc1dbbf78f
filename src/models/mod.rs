// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.
//!
//! Each stored record implements [`FirestoreRecord`](crate::db::FirestoreRecord):
//! an explicit encoder to the field-tagged wire format and a decoder that
//! defaults malformed scalar fields and rejects only documents whose identity
//! cannot be established.

pub mod content;
pub mod event;
pub mod poll;
pub mod proposal;
pub mod site;
pub mod user;

pub use content::{BoardPost, Comment, NewsArticle, NewsDraft, PostDraft};
pub use event::{Event, EventApplication, EventDraft, EventStatus};
pub use poll::{Poll, PollDraft, PollOption, PollOptionResult};
pub use proposal::{Proposal, ProposalDraft, ProposalStatus};
pub use site::{AboutContent, HistoryEntry, SiteContent};
pub use user::{DeletionMarker, MembershipLevel, ProfileUpdate, SignUpRequest, User};
