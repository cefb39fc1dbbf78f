// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application state container.
//!
//! `Store` holds the in-memory collections mirrored from the document
//! store, the credential cache and the logged-in user. Every mutating
//! operation computes the next value, writes it remotely, and applies it
//! locally only when the write succeeded.
//!
//! Operations are grouped by area:
//! - `session`: sign-up, login, logout, session restoration
//! - `users`: profiles, membership, deletion, bulk import, SMS
//! - `content`: news and board posts
//! - `events`: events and applications
//! - `polls`, `proposals`, `site`
//! - `reconcile`: orphan and credential sweeps

mod content;
mod events;
mod polls;
mod proposals;
mod reconcile;
mod session;
mod site;
mod users;

pub use reconcile::ReconcileReport;
pub use users::{BulkCreateResult, BulkUserRow, RemoteCleanup};

use crate::config::Config;
use crate::db::remote::{FirestoreRecord, RemoteData, Write};
use crate::db::DocumentStore;
use crate::error::{AppError, Result};
use crate::models::{
    BoardPost, Event, EventApplication, NewsArticle, Poll, Proposal, SiteContent, User,
};
use crate::services::{AdminEndpoints, CredentialCache, IdentityProvider, Session};
use crate::storage::{keys, load_json, save_json, LocalStorage};
use crate::time_utils::today_at;
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// External collaborators of the store.
#[derive(Clone)]
pub struct Backends {
    pub documents: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub admin_api: Arc<dyn AdminEndpoints>,
    pub storage: Arc<dyn LocalStorage>,
}

/// Collections reached by [`Store::load_remote`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadSummary {
    pub news: Option<usize>,
    pub posts: Option<usize>,
    pub events: Option<usize>,
    pub applications: Option<usize>,
    pub proposals: Option<usize>,
    pub polls: Option<usize>,
}

/// Result of [`Store::startup`].
#[derive(Debug, Clone, Default)]
pub struct StartupSummary {
    pub loaded: LoadSummary,
    pub restored_user: Option<String>,
    pub reconcile: ReconcileReport,
}

/// Users and proofs as seen by the last reconciliation.
#[derive(Debug, Clone, PartialEq)]
struct Fingerprint {
    users: BTreeSet<String>,
    proofs: BTreeMap<String, String>,
}

pub struct Store {
    config: Config,
    remote: RemoteData,
    identity: Arc<dyn IdentityProvider>,
    admin_api: Arc<dyn AdminEndpoints>,
    storage: Arc<dyn LocalStorage>,
    credentials: CredentialCache,
    current_user: Option<User>,
    /// Locally known accounts (persisted, subject to the sweeps)
    users: Vec<User>,
    /// Full member list fetched for admins (not persisted, not swept)
    directory: Vec<User>,
    news: Vec<NewsArticle>,
    posts: Vec<BoardPost>,
    events: Vec<Event>,
    applications: Vec<EventApplication>,
    proposals: Vec<Proposal>,
    polls: Vec<Poll>,
    site: SiteContent,
    last_reconciled: Option<Fingerprint>,
}

impl Store {
    /// Create a store from local persisted state. No remote calls are made.
    pub fn new(config: Config, backends: Backends) -> Self {
        let storage = backends.storage;
        let users: Vec<User> = load_json(storage.as_ref(), keys::USERS);
        let proofs: HashMap<String, String> = load_json(storage.as_ref(), keys::AUTH_PROOFS);
        let session: Option<Session> = load_json(storage.as_ref(), keys::SESSION);
        let site = SiteContent {
            hero_image_urls: load_json(storage.as_ref(), keys::HERO_IMAGE_URLS),
            logo_url: load_json(storage.as_ref(), keys::LOGO_URL),
            ..SiteContent::default()
        };

        tracing::debug!(
            users = users.len(),
            proofs = proofs.len(),
            session = session.is_some(),
            "Loaded local state"
        );

        Self {
            config,
            remote: RemoteData::new(backends.documents),
            identity: backends.identity,
            admin_api: backends.admin_api,
            storage,
            credentials: CredentialCache::new(proofs, session),
            current_user: None,
            users: dedup_users(users),
            directory: Vec::new(),
            news: Vec::new(),
            posts: Vec::new(),
            events: Vec::new(),
            applications: Vec::new(),
            proposals: Vec::new(),
            polls: Vec::new(),
            site,
            last_reconciled: None,
        }
    }

    /// Load local state, fetch content, restore the session and reconcile.
    pub async fn startup(&mut self, cancel: &AtomicBool) -> StartupSummary {
        let loaded = self.load_remote().await;
        self.load_site_content().await;
        let restored_user = self.restore_session(cancel).await.map(|u| u.id);
        let reconcile = self.reconcile().await;
        StartupSummary {
            loaded,
            restored_user,
            reconcile,
        }
    }

    /// Fetch every content collection.
    ///
    /// A collection that could not be fetched keeps its current local state.
    pub async fn load_remote(&mut self) -> LoadSummary {
        let mut summary = LoadSummary::default();
        let token = self.optional_token().await;
        let token = token.as_deref();

        if let Some(mut news) = self.remote.fetch_list::<NewsArticle>(token).await {
            news.sort_by(|a, b| b.id.cmp(&a.id));
            summary.news = Some(news.len());
            self.news = news;
        }
        if let Some(mut posts) = self.remote.fetch_list::<BoardPost>(token).await {
            sort_posts(&mut posts);
            summary.posts = Some(posts.len());
            self.posts = posts;
        }
        if let Some(mut events) = self.remote.fetch_list::<Event>(token).await {
            events.sort_by(|a, b| b.id.cmp(&a.id));
            summary.events = Some(events.len());
            self.events = events;
        }
        if let Some(applications) = self.remote.fetch_list::<EventApplication>(token).await {
            summary.applications = Some(applications.len());
            self.applications = applications;
        }
        if let Some(mut proposals) = self.remote.fetch_list::<Proposal>(token).await {
            proposals.sort_by(|a, b| b.id.cmp(&a.id));
            summary.proposals = Some(proposals.len());
            self.proposals = proposals;
        }
        if let Some(mut polls) = self.remote.fetch_list::<Poll>(token).await {
            polls.sort_by(|a, b| b.id.cmp(&a.id));
            summary.polls = Some(polls.len());
            self.polls = polls;
        }

        tracing::info!(?summary, "Loaded remote collections");
        summary
    }

    // ─── Accessors ──────────────────────────────────────────────

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn directory(&self) -> &[User] {
        &self.directory
    }

    pub fn credentials(&self) -> &CredentialCache {
        &self.credentials
    }

    pub fn news(&self) -> &[NewsArticle] {
        &self.news
    }

    pub fn posts(&self) -> &[BoardPost] {
        &self.posts
    }

    /// Stored events without the recruitment projection.
    pub fn raw_events(&self) -> &[Event] {
        &self.events
    }

    pub fn applications(&self) -> &[EventApplication] {
        &self.applications
    }

    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn polls(&self) -> &[Poll] {
        &self.polls
    }

    pub fn site_content(&self) -> &SiteContent {
        &self.site
    }

    /// Today's calendar date in the site's configured offset.
    pub fn today(&self) -> NaiveDate {
        today_at(Utc::now(), self.config.site_utc_offset_minutes)
    }

    // ─── Access Checks ──────────────────────────────────────────

    fn require_login(&self) -> Result<&User> {
        self.current_user.as_ref().ok_or(AppError::NotLoggedIn)
    }

    fn require_admin(&self) -> Result<&User> {
        let user = self.require_login()?;
        if self.is_admin(user) {
            Ok(user)
        } else {
            Err(AppError::Forbidden("administrators only".to_string()))
        }
    }

    fn is_admin(&self, user: &User) -> bool {
        user.is_admin() || user.id == self.config.admin_user_id
    }

    /// The logged-in user may change a record written by `author_id`.
    fn require_author_or_admin(&self, author_id: &str) -> Result<&User> {
        let user = self.require_login()?;
        if user.id == author_id || self.is_admin(user) {
            Ok(user)
        } else {
            Err(AppError::Forbidden("only the author or an administrator".to_string()))
        }
    }

    // ─── Remote Writes ──────────────────────────────────────────

    /// Token for `user_id`, persisting any refreshed session.
    async fn token_for(&mut self, user_id: &str) -> Option<String> {
        let token = self
            .credentials
            .token_for(self.identity.as_ref(), &self.config.auth_email_domain, user_id)
            .await;
        self.persist_credentials();
        token
    }

    /// Token for the logged-in user, if any.
    async fn optional_token(&mut self) -> Option<String> {
        let user_id = self.current_user.as_ref()?.id.clone();
        self.token_for(&user_id).await
    }

    /// Token for an admin-only read. Member profiles and applications are
    /// not readable anonymously.
    async fn admin_token(&mut self) -> Result<String> {
        let user_id = self.require_admin()?.id.clone();
        self.token_for(&user_id).await.ok_or(AppError::NoToken)
    }

    /// Write as the logged-in user.
    ///
    /// A `401` invalidates the cached token and the write is attempted once
    /// more with a freshly derived one. Any other failure is reported once.
    async fn authorized_write<T: FirestoreRecord>(&mut self, write: Write<'_, T>) -> Result<()> {
        let user_id = self.require_login()?.id.clone();
        let token = self.token_for(&user_id).await.ok_or(AppError::NoToken)?;

        let result = match self.remote.write_checked(&write, Some(&token)).await {
            Err(e) if e.is_unauthorized() => {
                tracing::info!(user_id = %user_id, "Token rejected, refreshing");
                self.credentials.invalidate_token(&user_id);
                let token = self.token_for(&user_id).await.ok_or(AppError::NoToken)?;
                self.remote.write_checked(&write, Some(&token)).await
            }
            other => other,
        };

        result.map_err(|e| {
            tracing::warn!(
                collection = T::COLLECTION,
                op = write.op_name(),
                user_id = %user_id,
                error = %e,
                "Remote write failed"
            );
            AppError::write_failed(T::KIND)
        })
    }

    /// Write that does not require a login (view counters).
    async fn visitor_write<T: FirestoreRecord>(&mut self, write: Write<'_, T>) -> Result<()> {
        let token = self.optional_token().await;
        if self.remote.write(&write, token.as_deref()).await {
            Ok(())
        } else {
            Err(AppError::write_failed(T::KIND))
        }
    }

    // ─── Local Persistence ──────────────────────────────────────

    fn persist_users(&self) {
        if let Err(e) = save_json(self.storage.as_ref(), keys::USERS, &self.users) {
            tracing::warn!(error = %e, "Failed to persist users");
        }
    }

    fn persist_credentials(&self) {
        if let Err(e) = save_json(self.storage.as_ref(), keys::AUTH_PROOFS, self.credentials.proofs()) {
            tracing::warn!(error = %e, "Failed to persist credential proofs");
        }
        let result = match self.credentials.session() {
            Some(session) => save_json(self.storage.as_ref(), keys::SESSION, session),
            None => self.storage.remove(keys::SESSION),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to persist session");
        }
    }

    // ─── User List Helpers ──────────────────────────────────────

    fn find_user(&self, user_id: &str) -> Option<&User> {
        self.users
            .iter()
            .chain(self.directory.iter())
            .find(|u| u.id == user_id)
    }

    /// Insert or replace a user in the local list.
    fn upsert_user(&mut self, user: User) {
        match self.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user,
            None => self.users.push(user),
        }
        self.persist_users();
    }

    /// Apply a saved profile wherever that user is held locally.
    fn commit_user(&mut self, user: User) {
        for entry in self.directory.iter_mut().filter(|u| u.id == user.id) {
            *entry = user.clone();
        }
        if let Some(current) = self.current_user.as_mut().filter(|u| u.id == user.id) {
            *current = user.clone();
        }
        if let Some(existing) = self.users.iter_mut().find(|u| u.id == user.id) {
            *existing = user;
            self.persist_users();
        }
    }

    /// Drop a user from local state entirely. Returns whether anything changed.
    fn remove_user_locally(&mut self, user_id: &str) -> bool {
        let before = self.users.len() + self.directory.len();
        self.users.retain(|u| u.id != user_id);
        self.directory.retain(|u| u.id != user_id);
        let forgot = self.credentials.forget_proof(user_id);
        let changed = forgot || before != self.users.len() + self.directory.len();
        self.persist_users();
        self.persist_credentials();
        changed
    }

    /// Clear session-scoped state. Content collections are kept.
    fn end_session(&mut self) {
        self.credentials.clear_session();
        self.current_user = None;
        self.persist_credentials();
    }
}

/// Millisecond-timestamp id, bumped past every existing id.
fn next_timestamp_id(existing: impl Iterator<Item = i64>) -> i64 {
    let now = Utc::now().timestamp_millis();
    existing.max().map_or(now, |max| now.max(max + 1))
}

/// Pinned notices first, then newest first.
fn sort_posts(posts: &mut [BoardPost]) {
    posts.sort_by(|a, b| b.is_notice.cmp(&a.is_notice).then(b.id.cmp(&a.id)));
}

/// Keep the first entry for each user id.
fn dedup_users(users: Vec<User>) -> Vec<User> {
    let mut seen = BTreeSet::new();
    users
        .into_iter()
        .filter(|u| seen.insert(u.id.clone()))
        .collect()
}
