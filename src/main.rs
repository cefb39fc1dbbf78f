// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Civic-Portal state loader
//!
//! Wires the hosted backends and local state, runs startup reconciliation
//! and reports what it found.

use civic_portal::{
    config::Config,
    db::FirestoreRest,
    services::{AdminApiClient, FirebaseAuthClient},
    storage::FileStorage,
    Backends, Store,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        project = %config.firebase_project_id,
        state_dir = %config.local_state_dir.display(),
        "Starting Civic-Portal"
    );

    let backends = Backends {
        documents: Arc::new(FirestoreRest::new(
            &config.firebase_project_id,
            &config.firebase_api_key,
        )),
        identity: Arc::new(FirebaseAuthClient::new(&config.firebase_api_key)),
        admin_api: Arc::new(AdminApiClient::new(&config.admin_api_base_url)),
        storage: Arc::new(FileStorage::new(&config.local_state_dir)),
    };

    let mut store = Store::new(config, backends);
    let cancel = AtomicBool::new(false);
    let summary = store.startup(&cancel).await;

    tracing::info!(
        news = ?summary.loaded.news,
        posts = ?summary.loaded.posts,
        events = ?summary.loaded.events,
        polls = ?summary.loaded.polls,
        user = ?summary.restored_user,
        purged = summary.reconcile.deleted.len() + summary.reconcile.invalid_proof.len(),
        orphans = summary.reconcile.orphans.len(),
        "Startup complete"
    );
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("civic_portal=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
