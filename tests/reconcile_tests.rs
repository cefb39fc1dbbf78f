// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Orphan and credential sweeps against the identity provider.

use civic_portal::models::{MembershipLevel, User};
use civic_portal::storage::{keys, save_json};
use std::sync::atomic::AtomicBool;

mod common;
use common::{signed_up, TestEnv};

fn ids(users: &[User]) -> Vec<&str> {
    let mut ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_sweep_classifies_provider_answers() {
    let env = TestEnv::new();
    let mut store = env.store();
    for user_id in ["kim01", "lee02", "park03"] {
        signed_up(&mut store, user_id).await;
    }

    env.identity.remove_account(&env.email("kim01"));
    env.identity.set_password(&env.email("lee02"), "changed-elsewhere");

    let report = store.reconcile().await;
    assert_eq!(report.deleted, vec!["kim01".to_string()]);
    assert_eq!(report.invalid_proof, vec!["lee02".to_string()]);
    assert!(report.orphans.is_empty());
    assert!(!report.logged_out);

    assert_eq!(ids(store.users()), vec!["park03"]);
    assert!(!store.credentials().has_proof("kim01"));
    assert!(!store.credentials().has_proof("lee02"));
    assert_eq!(store.current_user().map(|u| u.id.as_str()), Some("park03"));
}

#[tokio::test]
async fn test_network_failure_is_never_evidence() {
    let env = TestEnv::new();
    let mut store = env.store();
    signed_up(&mut store, "kim01").await;
    env.identity.remove_account(&env.email("kim01"));

    env.identity.set_offline(true);
    let report = store.reconcile().await;
    assert!(report.deleted.is_empty());
    assert!(report.invalid_proof.is_empty());
    assert_eq!(ids(store.users()), vec!["kim01"]);
    assert!(store.credentials().has_proof("kim01"));
}

#[tokio::test]
async fn test_enumeration_protected_provider_purges_as_stale() {
    let env = TestEnv::new();
    env.identity.set_enumeration_protection(true);
    let mut store = env.store();
    signed_up(&mut store, "kim01").await;
    signed_up(&mut store, "lee02").await;
    signed_up(&mut store, "park03").await;

    env.identity.remove_account(&env.email("kim01"));
    env.identity.set_password(&env.email("lee02"), "changed-elsewhere");

    // the provider withholds whether kim01 still exists
    let report = store.reconcile().await;
    assert!(report.deleted.is_empty());
    assert_eq!(
        report.invalid_proof,
        vec!["kim01".to_string(), "lee02".to_string()]
    );
    assert_eq!(ids(store.users()), vec!["park03"]);
}

#[tokio::test]
async fn test_purged_current_user_is_logged_out() {
    let env = TestEnv::new();
    let mut store = env.store();
    signed_up(&mut store, "kim01").await;
    env.identity.set_password(&env.email("kim01"), "changed-elsewhere");

    let report = store.reconcile().await;
    assert!(report.logged_out);
    assert!(store.current_user().is_none());
    assert!(store.credentials().session().is_none());
    assert!(env.storage_session_is_empty());
}

#[tokio::test]
async fn test_orphan_sweep_keeps_admins() {
    let env = TestEnv::new();
    let seeded = vec![
        User::synthesized("admin", MembershipLevel::Basic),
        User::synthesized("boss", MembershipLevel::Admin),
        User::synthesized("kim01", MembershipLevel::Full),
    ];
    save_json(env.storage.as_ref(), keys::USERS, &seeded).unwrap();

    let mut store = env.store();
    let report = store.reconcile().await;
    assert_eq!(report.orphans, vec!["kim01".to_string()]);
    assert_eq!(ids(store.users()), vec!["admin", "boss"]);

    // the removal is persisted
    let reloaded = env.store();
    assert_eq!(ids(reloaded.users()), vec!["admin", "boss"]);
}

#[tokio::test]
async fn test_reconcile_runs_only_on_change() {
    let env = TestEnv::new();
    let mut store = env.store();
    signed_up(&mut store, "kim01").await;

    assert!(store.reconcile_if_changed().await.is_some());
    assert!(store.reconcile_if_changed().await.is_none());

    signed_up(&mut store, "lee02").await;
    assert!(store.reconcile_if_changed().await.is_some());
    assert!(store.reconcile_if_changed().await.is_none());
}

#[tokio::test]
async fn test_startup_purges_deleted_session_user() {
    let env = TestEnv::new();
    {
        let mut store = env.store();
        signed_up(&mut store, "kim01").await;
    }
    env.identity.remove_account(&env.email("kim01"));

    let mut store = env.store();
    let summary = store.startup(&AtomicBool::new(false)).await;
    assert_eq!(summary.restored_user.as_deref(), Some("kim01"));
    assert_eq!(summary.reconcile.deleted, vec!["kim01".to_string()]);
    assert!(summary.reconcile.logged_out);
    assert!(store.current_user().is_none());
}
