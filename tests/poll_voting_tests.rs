// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Poll creation and one-vote-per-member voting.

use civic_portal::db::collections;
use civic_portal::models::{MembershipLevel, Poll, PollDraft};
use civic_portal::{AppError, Store};

mod common;
use common::{admin_store, signed_up, TestEnv};

fn poll_draft(start: &str, end: &str) -> PollDraft {
    PollDraft {
        title: "Park renovation".to_string(),
        description: "Should the park be renovated this year?".to_string(),
        options: vec![
            ("a".to_string(), "Yes".to_string()),
            ("b".to_string(), "No".to_string()),
        ],
        start_date: start.to_string(),
        end_date: end.to_string(),
    }
}

/// A member store logged in as `user_id` with voting rights granted by the admin.
async fn eligible_voter(env: &TestEnv, admin: &mut Store, user_id: &str) -> Store {
    let mut member = env.store();
    signed_up(&mut member, user_id).await;
    admin.change_level(user_id, MembershipLevel::Full).await.unwrap();
    admin.set_voting_rights(user_id, true).await.unwrap();

    // pick up the granted rights and the polls
    member.login(user_id, "secret123").await.unwrap();
    member.load_remote().await;
    member
}

#[tokio::test]
async fn test_vote_once_then_second_vote_rejected() {
    let env = TestEnv::new();
    let mut admin = admin_store(&env).await;
    let poll = admin
        .create_poll(poll_draft("2000-01-01", "2999-12-31"))
        .await
        .unwrap();
    assert_eq!(poll.total_votes, 0);

    let mut member = eligible_voter(&env, &mut admin, "user1").await;

    let voted = member.vote(poll.id, "a").await.unwrap();
    let counts: Vec<(&str, u32)> = voted
        .options
        .iter()
        .map(|o| (o.id.as_str(), o.votes))
        .collect();
    assert_eq!(counts, vec![("a", 1), ("b", 0)]);
    assert_eq!(voted.total_votes, 1);
    assert_eq!(voted.voted_user_ids, vec!["user1".to_string()]);

    let writes_before = env.documents.write_count();
    let result = member.vote(poll.id, "b").await;
    assert!(matches!(result, Err(AppError::Rejected(_))));
    assert_eq!(env.documents.write_count(), writes_before, "no remote call for a repeat vote");
    assert_eq!(member.poll(poll.id), Some(&voted));

    // the stored poll agrees
    let mut fresh = env.other_browser();
    fresh.load_remote().await;
    let stored: &Poll = fresh.poll(poll.id).unwrap();
    assert_eq!(stored.total_votes, 1);
    assert_eq!(stored.voted_user_ids, vec!["user1".to_string()]);
}

#[tokio::test]
async fn test_vote_requires_level_and_rights() {
    let env = TestEnv::new();
    let mut admin = admin_store(&env).await;
    let poll = admin
        .create_poll(poll_draft("2000-01-01", "2999-12-31"))
        .await
        .unwrap();

    let mut member = env.store();
    signed_up(&mut member, "basic1").await;
    member.load_remote().await;

    // basic level
    let result = member.vote(poll.id, "a").await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    // full level but rights not granted
    admin.change_level("basic1", MembershipLevel::Full).await.unwrap();
    member.login("basic1", "secret123").await.unwrap();
    let writes_before_vote = env.documents.write_count();
    let result = member.vote(poll.id, "a").await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert_eq!(env.documents.write_count(), writes_before_vote);

    assert_eq!(member.poll(poll.id).unwrap().total_votes, 0);
}

#[tokio::test]
async fn test_vote_outside_window_rejected() {
    let env = TestEnv::new();
    let mut admin = admin_store(&env).await;
    let poll = admin
        .create_poll(poll_draft("2000-01-01", "2000-01-02"))
        .await
        .unwrap();
    let mut member = eligible_voter(&env, &mut admin, "late1").await;

    let result = member.vote(poll.id, "a").await;
    assert!(matches!(result, Err(AppError::Rejected(_))));
}

#[tokio::test]
async fn test_unknown_option_rejected() {
    let env = TestEnv::new();
    let mut admin = admin_store(&env).await;
    let poll = admin
        .create_poll(poll_draft("2000-01-01", "2999-12-31"))
        .await
        .unwrap();
    let mut member = eligible_voter(&env, &mut admin, "user2").await;

    let result = member.vote(poll.id, "zzz").await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
    assert!(member.poll(poll.id).unwrap().voted_user_ids.is_empty());
}

#[tokio::test]
async fn test_failed_vote_leaves_state_unchanged() {
    let env = TestEnv::new();
    let mut admin = admin_store(&env).await;
    let poll = admin
        .create_poll(poll_draft("2000-01-01", "2999-12-31"))
        .await
        .unwrap();
    let mut member = eligible_voter(&env, &mut admin, "user3").await;
    let before: Vec<Poll> = member.polls().to_vec();

    env.documents.fail_writes_to(collections::POLLS);
    let result = member.vote(poll.id, "a").await;
    assert!(matches!(result, Err(AppError::RemoteWrite(_))));
    assert_eq!(member.polls(), before.as_slice());

    // and a retry works once the backend recovers
    env.documents.clear_failures();
    assert_eq!(member.vote(poll.id, "a").await.unwrap().total_votes, 1);
}

#[tokio::test]
async fn test_create_poll_validation() {
    let env = TestEnv::new();
    let mut admin = admin_store(&env).await;

    let mut one_option = poll_draft("2000-01-01", "2999-12-31");
    one_option.options.truncate(1);
    assert!(matches!(
        admin.create_poll(one_option).await,
        Err(AppError::BadRequest(_))
    ));

    let mut duplicate = poll_draft("2000-01-01", "2999-12-31");
    duplicate.options[1].0 = "a".to_string();
    assert!(matches!(
        admin.create_poll(duplicate).await,
        Err(AppError::BadRequest(_))
    ));

    assert!(matches!(
        admin.create_poll(poll_draft("2999-12-31", "2000-01-01")).await,
        Err(AppError::BadRequest(_))
    ));
    assert!(admin.polls().is_empty());
}

#[tokio::test]
async fn test_results_report_shares() {
    let env = TestEnv::new();
    let mut admin = admin_store(&env).await;
    let poll = admin
        .create_poll(poll_draft("2000-01-01", "2999-12-31"))
        .await
        .unwrap();
    let mut member = eligible_voter(&env, &mut admin, "user4").await;
    member.vote(poll.id, "b").await.unwrap();

    let results = member.poll_results(poll.id).unwrap();
    assert_eq!(results[0].votes, 0);
    assert_eq!(results[1].votes, 1);
    assert!((results[1].share - 1.0).abs() < 1e-9);
}
