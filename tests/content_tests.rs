// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! News and board posts: ids, permissions, comments and view counters.

use civic_portal::db::{collections, Value};
use civic_portal::models::{NewsDraft, PostDraft};
use civic_portal::{AppError, Store};

mod common;
use common::{admin_store, signed_up, TestEnv};

fn news_draft(title: &str) -> NewsDraft {
    NewsDraft {
        title: title.to_string(),
        content: "Details inside".to_string(),
        category: "notice".to_string(),
        image_url: Some(String::new()),
    }
}

fn post_draft(title: &str) -> PostDraft {
    PostDraft {
        title: title.to_string(),
        content: "What does everyone think?".to_string(),
    }
}

async fn member(env: &TestEnv, user_id: &str) -> Store {
    let mut store = env.other_browser();
    signed_up(&mut store, user_id).await;
    store.load_remote().await;
    store
}

#[tokio::test]
async fn test_news_ids_are_sequential() {
    let env = TestEnv::new();
    let mut admin = admin_store(&env).await;

    let first = admin.create_news(news_draft("First")).await.unwrap();
    let second = admin.create_news(news_draft("Second")).await.unwrap();
    assert_eq!((first.id, second.id), (1, 2));
    assert_eq!(first.image_url, None);
    assert_eq!(admin.news()[0].id, 2);

    admin.delete_news(2).await.unwrap();
    let third = admin.create_news(news_draft("Third")).await.unwrap();
    assert_eq!(third.id, 2);
}

#[tokio::test]
async fn test_failed_news_write_changes_nothing() {
    let env = TestEnv::new();
    let mut admin = admin_store(&env).await;
    admin.create_news(news_draft("First")).await.unwrap();

    env.documents.fail_writes_to(collections::NEWS);
    let result = admin.create_news(news_draft("Second")).await;
    match result {
        Err(AppError::RemoteWrite(kind)) => assert_eq!(kind, "News article"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(admin.news().len(), 1);

    let result = admin.update_news(1, news_draft("Renamed")).await;
    assert!(result.is_err());
    assert_eq!(admin.news()[0].title, "First");
}

#[tokio::test]
async fn test_only_admins_publish_news() {
    let env = TestEnv::new();
    let mut store = member(&env, "kim01").await;
    assert!(matches!(
        store.create_news(news_draft("Mine")).await,
        Err(AppError::Forbidden(_))
    ));

    let mut visitor = env.other_browser();
    assert!(matches!(
        visitor.create_news(news_draft("Anon")).await,
        Err(AppError::NotLoggedIn)
    ));
}

#[tokio::test]
async fn test_visitors_count_views() {
    let env = TestEnv::new();
    let mut admin = admin_store(&env).await;
    let article = admin.create_news(news_draft("First")).await.unwrap();

    let mut visitor = env.other_browser();
    visitor.load_remote().await;
    assert_eq!(visitor.view_news(article.id).await.unwrap().views, 1);
    assert_eq!(visitor.view_news(article.id).await.unwrap().views, 2);

    let fields = env
        .documents
        .raw(collections::NEWS, &article.id.to_string())
        .unwrap();
    assert_eq!(fields.get("views"), Some(&Value::integer(2)));
    assert!(matches!(visitor.view_news(999).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_post_permissions() {
    let env = TestEnv::new();
    let mut author = member(&env, "kim01").await;
    let post = author.create_post(post_draft("Park benches")).await.unwrap();
    assert_eq!(post.author_id, "kim01");

    let mut other = member(&env, "lee02").await;
    assert!(matches!(
        other.update_post(post.id, post_draft("Hijacked")).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(other.delete_post(post.id).await, Err(AppError::Forbidden(_))));

    let edited = author.update_post(post.id, post_draft("More benches")).await.unwrap();
    assert_eq!(edited.title, "More benches");

    let mut admin = admin_store(&env).await;
    admin.load_remote().await;
    admin.delete_post(post.id).await.unwrap();
    assert!(env
        .documents
        .raw(collections::BOARD_POSTS, &post.id.to_string())
        .is_none());
}

#[tokio::test]
async fn test_notices_sort_first() {
    let env = TestEnv::new();
    let mut admin = admin_store(&env).await;
    let older = admin.create_post(post_draft("Older")).await.unwrap();
    let newer = admin.create_post(post_draft("Newer")).await.unwrap();
    assert!(newer.id > older.id);
    assert_eq!(admin.posts()[0].id, newer.id);

    let pinned = admin.toggle_notice(older.id).await.unwrap();
    assert!(pinned.is_notice);
    assert_eq!(admin.posts()[0].id, older.id);

    let mut store = member(&env, "kim01").await;
    assert_eq!(store.posts()[0].id, older.id);
    assert!(matches!(
        store.toggle_notice(newer.id).await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_comments() {
    let env = TestEnv::new();
    let mut author = member(&env, "kim01").await;
    let post = author.create_post(post_draft("Park benches")).await.unwrap();

    let mut commenter = member(&env, "lee02").await;
    let with_comment = commenter.add_comment(post.id, "  Agreed  ").await.unwrap();
    assert_eq!(with_comment.comments, 1);
    let comment = &with_comment.comment_list[0];
    assert_eq!((comment.author_id.as_str(), comment.content.as_str()), ("lee02", "Agreed"));

    assert!(matches!(
        commenter.add_comment(post.id, "   ").await,
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        commenter.add_comment(post.id, &"x".repeat(1001)).await,
        Err(AppError::BadRequest(_))
    ));

    // the post author cannot remove someone else's comment
    author.load_remote().await;
    assert!(matches!(
        author.delete_comment(post.id, comment.id).await,
        Err(AppError::Forbidden(_))
    ));

    let without = commenter.delete_comment(post.id, comment.id).await.unwrap();
    assert_eq!(without.comments, 0);
    assert!(without.comment_list.is_empty());
}

#[tokio::test]
async fn test_failed_comment_write_keeps_post() {
    let env = TestEnv::new();
    let mut store = member(&env, "kim01").await;
    let post = store.create_post(post_draft("Park benches")).await.unwrap();

    env.documents.fail_writes_to(collections::BOARD_POSTS);
    assert!(store.add_comment(post.id, "hello").await.is_err());
    assert_eq!(store.post(post.id).unwrap().comments, 0);
    assert!(store.post(post.id).unwrap().comment_list.is_empty());
}
