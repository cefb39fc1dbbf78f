// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! News articles and board posts.

use super::{next_timestamp_id, sort_posts, Store};
use crate::db::remote::Write;
use crate::error::{AppError, Result};
use crate::models::{BoardPost, Comment, NewsArticle, NewsDraft, PostDraft};
use crate::time_utils::now_rfc3339;
use validator::Validate;

/// Longest comment accepted.
const MAX_COMMENT_CHARS: usize = 1000;

impl Store {
    // ─── News ───────────────────────────────────────────────────

    pub fn news_article(&self, id: i64) -> Option<&NewsArticle> {
        self.news.iter().find(|n| n.id == id)
    }

    fn existing_news(&self, id: i64) -> Result<&NewsArticle> {
        self.news_article(id)
            .ok_or_else(|| AppError::NotFound(format!("news article {}", id)))
    }

    /// Publish a news article (admin). Ids are sequential.
    pub async fn create_news(&mut self, draft: NewsDraft) -> Result<NewsArticle> {
        draft.validate()?;
        let author = self.require_admin()?.name.clone();
        let id = self.news.iter().map(|n| n.id).max().unwrap_or(0) + 1;
        let article = NewsArticle {
            id,
            title: draft.title,
            content: draft.content,
            author,
            date: now_rfc3339(),
            category: draft.category,
            image_url: draft.image_url.filter(|u| !u.is_empty()),
            views: 0,
        };

        self.authorized_write(Write::Create(&article)).await?;
        tracing::info!(news_id = id, "News article published");
        self.news.insert(0, article.clone());
        Ok(article)
    }

    pub async fn update_news(&mut self, id: i64, draft: NewsDraft) -> Result<NewsArticle> {
        draft.validate()?;
        self.require_admin()?;
        let next = NewsArticle {
            title: draft.title,
            content: draft.content,
            category: draft.category,
            image_url: draft.image_url.filter(|u| !u.is_empty()),
            ..self.existing_news(id)?.clone()
        };

        self.authorized_write(Write::Update(&next)).await?;
        self.replace_news(next.clone());
        Ok(next)
    }

    pub async fn delete_news(&mut self, id: i64) -> Result<()> {
        self.require_admin()?;
        self.existing_news(id)?;
        let doc_id = id.to_string();
        self.authorized_write(Write::<NewsArticle>::Delete(&doc_id)).await?;
        tracing::info!(news_id = id, "News article deleted");
        self.news.retain(|n| n.id != id);
        Ok(())
    }

    /// Count one view of an article. Open to visitors.
    pub async fn view_news(&mut self, id: i64) -> Result<NewsArticle> {
        let article = self.existing_news(id)?.clone();
        let next = NewsArticle {
            views: article.views.saturating_add(1),
            ..article
        };
        self.visitor_write(Write::Update(&next)).await?;
        self.replace_news(next.clone());
        Ok(next)
    }

    fn replace_news(&mut self, article: NewsArticle) {
        if let Some(slot) = self.news.iter_mut().find(|n| n.id == article.id) {
            *slot = article;
        }
    }

    // ─── Board Posts ────────────────────────────────────────────

    pub fn post(&self, id: i64) -> Option<&BoardPost> {
        self.posts.iter().find(|p| p.id == id)
    }

    fn existing_post(&self, id: i64) -> Result<&BoardPost> {
        self.post(id)
            .ok_or_else(|| AppError::NotFound(format!("board post {}", id)))
    }

    pub async fn create_post(&mut self, draft: PostDraft) -> Result<BoardPost> {
        draft.validate()?;
        let author = self.require_login()?.clone();
        let post = BoardPost {
            id: next_timestamp_id(self.posts.iter().map(|p| p.id)),
            title: draft.title,
            content: draft.content,
            author_id: author.id,
            author_name: author.name,
            created_at: now_rfc3339(),
            views: 0,
            comments: 0,
            comment_list: Vec::new(),
            is_notice: false,
        };

        self.authorized_write(Write::Create(&post)).await?;
        tracing::info!(post_id = post.id, author_id = %post.author_id, "Board post created");
        self.posts.push(post.clone());
        sort_posts(&mut self.posts);
        Ok(post)
    }

    pub async fn update_post(&mut self, id: i64, draft: PostDraft) -> Result<BoardPost> {
        draft.validate()?;
        let post = self.existing_post(id)?.clone();
        self.require_author_or_admin(&post.author_id)?;
        let next = BoardPost {
            title: draft.title,
            content: draft.content,
            ..post
        };

        self.authorized_write(Write::Update(&next)).await?;
        self.replace_post(next.clone());
        Ok(next)
    }

    pub async fn delete_post(&mut self, id: i64) -> Result<()> {
        let author_id = self.existing_post(id)?.author_id.clone();
        self.require_author_or_admin(&author_id)?;
        let doc_id = id.to_string();
        self.authorized_write(Write::<BoardPost>::Delete(&doc_id)).await?;
        tracing::info!(post_id = id, "Board post deleted");
        self.posts.retain(|p| p.id != id);
        Ok(())
    }

    /// Pin or unpin a post as a notice (admin).
    pub async fn toggle_notice(&mut self, id: i64) -> Result<BoardPost> {
        self.require_admin()?;
        let post = self.existing_post(id)?.clone();
        let next = BoardPost {
            is_notice: !post.is_notice,
            ..post
        };

        self.authorized_write(Write::Update(&next)).await?;
        self.replace_post(next.clone());
        sort_posts(&mut self.posts);
        Ok(next)
    }

    /// Count one view of a post. Open to visitors.
    pub async fn view_post(&mut self, id: i64) -> Result<BoardPost> {
        let post = self.existing_post(id)?.clone();
        let next = BoardPost {
            views: post.views.saturating_add(1),
            ..post
        };
        self.visitor_write(Write::Update(&next)).await?;
        self.replace_post(next.clone());
        Ok(next)
    }

    pub async fn add_comment(&mut self, post_id: i64, content: &str) -> Result<BoardPost> {
        let content = content.trim();
        if content.is_empty() || content.chars().count() > MAX_COMMENT_CHARS {
            return Err(AppError::BadRequest(format!(
                "comment must be 1 to {} characters",
                MAX_COMMENT_CHARS
            )));
        }
        let author = self.require_login()?.clone();
        let post = self.existing_post(post_id)?.clone();

        let mut next = post.clone();
        next.comment_list.push(Comment {
            id: next_timestamp_id(post.comment_list.iter().map(|c| c.id)),
            author_id: author.id,
            author_name: author.name,
            content: content.to_string(),
            created_at: now_rfc3339(),
        });
        next.comments = post.comments.saturating_add(1);

        self.authorized_write(Write::Update(&next)).await?;
        self.replace_post(next.clone());
        Ok(next)
    }

    /// Remove a comment (its author or an admin).
    pub async fn delete_comment(&mut self, post_id: i64, comment_id: i64) -> Result<BoardPost> {
        let post = self.existing_post(post_id)?.clone();
        let comment = post
            .comment_list
            .iter()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| AppError::NotFound(format!("comment {}", comment_id)))?;
        self.require_author_or_admin(&comment.author_id)?;

        let next = BoardPost {
            comment_list: post
                .comment_list
                .iter()
                .filter(|c| c.id != comment_id)
                .cloned()
                .collect(),
            comments: post.comments.saturating_sub(1),
            ..post.clone()
        };

        self.authorized_write(Write::Update(&next)).await?;
        self.replace_post(next.clone());
        Ok(next)
    }

    fn replace_post(&mut self, post: BoardPost) {
        if let Some(slot) = self.posts.iter_mut().find(|p| p.id == post.id) {
            *slot = post;
        }
    }
}
