// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! News articles and member board posts.

use crate::db::collections;
use crate::db::remote::{numeric_id, FirestoreRecord};
use crate::db::value::{
    read_bool, read_count, read_int, read_map_list, read_optional_string, read_string, Document,
    Fields, FieldsBuilder, Value,
};
use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// News article in `news/{id}`. Ids are sequential (max existing + 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: String,
    /// Publication timestamp (RFC 3339)
    pub date: String,
    pub category: String,
    pub image_url: Option<String>,
    pub views: u32,
}

impl FirestoreRecord for NewsArticle {
    const COLLECTION: &'static str = collections::NEWS;
    const KIND: &'static str = "News article";

    fn document_id(&self) -> String {
        self.id.to_string()
    }

    fn to_fields(&self) -> Fields {
        FieldsBuilder::new()
            .integer("id", self.id)
            .string("title", &self.title)
            .string("content", &self.content)
            .string("author", &self.author)
            .string("date", &self.date)
            .string("category", &self.category)
            .optional_string("imageUrl", self.image_url.as_deref())
            .integer("views", i64::from(self.views))
            .build()
    }

    fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        let f = &doc.fields;
        Ok(Self {
            id: numeric_id(doc, "news")?,
            title: read_string(f, "title"),
            content: read_string(f, "content"),
            author: read_string(f, "author"),
            date: read_string(f, "date"),
            category: read_string(f, "category"),
            image_url: read_optional_string(f, "imageUrl"),
            views: read_count(f, "views"),
        })
    }
}

/// Fields an admin fills in when writing news.
#[derive(Debug, Clone, Validate)]
pub struct NewsDraft {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub content: String,
    #[validate(length(max = 50))]
    pub category: String,
    pub image_url: Option<String>,
}

/// Comment embedded in a board post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    pub created_at: String,
}

impl Comment {
    fn to_value(&self) -> Value {
        Value::map(
            FieldsBuilder::new()
                .integer("id", self.id)
                .string("authorId", &self.author_id)
                .string("authorName", &self.author_name)
                .string("content", &self.content)
                .string("createdAt", &self.created_at)
                .build(),
        )
    }

    fn from_fields(f: &Fields) -> Self {
        Self {
            id: read_int(f, "id"),
            author_id: read_string(f, "authorId"),
            author_name: read_string(f, "authorName"),
            content: read_string(f, "content"),
            created_at: read_string(f, "createdAt"),
        }
    }
}

/// Member board post in `boardPosts/{id}`. Ids are millisecond timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct BoardPost {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub author_name: String,
    pub created_at: String,
    pub views: u32,
    /// Comment counter (kept alongside the embedded list)
    pub comments: u32,
    pub comment_list: Vec<Comment>,
    /// Pinned as a notice at the top of the board
    pub is_notice: bool,
}

impl FirestoreRecord for BoardPost {
    const COLLECTION: &'static str = collections::BOARD_POSTS;
    const KIND: &'static str = "Board post";

    fn document_id(&self) -> String {
        self.id.to_string()
    }

    fn to_fields(&self) -> Fields {
        FieldsBuilder::new()
            .integer("id", self.id)
            .string("title", &self.title)
            .string("content", &self.content)
            .string("authorId", &self.author_id)
            .string("authorName", &self.author_name)
            .string("createdAt", &self.created_at)
            .integer("views", i64::from(self.views))
            .integer("comments", i64::from(self.comments))
            .value(
                "commentList",
                Value::array(self.comment_list.iter().map(Comment::to_value).collect()),
            )
            .boolean("isNotice", self.is_notice)
            .build()
    }

    fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        let f = &doc.fields;
        Ok(Self {
            id: numeric_id(doc, "board post")?,
            title: read_string(f, "title"),
            content: read_string(f, "content"),
            author_id: read_string(f, "authorId"),
            author_name: read_string(f, "authorName"),
            created_at: read_string(f, "createdAt"),
            views: read_count(f, "views"),
            comments: read_count(f, "comments"),
            comment_list: read_map_list(f, "commentList")
                .into_iter()
                .map(Comment::from_fields)
                .collect(),
            is_notice: read_bool(f, "isNotice"),
        })
    }
}

/// Fields a member fills in when posting.
#[derive(Debug, Clone, Validate)]
pub struct PostDraft {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, fields: Fields) -> Document {
        Document::new(format!("projects/p/databases/(default)/documents/x/{}", id), fields)
    }

    #[test]
    fn test_news_with_text_id_is_rejected() {
        let result = NewsArticle::from_document(&doc("latest", Fields::new()));
        assert!(matches!(result, Err(DecodeError::InvalidId { .. })));
    }

    #[test]
    fn test_board_post_comments_survive_encoding() {
        let post = BoardPost {
            id: 1_700_000_000_000,
            title: "Cleanup day".to_string(),
            content: "Bring gloves".to_string(),
            author_id: "kim01".to_string(),
            author_name: "Kim".to_string(),
            created_at: "2024-05-01T09:00:00Z".to_string(),
            views: 4,
            comments: 1,
            comment_list: vec![Comment {
                id: 1,
                author_id: "lee02".to_string(),
                author_name: "Lee".to_string(),
                content: "I'll be there".to_string(),
                created_at: "2024-05-01T10:00:00Z".to_string(),
            }],
            is_notice: true,
        };

        let decoded = BoardPost::from_document(&doc("1700000000000", post.to_fields())).unwrap();
        assert_eq!(decoded, post);
    }

    #[test]
    fn test_news_malformed_views_reads_zero() {
        let fields = FieldsBuilder::new()
            .string("title", "Notice")
            .string("views", "many")
            .build();
        let article = NewsArticle::from_document(&doc("3", fields)).unwrap();
        assert_eq!(article.id, 3);
        assert_eq!(article.views, 0);
        assert_eq!(article.image_url, None);
    }
}
