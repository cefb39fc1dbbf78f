// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document store client over the REST API.
//!
//! Provides path-addressed operations for every collection:
//! - list (GET on the collection, following `nextPageToken`)
//! - get (GET on the document path, 404 means absent)
//! - create (POST with `documentId`)
//! - update (PATCH on the document path)
//! - delete (DELETE on the document path)
//!
//! Every call carries the API key; the bearer token is attached when given.

use crate::db::value::{Document, Fields};
use crate::db::DocumentStore;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

const PAGE_SIZE: u32 = 300;

/// REST document store client.
#[derive(Clone)]
pub struct FirestoreRest {
    http: reqwest::Client,
    /// `.../projects/{p}/databases/(default)/documents`
    documents_url: String,
    api_key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Serialize)]
struct WriteBody<'a> {
    fields: &'a Fields,
}

impl FirestoreRest {
    /// Create a client for the given project.
    ///
    /// For local development with the emulator, set FIRESTORE_EMULATOR_HOST.
    pub fn new(project_id: &str, api_key: &str) -> Self {
        let base = match std::env::var("FIRESTORE_EMULATOR_HOST") {
            Ok(host) => {
                tracing::info!(host = %host, "Using Firestore emulator");
                format!("http://{}/v1", host)
            }
            Err(_) => "https://firestore.googleapis.com/v1".to_string(),
        };
        Self::with_base_url(&base, project_id, api_key)
    }

    /// Create a client against an explicit REST base URL.
    pub fn with_base_url(base_url: &str, project_id: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            documents_url: format!(
                "{}/projects/{}/databases/(default)/documents",
                base_url.trim_end_matches('/'),
                project_id
            ),
            api_key: api_key.to_string(),
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.documents_url, collection)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.documents_url,
            collection,
            urlencoding::encode(id)
        )
    }

    fn authorize(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        let request = request.query(&[("key", self.api_key.as_str())]);
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, AppError> {
        request
            .send()
            .await
            .map_err(|e| AppError::Database(format!("request failed: {}", e)))
    }

    /// Map a non-success status to an error.
    async fn check_response(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED => Err(AppError::Unauthorized),
            StatusCode::FORBIDDEN => Err(AppError::Forbidden(body)),
            StatusCode::NOT_FOUND => Err(AppError::NotFound(body)),
            _ => Err(AppError::Database(format!("HTTP {}: {}", status, body))),
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreRest {
    async fn list(
        &self,
        collection: &str,
        token: Option<&str>,
    ) -> Result<Vec<Document>, AppError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .authorize(self.http.get(self.collection_url(collection)), token)
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(next) = &page_token {
                request = request.query(&[("pageToken", next.as_str())]);
            }

            let response = self.check_response(self.send(request).await?).await?;
            let page: ListResponse = response
                .json()
                .await
                .map_err(|e| AppError::Database(format!("JSON parse error: {}", e)))?;

            documents.extend(page.documents);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        tracing::debug!(collection, count = documents.len(), "Listed documents");
        Ok(documents)
    }

    async fn get(
        &self,
        collection: &str,
        id: &str,
        token: Option<&str>,
    ) -> Result<Option<Document>, AppError> {
        let request = self.authorize(self.http.get(self.document_url(collection, id)), token);
        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = self.check_response(response).await?;
        response
            .json()
            .await
            .map(Some)
            .map_err(|e| AppError::Database(format!("JSON parse error: {}", e)))
    }

    async fn create(
        &self,
        collection: &str,
        id: &str,
        fields: &Fields,
        token: Option<&str>,
    ) -> Result<(), AppError> {
        let request = self
            .authorize(self.http.post(self.collection_url(collection)), token)
            .query(&[("documentId", id)])
            .json(&WriteBody { fields });
        self.check_response(self.send(request).await?).await?;
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: &Fields,
        token: Option<&str>,
    ) -> Result<(), AppError> {
        let request = self
            .authorize(self.http.patch(self.document_url(collection, id)), token)
            .json(&WriteBody { fields });
        self.check_response(self.send(request).await?).await?;
        Ok(())
    }

    async fn delete(
        &self,
        collection: &str,
        id: &str,
        token: Option<&str>,
    ) -> Result<(), AppError> {
        let request = self.authorize(self.http.delete(self.document_url(collection, id)), token);
        self.check_response(self.send(request).await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_urls() {
        let db = FirestoreRest::with_base_url("http://localhost:8080/v1/", "demo", "k");
        assert_eq!(
            db.collection_url("news"),
            "http://localhost:8080/v1/projects/demo/databases/(default)/documents/news"
        );
        assert_eq!(
            db.document_url("users", "a b"),
            "http://localhost:8080/v1/projects/demo/databases/(default)/documents/users/a%20b"
        );
    }
}
