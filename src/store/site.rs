// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Site content singleton.

use super::Store;
use crate::db::remote::Write;
use crate::error::Result;
use crate::models::SiteContent;
use crate::storage::{keys, save_json};

impl Store {
    /// Fetch site content. Unreachable backend keeps the cached images.
    pub async fn load_site_content(&mut self) -> &SiteContent {
        let token = self.optional_token().await;
        match self.remote.fetch_site_content(token.as_deref()).await {
            Some(content) => {
                self.site = content;
                self.cache_site_images();
            }
            None => tracing::debug!("Using cached site images"),
        }
        &self.site
    }

    /// Replace the site content (admin).
    pub async fn save_site_content(&mut self, content: SiteContent) -> Result<()> {
        self.require_admin()?;
        let content = SiteContent {
            hero_image_urls: content
                .hero_image_urls
                .into_iter()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .collect(),
            ..content
        };

        self.authorized_write(Write::Update(&content)).await?;
        tracing::info!(hero_images = content.hero_image_urls.len(), "Site content saved");
        self.site = content;
        self.cache_site_images();
        Ok(())
    }

    fn cache_site_images(&self) {
        let storage = self.storage.as_ref();
        let result = save_json(storage, keys::HERO_IMAGE_URLS, &self.site.hero_image_urls)
            .and_then(|()| save_json(storage, keys::LOGO_URL, &self.site.logo_url));
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to cache site images");
        }
    }
}
