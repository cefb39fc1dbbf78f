// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Site-wide content singleton (`settings/siteContent`).

use crate::db::remote::FirestoreRecord;
use crate::db::value::{
    read_map, read_map_list, read_string, read_string_list, Document, Fields, FieldsBuilder, Value,
};
use crate::db::{collections, SITE_CONTENT_ID};
use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HistoryEntry {
    pub year: String,
    pub text: String,
}

/// Structured "about us" page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(default)]
pub struct AboutContent {
    pub greeting: String,
    pub mission: String,
    pub history: Vec<HistoryEntry>,
    pub address: String,
    pub phone: String,
}

/// Hero images, logo and about-us content. Readable by anyone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteContent {
    pub hero_image_urls: Vec<String>,
    pub logo_url: String,
    pub about: AboutContent,
}

impl FirestoreRecord for SiteContent {
    const COLLECTION: &'static str = collections::SETTINGS;
    const KIND: &'static str = "Site content";

    fn document_id(&self) -> String {
        SITE_CONTENT_ID.to_string()
    }

    fn to_fields(&self) -> Fields {
        let history = self
            .about
            .history
            .iter()
            .map(|h| {
                Value::map(
                    FieldsBuilder::new()
                        .string("year", &h.year)
                        .string("text", &h.text)
                        .build(),
                )
            })
            .collect();

        let about = FieldsBuilder::new()
            .string("greeting", &self.about.greeting)
            .string("mission", &self.about.mission)
            .value("history", Value::array(history))
            .string("address", &self.about.address)
            .string("phone", &self.about.phone)
            .build();

        FieldsBuilder::new()
            .string_array("heroImageUrls", self.hero_image_urls.iter().cloned())
            .string("logoUrl", &self.logo_url)
            .value("aboutUs", Value::map(about))
            .build()
    }

    /// The singleton has a fixed id, so any document decodes.
    fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        let f = &doc.fields;
        let about = read_map(f, "aboutUs")
            .map(|a| AboutContent {
                greeting: read_string(a, "greeting"),
                mission: read_string(a, "mission"),
                history: read_map_list(a, "history")
                    .into_iter()
                    .map(|h| HistoryEntry {
                        year: read_string(h, "year"),
                        text: read_string(h, "text"),
                    })
                    .collect(),
                address: read_string(a, "address"),
                phone: read_string(a, "phone"),
            })
            .unwrap_or_default();

        Ok(Self {
            hero_image_urls: read_string_list(f, "heroImageUrls"),
            logo_url: read_string(f, "logoUrl"),
            about,
        })
    }
}
