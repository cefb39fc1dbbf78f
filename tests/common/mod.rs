// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use civic_portal::config::Config;
use civic_portal::db::MemoryStore;
use civic_portal::models::{EventDraft, SignUpRequest, User};
use civic_portal::services::{MemoryAdminApi, MemoryIdentity};
use civic_portal::storage::{keys, LocalStorage, MemoryStorage};
use civic_portal::{Backends, Store};
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Shared in-memory backends. Each `Store` built from one env sees the same
/// remote data, like two browsers against one backend.
#[allow(dead_code)]
pub struct TestEnv {
    pub documents: Arc<MemoryStore>,
    pub identity: Arc<MemoryIdentity>,
    pub admin_api: Arc<MemoryAdminApi>,
    pub storage: Arc<MemoryStorage>,
}

#[allow(dead_code)]
impl TestEnv {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(MemoryStore::new()),
            identity: Arc::new(MemoryIdentity::new()),
            admin_api: Arc::new(MemoryAdminApi::new()),
            storage: Arc::new(MemoryStorage::new()),
        }
    }

    /// Backends sharing this env's local storage.
    pub fn backends(&self) -> Backends {
        Backends {
            documents: self.documents.clone(),
            identity: self.identity.clone(),
            admin_api: self.admin_api.clone(),
            storage: self.storage.clone(),
        }
    }

    /// A store over this env's local storage (a reload of the same browser).
    pub fn store(&self) -> Store {
        Store::new(Config::default(), self.backends())
    }

    /// A store with its own empty local storage (another browser).
    pub fn other_browser(&self) -> Store {
        let backends = Backends {
            storage: Arc::new(MemoryStorage::new()),
            ..self.backends()
        };
        Store::new(Config::default(), backends)
    }

    /// No session is persisted in this env's local storage.
    pub fn storage_session_is_empty(&self) -> bool {
        self.storage.get(keys::SESSION).is_none()
    }

    pub fn email(&self, user_id: &str) -> String {
        format!("{}@{}", user_id, Config::default().auth_email_domain)
    }
}

#[allow(dead_code)]
pub fn signup_request(user_id: &str, password: &str) -> SignUpRequest {
    SignUpRequest {
        user_id: user_id.to_string(),
        password: password.to_string(),
        name: format!("Member {}", user_id),
        phone: "010-0000-0000".to_string(),
        email: None,
        address: String::new(),
    }
}

/// Sign up and stay logged in.
#[allow(dead_code)]
pub async fn signed_up(store: &mut Store, user_id: &str) -> User {
    store
        .sign_up(signup_request(user_id, "secret123"))
        .await
        .expect("sign-up should succeed")
}

/// A store in its own browser, logged in as the site administrator.
#[allow(dead_code)]
pub async fn admin_store(env: &TestEnv) -> Store {
    let mut store = env.other_browser();
    let admin = signed_up(&mut store, "admin").await;
    assert!(admin.is_admin());
    store
}

#[allow(dead_code)]
pub fn event_draft(capacity: u32, recruitment_end: &str) -> EventDraft {
    EventDraft {
        title: "Riverside cleanup".to_string(),
        description: "Bring gloves".to_string(),
        location: "Riverside park".to_string(),
        event_date: "2999-12-31".to_string(),
        recruitment_start_date: "2000-01-01".to_string(),
        recruitment_end_date: recruitment_end.to_string(),
        capacity,
    }
}
