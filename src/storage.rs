// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local persisted key/value state.
//!
//! Every value is a JSON string under a fixed key. Reads tolerate missing
//! or malformed JSON by falling back to the default.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Keys of the persisted state.
pub mod keys {
    pub const USERS: &str = "users";
    pub const AUTH_PROOFS: &str = "userAuthProofs";
    pub const SESSION: &str = "firebaseSession";
    pub const HERO_IMAGE_URLS: &str = "heroImageUrls";
    pub const LOGO_URL: &str = "logoUrl";
}

/// Storage errors. Only writes report them; reads fall back to defaults.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to write {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// String key/value store.
pub trait LocalStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Load a JSON value, or `T::default()` if missing or malformed.
pub fn load_json<T>(storage: &dyn LocalStorage, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = storage.get(key) else {
        return T::default();
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "Malformed local state, using default");
            T::default()
        }
    }
}

pub fn save_json<T: Serialize + ?Sized>(
    storage: &dyn LocalStorage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })?;
    storage.set(key, &raw)
}

/// One file per key under a directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        std::fs::write(self.path(key), value).map_err(io_err)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// In-memory storage for tests.
#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if let Ok(mut values) = self.values.lock() {
            values.remove(key);
        }
        Ok(())
    }
}
