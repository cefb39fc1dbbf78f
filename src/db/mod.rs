//! Database layer (remote document store).

pub mod firestore;
pub mod memory;
pub mod remote;
pub mod value;

pub use firestore::FirestoreRest;
pub use memory::MemoryStore;
pub use remote::{FirestoreRecord, RemoteData, Write};
pub use value::{Document, Fields, Value};

use crate::error::AppError;
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const NEWS: &str = "news";
    pub const BOARD_POSTS: &str = "boardPosts";
    pub const EVENTS: &str = "events";
    pub const EVENT_APPLICATIONS: &str = "eventApplications";
    pub const PROPOSALS: &str = "proposals";
    pub const POLLS: &str = "polls";
    /// Singleton documents (`settings/siteContent`)
    pub const SETTINGS: &str = "settings";
    /// Admin-issued deletion markers keyed by user id
    pub const DELETED_USERS: &str = "deletedUsers";
}

/// Document id of the site content singleton inside `settings`.
pub const SITE_CONTENT_ID: &str = "siteContent";

/// Raw document operations against the remote store.
///
/// Implementations report failures as errors; the typed layer in
/// [`RemoteData`] decides how to fold them.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of a collection. An empty collection is `Ok(vec![])`.
    async fn list(&self, collection: &str, token: Option<&str>)
        -> Result<Vec<Document>, AppError>;

    /// A single document, `None` if it does not exist.
    async fn get(
        &self,
        collection: &str,
        id: &str,
        token: Option<&str>,
    ) -> Result<Option<Document>, AppError>;

    /// Create a document with an explicit id.
    async fn create(
        &self,
        collection: &str,
        id: &str,
        fields: &Fields,
        token: Option<&str>,
    ) -> Result<(), AppError>;

    /// Replace (or create) the document at `collection/id`.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: &Fields,
        token: Option<&str>,
    ) -> Result<(), AppError>;

    async fn delete(&self, collection: &str, id: &str, token: Option<&str>)
        -> Result<(), AppError>;
}
