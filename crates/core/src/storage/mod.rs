//! Object storage abstraction.
//!
//! Both programs talk to one container (a bucket) through [`ObjectStore`]:
//! the catalog builder lists, downloads and uploads; the view signs playback
//! URLs for media objects.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub mod gcs;
pub mod local;
pub mod memory;

pub use gcs::{GcsConfig, GcsStore};
pub use local::{LocalStore, get_default_local_root};
pub use memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Object not found: {object}")]
    NotFound { object: String },

    #[error("Storage request for {object} failed with HTTP {status}: {body}")]
    Http {
        object: String,
        status: u16,
        body: String,
    },

    #[error("Storage request for {object} failed: {reason}")]
    Backend { object: String, reason: String },

    #[error("Authentication failed: {reason}")]
    Auth { reason: String },

    #[error("Could not sign URL for {object}: {reason}")]
    Signing { object: String, reason: String },

    #[error("Object {object} is not valid UTF-8")]
    NotUtf8 { object: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the container (bucket) this store reads from and writes to.
    fn container(&self) -> &str;

    /// Names of every object starting with `prefix`, in the store's own order.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    async fn download(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Create or overwrite `name`.
    async fn upload(&self, name: &str, data: Vec<u8>, content_type: &str)
    -> Result<(), StorageError>;

    /// Time-limited URL granting read access to `name`.
    async fn signed_url(&self, name: &str, validity: Duration) -> Result<String, StorageError>;

    async fn download_text(&self, name: &str) -> Result<String, StorageError> {
        let bytes = self.download(name).await?;
        String::from_utf8(bytes).map_err(|_| StorageError::NotUtf8 {
            object: name.to_string(),
        })
    }
}
