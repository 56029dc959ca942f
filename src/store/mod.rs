//! Photo cache layer
//!
//! Persists the photos of each album in its own namespace so a whole album can be
//! replaced atomically. Records keep the order they were saved in.

pub mod memory;
pub mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::api::Photo;

/// Photo cache error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Album not cached: {0}")]
    AlbumNotExists(String),

    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Failed to encode photo: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to decode cached photo {key} of album {album}: {source}")]
    Decode {
        album: String,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Photo cache is closed")]
    Closed,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Transactional photo cache. Every call is exactly one transaction.
pub trait PhotoStore: Send + Sync {
    /// Append photos to the album namespace, creating it if needed.
    /// Either every photo is written or none is.
    fn save_photos(&self, album: &str, photos: &[Photo]) -> StoreResult<()>;

    /// Read the album's photos in save order.
    /// Fails with [`StoreError::AlbumNotExists`] when the namespace is absent.
    fn list_photos(&self, album: &str) -> StoreResult<Vec<Photo>>;

    /// Drop the album namespace. Succeeds without effect if it does not exist.
    fn truncate_album(&self, album: &str) -> StoreResult<()>;

    /// Release the underlying store. Repeated calls are no-ops.
    fn close(&self) -> StoreResult<()>;
}
