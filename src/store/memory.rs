//! In-memory photo cache
//!
//! Same contract as [`super::RedbStore`] without durability. Useful for tests
//! and for running without a cache file.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use super::{PhotoStore, StoreError, StoreResult};
use crate::api::Photo;

/// One album namespace
#[derive(Debug, Default)]
struct AlbumRecords {
    /// Last issued sequence number
    sequence: u64,
    records: BTreeMap<u64, Photo>,
}

#[derive(Debug, Default)]
struct State {
    albums: HashMap<String, AlbumRecords>,
    closed: bool,
}

/// Photo cache held in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> StoreResult<T>) -> StoreResult<T> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.closed {
            return Err(StoreError::Closed);
        }
        f(&mut state)
    }
}

impl PhotoStore for MemoryStore {
    fn save_photos(&self, album: &str, photos: &[Photo]) -> StoreResult<()> {
        self.with_state(|state| {
            let namespace = state.albums.entry(album.to_string()).or_default();
            for photo in photos {
                namespace.sequence += 1;
                namespace.records.insert(namespace.sequence, photo.clone());
            }
            debug!(album = album, count = photos.len(), "Saved album photos in memory");
            Ok(())
        })
    }

    fn list_photos(&self, album: &str) -> StoreResult<Vec<Photo>> {
        self.with_state(|state| {
            state
                .albums
                .get(album)
                .map(|namespace| namespace.records.values().cloned().collect())
                .ok_or_else(|| StoreError::AlbumNotExists(album.to_string()))
        })
    }

    fn truncate_album(&self, album: &str) -> StoreResult<()> {
        self.with_state(|state| {
            state.albums.remove(album);
            Ok(())
        })
    }

    fn close(&self) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.closed = true;
        state.albums.clear();
        Ok(())
    }
}
