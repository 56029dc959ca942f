//! Durable photo cache backed by redb
//!
//! Layout: the top-level `photo` table maps each cached album id to the last
//! sequence number issued in that album, and doubles as the namespace registry.
//! The records of an album live in their own table `photo/<album id>`, keyed by
//! zero-padded decimal sequence numbers so key order equals save order.

use std::path::Path;
use std::sync::{PoisonError, RwLock};

use redb::{Database, ReadableTable, TableDefinition};
use tracing::{debug, info};

use super::{PhotoStore, StoreError, StoreResult};
use crate::api::Photo;

/// Album id -> last issued sequence number
const PHOTO_TABLE: TableDefinition<&str, u64> = TableDefinition::new("photo");

/// Width of an encoded sequence key (u64::MAX has 20 digits)
const SEQUENCE_WIDTH: usize = 20;

macro_rules! impl_from_redb {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for StoreError {
                fn from(e: $ty) -> Self {
                    StoreError::Database(e.into())
                }
            }
        )*
    };
}

impl_from_redb!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError
);

fn album_table_name(album: &str) -> String {
    format!("photo/{}", album)
}

fn sequence_key(sequence: u64) -> String {
    format!("{:0width$}", sequence, width = SEQUENCE_WIDTH)
}

/// File-backed transactional photo cache
pub struct RedbStore {
    /// `None` once closed
    db: RwLock<Option<Database>>,
}

impl RedbStore {
    /// Open (or create) the cache file at `path`
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let db = Database::create(path)?;

        let txn = db.begin_write()?;
        txn.open_table(PHOTO_TABLE)?;
        txn.commit()?;

        info!(path = %path.display(), "Photo cache opened");
        Ok(Self {
            db: RwLock::new(Some(db)),
        })
    }

    fn with_db<T>(&self, f: impl FnOnce(&Database) -> StoreResult<T>) -> StoreResult<T> {
        let guard = self.db.read().unwrap_or_else(PoisonError::into_inner);
        let db = guard.as_ref().ok_or(StoreError::Closed)?;
        f(db)
    }
}

impl PhotoStore for RedbStore {
    fn save_photos(&self, album: &str, photos: &[Photo]) -> StoreResult<()> {
        self.with_db(|db| {
            let txn = db.begin_write()?;
            {
                let mut registry = txn.open_table(PHOTO_TABLE)?;
                let mut sequence = registry.get(album)?.map(|last| last.value()).unwrap_or(0);

                let name = album_table_name(album);
                let mut table = txn.open_table(TableDefinition::<&str, &str>::new(&name))?;
                for photo in photos {
                    sequence += 1;
                    let value = serde_json::to_string(photo).map_err(StoreError::Encode)?;
                    table.insert(sequence_key(sequence).as_str(), value.as_str())?;
                }

                registry.insert(album, sequence)?;
            }
            // Dropping an uncommitted transaction aborts it
            txn.commit()?;

            debug!(album = album, count = photos.len(), "Saved album photos");
            Ok(())
        })
    }

    fn list_photos(&self, album: &str) -> StoreResult<Vec<Photo>> {
        self.with_db(|db| {
            let txn = db.begin_read()?;
            let registry = txn.open_table(PHOTO_TABLE)?;
            if registry.get(album)?.is_none() {
                debug!(album = album, "Album not cached");
                return Err(StoreError::AlbumNotExists(album.to_string()));
            }

            let name = album_table_name(album);
            let table = txn.open_table(TableDefinition::<&str, &str>::new(&name))?;

            let mut photos = Vec::new();
            for entry in table.iter()? {
                let (key, value) = entry?;
                let photo = serde_json::from_str(value.value()).map_err(|source| {
                    StoreError::Decode {
                        album: album.to_string(),
                        key: key.value().to_string(),
                        source,
                    }
                })?;
                photos.push(photo);
            }

            debug!(album = album, count = photos.len(), "Listed cached album photos");
            Ok(photos)
        })
    }

    fn truncate_album(&self, album: &str) -> StoreResult<()> {
        self.with_db(|db| {
            let txn = db.begin_write()?;
            {
                let mut registry = txn.open_table(PHOTO_TABLE)?;
                if registry.remove(album)?.is_none() {
                    return Ok(());
                }
            }

            let name = album_table_name(album);
            txn.delete_table(TableDefinition::<&str, &str>::new(&name))?;
            txn.commit()?;

            debug!(album = album, "Truncated cached album");
            Ok(())
        })
    }

    fn close(&self) -> StoreResult<()> {
        let mut guard = self.db.write().unwrap_or_else(PoisonError::into_inner);
        if guard.take().is_some() {
            info!("Photo cache closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CameraMetadata;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, RedbStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("gphoto.db")).unwrap();
        (dir, store)
    }

    fn photo(id: &str) -> Photo {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "baseUrl": format!("http://media/{}", id),
            "mimeType": "image/jpeg",
            "filename": format!("{}.jpg", id),
            "mediaMetadata": {"creationTime": "2021-07-04T12:00:00Z", "width": "800", "height": "600"}
        }))
        .unwrap()
    }

    fn stored_keys(store: &RedbStore, album: &str) -> Vec<String> {
        store
            .with_db(|db| {
                let txn = db.begin_read()?;
                let name = album_table_name(album);
                let table = txn.open_table(TableDefinition::<&str, &str>::new(&name))?;
                let mut keys = Vec::new();
                for entry in table.iter()? {
                    keys.push(entry?.0.value().to_string());
                }
                Ok(keys)
            })
            .unwrap()
    }

    #[test]
    fn test_save_then_list_keeps_order() {
        let (_dir, store) = open_store();
        // More than nine records so string keys must sort numerically
        let photos: Vec<Photo> = (1..=12).map(|i| photo(&format!("p{}", i))).collect();

        store.save_photos("A1", &photos).unwrap();

        assert_eq!(store.list_photos("A1").unwrap(), photos);
    }

    #[test]
    fn test_camera_floats_read_back_exactly() {
        let (_dir, store) = open_store();
        let mut with_camera = photo("lens");
        with_camera.media_metadata.photo = Some(CameraMetadata {
            camera_make: "Canon".to_string(),
            camera_model: "EOS R5".to_string(),
            focal_length: 119.01793343883841,
            aperture_f_number: 5.6000000000000005,
            iso_equivalent: 400,
        });

        store.save_photos("A1", std::slice::from_ref(&with_camera)).unwrap();

        let listed = store.list_photos("A1").unwrap();
        let camera = listed[0].media_metadata.photo.as_ref().unwrap();
        assert_eq!(camera.focal_length.to_bits(), 119.01793343883841f64.to_bits());
        assert_eq!(camera.aperture_f_number.to_bits(), 5.6000000000000005f64.to_bits());
        assert_eq!(listed, vec![with_camera]);
    }

    #[test]
    fn test_list_missing_album() {
        let (_dir, store) = open_store();

        let err = store.list_photos("missing").unwrap_err();
        assert!(matches!(err, StoreError::AlbumNotExists(album) if album == "missing"));
    }

    #[test]
    fn test_save_appends_with_increasing_keys() {
        let (_dir, store) = open_store();

        store.save_photos("A1", &[photo("a"), photo("b")]).unwrap();
        store.save_photos("A1", &[photo("c")]).unwrap();

        let ids: Vec<String> = store.list_photos("A1").unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(
            stored_keys(&store, "A1"),
            vec![sequence_key(1), sequence_key(2), sequence_key(3)]
        );
    }

    #[test]
    fn test_truncate_missing_album_is_noop() {
        let (_dir, store) = open_store();
        store.save_photos("other", &[photo("x")]).unwrap();

        store.truncate_album("missing").unwrap();

        assert_eq!(store.list_photos("other").unwrap().len(), 1);
    }

    #[test]
    fn test_truncate_removes_only_that_album() {
        let (_dir, store) = open_store();
        store.save_photos("A1", &[photo("a")]).unwrap();
        store.save_photos("A2", &[photo("b")]).unwrap();

        store.truncate_album("A1").unwrap();

        assert!(matches!(
            store.list_photos("A1"),
            Err(StoreError::AlbumNotExists(_))
        ));
        assert_eq!(store.list_photos("A2").unwrap()[0].id, "b");
    }

    #[test]
    fn test_sequence_restarts_after_truncate() {
        let (_dir, store) = open_store();
        store.save_photos("A1", &[photo("a"), photo("b")]).unwrap();
        store.save_photos("A2", &[photo("x")]).unwrap();

        store.truncate_album("A1").unwrap();
        store.save_photos("A1", &[photo("c")]).unwrap();
        store.save_photos("A2", &[photo("y")]).unwrap();

        assert_eq!(stored_keys(&store, "A1"), vec![sequence_key(1)]);
        assert_eq!(stored_keys(&store, "A2"), vec![sequence_key(1), sequence_key(2)]);
    }

    #[test]
    fn test_save_empty_creates_namespace() {
        let (_dir, store) = open_store();

        store.save_photos("A1", &[]).unwrap();

        assert!(store.list_photos("A1").unwrap().is_empty());
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gphoto.db");
        let photos = vec![photo("a"), photo("b")];

        let store = RedbStore::open(&path).unwrap();
        store.save_photos("A1", &photos).unwrap();
        store.close().unwrap();
        drop(store);

        let reopened = RedbStore::open(&path).unwrap();
        assert_eq!(reopened.list_photos("A1").unwrap(), photos);
    }

    #[test]
    fn test_closed_store_rejects_operations() {
        let (_dir, store) = open_store();

        store.close().unwrap();
        store.close().unwrap();

        assert!(matches!(store.list_photos("A1"), Err(StoreError::Closed)));
        assert!(matches!(store.save_photos("A1", &[photo("a")]), Err(StoreError::Closed)));
        assert!(matches!(store.truncate_album("A1"), Err(StoreError::Closed)));
    }

    #[test]
    fn test_undecodable_record_fails_whole_list() {
        let (_dir, store) = open_store();
        store.save_photos("A1", &[photo("a")]).unwrap();

        store
            .with_db(|db| {
                let txn = db.begin_write()?;
                {
                    let name = album_table_name("A1");
                    let mut table = txn.open_table(TableDefinition::<&str, &str>::new(&name))?;
                    table.insert(sequence_key(2).as_str(), "{not json")?;
                }
                txn.commit()?;
                Ok(())
            })
            .unwrap();

        match store.list_photos("A1") {
            Err(StoreError::Decode { album, key, .. }) => {
                assert_eq!(album, "A1");
                assert_eq!(key, sequence_key(2));
            }
            other => panic!("expected decode error, got {:?}", other),
        }
    }
}
