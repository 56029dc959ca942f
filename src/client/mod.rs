//! Photo Client
//!
//! Front door for album and photo lookups. Owns the OAuth credentials, retries a
//! call once after refreshing an expired access token, and keeps album photos in
//! the local cache so their time-limited media links are only refetched once the
//! service stops serving them.
//!
//! A client is meant to be driven by one caller at a time. The access token sits
//! behind a lock, but two concurrent `get_photos_by_album` calls for the same
//! album may still interleave their truncate and save steps; callers needing
//! that must serialize per album themselves.

pub mod errors;

pub use errors::ClientError;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::api::{Album, ApiError, Photo, PhotosApi};
use crate::store::{PhotoStore, StoreError};

/// OAuth credentials handed to the client at construction
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Pre-seeded access token, may be empty
    pub access_token: String,
}

/// Why a call that went through the refresh protocol failed
enum CallFailure {
    /// The token refresh itself failed
    Refresh(ApiError),
    /// The remote call failed, before or after a refresh
    Call(ApiError),
}

/// Album and photo client backed by a remote API and a photo cache
pub struct PhotoClient<A, S> {
    api: A,
    store: S,
    client_id: String,
    client_secret: String,
    /// Never changes; only the access token is replaced on refresh
    refresh_token: String,
    access_token: RwLock<String>,
    /// Cache hit counter
    hits: AtomicU64,
    /// Cache miss counter
    misses: AtomicU64,
}

impl<A: PhotosApi, S: PhotoStore> PhotoClient<A, S> {
    pub fn new(api: A, store: S, credentials: Credentials) -> Self {
        Self {
            api,
            store,
            client_id: credentials.client_id,
            client_secret: credentials.client_secret,
            refresh_token: credentials.refresh_token,
            access_token: RwLock::new(credentials.access_token),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Current access token
    pub fn access_token(&self) -> String {
        self.access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Exchange the refresh token and store the new access token
    async fn refresh(&self) -> Result<String, ApiError> {
        info!("Refreshing access token...");
        let token = self
            .api
            .refresh_access_token(&self.client_id, &self.client_secret, &self.refresh_token)
            .await?;

        *self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token.clone();
        Ok(token)
    }

    /// Run a remote call with the current token. On `Unauthorized` refresh the
    /// token once and repeat the call once; a second rejection is final.
    async fn with_token_refresh<F, Fut, T>(&self, operation: &str, f: F) -> Result<T, CallFailure>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match f(self.access_token()).await {
            Err(e) if e.is_unauthorized() => {
                warn!(operation = operation, "Access token rejected, refreshing");
                let token = self.refresh().await.map_err(CallFailure::Refresh)?;
                f(token).await.map_err(CallFailure::Call)
            }
            result => result.map_err(CallFailure::Call),
        }
    }

    /// List all albums. Always served live.
    pub async fn list_albums(&self) -> Result<Vec<Album>, ClientError> {
        let albums = self
            .with_token_refresh("list_albums", move |token| async move {
                self.api.list_albums(&token).await
            })
            .await
            .map_err(|failure| match failure {
                CallFailure::Refresh(e) => ClientError::RefreshToken(e),
                CallFailure::Call(e) => ClientError::GetAlbum(e),
            })?;

        debug!(count = albums.len(), "Listed albums");
        Ok(albums)
    }

    /// Photos of an album, from the cache while its media links still work,
    /// otherwise fetched live and written back to the cache.
    pub async fn get_photos_by_album(&self, album_id: &str) -> Result<Vec<Photo>, ClientError> {
        if let Some(cached) = self.cached_photos(album_id).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(album = album_id, count = cached.len(), "Cache HIT for album photos");
            return Ok(cached);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let photos = self
            .with_token_refresh("search_photos", move |token| async move {
                self.api.search_photos(&token, album_id).await
            })
            .await
            .map_err(|failure| match failure {
                CallFailure::Refresh(e) => ClientError::RefreshToken(e),
                CallFailure::Call(source) => ClientError::SearchPhotos {
                    album: album_id.to_string(),
                    source,
                },
            })?;

        self.replace_cached(album_id, &photos)?;
        info!(album = album_id, count = photos.len(), "Refilled album photo cache");
        Ok(photos)
    }

    /// Cached photos of an album if they are still usable.
    ///
    /// Only the first photo's link is checked: link expiry applies to a whole
    /// batch, so one live link stands in for the rest.
    async fn cached_photos(&self, album_id: &str) -> Option<Vec<Photo>> {
        let cached = match self.store.list_photos(album_id) {
            Ok(cached) => cached,
            Err(StoreError::AlbumNotExists(_)) => {
                debug!(album = album_id, "Cache MISS for album photos");
                return None;
            }
            Err(e) => {
                warn!(album = album_id, error = %e, "Failed to read cached photos, refetching");
                return None;
            }
        };

        let first = cached.first()?;
        if self.api.check_link(&first.base_url).await {
            Some(cached)
        } else {
            debug!(album = album_id, "Cached media links expired");
            None
        }
    }

    /// Replace the album's cached photos as a whole
    fn replace_cached(&self, album_id: &str, photos: &[Photo]) -> Result<(), ClientError> {
        self.store
            .truncate_album(album_id)
            .map_err(|source| ClientError::Truncate {
                album: album_id.to_string(),
                source,
            })?;

        if photos.is_empty() {
            return Ok(());
        }

        self.store
            .save_photos(album_id, photos)
            .map_err(|source| ClientError::Save {
                album: album_id.to_string(),
                source,
            })
    }

    /// Get cache statistics
    ///
    /// Returns (hits, misses, hit_rate)
    pub fn stats(&self) -> (u64, u64, f64) {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        (hits, misses, hit_rate)
    }

    /// Close the photo cache
    pub fn close(&self) -> Result<(), ClientError> {
        let (hits, misses, hit_rate) = self.stats();
        debug!(
            hits = hits,
            misses = misses,
            hit_rate = format!("{:.1}%", hit_rate),
            "Cache metrics"
        );
        self.store.close().map_err(ClientError::Close)
    }
}
