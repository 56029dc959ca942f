//! Photo client error types

use crate::api::ApiError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Failed to refresh access token: {0}")]
    RefreshToken(#[source] ApiError),

    #[error("Failed to get album list: {0}")]
    GetAlbum(#[source] ApiError),

    #[error("Failed to search photos of album {album}: {source}")]
    SearchPhotos {
        album: String,
        #[source]
        source: ApiError,
    },

    #[error("Failed to truncate cached album {album}: {source}")]
    Truncate {
        album: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to save photos of album {album}: {source}")]
    Save {
        album: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to close photo cache: {0}")]
    Close(#[source] StoreError),
}
