//! Google Photos album client with token refresh and a persistent photo cache

pub mod api;
pub mod client;
pub mod config;
pub mod store;

pub use api::{Album, ApiError, GooglePhotosApi, Photo, PhotosApi};
pub use client::{ClientError, Credentials, PhotoClient};
pub use config::Config;
pub use store::{MemoryStore, PhotoStore, RedbStore, StoreError};
