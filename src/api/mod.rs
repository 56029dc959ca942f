//! Google Photos API client

pub mod client;
pub mod errors;
pub mod types;

pub use client::{Endpoints, GooglePhotosApi, PhotosApi, DEFAULT_PAGE_SIZE};
pub use errors::ApiError;
pub use types::*;
