//! Google Photos API Client
//!
//! Low-level requests against the Photos Library API and the OAuth token endpoint.
//! Every call takes the access token explicitly; token lifecycle belongs to
//! [`crate::client::PhotoClient`].

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, trace};

use super::errors::ApiError;
use super::types::{Album, AlbumListResponse, Photo, SearchPhotosResponse};

/// OAuth endpoint used to exchange the refresh token
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Photos Library albums.list endpoint
const ALBUMS_URL: &str = "https://photoslibrary.googleapis.com/v1/albums";

/// Photos Library mediaItems:search endpoint
const SEARCH_URL: &str = "https://photoslibrary.googleapis.com/v1/mediaItems:search";

/// HTTP client timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of media items requested per search page
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// albums.list rejects page sizes above 50
const ALBUM_PAGE_SIZE: u32 = 50;

/// Remote operations the photo client depends on
#[async_trait]
pub trait PhotosApi: Send + Sync {
    /// Exchange a refresh token for a new access token
    async fn refresh_access_token(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<String, ApiError>;

    /// List every album of the account, in service order
    async fn list_albums(&self, access_token: &str) -> Result<Vec<Album>, ApiError>;

    /// List the media items of an album
    async fn search_photos(&self, access_token: &str, album_id: &str)
        -> Result<Vec<Photo>, ApiError>;

    /// Whether a media link is still servable. Any failure counts as `false`.
    async fn check_link(&self, url: &str) -> bool;
}

/// Endpoint set used by [`GooglePhotosApi`]
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub token_url: String,
    pub albums_url: String,
    pub search_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            token_url: TOKEN_URL.to_string(),
            albums_url: ALBUMS_URL.to_string(),
            search_url: SEARCH_URL.to_string(),
        }
    }
}

/// Response from the OAuth token endpoint
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

/// Request body for mediaItems:search
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchPhotosRequest<'a> {
    album_id: &'a str,
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<String>,
}

/// HTTP implementation of [`PhotosApi`]
#[derive(Clone)]
pub struct GooglePhotosApi {
    /// HTTP client for making requests
    http_client: Client,
    endpoints: Endpoints,
    /// Media items per search page
    page_size: u32,
}

impl GooglePhotosApi {
    /// Create a client for the public Google endpoints
    pub fn new() -> Result<Self, ApiError> {
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_http_client(http_client, Endpoints::default()))
    }

    /// Create a client on top of an existing HTTP client and endpoint set
    pub fn with_http_client(http_client: Client, endpoints: Endpoints) -> Self {
        Self {
            http_client,
            endpoints,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the search page size
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

/// Check the status and decode the JSON body of a response
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::from_status(status.as_u16(), &body));
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl PhotosApi for GooglePhotosApi {
    async fn refresh_access_token(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<String, ApiError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ];

        let response = self
            .http_client
            .post(&self.endpoints.token_url)
            .header("cache-control", "no-cache")
            .form(&form)
            .send()
            .await?;

        let refreshed: RefreshResponse = read_json(response).await?;
        info!(expires_in = refreshed.expires_in, "Access token refreshed");
        Ok(refreshed.access_token)
    }

    async fn list_albums(&self, access_token: &str) -> Result<Vec<Album>, ApiError> {
        let mut albums = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http_client
                .get(&self.endpoints.albums_url)
                .bearer_auth(access_token)
                .header("cache-control", "no-cache")
                .query(&[("pageSize", ALBUM_PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let page: AlbumListResponse = read_json(request.send().await?).await?;
            albums.extend(page.albums);

            match page.next_page_token {
                Some(next) if !next.is_empty() && page_token.as_deref() != Some(next.as_str()) => {
                    page_token = Some(next)
                }
                _ => break,
            }
        }

        debug!(count = albums.len(), "Listed albums from API");
        Ok(albums)
    }

    async fn search_photos(
        &self,
        access_token: &str,
        album_id: &str,
    ) -> Result<Vec<Photo>, ApiError> {
        let mut photos = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let request = SearchPhotosRequest {
                album_id,
                page_size: self.page_size,
                page_token: page_token.clone(),
            };

            let response = self
                .http_client
                .post(&self.endpoints.search_url)
                .bearer_auth(access_token)
                .header("cache-control", "no-cache")
                .json(&request)
                .send()
                .await?;

            let page: SearchPhotosResponse = read_json(response).await?;
            photos.extend(page.media_items);

            match page.next_page_token {
                Some(next) if !next.is_empty() && page_token.as_deref() != Some(next.as_str()) => {
                    page_token = Some(next)
                }
                _ => break,
            }
        }

        debug!(album = album_id, count = photos.len(), "Fetched album photos from API");
        Ok(photos)
    }

    async fn check_link(&self, url: &str) -> bool {
        match self.http_client.get(url).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                trace!(error = %e, "Media link check failed");
                false
            }
        }
    }
}
