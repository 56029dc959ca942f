//! Photos API types
//!
//! Album and media item payloads as returned by the Google Photos Library API.
//! The same types are persisted by the photo cache, so serialization must
//! round-trip exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Wire forms of an int64 field
#[derive(Deserialize)]
#[serde(untagged)]
enum Int64Field {
    Number(u64),
    Text(String),
}

/// The Photos API encodes int64 fields as strings ("4032") while cached
/// records hold plain numbers. Absent, null and "" all read as 0.
fn int64_field<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Int64Field>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Int64Field::Number(value)) => Ok(value),
        Some(Int64Field::Text(text)) if text.is_empty() => Ok(0),
        Some(Int64Field::Text(text)) => text.parse().map_err(serde::de::Error::custom),
    }
}

/// A named collection of media items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Link to the album in the Photos web UI
    #[serde(default)]
    pub product_url: String,
    #[serde(default, deserialize_with = "int64_field")]
    pub media_items_count: u64,
    #[serde(default)]
    pub cover_photo_base_url: String,
    #[serde(default)]
    pub cover_photo_media_item_id: String,
}

/// A single image or video item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    #[serde(default)]
    pub product_url: String,
    /// Direct media link. Expires after a service-defined window and carries
    /// no expiry of its own; it has to be requested to know if it still works.
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub media_metadata: MediaMetadata,
}

/// Capture metadata of a media item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    #[serde(default)]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "int64_field")]
    pub width: u64,
    #[serde(default, deserialize_with = "int64_field")]
    pub height: u64,
    /// Camera details, only present for photos
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<CameraMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraMetadata {
    #[serde(default)]
    pub camera_make: String,
    #[serde(default)]
    pub camera_model: String,
    #[serde(default)]
    pub focal_length: f64,
    #[serde(default)]
    pub aperture_f_number: f64,
    #[serde(default)]
    pub iso_equivalent: u32,
}

/// Response from the albums.list endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumListResponse {
    /// Omitted by the API when the account has no albums
    #[serde(default)]
    pub albums: Vec<Album>,
    pub next_page_token: Option<String>,
}

/// Response from the mediaItems:search endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPhotosResponse {
    /// Omitted by the API when the album is empty
    #[serde(default)]
    pub media_items: Vec<Photo>,
    pub next_page_token: Option<String>,
}
