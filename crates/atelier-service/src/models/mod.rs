//! Atelier models.
//!
//! Records stored in Postgres, the request bodies that create or update them,
//! and the response envelopes the handlers return.

use serde::{Deserialize, Serialize};

/// A stored artist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub style: String,
}

/// A stored video. `video_type` is `type` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub video_type: String,
}

/// Body of `POST /artists`. Every field is required.
#[derive(Debug, Clone, Deserialize)]
pub struct NewArtist {
    pub name: String,
    pub age: i32,
    pub style: String,
}

/// Body of `PATCH /artists/:id`. Absent (or null) fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtistChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub style: Option<String>,
}

/// Body of `POST /videos` and `POST /add-videos`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewVideo {
    pub title: String,
    #[serde(rename = "type")]
    pub video_type: String,
}

/// Body of `PATCH /videos/:id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoChanges {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub video_type: Option<String>,
}

/// `{ "success": true, "artists": ... }`, used for lists and single records.
#[derive(Debug, Clone, Serialize)]
pub struct ArtistsResponse<T> {
    pub success: bool,
    pub artists: T,
}

/// `{ "success": true, "videos": ... }`, used for lists and single records.
#[derive(Debug, Clone, Serialize)]
pub struct VideosResponse<T> {
    pub success: bool,
    pub videos: T,
}

/// `{ "success": true, "video": ... }`, returned by `PATCH /videos/:id`.
#[derive(Debug, Clone, Serialize)]
pub struct VideoResponse {
    pub success: bool,
    pub video: Video,
}

/// `{ "success": true, "delete": <id> }`.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub delete: i64,
}

/// `{ "url": ... }`, returned by `GET /authorization/url`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginUrlResponse {
    pub url: String,
}

/// Readiness check response.
///
/// Returned by the `/ready` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    /// "ready" or "not_ready".
    pub status: &'static str,

    /// Database connectivity status.
    pub database: &'static str,
}
