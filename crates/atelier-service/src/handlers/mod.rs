//! HTTP request handlers for the atelier service.

pub mod artists;
pub mod health;
pub mod login;
pub mod metrics;
pub mod videos;

pub use artists::{create_artist, delete_artist, get_artist, list_artists, update_artist};
pub use health::{greeting, health_check, not_found, readiness_check};
pub use login::login_url;
pub use metrics::metrics_handler;
pub use videos::{create_video, delete_video, get_video, list_videos, update_video};

use crate::errors::ApiError;
use axum::body::Bytes;
use serde::de::DeserializeOwned;

/// Decode a JSON request body.
///
/// Bodies are read as raw bytes so that missing fields, wrong types and
/// invalid JSON all surface as 400 rather than the framework's 415/422.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(target: "atelier.handlers", error = %e, "Rejected request body");
        ApiError::BadRequest(format!("Invalid request body: {e}"))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{NewVideo, VideoChanges};

    #[test]
    fn test_parse_json_valid() {
        let body = Bytes::from_static(br#"{"title": "Kind of Blue", "type": "album"}"#);
        let video: NewVideo = parse_json(&body).unwrap();
        assert_eq!(video.video_type, "album");
    }

    #[test]
    fn test_parse_json_rejections_are_bad_request() {
        let cases: [&[u8]; 4] = [
            b"",
            b"not json",
            br#"{"title": "No type"}"#,
            br#"{"title": 7, "type": "live"}"#,
        ];
        for raw in cases {
            let result: Result<NewVideo, _> = parse_json(&Bytes::copy_from_slice(raw));
            assert!(matches!(result, Err(ApiError::BadRequest(_))), "{raw:?}");
        }
    }

    #[test]
    fn test_parse_json_non_object_patch_rejected() {
        let result: Result<VideoChanges, _> = parse_json(&Bytes::from_static(b"[1, 2]"));
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
