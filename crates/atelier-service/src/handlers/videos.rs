//! Video handlers.
//!
//! `POST /videos` and `POST /add-videos` share [`create_video`].

use crate::errors::ApiError;
use crate::handlers::parse_json;
use crate::models::{DeleteResponse, NewVideo, Video, VideoChanges, VideoResponse, VideosResponse};
use crate::repositories::VideosRepository;
use crate::routes::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::instrument;

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Video {id} not found"))
}

/// Handler for GET /videos
#[instrument(skip_all, name = "atelier.handlers.list_videos")]
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<VideosResponse<Vec<Video>>>, ApiError> {
    let videos = VideosRepository::list(&state.pool).await?;

    Ok(Json(VideosResponse {
        success: true,
        videos,
    }))
}

/// Handler for GET /videos/:id
#[instrument(skip_all, name = "atelier.handlers.get_video", fields(video_id = id))]
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<VideosResponse<Video>>, ApiError> {
    let video = VideosRepository::get(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(Json(VideosResponse {
        success: true,
        videos: video,
    }))
}

/// Handler for POST /videos and POST /add-videos
///
/// Requires `post:video`. Body: `{"title": str, "type": str}`.
#[instrument(skip_all, name = "atelier.handlers.create_video")]
pub async fn create_video(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<VideosResponse<Video>>, ApiError> {
    let new_video: NewVideo = parse_json(&body)?;

    let video = VideosRepository::create(&state.pool, &new_video).await?;

    tracing::info!(target: "atelier.handlers.videos", video_id = video.id, "Video created");

    Ok(Json(VideosResponse {
        success: true,
        videos: video,
    }))
}

/// Handler for PATCH /videos/:id
///
/// Requires `patch:video`. Responds under the singular `video` key.
#[instrument(skip_all, name = "atelier.handlers.update_video", fields(video_id = id))]
pub async fn update_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<VideoResponse>, ApiError> {
    let changes: VideoChanges = parse_json(&body)?;

    let video = VideosRepository::update(&state.pool, id, &changes)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(target: "atelier.handlers.videos", video_id = id, "Video updated");

    Ok(Json(VideoResponse {
        success: true,
        video,
    }))
}

/// Handler for DELETE /videos/:id
#[instrument(skip_all, name = "atelier.handlers.delete_video", fields(video_id = id))]
pub async fn delete_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, ApiError> {
    if !VideosRepository::delete(&state.pool, id).await? {
        return Err(not_found(id));
    }

    tracing::info!(target: "atelier.handlers.videos", video_id = id, "Video deleted");

    Ok(Json(DeleteResponse {
        success: true,
        delete: id,
    }))
}
