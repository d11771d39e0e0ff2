//! Artist handlers.
//!
//! Reads are public. Writes run behind the permission middleware, so by the
//! time a write handler executes the caller holds the matching permission.

use crate::errors::ApiError;
use crate::handlers::parse_json;
use crate::models::{Artist, ArtistChanges, ArtistsResponse, DeleteResponse, NewArtist};
use crate::repositories::ArtistsRepository;
use crate::routes::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::instrument;

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Artist {id} not found"))
}

/// Handler for GET /artists
#[instrument(skip_all, name = "atelier.handlers.list_artists")]
pub async fn list_artists(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ArtistsResponse<Vec<Artist>>>, ApiError> {
    let artists = ArtistsRepository::list(&state.pool).await?;

    Ok(Json(ArtistsResponse {
        success: true,
        artists,
    }))
}

/// Handler for GET /artists/:id
#[instrument(skip_all, name = "atelier.handlers.get_artist", fields(artist_id = id))]
pub async fn get_artist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ArtistsResponse<Artist>>, ApiError> {
    let artist = ArtistsRepository::get(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(Json(ArtistsResponse {
        success: true,
        artists: artist,
    }))
}

/// Handler for POST /artists
///
/// Requires `post:artist`. Body: `{"name": str, "age": int, "style": str}`.
#[instrument(skip_all, name = "atelier.handlers.create_artist")]
pub async fn create_artist(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ArtistsResponse<Artist>>, ApiError> {
    let new_artist: NewArtist = parse_json(&body)?;

    let artist = ArtistsRepository::create(&state.pool, &new_artist).await?;

    tracing::info!(target: "atelier.handlers.artists", artist_id = artist.id, "Artist created");

    Ok(Json(ArtistsResponse {
        success: true,
        artists: artist,
    }))
}

/// Handler for PATCH /artists/:id
///
/// Requires `patch:artist`. Only the fields present in the body change.
#[instrument(skip_all, name = "atelier.handlers.update_artist", fields(artist_id = id))]
pub async fn update_artist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<ArtistsResponse<Artist>>, ApiError> {
    let changes: ArtistChanges = parse_json(&body)?;

    let artist = ArtistsRepository::update(&state.pool, id, &changes)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(target: "atelier.handlers.artists", artist_id = id, "Artist updated");

    Ok(Json(ArtistsResponse {
        success: true,
        artists: artist,
    }))
}

/// Handler for DELETE /artists/:id
///
/// Requires `delete:artist`.
#[instrument(skip_all, name = "atelier.handlers.delete_artist", fields(artist_id = id))]
pub async fn delete_artist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, ApiError> {
    if !ArtistsRepository::delete(&state.pool, id).await? {
        return Err(not_found(id));
    }

    tracing::info!(target: "atelier.handlers.artists", artist_id = id, "Artist deleted");

    Ok(Json(DeleteResponse {
        success: true,
        delete: id,
    }))
}
