//! Videos repository for database operations.

use crate::errors::ApiError;
use crate::models::{NewVideo, Video, VideoChanges};
use crate::observability::metrics;
use sqlx::{PgPool, Row};
use std::time::Instant;
use tracing::instrument;

/// Videos repository for database operations.
pub struct VideosRepository;

impl VideosRepository {
    /// All videos, ordered by id.
    #[instrument(skip_all, name = "atelier.repo.list_videos")]
    pub async fn list(pool: &PgPool) -> Result<Vec<Video>, ApiError> {
        let start = Instant::now();

        let rows = sqlx::query(
            r#"
            SELECT id, title, video_type
            FROM videos
            ORDER BY id
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(|e| {
            metrics::record_db_query("list_videos", "error", start.elapsed());
            ApiError::Database(e.to_string())
        })?;

        metrics::record_db_query("list_videos", "success", start.elapsed());

        Ok(rows.into_iter().map(map_row_to_video).collect())
    }

    /// Video by id, or `None` if no such row exists.
    #[instrument(skip_all, name = "atelier.repo.get_video", fields(video_id = id))]
    pub async fn get(pool: &PgPool, id: i64) -> Result<Option<Video>, ApiError> {
        let start = Instant::now();

        let row = sqlx::query(
            r#"
            SELECT id, title, video_type
            FROM videos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            metrics::record_db_query("get_video", "error", start.elapsed());
            ApiError::Database(e.to_string())
        })?;

        metrics::record_db_query("get_video", "success", start.elapsed());

        Ok(row.map(map_row_to_video))
    }

    #[instrument(skip_all, name = "atelier.repo.create_video")]
    pub async fn create(pool: &PgPool, video: &NewVideo) -> Result<Video, ApiError> {
        let start = Instant::now();

        let row = sqlx::query(
            r#"
            INSERT INTO videos (title, video_type)
            VALUES ($1, $2)
            RETURNING id, title, video_type
            "#,
        )
        .bind(&video.title) // $1
        .bind(&video.video_type) // $2
        .fetch_one(pool)
        .await
        .map_err(|e| {
            metrics::record_db_query("create_video", "error", start.elapsed());
            ApiError::Database(e.to_string())
        })?;

        metrics::record_db_query("create_video", "success", start.elapsed());

        Ok(map_row_to_video(row))
    }

    /// Apply the provided fields to a video. `None` if the id is unknown.
    #[instrument(skip_all, name = "atelier.repo.update_video", fields(video_id = id))]
    pub async fn update(
        pool: &PgPool,
        id: i64,
        changes: &VideoChanges,
    ) -> Result<Option<Video>, ApiError> {
        let start = Instant::now();

        let row = sqlx::query(
            r#"
            UPDATE videos
            SET title = COALESCE($2, title),
                video_type = COALESCE($3, video_type)
            WHERE id = $1
            RETURNING id, title, video_type
            "#,
        )
        .bind(id) // $1
        .bind(changes.title.as_deref()) // $2
        .bind(changes.video_type.as_deref()) // $3
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            metrics::record_db_query("update_video", "error", start.elapsed());
            ApiError::Database(e.to_string())
        })?;

        metrics::record_db_query("update_video", "success", start.elapsed());

        Ok(row.map(map_row_to_video))
    }

    /// Delete a video. Returns `false` if no video has this id.
    #[instrument(skip_all, name = "atelier.repo.delete_video", fields(video_id = id))]
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, ApiError> {
        let start = Instant::now();

        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| {
                metrics::record_db_query("delete_video", "error", start.elapsed());
                ApiError::Database(e.to_string())
            })?;

        metrics::record_db_query("delete_video", "success", start.elapsed());

        Ok(result.rows_affected() > 0)
    }
}

fn map_row_to_video(row: sqlx::postgres::PgRow) -> Video {
    Video {
        id: row.get("id"),
        title: row.get("title"),
        video_type: row.get("video_type"),
    }
}
