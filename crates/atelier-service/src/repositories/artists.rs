//! Artists repository for database operations.
//!
//! All queries use parameterized statements. Partial updates keep the stored
//! value for every column whose bind parameter is NULL.

use crate::errors::ApiError;
use crate::models::{Artist, ArtistChanges, NewArtist};
use crate::observability::metrics;
use sqlx::{PgPool, Row};
use std::time::Instant;
use tracing::instrument;

/// Artists repository for database operations.
pub struct ArtistsRepository;

impl ArtistsRepository {
    /// All artists, ordered by id.
    #[instrument(skip_all, name = "atelier.repo.list_artists")]
    pub async fn list(pool: &PgPool) -> Result<Vec<Artist>, ApiError> {
        let start = Instant::now();

        let rows = sqlx::query(
            r#"
            SELECT id, name, age, style
            FROM artists
            ORDER BY id
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(|e| {
            metrics::record_db_query("list_artists", "error", start.elapsed());
            ApiError::Database(e.to_string())
        })?;

        metrics::record_db_query("list_artists", "success", start.elapsed());

        Ok(rows.into_iter().map(map_row_to_artist).collect())
    }

    /// Artist by id, or `None` if no such row exists.
    #[instrument(skip_all, name = "atelier.repo.get_artist", fields(artist_id = id))]
    pub async fn get(pool: &PgPool, id: i64) -> Result<Option<Artist>, ApiError> {
        let start = Instant::now();

        let row = sqlx::query(
            r#"
            SELECT id, name, age, style
            FROM artists
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            metrics::record_db_query("get_artist", "error", start.elapsed());
            ApiError::Database(e.to_string())
        })?;

        metrics::record_db_query("get_artist", "success", start.elapsed());

        Ok(row.map(map_row_to_artist))
    }

    /// Insert an artist and return the stored row with its new id.
    #[instrument(skip_all, name = "atelier.repo.create_artist")]
    pub async fn create(pool: &PgPool, artist: &NewArtist) -> Result<Artist, ApiError> {
        let start = Instant::now();

        let row = sqlx::query(
            r#"
            INSERT INTO artists (name, age, style)
            VALUES ($1, $2, $3)
            RETURNING id, name, age, style
            "#,
        )
        .bind(&artist.name) // $1
        .bind(artist.age) // $2
        .bind(&artist.style) // $3
        .fetch_one(pool)
        .await
        .map_err(|e| {
            metrics::record_db_query("create_artist", "error", start.elapsed());
            ApiError::Database(e.to_string())
        })?;

        metrics::record_db_query("create_artist", "success", start.elapsed());

        Ok(map_row_to_artist(row))
    }

    /// Apply the provided fields to an artist.
    ///
    /// Returns the updated row, or `None` if no artist has this id.
    #[instrument(skip_all, name = "atelier.repo.update_artist", fields(artist_id = id))]
    pub async fn update(
        pool: &PgPool,
        id: i64,
        changes: &ArtistChanges,
    ) -> Result<Option<Artist>, ApiError> {
        let start = Instant::now();

        let row = sqlx::query(
            r#"
            UPDATE artists
            SET name = COALESCE($2, name),
                age = COALESCE($3, age),
                style = COALESCE($4, style)
            WHERE id = $1
            RETURNING id, name, age, style
            "#,
        )
        .bind(id) // $1
        .bind(changes.name.as_deref()) // $2
        .bind(changes.age) // $3
        .bind(changes.style.as_deref()) // $4
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            metrics::record_db_query("update_artist", "error", start.elapsed());
            ApiError::Database(e.to_string())
        })?;

        metrics::record_db_query("update_artist", "success", start.elapsed());

        Ok(row.map(map_row_to_artist))
    }

    /// Delete an artist. Returns `false` if no artist has this id.
    #[instrument(skip_all, name = "atelier.repo.delete_artist", fields(artist_id = id))]
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, ApiError> {
        let start = Instant::now();

        let result = sqlx::query("DELETE FROM artists WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| {
                metrics::record_db_query("delete_artist", "error", start.elapsed());
                ApiError::Database(e.to_string())
            })?;

        metrics::record_db_query("delete_artist", "success", start.elapsed());

        Ok(result.rows_affected() > 0)
    }
}

/// Map a database row to an Artist.
fn map_row_to_artist(row: sqlx::postgres::PgRow) -> Artist {
    Artist {
        id: row.get("id"),
        name: row.get("name"),
        age: row.get("age"),
        style: row.get("style"),
    }
}
