//! Repository for the `showtimes` table.

use sqlx::PgPool;

use cinebook_core::error::CoreError;
use cinebook_core::types::{DbId, Timestamp};

use crate::models::showtime::{Showtime, ShowtimeInfo};
use crate::repositories::SeatShowtimeRepo;
use crate::RepoError;

/// Provides showtime scheduling and lookups.
pub struct ShowtimeRepo;

impl ShowtimeRepo {
    /// Schedule a screening and create its seat ledger rows in one
    /// transaction.
    ///
    /// Rejects with `Conflict` when the room is occupied: two showtimes in
    /// the same room must be separated by the movie runtimes plus the
    /// cleaning break on both sides.
    pub async fn schedule(
        pool: &PgPool,
        movie_id: DbId,
        room_id: DbId,
        starts_at: Timestamp,
        break_mins: i64,
    ) -> Result<Showtime, RepoError> {
        let mut tx = pool.begin().await?;

        let duration: Option<(i32,)> =
            sqlx::query_as("SELECT duration_minutes FROM movies WHERE id = $1")
                .bind(movie_id)
                .fetch_optional(&mut *tx)
                .await?;
        let (duration_minutes,) = duration.ok_or(CoreError::NotFound {
            entity: "Movie",
            id: movie_id,
        })?;

        let ends_at = starts_at + chrono::Duration::minutes(i64::from(duration_minutes));
        let overlapping: (bool,) = sqlx::query_as(
            "SELECT EXISTS ( \
                 SELECT 1 FROM showtimes s \
                 JOIN movies m ON m.id = s.movie_id \
                 WHERE s.room_id = $1 \
                   AND s.starts_at < $3 + make_interval(mins => $4) \
                   AND $2 < s.starts_at + make_interval(mins => m.duration_minutes + $4) \
             )",
        )
        .bind(room_id)
        .bind(starts_at)
        .bind(ends_at)
        .bind(i32::try_from(break_mins).unwrap_or(i32::MAX))
        .fetch_one(&mut *tx)
        .await?;
        if overlapping.0 {
            return Err(CoreError::Conflict(
                "Room is occupied around that time, including the cleaning break".into(),
            )
            .into());
        }

        let showtime = sqlx::query_as::<_, Showtime>(
            "INSERT INTO showtimes (movie_id, room_id, starts_at) \
             VALUES ($1, $2, $3) \
             RETURNING id, movie_id, room_id, starts_at",
        )
        .bind(movie_id)
        .bind(room_id)
        .bind(starts_at)
        .fetch_one(&mut *tx)
        .await?;

        SeatShowtimeRepo::create_for_showtime(&mut *tx, showtime.id, room_id).await?;

        tx.commit().await?;
        Ok(showtime)
    }

    /// Showtime with joined movie/room facts.
    pub async fn find_info(pool: &PgPool, id: DbId) -> Result<Option<ShowtimeInfo>, sqlx::Error> {
        sqlx::query_as::<_, ShowtimeInfo>(
            "SELECT s.id, s.starts_at, m.duration_minutes, m.title AS movie_title, \
                    r.name AS room_name \
             FROM showtimes s \
             JOIN movies m ON m.id = s.movie_id \
             JOIN rooms r ON r.id = s.room_id \
             WHERE s.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
