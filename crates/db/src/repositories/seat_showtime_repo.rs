//! Repository for the `seat_showtimes` ledger.
//!
//! The `version` column is the optimistic concurrency token: every
//! successful mutation increments it inside the same `UPDATE`, so the
//! compare-and-swap in [`SeatShowtimeRepo::reserve`] is atomic at the
//! storage engine. There is no read-then-write anywhere in this file.

use sqlx::{PgExecutor, PgPool};

use cinebook_core::types::DbId;

use crate::models::seat_showtime::{SeatMapEntry, SeatShowtime};

/// Provides ledger operations for seat availability per showtime.
pub struct SeatShowtimeRepo;

impl SeatShowtimeRepo {
    /// Create one ledger row per chair of the room, all available at
    /// version 0. Called when a showtime is scheduled; idempotent.
    pub async fn create_for_showtime<'e>(
        executor: impl PgExecutor<'e>,
        showtime_id: DbId,
        room_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO seat_showtimes (chair_id, showtime_id) \
             SELECT id, $2 FROM chairs WHERE room_id = $1 \
             ON CONFLICT DO NOTHING",
        )
        .bind(room_id)
        .bind(showtime_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Look up a single ledger row.
    pub async fn find(
        pool: &PgPool,
        showtime_id: DbId,
        chair_id: DbId,
    ) -> Result<Option<SeatShowtime>, sqlx::Error> {
        sqlx::query_as::<_, SeatShowtime>(
            "SELECT chair_id, showtime_id, available, version \
             FROM seat_showtimes WHERE showtime_id = $1 AND chair_id = $2",
        )
        .bind(showtime_id)
        .bind(chair_id)
        .fetch_optional(pool)
        .await
    }

    /// The seat map for one showtime: chair facts plus availability and the
    /// version token clients must present when reserving.
    pub async fn list_for_showtime(
        pool: &PgPool,
        showtime_id: DbId,
    ) -> Result<Vec<SeatMapEntry>, sqlx::Error> {
        sqlx::query_as::<_, SeatMapEntry>(
            "SELECT ss.chair_id, c.label, ct.name AS chair_type, ct.price, \
                    ss.available, ss.version \
             FROM seat_showtimes ss \
             JOIN chairs c ON c.id = ss.chair_id \
             JOIN chair_types ct ON ct.id = c.chair_type_id \
             WHERE ss.showtime_id = $1 \
             ORDER BY c.label",
        )
        .bind(showtime_id)
        .fetch_all(pool)
        .await
    }

    /// Compare-and-swap reservation of one seat.
    ///
    /// Succeeds only if the row is currently available AND still carries
    /// `expected_version`; the version bump happens in the same statement.
    /// Returns `false`, with no mutation, when the seat is taken or the
    /// token is stale. Of two racing callers presenting the same token,
    /// exactly one sees `true`.
    ///
    /// Takes an executor so multi-seat orders can run every reservation
    /// inside one transaction and roll all of them back on any failure.
    pub async fn reserve<'e>(
        executor: impl PgExecutor<'e>,
        showtime_id: DbId,
        chair_id: DbId,
        expected_version: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE seat_showtimes \
             SET available = FALSE, version = version + 1 \
             WHERE showtime_id = $1 AND chair_id = $2 \
               AND available AND version = $3",
        )
        .bind(showtime_id)
        .bind(chair_id)
        .bind(expected_version)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Unconditionally free one seat. No version check: release is
    /// idempotent and always safe to retry. Returns `false` only when the
    /// ledger row does not exist.
    pub async fn release<'e>(
        executor: impl PgExecutor<'e>,
        showtime_id: DbId,
        chair_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE seat_showtimes \
             SET available = TRUE, version = version + 1 \
             WHERE showtime_id = $1 AND chair_id = $2",
        )
        .bind(showtime_id)
        .bind(chair_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Free every seat belonging to an order's tickets. Used by payment
    /// failure, lazy expiry, and the deferred release worker; running it
    /// more than once converges on the same state.
    pub async fn release_for_order<'e>(
        executor: impl PgExecutor<'e>,
        order_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE seat_showtimes ss \
             SET available = TRUE, version = ss.version + 1 \
             FROM tickets t \
             WHERE t.order_id = $1 \
               AND t.chair_id = ss.chair_id \
               AND t.showtime_id = ss.showtime_id",
        )
        .bind(order_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
