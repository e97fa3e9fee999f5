//! Repository for the `seat_release_jobs` queue.

use sqlx::{PgExecutor, PgPool};

use cinebook_core::types::{DbId, Timestamp};

use crate::models::release_job::SeatReleaseJob;

/// Column list for `seat_release_jobs` queries.
const COLUMNS: &str = "id, order_id, run_at, done, created_at";

/// Provides queue operations for deferred seat releases.
pub struct ReleaseJobRepo;

impl ReleaseJobRepo {
    /// Enqueue a one-shot release for an order at `run_at`. Called inside
    /// the order-creation transaction so the job exists iff the order does.
    pub async fn schedule<'e>(
        executor: impl PgExecutor<'e>,
        order_id: DbId,
        run_at: Timestamp,
    ) -> Result<SeatReleaseJob, sqlx::Error> {
        let query = format!(
            "INSERT INTO seat_release_jobs (order_id, run_at) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SeatReleaseJob>(&query)
            .bind(order_id)
            .bind(run_at)
            .fetch_one(executor)
            .await
    }

    /// Atomically claim the next due job.
    ///
    /// Uses `SELECT FOR UPDATE SKIP LOCKED` so multiple worker instances
    /// never double-claim. The claim marks the job done; losing a claimed
    /// job is tolerable because the lazy expiry check on the read path is
    /// the redundant safety net for correctness.
    pub async fn claim_due(pool: &PgPool) -> Result<Option<SeatReleaseJob>, sqlx::Error> {
        let query = format!(
            "UPDATE seat_release_jobs \
             SET done = TRUE \
             WHERE id = ( \
                 SELECT id FROM seat_release_jobs \
                 WHERE NOT done AND run_at <= NOW() \
                 ORDER BY run_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SeatReleaseJob>(&query)
            .fetch_optional(pool)
            .await
    }

    /// The still-pending job for an order, if any.
    pub async fn pending_for_order(
        pool: &PgPool,
        order_id: DbId,
    ) -> Result<Option<SeatReleaseJob>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM seat_release_jobs \
             WHERE order_id = $1 AND NOT done \
             ORDER BY run_at ASC LIMIT 1"
        );
        sqlx::query_as::<_, SeatReleaseJob>(&query)
            .bind(order_id)
            .fetch_optional(pool)
            .await
    }
}
