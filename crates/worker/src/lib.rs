//! Deferred seat-release worker.
//!
//! Pending orders carry a one-shot job in `seat_release_jobs` firing at the
//! end of their payment window. This worker claims due jobs (`FOR UPDATE
//! SKIP LOCKED`, safe to run in multiple instances), re-reads the order at
//! fire time, and fails still-pending orders so their seats return to the
//! pool. Paid orders retire their job at completion, so a claimed job for a
//! completed order is just a race that resolves to a no-op.
//!
//! The API's lazy expiry on every order read is the redundant safety net:
//! even a stopped worker never lets a stale pending order block seats from
//! a paying customer.

use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use cinebook_db::models::release_job::SeatReleaseJob;
use cinebook_db::models::status::OrderStatus;
use cinebook_db::repositories::{OrderRepo, ReleaseJobRepo};

/// Default poll interval in seconds.
const DEFAULT_POLL_SECS: u64 = 5;

/// Poll interval from `RELEASE_POLL_SECS`, defaulting to 5 seconds.
pub fn poll_interval_from_env() -> Duration {
    let secs = std::env::var("RELEASE_POLL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_POLL_SECS);
    Duration::from_secs(secs)
}

/// Run the release loop until `cancel` is triggered.
///
/// Each tick drains every currently-due job before sleeping again, so a
/// backlog after downtime clears in one pass.
pub async fn run(pool: PgPool, poll: Duration, cancel: CancellationToken) {
    tracing::info!(poll_secs = poll.as_secs(), "Seat release worker started");

    let mut interval = tokio::time::interval(poll);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Seat release worker stopping");
                break;
            }
            _ = interval.tick() => {
                loop {
                    match process_next(&pool).await {
                        Ok(true) => continue,
                        Ok(false) => break,
                        Err(e) => {
                            tracing::error!(error = %e, "Seat release pass failed");
                            break;
                        }
                    }
                }
            }
        }
    }
}

/// Claim and handle one due job. Returns `false` when nothing was due.
pub async fn process_next(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let Some(job) = ReleaseJobRepo::claim_due(pool).await? else {
        return Ok(false);
    };
    handle_job(pool, &job).await?;
    Ok(true)
}

/// Decide what a fired job means for its order.
async fn handle_job(pool: &PgPool, job: &SeatReleaseJob) -> Result<(), sqlx::Error> {
    let Some(order) = OrderRepo::find_by_id(pool, job.order_id).await? else {
        tracing::warn!(job_id = job.id, order_id = job.order_id, "Release job for unknown order");
        return Ok(());
    };

    match OrderStatus::from_id(order.status_id) {
        Some(OrderStatus::Pending) => {
            // The payment window ended without a callback.
            let failed = OrderRepo::fail(pool, order.id).await?;
            if failed {
                tracing::info!(order_id = order.id, "Payment window elapsed, order failed");
            }
        }
        Some(OrderStatus::Completed) | Some(OrderStatus::Printed) => {
            // Paid while our claim was in flight; nothing to release.
            tracing::debug!(order_id = order.id, "Release job no-op, order is paid");
        }
        _ => {
            // Canceled/Failed orders released their seats when they
            // terminated.
            tracing::debug!(order_id = order.id, "Release job no-op, order already terminal");
        }
    }
    Ok(())
}
