//! Deferred seat-release job model.

use serde::Serialize;
use sqlx::FromRow;

use cinebook_core::types::{DbId, Timestamp};

/// A one-shot deferred release entry: free the order's seats at `run_at`
/// unless payment completed first. Claimed by the worker.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SeatReleaseJob {
    pub id: DbId,
    pub order_id: DbId,
    pub run_at: Timestamp,
    pub done: bool,
    pub created_at: Timestamp,
}
