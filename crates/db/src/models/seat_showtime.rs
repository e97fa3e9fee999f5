//! Seat-showtime ledger models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cinebook_core::types::{Amount, DbId};

/// One ledger row: the availability record for one physical chair at one
/// screening. `version` is the optimistic concurrency token.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SeatShowtime {
    pub chair_id: DbId,
    pub showtime_id: DbId,
    pub available: bool,
    pub version: i64,
}

/// A seat-map entry returned to clients picking seats. Carries the version
/// token the client must present when reserving.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SeatMapEntry {
    pub chair_id: DbId,
    pub label: String,
    pub chair_type: String,
    pub price: Amount,
    pub available: bool,
    pub version: i64,
}

/// One requested seat in an order: the chair plus the version token the
/// client last observed for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatSelection {
    pub chair_id: DbId,
    pub version: i64,
}
