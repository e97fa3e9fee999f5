//! Ticket models.

use serde::Serialize;
use sqlx::FromRow;

use cinebook_core::types::{Amount, DbId};

/// A ticket row: one per reserved seat. `ticket_code` stays NULL until the
/// owning order completes payment; `price` is the chair-type price captured
/// at booking time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Ticket {
    pub id: DbId,
    pub order_id: DbId,
    pub showtime_id: DbId,
    pub chair_id: DbId,
    pub ticket_code: Option<String>,
    pub price: Amount,
}
