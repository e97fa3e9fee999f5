//! Concession combo models.

use serde::Serialize;
use sqlx::FromRow;

use cinebook_core::types::{Amount, DbId};

/// A combo from the concession catalog.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Combo {
    pub id: DbId,
    pub name: String,
    pub price: Amount,
}

/// One combo line attached to an order, with the price captured at
/// attachment time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderComboLine {
    pub combo_id: DbId,
    pub name: String,
    pub quantity: i32,
    pub price: Amount,
}
