//! Order models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use cinebook_core::pricing::PriceBreakdown;
use cinebook_core::types::{DbId, Timestamp};

use crate::models::combo::OrderComboLine;
use crate::models::seat_showtime::SeatSelection;
use crate::models::ticket::Ticket;

/// An order row from the `orders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    pub status_id: i16,
    pub user_id: Option<DbId>,
    pub voucher_id: Option<DbId>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub created_at: Timestamp,
}

/// Guest contact details for checkout without an account.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GuestContact {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(length(min = 6, message = "phone number looks too short"))]
    pub phone: String,
    #[validate(email)]
    pub email: String,
}

/// One requested combo line.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ComboSelection {
    pub combo_id: DbId,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
}

/// Input for creating a new order.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrder {
    pub showtime_id: DbId,
    #[validate(length(min = 1, message = "select at least one seat"))]
    pub seats: Vec<SeatSelection>,
    #[serde(default)]
    #[validate(nested)]
    pub combos: Vec<ComboSelection>,
    pub voucher_id: Option<DbId>,
    /// Required when no authenticated user is present.
    #[validate(nested)]
    pub contact: Option<GuestContact>,
}

/// Resolved contact details stamped onto the order row (guest contact or
/// derived from the authenticated user).
#[derive(Debug, Clone)]
pub struct OrderContact {
    pub name: String,
    pub phone: String,
    pub email: String,
}

/// Full order detail: the row, its lines, and the recomputed price
/// breakdown. Totals are never stored; see `cinebook_core::pricing`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub status: &'static str,
    pub tickets: Vec<Ticket>,
    pub combos: Vec<OrderComboLine>,
    pub pricing: PriceBreakdown,
}
