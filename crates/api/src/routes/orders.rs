//! Route definitions for the `/orders` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{orders, redemption};
use crate::state::AppState;

/// Routes mounted at `/orders`.
///
/// ```text
/// POST /                     create (guest contact or Bearer token)
/// GET  /{id}                 detail with recomputed price breakdown
/// POST /{id}/combos          attach combos (Pending only)
/// GET  /{id}/payment-url     VNPay redirect URL (Pending only)
/// GET  /{id}/qr              issue QR token (staff, paid orders)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create))
        .route("/{id}", get(orders::get_by_id))
        .route("/{id}/combos", post(orders::add_combos))
        .route("/{id}/payment-url", get(orders::payment_url))
        .route("/{id}/qr", get(redemption::issue))
}
