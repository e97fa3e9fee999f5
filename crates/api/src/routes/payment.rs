//! Route definitions for the payment gateway surface.

use axum::routing::get;
use axum::Router;

use crate::handlers::payment;
use crate::state::AppState;

/// Routes mounted at `/payment`.
///
/// ```text
/// GET /vnpay/callback    signed gateway callback
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/vnpay/callback", get(payment::vnpay_callback))
}
