//! Route definitions for box-office redemption.

use axum::routing::post;
use axum::Router;

use crate::handlers::redemption;
use crate::state::AppState;

/// Routes mounted at `/redemption` (all staff-only).
///
/// ```text
/// POST /verify    check a scanned token, no state change
/// POST /redeem    check + mark the order printed (single-use gate)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/verify", post(redemption::verify))
        .route("/redeem", post(redemption::redeem))
}
