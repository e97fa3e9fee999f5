pub mod health;
pub mod orders;
pub mod payment;
pub mod redemption;
pub mod showtimes;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /showtimes/{id}/seats          seat map with version tokens (public)
///
/// /orders                        create (guest or signed-in)
/// /orders/{id}                   detail + recomputed price breakdown
/// /orders/{id}/combos            attach combos (Pending only)
/// /orders/{id}/payment-url       VNPay redirect URL
/// /orders/{id}/qr                issue QR token (staff)
///
/// /payment/vnpay/callback        gateway callback
///
/// /redemption/verify             check a token, no mutation (staff)
/// /redemption/redeem             check + mark printed (staff)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/showtimes", showtimes::router())
        .nest("/orders", orders::router())
        .nest("/payment", payment::router())
        .nest("/redemption", redemption::router())
}
