//! Route definitions for showtime-scoped resources.

use axum::routing::get;
use axum::Router;

use crate::handlers::seats;
use crate::state::AppState;

/// Routes mounted at `/showtimes`.
///
/// ```text
/// GET /{id}/seats    seat map with availability and version tokens
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/seats", get(seats::seat_map))
}
