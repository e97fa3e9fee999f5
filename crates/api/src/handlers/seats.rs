//! Handlers for the showtime seat map.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use cinebook_core::error::CoreError;
use cinebook_core::types::DbId;
use cinebook_db::models::seat_showtime::SeatMapEntry;
use cinebook_db::models::showtime::ShowtimeInfo;
use cinebook_db::repositories::{SeatShowtimeRepo, ShowtimeRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Seat map for one showtime: the screening facts plus one entry per chair
/// with availability and the version token a reservation must present.
#[derive(Debug, Serialize)]
pub struct SeatMap {
    pub showtime: ShowtimeInfo,
    pub seats: Vec<SeatMapEntry>,
}

/// GET /api/v1/showtimes/{id}/seats
///
/// Public: customers browse the map before checkout, and re-fetch it after
/// a seat conflict to pick up fresh version tokens.
pub async fn seat_map(
    State(state): State<AppState>,
    Path(showtime_id): Path<DbId>,
) -> AppResult<Json<DataResponse<SeatMap>>> {
    let showtime = ShowtimeRepo::find_info(&state.pool, showtime_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Showtime",
            id: showtime_id,
        }))?;

    let seats = SeatShowtimeRepo::list_for_showtime(&state.pool, showtime_id).await?;

    Ok(Json(DataResponse {
        data: SeatMap { showtime, seats },
    }))
}
