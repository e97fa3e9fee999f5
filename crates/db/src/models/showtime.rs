//! Showtime models.

use serde::Serialize;
use sqlx::FromRow;

use cinebook_core::types::{DbId, Timestamp};

/// A showtime row from the `showtimes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Showtime {
    pub id: DbId,
    pub movie_id: DbId,
    pub room_id: DbId,
    pub starts_at: Timestamp,
}

/// Showtime with the joined movie/room facts the booking core needs
/// (QR expiry computation, seat-map headers).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShowtimeInfo {
    pub id: DbId,
    pub starts_at: Timestamp,
    pub duration_minutes: i32,
    pub movie_title: String,
    pub room_name: String,
}

impl ShowtimeInfo {
    /// When the screening ends.
    pub fn ends_at(&self) -> Timestamp {
        self.starts_at + chrono::Duration::minutes(i64::from(self.duration_minutes))
    }
}
