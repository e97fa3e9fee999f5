//! Repository for the `tickets` table.

use sqlx::PgPool;

use cinebook_core::types::DbId;

use crate::models::showtime::ShowtimeInfo;
use crate::models::ticket::Ticket;

/// Provides ticket queries. Ticket rows are created and coded by
/// `OrderRepo` inside the booking transactions; this repo only reads.
pub struct TicketRepo;

impl TicketRepo {
    /// All tickets of an order, in creation order.
    pub async fn list_for_order(pool: &PgPool, order_id: DbId) -> Result<Vec<Ticket>, sqlx::Error> {
        sqlx::query_as::<_, Ticket>(
            "SELECT id, order_id, showtime_id, chair_id, ticket_code, price \
             FROM tickets WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(pool)
        .await
    }

    /// Showtime facts for the order's first ticket, used to compute the QR
    /// expiry (showtime end plus grace). `None` when the order has no
    /// tickets.
    pub async fn showtime_for_order(
        pool: &PgPool,
        order_id: DbId,
    ) -> Result<Option<ShowtimeInfo>, sqlx::Error> {
        sqlx::query_as::<_, ShowtimeInfo>(
            "SELECT s.id, s.starts_at, m.duration_minutes, m.title AS movie_title, \
                    r.name AS room_name \
             FROM tickets t \
             JOIN showtimes s ON s.id = t.showtime_id \
             JOIN movies m ON m.id = s.movie_id \
             JOIN rooms r ON r.id = s.room_id \
             WHERE t.order_id = $1 \
             ORDER BY t.id \
             LIMIT 1",
        )
        .bind(order_id)
        .fetch_optional(pool)
        .await
    }

    /// Look up a ticket by its code (door-side fallback when a QR cannot be
    /// scanned).
    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Ticket>, sqlx::Error> {
        sqlx::query_as::<_, Ticket>(
            "SELECT id, order_id, showtime_id, chair_id, ticket_code, price \
             FROM tickets WHERE ticket_code = $1",
        )
        .bind(code)
        .fetch_optional(pool)
        .await
    }
}
