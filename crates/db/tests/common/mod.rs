//! Shared seeding helpers for the db integration tests.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use cinebook_core::types::DbId;
use cinebook_db::models::order::{CreateOrder, Order, OrderContact};
use cinebook_db::models::seat_showtime::{SeatSelection, SeatShowtime};
use cinebook_db::repositories::{CatalogRepo, OrderRepo, SeatShowtimeRepo, ShowtimeRepo};

/// Payment window used by the tests, in minutes.
pub const TEST_TIMEOUT_MINS: i64 = 10;

/// A seeded screening: one room of four standard chairs at 100000 VND,
/// one combo at 50000 VND.
pub struct Fixture {
    pub movie_id: DbId,
    pub room_id: DbId,
    pub showtime_id: DbId,
    pub chair_ids: Vec<DbId>,
    pub combo_id: DbId,
}

pub async fn seed_showtime(pool: &PgPool) -> Fixture {
    let movie_id = CatalogRepo::create_movie(pool, "Interstellar", 169)
        .await
        .unwrap();
    let room_id = CatalogRepo::create_room(pool, "Room 1").await.unwrap();
    let chair_type_id = CatalogRepo::create_chair_type(pool, "standard", 100_000)
        .await
        .unwrap();

    let mut chair_ids = Vec::new();
    for label in ["A1", "A2", "A3", "A4"] {
        chair_ids.push(
            CatalogRepo::create_chair(pool, room_id, chair_type_id, label)
                .await
                .unwrap(),
        );
    }

    let showtime = ShowtimeRepo::schedule(pool, movie_id, room_id, Utc::now() + Duration::hours(2), 15)
        .await
        .unwrap();

    let combo_id = CatalogRepo::create_combo(pool, "Popcorn + Coke", 50_000)
        .await
        .unwrap();

    Fixture {
        movie_id,
        room_id,
        showtime_id: showtime.id,
        chair_ids,
        combo_id,
    }
}

pub fn guest_contact() -> OrderContact {
    OrderContact {
        name: "Linh Tran".into(),
        phone: "0901234567".into(),
        email: "linh@example.com".into(),
    }
}

/// Current ledger row for a seat; panics if it does not exist.
pub async fn seat(pool: &PgPool, showtime_id: DbId, chair_id: DbId) -> SeatShowtime {
    SeatShowtimeRepo::find(pool, showtime_id, chair_id)
        .await
        .unwrap()
        .expect("seat ledger row should exist")
}

/// Build a create-order input for the given chairs using their current
/// version tokens.
pub async fn order_input(pool: &PgPool, showtime_id: DbId, chair_ids: &[DbId]) -> CreateOrder {
    let mut seats = Vec::new();
    for &chair_id in chair_ids {
        let row = seat(pool, showtime_id, chair_id).await;
        seats.push(SeatSelection {
            chair_id,
            version: row.version,
        });
    }
    CreateOrder {
        showtime_id,
        seats,
        combos: Vec::new(),
        voucher_id: None,
        contact: None,
    }
}

/// Create a pending order holding the given chairs.
pub async fn create_order(pool: &PgPool, fixture: &Fixture, chair_ids: &[DbId]) -> Order {
    let input = order_input(pool, fixture.showtime_id, chair_ids).await;
    OrderRepo::create(pool, &input, None, &guest_contact(), TEST_TIMEOUT_MINS)
        .await
        .unwrap()
}
