//! The release worker against a real queue: due jobs fail pending orders
//! and free their seats, retired and not-yet-due jobs are left alone.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use cinebook_core::types::DbId;
use cinebook_db::models::order::{CreateOrder, OrderContact};
use cinebook_db::models::seat_showtime::SeatSelection;
use cinebook_db::models::status::OrderStatus;
use cinebook_db::repositories::{
    CatalogRepo, OrderRepo, ReleaseJobRepo, SeatShowtimeRepo, ShowtimeRepo,
};

struct Fixture {
    showtime_id: DbId,
    chair_ids: Vec<DbId>,
}

async fn seed_showtime(pool: &PgPool) -> Fixture {
    let movie_id = CatalogRepo::create_movie(pool, "Interstellar", 169)
        .await
        .unwrap();
    let room_id = CatalogRepo::create_room(pool, "Room 1").await.unwrap();
    let chair_type_id = CatalogRepo::create_chair_type(pool, "standard", 100_000)
        .await
        .unwrap();

    let mut chair_ids = Vec::new();
    for label in ["A1", "A2"] {
        chair_ids.push(
            CatalogRepo::create_chair(pool, room_id, chair_type_id, label)
                .await
                .unwrap(),
        );
    }

    let showtime =
        ShowtimeRepo::schedule(pool, movie_id, room_id, Utc::now() + Duration::hours(2), 15)
            .await
            .unwrap();

    Fixture {
        showtime_id: showtime.id,
        chair_ids,
    }
}

/// Create a pending order holding the fixture's chairs. A zero timeout makes
/// its release job due immediately.
async fn create_order(pool: &PgPool, fixture: &Fixture, timeout_mins: i64) -> DbId {
    let mut seats = Vec::new();
    for &chair_id in &fixture.chair_ids {
        let row = SeatShowtimeRepo::find(pool, fixture.showtime_id, chair_id)
            .await
            .unwrap()
            .expect("seat ledger row should exist");
        seats.push(SeatSelection {
            chair_id,
            version: row.version,
        });
    }
    let input = CreateOrder {
        showtime_id: fixture.showtime_id,
        seats,
        combos: Vec::new(),
        voucher_id: None,
        contact: None,
    };
    let contact = OrderContact {
        name: "Linh Tran".into(),
        phone: "0901234567".into(),
        email: "linh@example.com".into(),
    };
    OrderRepo::create(pool, &input, None, &contact, timeout_mins)
        .await
        .unwrap()
        .id
}

async fn order_status(pool: &PgPool, order_id: DbId) -> OrderStatus {
    let order = OrderRepo::find_by_id(pool, order_id)
        .await
        .unwrap()
        .expect("order should exist");
    OrderStatus::from_id(order.status_id).expect("known status")
}

#[sqlx::test(migrations = "../db/migrations")]
async fn due_job_fails_the_order_and_frees_its_seats(pool: PgPool) {
    let fixture = seed_showtime(&pool).await;
    let order_id = create_order(&pool, &fixture, 0).await;

    assert!(cinebook_worker::process_next(&pool).await.unwrap());
    assert_eq!(order_status(&pool, order_id).await, OrderStatus::Failed);

    for &chair_id in &fixture.chair_ids {
        let seat = SeatShowtimeRepo::find(&pool, fixture.showtime_id, chair_id)
            .await
            .unwrap()
            .unwrap();
        assert!(seat.available);
    }

    // The job was consumed by the claim.
    assert!(!cinebook_worker::process_next(&pool).await.unwrap());
    assert!(ReleaseJobRepo::pending_for_order(&pool, order_id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn completed_order_retired_its_job_before_it_fired(pool: PgPool) {
    let fixture = seed_showtime(&pool).await;
    let order_id = create_order(&pool, &fixture, 0).await;
    assert!(OrderRepo::complete(&pool, order_id).await.unwrap());

    // Completion retires the job, so there is nothing to claim.
    assert!(!cinebook_worker::process_next(&pool).await.unwrap());
    assert_eq!(order_status(&pool, order_id).await, OrderStatus::Completed);

    let seat = SeatShowtimeRepo::find(&pool, fixture.showtime_id, fixture.chair_ids[0])
        .await
        .unwrap()
        .unwrap();
    assert!(!seat.available);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn job_inside_the_payment_window_is_not_claimed(pool: PgPool) {
    let fixture = seed_showtime(&pool).await;
    let order_id = create_order(&pool, &fixture, 10).await;

    assert!(!cinebook_worker::process_next(&pool).await.unwrap());
    assert_eq!(order_status(&pool, order_id).await, OrderStatus::Pending);
    assert!(ReleaseJobRepo::pending_for_order(&pool, order_id)
        .await
        .unwrap()
        .is_some());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn processing_a_failed_order_twice_is_harmless(pool: PgPool) {
    let fixture = seed_showtime(&pool).await;
    let order_id = create_order(&pool, &fixture, 0).await;

    assert!(cinebook_worker::process_next(&pool).await.unwrap());

    // A stray duplicate job, as after a crashed worker re-run. The order is
    // already terminal, so firing it must change nothing.
    ReleaseJobRepo::schedule(&pool, order_id, Utc::now() - Duration::seconds(1))
        .await
        .unwrap();
    assert!(cinebook_worker::process_next(&pool).await.unwrap());
    assert!(!cinebook_worker::process_next(&pool).await.unwrap());

    assert_eq!(order_status(&pool, order_id).await, OrderStatus::Failed);
    let seat = SeatShowtimeRepo::find(&pool, fixture.showtime_id, fixture.chair_ids[0])
        .await
        .unwrap()
        .unwrap();
    assert!(seat.available);
    assert_eq!(seat.version, 2);
}
