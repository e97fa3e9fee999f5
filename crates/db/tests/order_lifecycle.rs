//! Order state machine, ticket coding, pricing, and rollback behaviour.

mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use sqlx::PgPool;

use cinebook_core::error::CoreError;
use cinebook_db::models::order::ComboSelection;
use cinebook_db::models::status::OrderStatus;
use cinebook_db::repositories::{CatalogRepo, OrderRepo, ReleaseJobRepo, SeatShowtimeRepo, TicketRepo};
use cinebook_db::RepoError;

use common::TEST_TIMEOUT_MINS;

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn create_order_holds_seats_and_schedules_release(pool: PgPool) {
    let fixture = common::seed_showtime(&pool).await;
    let chairs = &fixture.chair_ids[..2];

    let order = common::create_order(&pool, &fixture, chairs).await;
    assert_eq!(order.status_id, OrderStatus::Pending.id());

    for &chair_id in chairs {
        let row = common::seat(&pool, fixture.showtime_id, chair_id).await;
        assert!(!row.available, "reserved seat must be unavailable");
    }

    let tickets = TicketRepo::list_for_order(&pool, order.id).await.unwrap();
    assert_eq!(tickets.len(), 2);
    assert!(tickets.iter().all(|t| t.ticket_code.is_none()));
    assert!(tickets.iter().all(|t| t.price == 100_000));

    let job = ReleaseJobRepo::pending_for_order(&pool, order.id)
        .await
        .unwrap()
        .expect("a release job must be scheduled");
    assert_eq!(
        job.run_at,
        order.created_at + Duration::minutes(TEST_TIMEOUT_MINS)
    );
}

/// Booking [S1, S2] where S2 is already taken must fail with Conflict, and
/// S1 must not remain reserved by the failed attempt.
#[sqlx::test]
async fn conflicting_seat_rolls_back_the_whole_order(pool: PgPool) {
    let fixture = common::seed_showtime(&pool).await;
    let (s1, s2) = (fixture.chair_ids[0], fixture.chair_ids[1]);

    // Another customer already holds S2.
    common::create_order(&pool, &fixture, &[s2]).await;

    let input = common::order_input(&pool, fixture.showtime_id, &[s1, s2]).await;
    let err = OrderRepo::create(&pool, &input, None, &common::guest_contact(), TEST_TIMEOUT_MINS)
        .await
        .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::Conflict(_)));

    let s1_row = common::seat(&pool, fixture.showtime_id, s1).await;
    assert!(s1_row.available, "S1 must not leak from the failed attempt");
    assert_eq!(s1_row.version, 0, "rolled-back CAS must leave no trace");
}

#[sqlx::test]
async fn unknown_seat_is_not_found(pool: PgPool) {
    let fixture = common::seed_showtime(&pool).await;

    let mut input = common::order_input(&pool, fixture.showtime_id, &fixture.chair_ids[..1]).await;
    input.seats[0].chair_id = 999_999;

    let err = OrderRepo::create(&pool, &input, None, &common::guest_contact(), TEST_TIMEOUT_MINS)
        .await
        .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::NotFound { entity: "Seat", .. }));
}

#[sqlx::test]
async fn ticket_price_is_a_snapshot(pool: PgPool) {
    let fixture = common::seed_showtime(&pool).await;
    let order = common::create_order(&pool, &fixture, &fixture.chair_ids[..1]).await;

    // A later catalog price change must not alter the existing order.
    sqlx::query("UPDATE chair_types SET price = 999999")
        .execute(&pool)
        .await
        .unwrap();

    let detail = OrderRepo::detail(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(detail.pricing.ticket_subtotal, 100_000);
}

// ---------------------------------------------------------------------------
// Completion and ticket codes
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn complete_assigns_sequential_codes_once(pool: PgPool) {
    let fixture = common::seed_showtime(&pool).await;
    let order = common::create_order(&pool, &fixture, &fixture.chair_ids[..2]).await;

    assert!(OrderRepo::complete(&pool, order.id).await.unwrap());

    let tickets = TicketRepo::list_for_order(&pool, order.id).await.unwrap();
    let codes: Vec<String> = tickets
        .iter()
        .map(|t| t.ticket_code.clone().expect("code assigned on completion"))
        .collect();
    assert_eq!(codes, vec!["TK001".to_string(), "TK002".to_string()]);

    // Completing again is a no-op and must not re-code the tickets.
    assert!(!OrderRepo::complete(&pool, order.id).await.unwrap());
    let again = TicketRepo::list_for_order(&pool, order.id).await.unwrap();
    assert_eq!(
        again.iter().map(|t| t.ticket_code.clone()).collect::<Vec<_>>(),
        tickets.iter().map(|t| t.ticket_code.clone()).collect::<Vec<_>>()
    );

    // The deferred release job has been retired.
    assert!(ReleaseJobRepo::pending_for_order(&pool, order.id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test]
async fn concurrent_completions_never_share_codes(pool: PgPool) {
    let fixture = common::seed_showtime(&pool).await;
    let first = common::create_order(&pool, &fixture, &fixture.chair_ids[..2]).await;
    let second = common::create_order(&pool, &fixture, &fixture.chair_ids[2..]).await;

    let a = {
        let pool = pool.clone();
        tokio::spawn(async move { OrderRepo::complete(&pool, first.id).await })
    };
    let b = {
        let pool = pool.clone();
        tokio::spawn(async move { OrderRepo::complete(&pool, second.id).await })
    };
    assert!(a.await.unwrap().unwrap());
    assert!(b.await.unwrap().unwrap());

    let mut codes = Vec::new();
    for order_id in [first.id, second.id] {
        for ticket in TicketRepo::list_for_order(&pool, order_id).await.unwrap() {
            codes.push(ticket.ticket_code.unwrap());
        }
    }
    codes.sort();
    codes.dedup();
    assert_eq!(codes.len(), 4, "ticket codes must be globally unique");
}

#[sqlx::test]
async fn find_by_code_resolves_ticket(pool: PgPool) {
    let fixture = common::seed_showtime(&pool).await;
    let order = common::create_order(&pool, &fixture, &fixture.chair_ids[..1]).await;
    assert!(OrderRepo::complete(&pool, order.id).await.unwrap());

    let ticket = TicketRepo::find_by_code(&pool, "TK001").await.unwrap();
    assert_eq!(ticket.unwrap().order_id, order.id);
}

// ---------------------------------------------------------------------------
// Cancel / expiry
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn cancel_releases_the_seats(pool: PgPool) {
    let fixture = common::seed_showtime(&pool).await;
    let chairs = &fixture.chair_ids[..2];
    let order = common::create_order(&pool, &fixture, chairs).await;

    assert!(OrderRepo::cancel(&pool, order.id).await.unwrap());
    for &chair_id in chairs {
        assert!(common::seat(&pool, fixture.showtime_id, chair_id).await.available);
    }

    // Canceled is terminal; a second cancel and a completion both bounce.
    assert!(!OrderRepo::cancel(&pool, order.id).await.unwrap());
    assert!(!OrderRepo::complete(&pool, order.id).await.unwrap());
}

#[sqlx::test]
async fn expiry_is_lazy_guarded_and_idempotent(pool: PgPool) {
    let fixture = common::seed_showtime(&pool).await;
    let chair = fixture.chair_ids[0];
    let order = common::create_order(&pool, &fixture, &[chair]).await;

    // Inside the payment window: no-op.
    assert!(!OrderRepo::expire_if_stale(&pool, order.id, Utc::now(), TEST_TIMEOUT_MINS)
        .await
        .unwrap());
    assert!(!common::seat(&pool, fixture.showtime_id, chair).await.available);

    // Past the window (callback arrives at T0+11min with a 10min window).
    let late = Utc::now() + Duration::minutes(TEST_TIMEOUT_MINS + 1);
    assert!(OrderRepo::expire_if_stale(&pool, order.id, late, TEST_TIMEOUT_MINS)
        .await
        .unwrap());
    let row = OrderRepo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(row.status_id, OrderStatus::Failed.id());
    assert!(common::seat(&pool, fixture.showtime_id, chair).await.available);

    // Applying expiry to an already-failed order never double-transitions.
    assert!(!OrderRepo::expire_if_stale(&pool, order.id, late, TEST_TIMEOUT_MINS)
        .await
        .unwrap());
}

#[sqlx::test]
async fn expired_order_cannot_complete(pool: PgPool) {
    let fixture = common::seed_showtime(&pool).await;
    let order = common::create_order(&pool, &fixture, &fixture.chair_ids[..1]).await;

    let late = Utc::now() + Duration::minutes(TEST_TIMEOUT_MINS + 1);
    assert!(OrderRepo::expire_if_stale(&pool, order.id, late, TEST_TIMEOUT_MINS)
        .await
        .unwrap());
    assert!(!OrderRepo::complete(&pool, order.id).await.unwrap());
}

// ---------------------------------------------------------------------------
// Printing (redemption gate)
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn mark_printed_requires_completed_and_fires_once(pool: PgPool) {
    let fixture = common::seed_showtime(&pool).await;
    let order = common::create_order(&pool, &fixture, &fixture.chair_ids[..1]).await;

    // Pending orders cannot be printed.
    assert!(!OrderRepo::mark_printed(&pool, order.id).await.unwrap());

    assert!(OrderRepo::complete(&pool, order.id).await.unwrap());
    assert!(OrderRepo::mark_printed(&pool, order.id).await.unwrap());

    // The replayed scan loses.
    assert!(!OrderRepo::mark_printed(&pool, order.id).await.unwrap());
    let row = OrderRepo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(row.status_id, OrderStatus::Printed.id());
}

// ---------------------------------------------------------------------------
// Combos and pricing
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn combos_attach_only_while_pending(pool: PgPool) {
    let fixture = common::seed_showtime(&pool).await;
    let order = common::create_order(&pool, &fixture, &fixture.chair_ids[..1]).await;

    let selection = [ComboSelection {
        combo_id: fixture.combo_id,
        quantity: 2,
    }];
    OrderRepo::add_combos(&pool, order.id, &selection).await.unwrap();
    assert!(OrderRepo::has_combos(&pool, order.id).await.unwrap());

    assert!(OrderRepo::complete(&pool, order.id).await.unwrap());
    let err = OrderRepo::add_combos(&pool, order.id, &selection).await.unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::InvalidState(_)));
}

#[sqlx::test]
async fn adding_same_combo_twice_accumulates_quantity(pool: PgPool) {
    let fixture = common::seed_showtime(&pool).await;
    let order = common::create_order(&pool, &fixture, &fixture.chair_ids[..1]).await;

    let one = [ComboSelection {
        combo_id: fixture.combo_id,
        quantity: 1,
    }];
    OrderRepo::add_combos(&pool, order.id, &one).await.unwrap();
    OrderRepo::add_combos(&pool, order.id, &one).await.unwrap();

    let detail = OrderRepo::detail(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(detail.combos.len(), 1);
    assert_eq!(detail.combos[0].quantity, 2);
}

/// Tickets 200000 + combos 50000 with a 10% voucher capped at 20000 gives
/// discount 20000 and total 230000.
#[sqlx::test]
async fn detail_applies_capped_voucher_discount(pool: PgPool) {
    let fixture = common::seed_showtime(&pool).await;
    let voucher_id = CatalogRepo::create_voucher(
        &pool,
        "WELCOME10",
        0.1,
        20_000,
        Utc::now() - Duration::days(1),
        Utc::now() + Duration::days(1),
    )
    .await
    .unwrap();

    let mut input = common::order_input(&pool, fixture.showtime_id, &fixture.chair_ids[..2]).await;
    input.voucher_id = Some(voucher_id);
    input.combos = vec![ComboSelection {
        combo_id: fixture.combo_id,
        quantity: 1,
    }];
    let order = OrderRepo::create(&pool, &input, None, &common::guest_contact(), TEST_TIMEOUT_MINS)
        .await
        .unwrap();

    let detail = OrderRepo::detail(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(detail.pricing.ticket_subtotal, 200_000);
    assert_eq!(detail.pricing.combo_subtotal, 50_000);
    assert_eq!(detail.pricing.payment, 250_000);
    assert_eq!(detail.pricing.discount, 20_000);
    assert_eq!(detail.pricing.total, 230_000);

    // Pure read: a second computation yields the same figures.
    let again = OrderRepo::detail(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(again.pricing, detail.pricing);
}
