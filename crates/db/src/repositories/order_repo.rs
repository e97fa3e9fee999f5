//! Repository for the `orders` table and its composite booking flows.
//!
//! Status transitions are guarded `UPDATE ... WHERE status_id = <from>`
//! statements; `rows_affected` tells the caller whether the transition
//! happened, which makes every transition idempotent under races (two
//! concurrent completions, expiry applied twice, and so on).

use sqlx::{PgPool, Postgres, Transaction};

use cinebook_core::error::CoreError;
use cinebook_core::lifecycle;
use cinebook_core::pricing::{self, ComboLine};
use cinebook_core::tickets::format_ticket_code;
use cinebook_core::types::{DbId, Timestamp};

use crate::models::order::{CreateOrder, Order, OrderContact, OrderDetail};
use crate::models::combo::OrderComboLine;
use crate::models::status::OrderStatus;
use crate::models::voucher::Voucher;
use crate::repositories::{ReleaseJobRepo, SeatShowtimeRepo, TicketRepo};
use crate::RepoError;

/// Column list for `orders` queries.
const COLUMNS: &str = "\
    id, status_id, user_id, voucher_id, \
    customer_name, customer_phone, customer_email, created_at";

/// Provides order lifecycle operations.
pub struct OrderRepo;

impl OrderRepo {
    /// Create a new order in `Pending`, reserving every requested seat.
    ///
    /// Runs as one transaction: order row, per-seat compare-and-swap
    /// reservations, ticket rows with price snapshots, combo lines, and the
    /// deferred release job. If any seat does not exist (`NotFound`) or its
    /// reservation fails (`Conflict`), the whole transaction rolls back;
    /// seats reserved earlier in the loop are never leaked to a failed
    /// order attempt.
    pub async fn create(
        pool: &PgPool,
        input: &CreateOrder,
        user_id: Option<DbId>,
        contact: &OrderContact,
        timeout_mins: i64,
    ) -> Result<Order, RepoError> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO orders \
                 (status_id, user_id, voucher_id, customer_name, customer_phone, customer_email) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&query)
            .bind(OrderStatus::Pending.id())
            .bind(user_id)
            .bind(input.voucher_id)
            .bind(&contact.name)
            .bind(&contact.phone)
            .bind(&contact.email)
            .fetch_one(&mut *tx)
            .await?;

        for seat in &input.seats {
            let row: Option<(bool,)> = sqlx::query_as(
                "SELECT available FROM seat_showtimes WHERE showtime_id = $1 AND chair_id = $2",
            )
            .bind(input.showtime_id)
            .bind(seat.chair_id)
            .fetch_optional(&mut *tx)
            .await?;
            if row.is_none() {
                return Err(CoreError::NotFound {
                    entity: "Seat",
                    id: seat.chair_id,
                }
                .into());
            }

            let reserved =
                SeatShowtimeRepo::reserve(&mut *tx, input.showtime_id, seat.chair_id, seat.version)
                    .await?;
            if !reserved {
                return Err(CoreError::Conflict(format!(
                    "Seat {} is already taken, please re-select",
                    seat.chair_id
                ))
                .into());
            }

            // Chair-type price snapshot: later catalog price changes must not
            // retroactively alter this order.
            let price: Option<(i64,)> = sqlx::query_as(
                "SELECT ct.price FROM chairs c \
                 JOIN chair_types ct ON ct.id = c.chair_type_id \
                 WHERE c.id = $1",
            )
            .bind(seat.chair_id)
            .fetch_optional(&mut *tx)
            .await?;
            let (price,) = price.ok_or(CoreError::NotFound {
                entity: "Chair",
                id: seat.chair_id,
            })?;

            sqlx::query(
                "INSERT INTO tickets (order_id, showtime_id, chair_id, price) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(order.id)
            .bind(input.showtime_id)
            .bind(seat.chair_id)
            .bind(price)
            .execute(&mut *tx)
            .await?;
        }

        for line in &input.combos {
            Self::insert_combo_line(&mut tx, order.id, line.combo_id, line.quantity).await?;
        }

        let run_at = order.created_at + chrono::Duration::minutes(timeout_mins);
        ReleaseJobRepo::schedule(&mut *tx, order.id, run_at).await?;

        tx.commit().await?;
        Ok(order)
    }

    /// Find an order by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Transition `Pending -> Completed` on verified payment and assign
    /// ticket codes from the global sequence to every ticket of the order
    /// that does not already have one.
    ///
    /// Returns `false` without side effect when the order was not pending.
    pub async fn complete(pool: &PgPool, order_id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query("UPDATE orders SET status_id = $2 WHERE id = $1 AND status_id = $3")
            .bind(order_id)
            .bind(OrderStatus::Completed.id())
            .bind(OrderStatus::Pending.id())
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        let ticket_ids: Vec<(DbId,)> = sqlx::query_as(
            "SELECT id FROM tickets WHERE order_id = $1 AND ticket_code IS NULL ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        for (ticket_id,) in ticket_ids {
            let (seq,): (i64,) = sqlx::query_as("SELECT nextval('ticket_code_seq')")
                .fetch_one(&mut *tx)
                .await?;
            sqlx::query("UPDATE tickets SET ticket_code = $2 WHERE id = $1")
                .bind(ticket_id)
                .bind(format_ticket_code(seq))
                .execute(&mut *tx)
                .await?;
        }

        // The deferred release job has nothing left to do.
        sqlx::query("UPDATE seat_release_jobs SET done = TRUE WHERE order_id = $1 AND NOT done")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Transition `Pending -> Canceled` (payment gateway reported failure)
    /// and free the order's seats so the customer can restart.
    pub async fn cancel(pool: &PgPool, order_id: DbId) -> Result<bool, sqlx::Error> {
        Self::terminate(pool, order_id, OrderStatus::Canceled, None).await
    }

    /// Transition `Pending -> Failed` and free the order's seats. Used by
    /// the release worker, which only sees orders whose payment window has
    /// already elapsed (the job fires at `created_at + timeout`).
    pub async fn fail(pool: &PgPool, order_id: DbId) -> Result<bool, sqlx::Error> {
        Self::terminate(pool, order_id, OrderStatus::Failed, None).await
    }

    /// Lazy expiry: transition `Pending -> Failed` and free the seats, but
    /// only when the payment window has elapsed. Applying this to an order
    /// that is not pending, or not yet stale, is a no-op returning `false`.
    pub async fn expire_if_stale(
        pool: &PgPool,
        order_id: DbId,
        now: Timestamp,
        timeout_mins: i64,
    ) -> Result<bool, sqlx::Error> {
        let cutoff = now - chrono::Duration::minutes(timeout_mins);
        Self::terminate(pool, order_id, OrderStatus::Failed, Some(cutoff)).await
    }

    /// Shared guarded `Pending -> {Canceled, Failed}` transition plus seat
    /// release, in one transaction. `created_before` restricts the
    /// transition to stale orders (the expiry path).
    async fn terminate(
        pool: &PgPool,
        order_id: DbId,
        to: OrderStatus,
        created_before: Option<Timestamp>,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = match created_before {
            Some(cutoff) => {
                sqlx::query(
                    "UPDATE orders SET status_id = $2 \
                     WHERE id = $1 AND status_id = $3 AND created_at < $4",
                )
                .bind(order_id)
                .bind(to.id())
                .bind(OrderStatus::Pending.id())
                .bind(cutoff)
                .execute(&mut *tx)
                .await?
            }
            None => {
                sqlx::query("UPDATE orders SET status_id = $2 WHERE id = $1 AND status_id = $3")
                    .bind(order_id)
                    .bind(to.id())
                    .bind(OrderStatus::Pending.id())
                    .execute(&mut *tx)
                    .await?
            }
        };
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        let released = SeatShowtimeRepo::release_for_order(&mut *tx, order_id).await?;
        sqlx::query("UPDATE seat_release_jobs SET done = TRUE WHERE order_id = $1 AND NOT done")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(
            order_id,
            released,
            status = lifecycle::status_name(to.id()),
            "Order terminated, seats released"
        );
        Ok(true)
    }

    /// Transition `Completed -> Printed`: the single-use redemption gate.
    ///
    /// Exactly one caller ever sees `true`; replayed QR scans find the
    /// order already printed and get `false`.
    pub async fn mark_printed(pool: &PgPool, order_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE orders SET status_id = $2 WHERE id = $1 AND status_id = $3")
            .bind(order_id)
            .bind(OrderStatus::Printed.id())
            .bind(OrderStatus::Completed.id())
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Attach combo lines to a pending order, snapshotting current combo
    /// prices. Rejected with `InvalidState` for any other status.
    pub async fn add_combos(
        pool: &PgPool,
        order_id: DbId,
        selections: &[crate::models::order::ComboSelection],
    ) -> Result<(), RepoError> {
        let mut tx = pool.begin().await?;

        let status: Option<(i16,)> =
            sqlx::query_as("SELECT status_id FROM orders WHERE id = $1 FOR UPDATE")
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await?;
        let (status_id,) = status.ok_or(CoreError::NotFound {
            entity: "Order",
            id: order_id,
        })?;
        if status_id != OrderStatus::Pending.id() {
            return Err(CoreError::InvalidState(format!(
                "Cannot add combos to a {} order",
                lifecycle::status_name(status_id)
            ))
            .into());
        }

        for line in selections {
            Self::insert_combo_line(&mut tx, order_id, line.combo_id, line.quantity).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Insert one combo line with a price snapshot; adding the same combo
    /// twice accumulates quantity while keeping the first snapshot price.
    async fn insert_combo_line(
        tx: &mut Transaction<'_, Postgres>,
        order_id: DbId,
        combo_id: DbId,
        quantity: i32,
    ) -> Result<(), RepoError> {
        let price: Option<(i64,)> = sqlx::query_as("SELECT price FROM combos WHERE id = $1")
            .bind(combo_id)
            .fetch_optional(&mut **tx)
            .await?;
        let (price,) = price.ok_or(CoreError::NotFound {
            entity: "Combo",
            id: combo_id,
        })?;

        sqlx::query(
            "INSERT INTO order_combos (order_id, combo_id, quantity, price) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (order_id, combo_id) \
             DO UPDATE SET quantity = order_combos.quantity + EXCLUDED.quantity",
        )
        .bind(order_id)
        .bind(combo_id)
        .bind(quantity)
        .bind(price)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Whether the order has at least one combo line (drives the QR type).
    pub async fn has_combos(pool: &PgPool, order_id: DbId) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM order_combos WHERE order_id = $1)")
                .bind(order_id)
                .fetch_one(pool)
                .await?;
        Ok(exists)
    }

    /// Full order detail with the price breakdown recomputed from the
    /// captured rows. Pure read; calling it repeatedly yields identical
    /// figures for unmodified rows.
    pub async fn detail(pool: &PgPool, order_id: DbId) -> Result<Option<OrderDetail>, sqlx::Error> {
        let Some(order) = Self::find_by_id(pool, order_id).await? else {
            return Ok(None);
        };

        let tickets = TicketRepo::list_for_order(pool, order_id).await?;

        let combos = sqlx::query_as::<_, OrderComboLine>(
            "SELECT oc.combo_id, c.name, oc.quantity, oc.price \
             FROM order_combos oc \
             JOIN combos c ON c.id = oc.combo_id \
             WHERE oc.order_id = $1 \
             ORDER BY oc.combo_id",
        )
        .bind(order_id)
        .fetch_all(pool)
        .await?;

        let voucher = match order.voucher_id {
            Some(voucher_id) => sqlx::query_as::<_, Voucher>(
                "SELECT id, code, discount_rate, max_value, starts_at, ends_at \
                 FROM vouchers WHERE id = $1",
            )
            .bind(voucher_id)
            .fetch_optional(pool)
            .await?,
            None => None,
        };

        let ticket_prices: Vec<i64> = tickets.iter().map(|t| t.price).collect();
        let combo_lines: Vec<ComboLine> = combos
            .iter()
            .map(|line| ComboLine {
                price: line.price,
                quantity: line.quantity,
            })
            .collect();
        let terms = voucher.as_ref().map(Voucher::terms);
        let pricing = pricing::aggregate(&ticket_prices, &combo_lines, terms.as_ref());

        Ok(Some(OrderDetail {
            status: lifecycle::status_name(order.status_id),
            order,
            tickets,
            combos,
            pricing,
        }))
    }
}
