//! Handlers for the `/orders` resource: checkout, detail, combos, and the
//! VNPay redirect URL.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use validator::Validate;

use cinebook_core::error::CoreError;
use cinebook_core::lifecycle;
use cinebook_core::types::DbId;
use cinebook_db::models::order::{ComboSelection, CreateOrder, Order, OrderContact, OrderDetail};
use cinebook_db::models::status::OrderStatus;
use cinebook_db::repositories::{CatalogRepo, OrderRepo, ShowtimeRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::OptionalAuthUser;
use crate::payment::vnpay;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/orders
///
/// Creates a pending order, reserving every requested seat atomically.
/// Signed-in customers get their contact details stamped from their
/// account; guests must supply a complete contact block.
pub async fn create(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    Json(input): Json<CreateOrder>,
) -> AppResult<(StatusCode, Json<DataResponse<OrderDetail>>)> {
    input.validate()?;

    let now = Utc::now();
    let showtime = ShowtimeRepo::find_info(&state.pool, input.showtime_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Showtime",
            id: input.showtime_id,
        }))?;
    if showtime.starts_at <= now {
        return Err(CoreError::Validation("Showtime has already started".into()).into());
    }
    if showtime.starts_at > now + state.booking.advance_ticketing() {
        return Err(
            CoreError::Validation("Tickets for this showtime are not on sale yet".into()).into(),
        );
    }

    if let Some(voucher_id) = input.voucher_id {
        let voucher = CatalogRepo::find_voucher(&state.pool, voucher_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Voucher",
                id: voucher_id,
            }))?;
        if !voucher.terms().usable_at(now) {
            return Err(
                CoreError::Validation("Voucher is outside its validity window".into()).into(),
            );
        }
    }

    let (user_id, contact) = resolve_contact(&state, user.map(|u| u.user_id), &input).await?;

    let order = OrderRepo::create(
        &state.pool,
        &input,
        user_id,
        &contact,
        state.booking.booking_timeout_mins,
    )
    .await?;
    tracing::info!(order_id = order.id, seats = input.seats.len(), "Order created");

    let detail = require_detail(&state, order.id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: detail })))
}

/// GET /api/v1/orders/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<OrderDetail>>> {
    load_current(&state, id).await?;
    let detail = require_detail(&state, id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// POST /api/v1/orders/{id}/combos
///
/// Attaches concession combos to a still-pending order, snapshotting
/// current combo prices.
pub async fn add_combos(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(selections): Json<Vec<ComboSelection>>,
) -> AppResult<Json<DataResponse<OrderDetail>>> {
    for selection in &selections {
        selection.validate()?;
    }

    load_current(&state, id).await?;
    OrderRepo::add_combos(&state.pool, id, &selections).await?;

    let detail = require_detail(&state, id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// Response payload for the payment-url endpoint.
#[derive(Debug, Serialize)]
pub struct PaymentUrl {
    pub payment_url: String,
}

/// GET /api/v1/orders/{id}/payment-url
///
/// Builds the VNPay hosted-checkout redirect for a pending, unexpired
/// order. The amount is the recomputed aggregate total; nothing stored is
/// trusted.
pub async fn payment_url(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    headers: HeaderMap,
) -> AppResult<Json<DataResponse<PaymentUrl>>> {
    let order = load_current(&state, id).await?;
    if order.status_id != OrderStatus::Pending.id() {
        return Err(CoreError::InvalidState(format!(
            "Cannot pay for a {} order",
            lifecycle::status_name(order.status_id)
        ))
        .into());
    }

    let detail = require_detail(&state, id).await?;
    let expires_at = order.created_at + state.booking.booking_timeout();
    let url = vnpay::build_payment_url(
        &state.vnpay,
        order.id,
        detail.pricing.total,
        client_ip(&headers),
        Utc::now(),
        expires_at,
    );

    Ok(Json(DataResponse {
        data: PaymentUrl { payment_url: url },
    }))
}

/// Load an order, applying lazy expiry first: a pending order whose payment
/// window has passed is failed (seats released) before its current state is
/// returned. Keeps every read path honest even if the release worker is
/// behind.
pub(crate) async fn load_current(state: &AppState, id: DbId) -> AppResult<Order> {
    let order = OrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Order",
            id,
        }))?;

    let now = Utc::now();
    if order.status_id == OrderStatus::Pending.id()
        && lifecycle::is_payment_window_elapsed(
            order.created_at,
            now,
            state.booking.booking_timeout_mins,
        )
    {
        OrderRepo::expire_if_stale(&state.pool, id, now, state.booking.booking_timeout_mins)
            .await?;
        return OrderRepo::find_by_id(&state.pool, id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound { entity: "Order", id }));
    }

    Ok(order)
}

/// Order detail or 404.
pub(crate) async fn require_detail(state: &AppState, id: DbId) -> AppResult<OrderDetail> {
    OrderRepo::detail(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Order", id }))
}

/// Resolve the contact details stamped onto the order row: the signed-in
/// user's account data, or the validated guest contact block.
async fn resolve_contact(
    state: &AppState,
    user_id: Option<DbId>,
    input: &CreateOrder,
) -> AppResult<(Option<DbId>, OrderContact)> {
    if let Some(user_id) = user_id {
        let (name, phone, email) = CatalogRepo::user_contact(&state.pool, user_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "User",
                id: user_id,
            }))?;
        return Ok((Some(user_id), OrderContact { name, phone, email }));
    }

    let contact = input.contact.as_ref().ok_or_else(|| {
        AppError::Core(CoreError::Validation(
            "Guest orders require contact details (name, phone, email)".into(),
        ))
    })?;
    Ok((
        None,
        OrderContact {
            name: contact.name.clone(),
            phone: contact.phone.clone(),
            email: contact.email.clone(),
        },
    ))
}

/// Best-effort client IP for the gateway parameters.
fn client_ip(headers: &HeaderMap) -> &str {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .unwrap_or("127.0.0.1")
}
