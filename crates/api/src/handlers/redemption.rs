//! QR issuance and box-office redemption.
//!
//! Verification is pure (no state change); redemption additionally flips
//! the order `Completed -> Printed`, which is the single-use gate: a
//! replayed token finds the order already printed and is rejected. Tampered
//! and expired tokens are answered with the same generic message so the
//! scanner cannot be used to probe which check failed; an already-used
//! ticket is reported distinctly.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use cinebook_core::error::CoreError;
use cinebook_core::qr::{self, QrPayload, QrType};
use cinebook_core::types::{DbId, Timestamp};
use cinebook_db::models::order::Order;
use cinebook_db::models::status::OrderStatus;
use cinebook_db::repositories::{OrderRepo, TicketRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Issuance
// ---------------------------------------------------------------------------

/// An issued QR token and its metadata.
#[derive(Debug, Serialize)]
pub struct IssuedQr {
    pub order_id: DbId,
    pub qr_type: QrType,
    pub token: String,
    pub expires_at: Timestamp,
}

/// GET /api/v1/orders/{id}/qr
///
/// Staff-only. Issues a fresh token for a paid order; reissuing is always
/// allowed (a lost e-mail must not strand the customer) because the
/// single-use property lives on the order status, not the token.
pub async fn issue(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<IssuedQr>>> {
    user.require_staff()?;
    let issued = issue_token(&state, id).await?;
    Ok(Json(DataResponse { data: issued }))
}

/// Issue a QR token for a Completed or Printed order.
///
/// The token expires at showtime end plus the configured grace period, so
/// latecomers can still collect tickets during the screening.
pub(crate) async fn issue_token(state: &AppState, order_id: DbId) -> AppResult<IssuedQr> {
    let order = OrderRepo::find_by_id(&state.pool, order_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Order",
            id: order_id,
        }))?;

    match OrderStatus::from_id(order.status_id) {
        Some(OrderStatus::Completed) | Some(OrderStatus::Printed) => {}
        _ => {
            return Err(CoreError::InvalidState(
                "QR codes are only issued for paid orders".into(),
            )
            .into());
        }
    }

    let showtime = TicketRepo::showtime_for_order(&state.pool, order_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Ticket",
            id: order_id,
        }))?;
    let expires_at = showtime.ends_at() + state.booking.qr_grace();

    let qr_type = if OrderRepo::has_combos(&state.pool, order_id).await? {
        QrType::FullOrder
    } else {
        QrType::Ticket
    };

    let token = qr::issue(order_id, qr_type, expires_at, &state.qr_keys)?;
    Ok(IssuedQr {
        order_id,
        qr_type,
        token,
        expires_at,
    })
}

// ---------------------------------------------------------------------------
// Verification / redemption
// ---------------------------------------------------------------------------

/// Request body for verify/redeem: the scanned token.
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub token: String,
}

/// What the scanner shows the staff member on a valid token.
#[derive(Debug, Serialize)]
pub struct ScanOutcome {
    pub order_id: DbId,
    pub qr_type: QrType,
    pub movie_title: String,
    pub room_name: String,
    pub starts_at: Timestamp,
    pub ticket_codes: Vec<String>,
}

/// POST /api/v1/redemption/verify
///
/// Staff-only. Checks a token without changing anything; the scanner calls
/// this to preview before committing the hand-over.
pub async fn verify(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<ScanRequest>,
) -> AppResult<Json<DataResponse<ScanOutcome>>> {
    user.require_staff()?;
    let (payload, _order) = inspect(&state, &request.token).await?;
    let outcome = scan_outcome(&state, &payload).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/redemption/redeem
///
/// Staff-only. Verifies the token, then transitions the order
/// `Completed -> Printed`. Exactly one scan ever wins; the guarded update
/// settles concurrent scans of the same (or a regenerated) token.
pub async fn redeem(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<ScanRequest>,
) -> AppResult<Json<DataResponse<ScanOutcome>>> {
    user.require_staff()?;
    let (payload, order) = inspect(&state, &request.token).await?;

    if !OrderRepo::mark_printed(&state.pool, order.id).await? {
        // Lost a race with another scanner between inspect and here.
        return Err(CoreError::Conflict("Ticket has already been used".into()).into());
    }
    tracing::info!(order_id = order.id, "Order redeemed, tickets printed");

    let outcome = scan_outcome(&state, &payload).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// Open a token and check it against the order it names.
///
/// Check order matters: already-used is reported before expiry so a
/// customer re-scanning a collected ticket gets the accurate message, and
/// everything integrity-related stays behind the generic rejection.
async fn inspect(state: &AppState, token: &str) -> AppResult<(QrPayload, Order)> {
    let payload = qr::open(token, &state.qr_keys)?;

    let order = OrderRepo::find_by_id(&state.pool, payload.order_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!(order_id = payload.order_id, "QR names a nonexistent order");
            AppError::Core(CoreError::Tampered)
        })?;

    match OrderStatus::from_id(order.status_id) {
        Some(OrderStatus::Printed) => {
            return Err(CoreError::Conflict("Ticket has already been used".into()).into());
        }
        Some(OrderStatus::Completed) => {}
        _ => {
            // Tokens are only ever issued for paid orders; anything else
            // gets the generic rejection.
            tracing::warn!(
                order_id = order.id,
                status_id = order.status_id,
                "QR presented for an unpaid order"
            );
            return Err(CoreError::Tampered.into());
        }
    }

    if payload.is_expired(Utc::now()) {
        return Err(CoreError::Expired("Ticket could not be verified".into()).into());
    }

    Ok((payload, order))
}

/// Assemble the scanner display payload for a verified token.
async fn scan_outcome(state: &AppState, payload: &QrPayload) -> AppResult<ScanOutcome> {
    let showtime = TicketRepo::showtime_for_order(&state.pool, payload.order_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Ticket",
            id: payload.order_id,
        }))?;
    let tickets = TicketRepo::list_for_order(&state.pool, payload.order_id).await?;

    Ok(ScanOutcome {
        order_id: payload.order_id,
        qr_type: payload.qr_type,
        movie_title: showtime.movie_title,
        room_name: showtime.room_name,
        starts_at: showtime.starts_at,
        ticket_codes: tickets.into_iter().filter_map(|t| t.ticket_code).collect(),
    })
}
