//! VNPay gateway callback handling.

use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use cinebook_core::error::CoreError;
use cinebook_core::lifecycle;
use cinebook_core::types::DbId;
use cinebook_db::models::status::OrderStatus;
use cinebook_db::repositories::OrderRepo;

use crate::error::AppResult;
use crate::handlers::orders;
use crate::notifications;
use crate::payment::vnpay;
use crate::response::DataResponse;
use crate::state::AppState;

/// Result of a processed gateway callback.
#[derive(Debug, Serialize)]
pub struct CallbackOutcome {
    pub order_id: DbId,
    /// `"completed"` or `"canceled"`.
    pub status: &'static str,
}

/// GET /api/v1/payment/vnpay/callback
///
/// Processing order:
///
/// 1. Recompute the `vnp_SecureHash` over the received parameters; a
///    mismatch is treated as tampering and nothing else is looked at.
/// 2. Locate the order from `vnp_TxnRef`.
/// 3. Apply lazy expiry: a callback arriving after the payment window
///    finds the order already failed and is answered with 410.
/// 4. Reject callbacks for orders not in `Pending` (replays, double
///    notifications) with 409.
/// 5. Success codes complete the order (assigning ticket codes) and fire
///    the confirmation e-mail; anything else cancels it and frees the
///    seats.
pub async fn vnpay_callback(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> AppResult<Json<DataResponse<CallbackOutcome>>> {
    if !vnpay::verify_signature(&params, &state.vnpay.hash_secret) {
        return Err(CoreError::Tampered.into());
    }

    let order_id: DbId = params
        .get("vnp_TxnRef")
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| CoreError::Validation("Missing or malformed vnp_TxnRef".into()))?;

    let order = orders::load_current(&state, order_id).await?;
    match OrderStatus::from_id(order.status_id) {
        Some(OrderStatus::Pending) => {}
        Some(OrderStatus::Failed) => {
            return Err(CoreError::Expired("Payment window has passed".into()).into());
        }
        _ => {
            return Err(CoreError::InvalidState(format!(
                "Order is already {}",
                lifecycle::status_name(order.status_id)
            ))
            .into());
        }
    }

    if vnpay::is_success(&params) {
        // Guarded transition; a concurrent callback racing us simply finds
        // the order no longer pending.
        if !OrderRepo::complete(&state.pool, order_id).await? {
            return Err(CoreError::InvalidState("Order is no longer pending".into()).into());
        }
        tracing::info!(order_id, "Payment verified, order completed");

        send_confirmation(&state, order_id, &order.customer_email).await;

        Ok(Json(DataResponse {
            data: CallbackOutcome {
                order_id,
                status: "completed",
            },
        }))
    } else {
        let response_code = params
            .get("vnp_ResponseCode")
            .map(String::as_str)
            .unwrap_or("?");
        OrderRepo::cancel(&state.pool, order_id).await?;
        tracing::info!(order_id, response_code, "Payment failed, order canceled");

        Ok(Json(DataResponse {
            data: CallbackOutcome {
                order_id,
                status: "canceled",
            },
        }))
    }
}

/// Issue a QR token for the freshly completed order and hand it to the
/// e-mail task. Failures here must not disturb the callback response.
async fn send_confirmation(state: &AppState, order_id: DbId, to_email: &str) {
    let token = match crate::handlers::redemption::issue_token(state, order_id).await {
        Ok(issued) => issued.token,
        Err(e) => {
            tracing::warn!(order_id, error = %e, "Could not issue QR for confirmation e-mail");
            return;
        }
    };
    notifications::spawn_confirmation(
        state.email.clone(),
        to_email.to_string(),
        order_id,
        token,
    );
}
