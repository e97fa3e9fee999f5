//! Order lifecycle state machine.
//!
//! This module lives in `core` (zero internal deps) so it can be used by both
//! the API/repository layer and the release worker. Status IDs match the
//! 1-based seed data in the `order_statuses` lookup table; the `db` crate's
//! `OrderStatus` enum mirrors these constants.

use crate::types::Timestamp;

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

/// Awaiting payment; seats are held.
pub const STATUS_PENDING: StatusId = 1;
/// Payment verified; tickets carry codes.
pub const STATUS_COMPLETED: StatusId = 2;
/// QR redeemed at the door. Terminal for redemption purposes.
pub const STATUS_PRINTED: StatusId = 3;
/// Payment gateway reported failure; seats released.
pub const STATUS_CANCELED: StatusId = 4;
/// Payment window elapsed; seats released.
pub const STATUS_FAILED: StatusId = 5;

/// Returns the set of valid target status IDs reachable from `from_status`.
///
/// Canceled, Failed, and Printed are terminal and return an empty slice.
/// There is no resurrection path: a Canceled or Failed order can never
/// become Pending again.
pub fn valid_transitions(from_status: StatusId) -> &'static [StatusId] {
    match from_status {
        STATUS_PENDING => &[STATUS_COMPLETED, STATUS_CANCELED, STATUS_FAILED],
        STATUS_COMPLETED => &[STATUS_PRINTED],
        STATUS_PRINTED | STATUS_CANCELED | STATUS_FAILED => &[],
        // Unknown status: no transitions allowed
        _ => &[],
    }
}

/// Check whether a transition from `from` to `to` is valid.
pub fn can_transition(from: StatusId, to: StatusId) -> bool {
    valid_transitions(from).contains(&to)
}

/// Validate a state transition, returning an error message for invalid ones.
pub fn validate_transition(from: StatusId, to: StatusId) -> Result<(), String> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(format!(
            "Invalid order transition: {} ({from}) -> {} ({to})",
            status_name(from),
            status_name(to)
        ))
    }
}

/// Human-readable name for a status ID (for error messages).
pub fn status_name(id: StatusId) -> &'static str {
    match id {
        STATUS_PENDING => "Pending",
        STATUS_COMPLETED => "Completed",
        STATUS_PRINTED => "Printed",
        STATUS_CANCELED => "Canceled",
        STATUS_FAILED => "Failed",
        _ => "Unknown",
    }
}

/// Whether a pending order created at `created_at` has outlived its payment
/// window of `timeout_mins` at instant `now`.
///
/// This is the lazy expiry check applied on every read path; the deferred
/// release job in the worker is the out-of-band counterpart. Both converge
/// on the same terminal state regardless of which fires first.
pub fn is_payment_window_elapsed(created_at: Timestamp, now: Timestamp, timeout_mins: i64) -> bool {
    now > created_at + chrono::Duration::minutes(timeout_mins)
}
