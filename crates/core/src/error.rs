use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Seat compare-and-swap failure or another booking-level collision.
    /// Surfaced to the user as "seat already taken, please re-select".
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Operation attempted against an order not in the required status.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Order payment window or QR validity window has passed.
    #[error("Expired: {0}")]
    Expired(String),

    /// QR signature mismatch or undecryptable token. Logged as a potential
    /// security event; the user-facing message stays generic.
    #[error("Tampered token")]
    Tampered,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
