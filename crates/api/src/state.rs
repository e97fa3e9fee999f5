use std::sync::Arc;

use cinebook_core::config::BookingConfig;
use cinebook_core::qr::QrKeys;

use crate::config::ServerConfig;
use crate::notifications::EmailConfig;
use crate::payment::vnpay::VnpayConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: cinebook_db::DbPool,
    /// Server configuration (bind address, CORS, JWT).
    pub config: Arc<ServerConfig>,
    /// Booking policy: payment window, QR grace, sale window.
    pub booking: BookingConfig,
    /// QR token key material.
    pub qr_keys: Arc<QrKeys>,
    /// VNPay gateway configuration.
    pub vnpay: Arc<VnpayConfig>,
    /// Optional SMTP configuration; `None` disables confirmation e-mails.
    pub email: Option<Arc<EmailConfig>>,
}
