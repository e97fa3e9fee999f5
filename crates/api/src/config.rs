use cinebook_core::error::CoreError;
use cinebook_core::qr::QrKeys;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry duration).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
        }
    }
}

/// Load the QR token key material from the environment.
///
/// | Env Var             | Required | Format              |
/// |---------------------|----------|---------------------|
/// | `QR_SIGNING_KEY`    | **yes**  | arbitrary secret    |
/// | `QR_ENCRYPTION_KEY` | **yes**  | 64 hex chars (AES-256) |
///
/// # Panics
///
/// Panics on a missing or malformed key; the server must not start without
/// working redemption crypto.
pub fn qr_keys_from_env() -> QrKeys {
    let signing_key =
        std::env::var("QR_SIGNING_KEY").expect("QR_SIGNING_KEY must be set in the environment");
    assert!(!signing_key.is_empty(), "QR_SIGNING_KEY must not be empty");

    let encryption_key_hex = std::env::var("QR_ENCRYPTION_KEY")
        .expect("QR_ENCRYPTION_KEY must be set in the environment");

    match QrKeys::from_hex(&signing_key, &encryption_key_hex) {
        Ok(keys) => keys,
        Err(CoreError::Validation(msg)) => panic!("QR_ENCRYPTION_KEY invalid: {msg}"),
        Err(e) => panic!("QR_ENCRYPTION_KEY invalid: {e}"),
    }
}
