//! QR redemption token issuance and verification.
//!
//! A token binds a QR image to one order: the payload carries the order id,
//! the redemption type, an expiry instant (showtime end plus a grace
//! period), and a random nonce, all covered by an HMAC-SHA256 signature and
//! wrapped in AES-256-GCM. The encoded form is `base64url(nonce ‖
//! ciphertext)` so it survives URL and QR transport unchanged.
//!
//! Opening a token proves integrity only. The single-use guarantee rides on
//! the order's status (`Printed` = already redeemed), not on token
//! bookkeeping, so it survives token loss and regeneration; the caller
//! checks status after [`open`] succeeds.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

type HmacSha256 = Hmac<Sha256>;

/// AES-GCM nonce length in bytes (96 bits).
const AES_NONCE_LEN: usize = 12;

/// Length of the random payload nonce in bytes (hex-encoded in the payload).
const PAYLOAD_NONCE_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Key material for QR token protection.
///
/// The signing key feeds the HMAC; the encryption key is the AES-256 key.
/// Both come from configuration and must never be logged.
#[derive(Clone)]
pub struct QrKeys {
    signing_key: Vec<u8>,
    encryption_key: [u8; 32],
}

impl std::fmt::Debug for QrKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrKeys").finish_non_exhaustive()
    }
}

impl QrKeys {
    pub fn new(signing_key: impl Into<Vec<u8>>, encryption_key: [u8; 32]) -> Self {
        Self {
            signing_key: signing_key.into(),
            encryption_key,
        }
    }

    /// Parse the encryption key from its 64-character hex form.
    pub fn from_hex(signing_key: &str, encryption_key_hex: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(encryption_key_hex)
            .ok_or_else(|| CoreError::Validation("QR encryption key is not valid hex".into()))?;
        let encryption_key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::Validation("QR encryption key must be 32 bytes".into()))?;
        Ok(Self::new(signing_key.as_bytes().to_vec(), encryption_key))
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Which redemption the QR covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QrType {
    /// Tickets only.
    Ticket,
    /// Tickets plus concession combos.
    FullOrder,
}

impl QrType {
    pub fn as_str(self) -> &'static str {
        match self {
            QrType::Ticket => "ticket",
            QrType::FullOrder => "full_order",
        }
    }
}

/// The decrypted, signature-verified token contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrPayload {
    pub order_id: DbId,
    pub qr_type: QrType,
    /// Unix timestamp after which the token is no longer honored.
    pub expires_at: i64,
    /// Random per-issuance value; makes every issued token distinct.
    pub nonce: String,
    signature: String,
}

impl QrPayload {
    /// Whether the token validity window has passed at `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now.timestamp() > self.expires_at
    }
}

// ---------------------------------------------------------------------------
// Issuance
// ---------------------------------------------------------------------------

/// Sign and encrypt a QR token for `order_id`, valid until `expires_at`.
pub fn issue(
    order_id: DbId,
    qr_type: QrType,
    expires_at: Timestamp,
    keys: &QrKeys,
) -> Result<String, CoreError> {
    let nonce_bytes: [u8; PAYLOAD_NONCE_LEN] = rand::rng().random();
    let nonce = hex::encode(nonce_bytes);
    let expires_at = expires_at.timestamp();

    let payload = QrPayload {
        order_id,
        qr_type,
        expires_at,
        signature: sign(order_id, qr_type, expires_at, &nonce, keys),
        nonce,
    };

    let plaintext = serde_json::to_vec(&payload)
        .map_err(|e| CoreError::Internal(format!("QR payload serialization failed: {e}")))?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&keys.encryption_key));
    let aes_nonce: [u8; AES_NONCE_LEN] = rand::rng().random();
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&aes_nonce), plaintext.as_ref())
        .map_err(|_| CoreError::Internal("QR payload encryption failed".into()))?;

    let mut blob = Vec::with_capacity(AES_NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&aes_nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(URL_SAFE_NO_PAD.encode(blob))
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Decrypt a token and verify its signature.
///
/// Every failure mode (malformed base64, wrong key, truncated blob, bad
/// JSON, signature mismatch) collapses into [`CoreError::Tampered`] so the
/// redemption UI cannot be used as an oracle for which check failed. Expiry
/// and already-used checks are the caller's job, in that order after this.
pub fn open(token: &str, keys: &QrKeys) -> Result<QrPayload, CoreError> {
    let blob = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|_| CoreError::Tampered)?;
    if blob.len() <= AES_NONCE_LEN {
        return Err(CoreError::Tampered);
    }
    let (aes_nonce, ciphertext) = blob.split_at(AES_NONCE_LEN);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&keys.encryption_key));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(aes_nonce), ciphertext)
        .map_err(|_| CoreError::Tampered)?;

    let payload: QrPayload = serde_json::from_slice(&plaintext).map_err(|_| CoreError::Tampered)?;

    let signature = hex::decode(&payload.signature).ok_or(CoreError::Tampered)?;
    let mut mac = <HmacSha256 as Mac>::new_from_slice(&keys.signing_key)
        .map_err(|_| CoreError::Internal("HMAC key setup failed".into()))?;
    mac.update(signing_input(payload.order_id, payload.qr_type, payload.expires_at, &payload.nonce).as_bytes());
    mac.verify_slice(&signature).map_err(|_| CoreError::Tampered)?;

    Ok(payload)
}

/// The canonical byte string covered by the signature.
fn signing_input(order_id: DbId, qr_type: QrType, expires_at: i64, nonce: &str) -> String {
    format!("{order_id}|{}|{expires_at}|{nonce}", qr_type.as_str())
}

/// HMAC-SHA256 over the canonical signing input, hex-encoded.
fn sign(order_id: DbId, qr_type: QrType, expires_at: i64, nonce: &str, keys: &QrKeys) -> String {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(&keys.signing_key).expect("HMAC accepts any key length");
    mac.update(signing_input(order_id, qr_type, expires_at, nonce).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

// ---------------------------------------------------------------------------
// hex helpers (no extra dep)
// ---------------------------------------------------------------------------

mod hex {
    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Decode a hex string; `None` on odd length or non-hex characters.
    pub fn decode(s: &str) -> Option<Vec<u8>> {
        if s.len() % 2 != 0 {
            return None;
        }
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
