//! VNPay hosted-checkout integration.
//!
//! The gateway contract is query-string based: parameters are sorted
//! lexicographically, URL-encoded as `key=value` pairs joined with `&`, and
//! sealed with an HMAC-SHA512 over exactly that string (`vnp_SecureHash`).
//! The callback carries the same parameter set back; we recompute the seal
//! over the received values and treat any mismatch as tampering.
//!
//! Amounts are sent in VND × 100 per the gateway spec. `vnp_TxnRef` carries
//! our order id, which is how the callback is tied back to an order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha512;

use cinebook_core::types::{Amount, DbId, Timestamp};

type HmacSha512 = Hmac<Sha512>;

/// Gateway response/transaction code meaning success.
const VNP_SUCCESS: &str = "00";

/// Query parameter carrying the HMAC seal.
const SECURE_HASH_PARAM: &str = "vnp_SecureHash";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// VNPay merchant configuration.
#[derive(Debug, Clone)]
pub struct VnpayConfig {
    /// Merchant terminal code issued by VNPay.
    pub tmn_code: String,
    /// HMAC-SHA512 secret shared with the gateway.
    pub hash_secret: String,
    /// Hosted checkout base URL.
    pub pay_url: String,
    /// Where the gateway redirects the customer after payment.
    pub return_url: String,
}

impl VnpayConfig {
    /// Load VNPay configuration from environment variables.
    ///
    /// | Env Var             | Required |
    /// |---------------------|----------|
    /// | `VNPAY_TMN_CODE`    | **yes**  |
    /// | `VNPAY_HASH_SECRET` | **yes**  |
    /// | `VNPAY_PAY_URL`     | **yes**  |
    /// | `VNPAY_RETURN_URL`  | **yes**  |
    ///
    /// # Panics
    ///
    /// Panics if any variable is missing; the server must not start with a
    /// half-configured payment gateway.
    pub fn from_env() -> Self {
        fn required(name: &str) -> String {
            std::env::var(name).unwrap_or_else(|_| panic!("{name} must be set in the environment"))
        }

        Self {
            tmn_code: required("VNPAY_TMN_CODE"),
            hash_secret: required("VNPAY_HASH_SECRET"),
            pay_url: required("VNPAY_PAY_URL"),
            return_url: required("VNPAY_RETURN_URL"),
        }
    }
}

// ---------------------------------------------------------------------------
// URL building
// ---------------------------------------------------------------------------

/// Build the hosted-checkout redirect URL for a pending order.
///
/// `total` is the aggregated payable amount in VND; the gateway expects it
/// multiplied by 100. `expires_at` is the end of the order's payment window
/// (`created_at + booking timeout`), after which the gateway refuses the
/// payment page.
pub fn build_payment_url(
    config: &VnpayConfig,
    order_id: DbId,
    total: Amount,
    client_ip: &str,
    now: Timestamp,
    expires_at: Timestamp,
) -> String {
    let mut params = BTreeMap::new();
    params.insert("vnp_Version".to_string(), "2.1.0".to_string());
    params.insert("vnp_Command".to_string(), "pay".to_string());
    params.insert("vnp_TmnCode".to_string(), config.tmn_code.clone());
    params.insert("vnp_Amount".to_string(), (total * 100).to_string());
    params.insert("vnp_CurrCode".to_string(), "VND".to_string());
    params.insert("vnp_TxnRef".to_string(), order_id.to_string());
    params.insert(
        "vnp_OrderInfo".to_string(),
        format!("Thanh toan don hang {order_id}"),
    );
    params.insert("vnp_OrderType".to_string(), "other".to_string());
    params.insert("vnp_Locale".to_string(), "vn".to_string());
    params.insert("vnp_ReturnUrl".to_string(), config.return_url.clone());
    params.insert("vnp_IpAddr".to_string(), client_ip.to_string());
    params.insert("vnp_CreateDate".to_string(), format_vnp_date(now));
    params.insert("vnp_ExpireDate".to_string(), format_vnp_date(expires_at));

    append_signature(&mut params, &config.hash_secret);
    format!("{}?{}", config.pay_url, encoded_query(&params))
}

/// Gateway timestamp format: `yyyyMMddHHmmss`.
fn format_vnp_date(t: DateTime<Utc>) -> String {
    t.format("%Y%m%d%H%M%S").to_string()
}

// ---------------------------------------------------------------------------
// Signing / verification
// ---------------------------------------------------------------------------

/// The canonical sorted, URL-encoded `key=value&...` string over `params`.
///
/// The seal parameter itself is never part of the signed material.
pub fn encoded_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .filter(|(k, _)| k.as_str() != SECURE_HASH_PARAM && k.as_str() != "vnp_SecureHashType")
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
        + &params
            .get(SECURE_HASH_PARAM)
            .map(|seal| format!("&{SECURE_HASH_PARAM}={seal}"))
            .unwrap_or_default()
}

/// Compute the HMAC-SHA512 seal over the canonical query and insert it as
/// `vnp_SecureHash`.
pub fn append_signature(params: &mut BTreeMap<String, String>, secret: &str) {
    params.remove(SECURE_HASH_PARAM);
    params.remove("vnp_SecureHashType");
    let seal = sign(&canonical_input(params), secret);
    params.insert(SECURE_HASH_PARAM.to_string(), seal);
}

/// Verify the `vnp_SecureHash` of a received parameter set.
///
/// Returns `false` when the seal is absent, not valid hex, or does not match
/// the recomputed HMAC. Comparison is constant-time via the `hmac` crate.
pub fn verify_signature(params: &BTreeMap<String, String>, secret: &str) -> bool {
    let Some(seal) = params.get(SECURE_HASH_PARAM) else {
        return false;
    };
    let Some(seal_bytes) = hex::decode(seal) else {
        return false;
    };

    let signed: BTreeMap<String, String> = params
        .iter()
        .filter(|(k, _)| k.as_str() != SECURE_HASH_PARAM && k.as_str() != "vnp_SecureHashType")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let mut mac = match HmacSha512::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(canonical_input(&signed).as_bytes());
    mac.verify_slice(&seal_bytes).is_ok()
}

/// The byte string covered by the seal: sorted `key=urlencode(value)` pairs
/// joined with `&`, excluding the seal parameters.
fn canonical_input(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .filter(|(k, _)| k.as_str() != SECURE_HASH_PARAM && k.as_str() != "vnp_SecureHashType")
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// HMAC-SHA512 over `input`, hex-encoded lowercase.
fn sign(input: &str, secret: &str) -> String {
    let mut mac =
        HmacSha512::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(input.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Whether a callback parameter set reports a successful payment.
///
/// Both the response code and the transaction status must be `"00"`.
pub fn is_success(params: &BTreeMap<String, String>) -> bool {
    params.get("vnp_ResponseCode").map(String::as_str) == Some(VNP_SUCCESS)
        && params.get("vnp_TransactionStatus").map(String::as_str) == Some(VNP_SUCCESS)
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
