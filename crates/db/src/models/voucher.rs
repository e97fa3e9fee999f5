//! Voucher models.

use serde::Serialize;
use sqlx::FromRow;

use cinebook_core::pricing::VoucherTerms;
use cinebook_core::types::{Amount, DbId, Timestamp};

/// A voucher row from the `vouchers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Voucher {
    pub id: DbId,
    pub code: String,
    pub discount_rate: f64,
    pub max_value: Amount,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
}

impl Voucher {
    /// The pure pricing terms of this voucher.
    pub fn terms(&self) -> VoucherTerms {
        VoucherTerms {
            discount_rate: self.discount_rate,
            max_value: self.max_value,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
        }
    }
}
