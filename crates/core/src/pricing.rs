//! Order price aggregation.
//!
//! Totals are never stored on the order row. They are recomputed from the
//! captured ticket/combo price snapshots plus voucher terms every time order
//! detail is requested, so adding combos to a still-pending order or
//! rebuilding a payment URL always yields a consistent figure. Everything
//! here is a pure function of its inputs.

use serde::Serialize;

use crate::types::{Amount, Timestamp};

/// Voucher terms as captured from the voucher catalog.
#[derive(Debug, Clone)]
pub struct VoucherTerms {
    /// Fraction of the payment discounted, e.g. `0.1` for 10%.
    pub discount_rate: f64,
    /// Absolute cap on the discount in VND.
    pub max_value: Amount,
    /// Start of the validity window (inclusive).
    pub starts_at: Timestamp,
    /// End of the validity window (inclusive).
    pub ends_at: Timestamp,
}

impl VoucherTerms {
    /// A voucher is usable only while `now` falls inside its window.
    pub fn usable_at(&self, now: Timestamp) -> bool {
        self.starts_at <= now && now <= self.ends_at
    }
}

/// One combo line of an order: captured unit price and quantity.
#[derive(Debug, Clone, Copy)]
pub struct ComboLine {
    pub price: Amount,
    pub quantity: i32,
}

/// The computed price breakdown for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceBreakdown {
    pub ticket_subtotal: Amount,
    pub combo_subtotal: Amount,
    /// `ticket_subtotal + combo_subtotal`, before discount.
    pub payment: Amount,
    /// `min(rate × payment, max_value)`, floored to whole VND.
    pub discount: Amount,
    /// The final payable amount.
    pub total: Amount,
}

/// Aggregate ticket and combo snapshots into a price breakdown.
///
/// The voucher, when present, is assumed to have been window-checked at
/// attachment time; its terms still apply to orders that outlive the window
/// (the discount was locked in with the order).
pub fn aggregate(
    ticket_prices: &[Amount],
    combo_lines: &[ComboLine],
    voucher: Option<&VoucherTerms>,
) -> PriceBreakdown {
    let ticket_subtotal: Amount = ticket_prices.iter().sum();
    let combo_subtotal: Amount = combo_lines
        .iter()
        .map(|line| line.price * Amount::from(line.quantity))
        .sum();
    let payment = ticket_subtotal + combo_subtotal;

    let discount = match voucher {
        Some(terms) => voucher_discount(terms, payment),
        None => 0,
    };

    PriceBreakdown {
        ticket_subtotal,
        combo_subtotal,
        payment,
        discount,
        total: payment - discount,
    }
}

/// Discount for a voucher against a payment amount, capped at `max_value`
/// and never negative.
fn voucher_discount(terms: &VoucherTerms, payment: Amount) -> Amount {
    let raw = (terms.discount_rate * payment as f64).floor() as Amount;
    raw.clamp(0, terms.max_value.max(0))
}
