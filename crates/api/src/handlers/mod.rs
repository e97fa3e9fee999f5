//! HTTP request handlers, grouped by resource.

pub mod orders;
pub mod payment;
pub mod redemption;
pub mod seats;
