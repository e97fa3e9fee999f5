//! Payment gateway integration.

pub mod vnpay;
