//! Domain logic for the CineBook ticketing backend.
//!
//! This crate has zero internal dependencies so it can be used by the API
//! server, the release worker, and any future CLI tooling. It contains the
//! pieces of the booking core that are pure computation:
//!
//! - [`error::CoreError`] -- the shared error taxonomy.
//! - [`lifecycle`] -- the order state machine (Pending, Completed, Printed).
//! - [`pricing`] -- deterministic price aggregation with voucher discounts.
//! - [`qr`] -- signed, encrypted, single-use QR redemption tokens.
//! - [`tickets`] -- ticket code formatting (`TK001`, `TK002`, ...).
//! - [`config::BookingConfig`] -- injected booking policy (no ambient globals).

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod pricing;
pub mod qr;
pub mod roles;
pub mod tickets;
pub mod types;
