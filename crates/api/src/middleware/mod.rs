//! Axum extractors and request guards.

pub mod auth;
