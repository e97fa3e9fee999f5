//! Authentication building blocks: JWT generation and validation.

pub mod jwt;
