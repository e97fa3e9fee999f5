//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for the write paths
//! - Response DTOs assembled by the repository layer

pub mod combo;
pub mod order;
pub mod release_job;
pub mod seat_showtime;
pub mod showtime;
pub mod status;
pub mod ticket;
pub mod voucher;
