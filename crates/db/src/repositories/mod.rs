//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept an executor (`&PgPool`, or a transaction for the composite
//! booking flows) as the first argument.

pub mod catalog_repo;
pub mod order_repo;
pub mod release_job_repo;
pub mod seat_showtime_repo;
pub mod showtime_repo;
pub mod ticket_repo;

pub use catalog_repo::CatalogRepo;
pub use order_repo::OrderRepo;
pub use release_job_repo::ReleaseJobRepo;
pub use seat_showtime_repo::SeatShowtimeRepo;
pub use showtime_repo::ShowtimeRepo;
pub use ticket_repo::TicketRepo;
