//! Booking policy configuration.
//!
//! An explicitly constructed struct passed to the components that need it
//! (API state, release worker) instead of ambient global settings.

use chrono::Duration;

/// Default payment window for a pending order, in minutes.
const DEFAULT_BOOKING_TIMEOUT_MINS: i64 = 10;

/// Default QR validity grace period after the movie ends, in minutes.
const DEFAULT_QR_GRACE_MINS: i64 = 30;

/// Default cleaning break between two showtimes in the same room, in minutes.
const DEFAULT_ROOM_BREAK_MINS: i64 = 15;

/// Default number of days before a showtime that tickets go on sale.
const DEFAULT_ADVANCE_TICKETING_DAYS: i64 = 7;

/// Default VND spent per loyalty point earned.
const DEFAULT_POINTS_PER_THRESHOLD: i64 = 10_000;

/// Booking policy settings shared by the API server and the release worker.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// Minutes a pending order may wait for payment before its seats are
    /// released and the order fails.
    pub booking_timeout_mins: i64,
    /// Minutes after the movie ends during which a QR code is still valid.
    pub qr_grace_mins: i64,
    /// Minimum gap between two showtimes scheduled in the same room.
    pub room_break_mins: i64,
    /// How many days before a showtime seats become purchasable.
    pub advance_ticketing_days: i64,
    /// VND spent per loyalty point earned on completed orders.
    pub points_per_threshold: i64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            booking_timeout_mins: DEFAULT_BOOKING_TIMEOUT_MINS,
            qr_grace_mins: DEFAULT_QR_GRACE_MINS,
            room_break_mins: DEFAULT_ROOM_BREAK_MINS,
            advance_ticketing_days: DEFAULT_ADVANCE_TICKETING_DAYS,
            points_per_threshold: DEFAULT_POINTS_PER_THRESHOLD,
        }
    }
}

impl BookingConfig {
    /// Load booking policy from environment variables, falling back to the
    /// defaults above.
    ///
    /// | Env Var                   | Default  |
    /// |---------------------------|----------|
    /// | `BOOKING_TIMEOUT_MINS`    | `10`     |
    /// | `QR_GRACE_MINS`           | `30`     |
    /// | `ROOM_BREAK_MINS`         | `15`     |
    /// | `ADVANCE_TICKETING_DAYS`  | `7`      |
    /// | `POINTS_PER_THRESHOLD`    | `10000`  |
    pub fn from_env() -> Self {
        fn env_i64(name: &str, default: i64) -> i64 {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        Self {
            booking_timeout_mins: env_i64("BOOKING_TIMEOUT_MINS", DEFAULT_BOOKING_TIMEOUT_MINS),
            qr_grace_mins: env_i64("QR_GRACE_MINS", DEFAULT_QR_GRACE_MINS),
            room_break_mins: env_i64("ROOM_BREAK_MINS", DEFAULT_ROOM_BREAK_MINS),
            advance_ticketing_days: env_i64(
                "ADVANCE_TICKETING_DAYS",
                DEFAULT_ADVANCE_TICKETING_DAYS,
            ),
            points_per_threshold: env_i64("POINTS_PER_THRESHOLD", DEFAULT_POINTS_PER_THRESHOLD),
        }
    }

    /// Payment window as a [`chrono::Duration`].
    pub fn booking_timeout(&self) -> Duration {
        Duration::minutes(self.booking_timeout_mins)
    }

    /// QR grace period as a [`chrono::Duration`].
    pub fn qr_grace(&self) -> Duration {
        Duration::minutes(self.qr_grace_mins)
    }

    /// Room cleaning break as a [`chrono::Duration`].
    pub fn room_break(&self) -> Duration {
        Duration::minutes(self.room_break_mins)
    }

    /// Advance ticketing window as a [`chrono::Duration`].
    pub fn advance_ticketing(&self) -> Duration {
        Duration::days(self.advance_ticketing_days)
    }

    /// Loyalty points earned for a completed order of `total` VND.
    pub fn loyalty_points(&self, total: i64) -> i64 {
        if self.points_per_threshold <= 0 {
            return 0;
        }
        total / self.points_per_threshold
    }
}
