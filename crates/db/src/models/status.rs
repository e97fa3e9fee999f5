//! Order status enum mapping to the `order_statuses` lookup table.

use cinebook_core::lifecycle;

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

/// Order lifecycle status. Discriminants match the 1-based seed data in
/// `order_statuses` and the constants in `cinebook_core::lifecycle`.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending = 1,
    Completed = 2,
    Printed = 3,
    Canceled = 4,
    Failed = 5,
}

impl OrderStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Map a raw status ID back to the enum, if known.
    pub fn from_id(id: StatusId) -> Option<Self> {
        match id {
            1 => Some(Self::Pending),
            2 => Some(Self::Completed),
            3 => Some(Self::Printed),
            4 => Some(Self::Canceled),
            5 => Some(Self::Failed),
            _ => None,
        }
    }

    /// Lowercase name matching the lookup table seed data.
    pub fn name(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Printed => "printed",
            Self::Canceled => "canceled",
            Self::Failed => "failed",
        }
    }
}

impl From<OrderStatus> for StatusId {
    fn from(value: OrderStatus) -> Self {
        value as StatusId
    }
}
