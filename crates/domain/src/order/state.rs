//! Order status machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Status transitions:
/// ```text
/// Open ──► Submitted ──► Paid ──► Shipped ──► Completed
///   │          │           │
///   └──────────┴───────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Cart and coupon may still change.
    #[default]
    Open,

    /// Stock and coupon are reserved, awaiting payment.
    Submitted,

    /// Payment recorded, awaiting shipment.
    Paid,

    /// Handed to the logistics partner.
    Shipped,

    /// Delivered (terminal state).
    Completed,

    /// Order was cancelled and its reservation released.
    Cancelled,
}

impl OrderStatus {
    /// Returns true if cart items and coupon can be modified in this status.
    pub fn can_modify_cart(&self) -> bool {
        matches!(self, OrderStatus::Open)
    }

    /// Returns true if a payment can be recorded in this status.
    pub fn can_pay(&self) -> bool {
        matches!(self, OrderStatus::Submitted)
    }

    /// Returns true if the order can be handed to the logistics partner.
    pub fn can_ship(&self) -> bool {
        matches!(self, OrderStatus::Paid)
    }

    /// Returns true if the order can be completed in this status.
    pub fn can_complete(&self) -> bool {
        matches!(self, OrderStatus::Shipped)
    }

    /// Returns true if stock and coupon are reserved for the order.
    pub fn holds_reservation(&self) -> bool {
        matches!(self, OrderStatus::Submitted | OrderStatus::Paid)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "Open",
            OrderStatus::Submitted => "Submitted",
            OrderStatus::Paid => "Paid",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(OrderStatus::Open),
            "Submitted" => Ok(OrderStatus::Submitted),
            "Paid" => Ok(OrderStatus::Paid),
            "Shipped" => Ok(OrderStatus::Shipped),
            "Completed" => Ok(OrderStatus::Completed),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}
