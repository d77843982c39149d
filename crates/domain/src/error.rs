//! Domain error types.

use common::{CouponCode, ProductId};
use thiserror::Error;

use crate::order::OrderStatus;
use crate::payment::PaymentType;
use crate::shipment::ShipmentStatus;

/// Coarse classification of a failure, independent of its representation.
///
/// The presentation layer maps each kind to a response class; the core only
/// reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced resource does not exist.
    NotFound,
    /// The request is well-formed but violates a domain invariant.
    Conflict,
    /// The caller supplied malformed input.
    Validation,
    /// Storage, network or other infrastructure failure.
    Infrastructure,
}

/// Errors raised by the order aggregate and the product/coupon ledgers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The order has left `Open` and its cart and coupon can no longer change.
    #[error("order is already finalized")]
    AlreadyFinalized,

    /// The order reached its terminal status.
    #[error("order is already completed")]
    AlreadyCompleted,

    /// The order was cancelled before.
    #[error("order is already cancelled")]
    AlreadyCancelled,

    /// The order was shipped before.
    #[error("order is already shipped")]
    AlreadyShipped,

    /// The coupon is exhausted or outside its validity window.
    #[error("invalid coupon: {code}")]
    InvalidCoupon { code: CouponCode },

    /// Requested quantity is larger than the available stock.
    #[error("quantity {requested} exceeds stock of product {product_id} ({available} available)")]
    QuantityExceedsStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Cart quantities must be positive.
    #[error("invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// The order is not in a status from which the action may be taken.
    #[error("invalid state transition: cannot {action} from {current} status")]
    InvalidStateTransition {
        current: OrderStatus,
        action: &'static str,
    },

    /// The logistics partner has not delivered the shipment yet.
    #[error("shipment is not delivered yet (status {status})")]
    ShipmentNotDelivered { status: ShipmentStatus },

    /// Only bank transfers are accepted.
    #[error("payment type {0} is not allowed")]
    PaymentTypeNotAllowed(PaymentType),

    /// The payment proof must be base64 encoded.
    #[error("payment proof is not a base64 encoded string")]
    PaymentProofNotDecodable,
}

impl DomainError {
    /// Returns the error classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::PaymentTypeNotAllowed(_)
            | DomainError::PaymentProofNotDecodable
            | DomainError::InvalidQuantity { .. } => ErrorKind::Validation,
            _ => ErrorKind::Conflict,
        }
    }
}
