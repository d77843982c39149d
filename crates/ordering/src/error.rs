//! Application service error types.

use common::{OrderId, ShippingId};
use domain::{DomainError, ErrorKind};
use store::StoreError;
use thiserror::Error;

/// Errors reported by the logistics partner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogisticsError {
    /// The order was already handed to the partner.
    #[error("order {order_id} is already registered for shipment")]
    AlreadyRegistered { order_id: OrderId },

    #[error("shipment not found: {0}")]
    ShipmentNotFound(ShippingId),

    /// The partner could not be reached.
    #[error("logistics partner error: {0}")]
    Unavailable(String),
}

impl LogisticsError {
    /// Returns the error classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LogisticsError::AlreadyRegistered { .. } => ErrorKind::Conflict,
            LogisticsError::ShipmentNotFound(_) => ErrorKind::NotFound,
            LogisticsError::Unavailable(_) => ErrorKind::Infrastructure,
        }
    }
}

/// Errors that can occur during ordering and handling operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Storage failure. Domain errors raised inside the store are unwrapped
    /// into [`ServiceError::Domain`].
    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Logistics(#[from] LogisticsError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Domain(e) => ServiceError::Domain(e),
            other => ServiceError::Store(other),
        }
    }
}

impl ServiceError {
    /// Returns the error classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Domain(e) => e.kind(),
            ServiceError::Store(e) => e.kind(),
            ServiceError::Logistics(e) => e.kind(),
        }
    }

    /// Returns true if a store operation ran past its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ServiceError::Store(e) if e.is_timeout())
    }
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;
