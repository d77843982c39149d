//! Ordering application service.
//!
//! Composes the order aggregate, the stores and the logistics partner into
//! the customer-facing and back-office use cases. [`LoggingOrdering`] and
//! [`InstrumentedOrdering`] wrap any [`Ordering`] with structured logs and
//! request metrics.

pub mod error;
pub mod instrumenting;
pub mod logging;
pub mod logistics;
pub mod service;

pub use error::{LogisticsError, Result, ServiceError};
pub use instrumenting::InstrumentedOrdering;
pub use logging::LoggingOrdering;
pub use logistics::{InMemoryLogisticsPartner, LogisticsPartner};
pub use service::{Ordering, OrderingService};
