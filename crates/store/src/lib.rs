//! Persistence for the order fulfillment core.
//!
//! - [`store`] defines the order, product, coupon and customer store traits
//!   plus the ledger transaction seam.
//! - [`coordinator`] runs the atomic submit and cancel operations on top of
//!   any [`TransactionalStore`].
//! - [`memory`] and [`postgres`] are the two interchangeable backends.

pub mod coordinator;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod seed;
pub mod store;

pub use coordinator::{DEFAULT_TRANSACTION_TIMEOUT, FulfillmentCoordinator};
pub use error::{Result, StoreError};
pub use memory::{InMemoryStore, InMemoryTransaction};
pub use postgres::{PostgresStore, PostgresTransaction};
pub use seed::DemoData;
pub use store::{
    CouponStore, CustomerStore, LedgerTransaction, OrderStore, ProductStore, Store,
    TransactionalStore,
};
