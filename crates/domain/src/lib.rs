//! Domain layer for the order fulfillment core.
//!
//! This crate holds the pure, synchronous business rules:
//! - Product ledger (stock check, reserve, rollback)
//! - Coupon ledger (validity window, reduction formula)
//! - Order aggregate with its status state machine and pricing
//! - Payment specification validation
//!
//! Nothing here performs I/O; persistence and coordination live in the `store` crate.

pub mod coupon;
pub mod customer;
pub mod error;
pub mod order;
pub mod payment;
pub mod product;
pub mod shipment;

pub use common::{CouponCode, CustomerId, OrderId, ProductId, ShippingId};
pub use coupon::{Coupon, CouponKind};
pub use customer::Customer;
pub use error::{DomainError, ErrorKind};
pub use order::{CartItem, Money, Order, OrderStatus};
pub use payment::{PaymentSpecification, PaymentType};
pub use product::Product;
pub use shipment::ShipmentStatus;
