//! Identifier types shared across the order fulfillment workspace.

mod ids;

pub use ids::{CouponCode, CustomerId, OrderId, ProductId, ShippingId};
