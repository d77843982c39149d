//! Order aggregate implementation.

use common::{CouponCode, OrderId, ProductId, ShippingId};
use serde::{Deserialize, Serialize};

use crate::coupon::Coupon;
use crate::customer::Customer;
use crate::error::DomainError;
use crate::payment::PaymentSpecification;
use crate::product::Product;

use super::{CartItem, Money, OrderStatus};

/// Order aggregate root.
///
/// Owns its cart items and the coupon, customer and payment snapshots copied
/// into it. Live stock and coupon counters belong to the product and coupon
/// ledgers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    id: OrderId,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: u64,

    /// Customer who placed the order.
    customer: Customer,

    /// Cart items in insertion order.
    cart: Vec<CartItem>,

    /// Applied coupon, if any.
    coupon: Option<Coupon>,

    /// Sum of every cart line.
    price: Money,

    /// Price with the coupon applied; unset without a coupon.
    price_after_reduction: Option<Money>,

    status: OrderStatus,

    payment: Option<PaymentSpecification>,

    shipping_id: Option<ShippingId>,
}

impl Order {
    /// Creates a new `Open` order with a freshly generated identifier.
    pub fn new(customer: Customer) -> Self {
        Self::with_id(OrderId::generate(), customer)
    }

    /// Creates a new `Open` order with the given identifier.
    pub fn with_id(id: OrderId, customer: Customer) -> Self {
        Self {
            id,
            version: 0,
            customer,
            cart: Vec::new(),
            coupon: None,
            price: Money::zero(),
            price_after_reduction: None,
            status: OrderStatus::Open,
            payment: None,
            shipping_id: None,
        }
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> &OrderId {
        &self.id
    }

    /// Returns the version last persisted.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn cart(&self) -> &[CartItem] {
        &self.cart
    }

    /// Returns the cart item for a product.
    pub fn cart_item(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.cart.iter().find(|item| &item.product.id == product_id)
    }

    pub fn coupon(&self) -> Option<&Coupon> {
        self.coupon.as_ref()
    }

    /// Returns the applied coupon code.
    pub fn coupon_code(&self) -> Option<&CouponCode> {
        self.coupon.as_ref().map(|coupon| &coupon.code)
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn price_after_reduction(&self) -> Option<Money> {
        self.price_after_reduction
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment(&self) -> Option<&PaymentSpecification> {
        self.payment.as_ref()
    }

    pub fn shipping_id(&self) -> Option<&ShippingId> {
        self.shipping_id.as_ref()
    }

    /// Returns true if a payment may be recorded.
    pub fn allow_make_payment(&self) -> bool {
        self.status.can_pay()
    }
}

// Command methods
impl Order {
    /// Records the version assigned by the store.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Puts a product in the cart.
    ///
    /// A product already in the cart has its quantity replaced, not summed.
    pub fn add_product(&mut self, product: Product, quantity: u32) -> Result<(), DomainError> {
        if !self.status.can_modify_cart() {
            return Err(DomainError::AlreadyFinalized);
        }

        if quantity == 0 {
            return Err(DomainError::InvalidQuantity { quantity });
        }

        match self
            .cart
            .iter_mut()
            .find(|item| item.product.id == product.id)
        {
            Some(existing) => existing.quantity = quantity,
            None => self.cart.push(CartItem::new(product, quantity)),
        }

        self.calculate_total_price();
        Ok(())
    }

    /// Applies a coupon, replacing any previously applied one.
    pub fn apply_coupon(&mut self, coupon: Coupon) -> Result<(), DomainError> {
        if !self.status.can_modify_cart() {
            return Err(DomainError::AlreadyFinalized);
        }

        coupon.validate()?;

        self.coupon = Some(coupon);
        self.calculate_total_price();
        Ok(())
    }

    /// Moves the order to `target`.
    ///
    /// Only guards against finalizing twice and against repeating a cancel or
    /// ship. Lifecycle ordering (pay after submit, ship after pay) is checked
    /// by the caller through the [`OrderStatus`] policies.
    pub fn change_status_to(&mut self, target: OrderStatus) -> Result<(), DomainError> {
        if self.status == OrderStatus::Completed {
            return Err(DomainError::AlreadyCompleted);
        }

        if target == OrderStatus::Submitted && self.status != OrderStatus::Open {
            return Err(DomainError::AlreadyFinalized);
        }

        if self.status == target {
            match target {
                OrderStatus::Cancelled => return Err(DomainError::AlreadyCancelled),
                OrderStatus::Shipped => return Err(DomainError::AlreadyShipped),
                _ => {}
            }
        }

        self.status = target;
        Ok(())
    }

    /// Recomputes `price` and `price_after_reduction` from the cart and coupon.
    pub fn calculate_total_price(&mut self) {
        self.price = self.cart.iter().map(CartItem::total_price).sum();
        self.price_after_reduction = self
            .coupon
            .as_ref()
            .map(|coupon| coupon.price_after_reduction(self.price));
    }

    /// Attaches payment details. Validation is the caller's responsibility.
    pub fn specify_new_payment(&mut self, payment: PaymentSpecification) {
        self.payment = Some(payment);
    }

    /// Attaches the shipment identifier from the logistics partner.
    pub fn specify_shipping_id(&mut self, shipping_id: ShippingId) {
        self.shipping_id = Some(shipping_id);
    }
}
