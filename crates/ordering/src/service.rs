//! Ordering and handling use cases.

use async_trait::async_trait;
use common::{CouponCode, CustomerId, OrderId, ProductId, ShippingId};
use domain::{
    DomainError, Order, OrderStatus, PaymentSpecification, Product, ShipmentStatus,
};
use store::Store;

use crate::error::Result;
use crate::logistics::LogisticsPartner;

/// Customer-facing ordering operations and back-office handling operations.
///
/// Implemented by [`OrderingService`] and by the logging and metrics
/// decorators that wrap it.
#[async_trait]
pub trait Ordering: Send + Sync {
    /// Creates an open order for a customer.
    async fn make_order(&self, customer_id: &CustomerId) -> Result<Order>;

    /// Puts a product in an open order's cart, replacing its quantity if it is
    /// already there.
    async fn add_product(
        &self,
        order_id: &OrderId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<()>;

    /// Applies a coupon to an open order.
    async fn apply_coupon(&self, order_id: &OrderId, code: &CouponCode) -> Result<()>;

    /// Finalizes an open order, reserving stock and redeeming its coupon.
    async fn submit_order(&self, order_id: &OrderId) -> Result<()>;

    /// Records a payment for a submitted order.
    async fn make_payment(&self, order_id: &OrderId, payment: PaymentSpecification)
    -> Result<()>;

    async fn check_order_status(&self, order_id: &OrderId) -> Result<OrderStatus>;

    async fn check_shipment_status(&self, shipping_id: &ShippingId) -> Result<ShipmentStatus>;

    async fn view_order(&self, order_id: &OrderId) -> Result<Order>;

    /// Cancels an order, releasing any reservation it holds.
    async fn cancel_order(&self, order_id: &OrderId) -> Result<()>;

    /// Hands a paid order to the logistics partner.
    async fn ship_order(&self, order_id: &OrderId) -> Result<ShippingId>;

    /// Closes a shipped order once the partner reports it delivered.
    async fn complete_order(&self, order_id: &OrderId) -> Result<()>;

    async fn list_products(&self) -> Result<Vec<Product>>;
}

/// The application service, generic over the store backend and the
/// logistics partner.
#[derive(Clone)]
pub struct OrderingService<S, L>
where
    S: Store,
    L: LogisticsPartner,
{
    store: S,
    logistics: L,
}

impl<S, L> OrderingService<S, L>
where
    S: Store,
    L: LogisticsPartner,
{
    /// Creates a new ordering service.
    pub fn new(store: S, logistics: L) -> Self {
        Self { store, logistics }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn logistics(&self) -> &L {
        &self.logistics
    }
}

#[async_trait]
impl<S, L> Ordering for OrderingService<S, L>
where
    S: Store,
    L: LogisticsPartner,
{
    async fn make_order(&self, customer_id: &CustomerId) -> Result<Order> {
        let customer = self.store.find_customer(customer_id).await?;

        let mut order = Order::new(customer);
        self.store.store_order(&mut order).await?;

        Ok(order)
    }

    async fn add_product(
        &self,
        order_id: &OrderId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<()> {
        let mut order = self.store.find_order(order_id).await?;
        let product = self.store.find_product(product_id).await?;

        // Early feedback only; the binding check runs again on submit.
        product.try_reserve_quantity(quantity)?;

        order.add_product(product, quantity)?;
        self.store.update_order(&mut order).await?;

        Ok(())
    }

    async fn apply_coupon(&self, order_id: &OrderId, code: &CouponCode) -> Result<()> {
        let mut order = self.store.find_order(order_id).await?;
        let coupon = self.store.find_coupon(code).await?;

        order.apply_coupon(coupon)?;
        self.store.update_order(&mut order).await?;

        Ok(())
    }

    async fn submit_order(&self, order_id: &OrderId) -> Result<()> {
        let mut order = self.store.find_order(order_id).await?;

        order.change_status_to(OrderStatus::Submitted)?;
        self.store.finalize_and_reserve(&mut order).await?;

        Ok(())
    }

    async fn make_payment(
        &self,
        order_id: &OrderId,
        payment: PaymentSpecification,
    ) -> Result<()> {
        payment.validate()?;

        let mut order = self.store.find_order(order_id).await?;
        if !order.allow_make_payment() {
            return Err(DomainError::InvalidStateTransition {
                current: order.status(),
                action: "pay",
            }
            .into());
        }

        order.specify_new_payment(payment);
        order.change_status_to(OrderStatus::Paid)?;
        self.store.update_order(&mut order).await?;

        Ok(())
    }

    async fn check_order_status(&self, order_id: &OrderId) -> Result<OrderStatus> {
        let order = self.store.find_order(order_id).await?;
        Ok(order.status())
    }

    async fn check_shipment_status(&self, shipping_id: &ShippingId) -> Result<ShipmentStatus> {
        Ok(self.logistics.check_shipment_status(shipping_id).await?)
    }

    async fn view_order(&self, order_id: &OrderId) -> Result<Order> {
        Ok(self.store.find_order(order_id).await?)
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<()> {
        let mut order = self.store.find_order(order_id).await?;

        order.change_status_to(OrderStatus::Cancelled)?;
        self.store.cancel_and_release(&mut order).await?;

        Ok(())
    }

    async fn ship_order(&self, order_id: &OrderId) -> Result<ShippingId> {
        let mut order = self.store.find_order(order_id).await?;
        let current = order.status();

        // Reports AlreadyShipped and AlreadyCompleted before the lifecycle check.
        order.change_status_to(OrderStatus::Shipped)?;
        if !current.can_ship() {
            return Err(DomainError::InvalidStateTransition {
                current,
                action: "ship",
            }
            .into());
        }

        let shipping_id = self.logistics.register_shipment(order.id()).await?;
        order.specify_shipping_id(shipping_id.clone());
        self.store.update_order(&mut order).await?;

        Ok(shipping_id)
    }

    async fn complete_order(&self, order_id: &OrderId) -> Result<()> {
        let mut order = self.store.find_order(order_id).await?;
        let current = order.status();

        order.change_status_to(OrderStatus::Completed)?;
        let shipping_id = match order.shipping_id() {
            Some(id) if current.can_complete() => id.clone(),
            _ => {
                return Err(DomainError::InvalidStateTransition {
                    current,
                    action: "complete",
                }
                .into());
            }
        };

        let status = self.logistics.check_shipment_status(&shipping_id).await?;
        if status != ShipmentStatus::Delivered {
            return Err(DomainError::ShipmentNotDelivered { status }.into());
        }

        self.store.update_order(&mut order).await?;

        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        Ok(self.store.find_all_products().await?)
    }
}
