//! Structured request logging around an [`Ordering`] implementation.

use std::time::Instant;

use async_trait::async_trait;
use common::{CouponCode, CustomerId, OrderId, ProductId, ShippingId};
use domain::{Order, OrderStatus, PaymentSpecification, Product, ShipmentStatus};

use crate::error::Result;
use crate::service::Ordering;

/// Logs every call with its identifiers, duration and outcome.
#[derive(Debug, Clone)]
pub struct LoggingOrdering<T> {
    inner: T,
}

impl<T> LoggingOrdering<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

fn took_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Call-specific fields carried by the per-call event. Unset fields are
/// left out of the record.
#[derive(Debug, Default)]
struct Fields<'a> {
    product_id: Option<&'a str>,
    quantity: Option<u32>,
    coupon: Option<&'a str>,
    payment_type: Option<&'static str>,
    order_id: Option<&'a str>,
    shipping_id: Option<&'a str>,
}

fn log_outcome<R>(
    method: &'static str,
    subject: &str,
    fields: Fields<'_>,
    start: Instant,
    result: &Result<R>,
) {
    let took_ms = took_ms(start);
    match result {
        Ok(_) => tracing::info!(
            method,
            subject,
            product_id = fields.product_id,
            quantity = fields.quantity,
            coupon = fields.coupon,
            payment_type = fields.payment_type,
            order_id = fields.order_id,
            shipping_id = fields.shipping_id,
            took_ms,
            "request handled"
        ),
        Err(e) => tracing::warn!(
            method,
            subject,
            product_id = fields.product_id,
            quantity = fields.quantity,
            coupon = fields.coupon,
            payment_type = fields.payment_type,
            took_ms,
            kind = ?e.kind(),
            error = %e,
            "request failed"
        ),
    }
}

#[async_trait]
impl<T: Ordering> Ordering for LoggingOrdering<T> {
    async fn make_order(&self, customer_id: &CustomerId) -> Result<Order> {
        let start = Instant::now();
        let result = self.inner.make_order(customer_id).await;
        let fields = Fields {
            order_id: result.as_ref().ok().map(|order| order.id().as_str()),
            ..Fields::default()
        };
        log_outcome("make_order", customer_id.as_str(), fields, start, &result);
        result
    }

    async fn add_product(
        &self,
        order_id: &OrderId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<()> {
        let start = Instant::now();
        let result = self.inner.add_product(order_id, product_id, quantity).await;
        let fields = Fields {
            product_id: Some(product_id.as_str()),
            quantity: Some(quantity),
            ..Fields::default()
        };
        log_outcome("add_product", order_id.as_str(), fields, start, &result);
        result
    }

    async fn apply_coupon(&self, order_id: &OrderId, code: &CouponCode) -> Result<()> {
        let start = Instant::now();
        let result = self.inner.apply_coupon(order_id, code).await;
        let fields = Fields {
            coupon: Some(code.as_str()),
            ..Fields::default()
        };
        log_outcome("apply_coupon", order_id.as_str(), fields, start, &result);
        result
    }

    async fn submit_order(&self, order_id: &OrderId) -> Result<()> {
        let start = Instant::now();
        let result = self.inner.submit_order(order_id).await;
        log_outcome("submit_order", order_id.as_str(), Fields::default(), start, &result);
        result
    }

    async fn make_payment(
        &self,
        order_id: &OrderId,
        payment: PaymentSpecification,
    ) -> Result<()> {
        let start = Instant::now();
        let fields = Fields {
            payment_type: Some(payment.payment_type.as_str()),
            ..Fields::default()
        };
        let result = self.inner.make_payment(order_id, payment).await;
        log_outcome("make_payment", order_id.as_str(), fields, start, &result);
        result
    }

    async fn check_order_status(&self, order_id: &OrderId) -> Result<OrderStatus> {
        let start = Instant::now();
        let result = self.inner.check_order_status(order_id).await;
        log_outcome("check_order_status", order_id.as_str(), Fields::default(), start, &result);
        result
    }

    async fn check_shipment_status(&self, shipping_id: &ShippingId) -> Result<ShipmentStatus> {
        let start = Instant::now();
        let result = self.inner.check_shipment_status(shipping_id).await;
        log_outcome(
            "check_shipment_status",
            shipping_id.as_str(),
            Fields::default(),
            start,
            &result,
        );
        result
    }

    async fn view_order(&self, order_id: &OrderId) -> Result<Order> {
        let start = Instant::now();
        let result = self.inner.view_order(order_id).await;
        log_outcome("view_order", order_id.as_str(), Fields::default(), start, &result);
        result
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<()> {
        let start = Instant::now();
        let result = self.inner.cancel_order(order_id).await;
        log_outcome("cancel_order", order_id.as_str(), Fields::default(), start, &result);
        result
    }

    async fn ship_order(&self, order_id: &OrderId) -> Result<ShippingId> {
        let start = Instant::now();
        let result = self.inner.ship_order(order_id).await;
        let fields = Fields {
            shipping_id: result.as_ref().ok().map(ShippingId::as_str),
            ..Fields::default()
        };
        log_outcome("ship_order", order_id.as_str(), fields, start, &result);
        result
    }

    async fn complete_order(&self, order_id: &OrderId) -> Result<()> {
        let start = Instant::now();
        let result = self.inner.complete_order(order_id).await;
        log_outcome("complete_order", order_id.as_str(), Fields::default(), start, &result);
        result
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let start = Instant::now();
        let result = self.inner.list_products().await;
        log_outcome("list_products", "-", Fields::default(), start, &result);
        result
    }
}
