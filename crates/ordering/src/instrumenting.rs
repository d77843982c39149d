//! Prometheus-style request metrics around an [`Ordering`] implementation.

use std::time::Instant;

use async_trait::async_trait;
use common::{CouponCode, CustomerId, OrderId, ProductId, ShippingId};
use domain::{Order, OrderStatus, PaymentSpecification, Product, ShipmentStatus};

use crate::error::Result;
use crate::service::Ordering;

/// Counts requests and records their latency, labelled by method and
/// whether they failed.
#[derive(Debug, Clone)]
pub struct InstrumentedOrdering<T> {
    inner: T,
}

impl<T> InstrumentedOrdering<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

fn record<R>(method: &'static str, start: Instant, result: &Result<R>) {
    let error = if result.is_err() { "true" } else { "false" };

    metrics::counter!("ordering_requests_total", "method" => method, "error" => error)
        .increment(1);
    metrics::histogram!("ordering_request_duration_seconds", "method" => method, "error" => error)
        .record(start.elapsed().as_secs_f64());
}

#[async_trait]
impl<T: Ordering> Ordering for InstrumentedOrdering<T> {
    async fn make_order(&self, customer_id: &CustomerId) -> Result<Order> {
        let start = Instant::now();
        let result = self.inner.make_order(customer_id).await;
        record("make_order", start, &result);
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
        record("add_product", start, &result);
        result
    }

    async fn apply_coupon(&self, order_id: &OrderId, code: &CouponCode) -> Result<()> {
        let start = Instant::now();
        let result = self.inner.apply_coupon(order_id, code).await;
        record("apply_coupon", start, &result);
        result
    }

    async fn submit_order(&self, order_id: &OrderId) -> Result<()> {
        let start = Instant::now();
        let result = self.inner.submit_order(order_id).await;
        record("submit_order", start, &result);
        result
    }

    async fn make_payment(
        &self,
        order_id: &OrderId,
        payment: PaymentSpecification,
    ) -> Result<()> {
        let start = Instant::now();
        let result = self.inner.make_payment(order_id, payment).await;
        record("make_payment", start, &result);
        result
    }

    async fn check_order_status(&self, order_id: &OrderId) -> Result<OrderStatus> {
        let start = Instant::now();
        let result = self.inner.check_order_status(order_id).await;
        record("check_order_status", start, &result);
        result
    }

    async fn check_shipment_status(&self, shipping_id: &ShippingId) -> Result<ShipmentStatus> {
        let start = Instant::now();
        let result = self.inner.check_shipment_status(shipping_id).await;
        record("check_shipment_status", start, &result);
        result
    }

    async fn view_order(&self, order_id: &OrderId) -> Result<Order> {
        let start = Instant::now();
        let result = self.inner.view_order(order_id).await;
        record("view_order", start, &result);
        result
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<()> {
        let start = Instant::now();
        let result = self.inner.cancel_order(order_id).await;
        record("cancel_order", start, &result);
        result
    }

    async fn ship_order(&self, order_id: &OrderId) -> Result<ShippingId> {
        let start = Instant::now();
        let result = self.inner.ship_order(order_id).await;
        record("ship_order", start, &result);
        result
    }

    async fn complete_order(&self, order_id: &OrderId) -> Result<()> {
        let start = Instant::now();
        let result = self.inner.complete_order(order_id).await;
        record("complete_order", start, &result);
        result
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let start = Instant::now();
        let result = self.inner.list_products().await;
        record("list_products", start, &result);
        result
    }
}
