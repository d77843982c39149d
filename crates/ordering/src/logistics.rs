//! Logistics partner trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, ShippingId};
use domain::ShipmentStatus;
use tokio::sync::RwLock;

use crate::error::LogisticsError;

/// Shipping partner that takes over an order once it is paid.
#[async_trait]
pub trait LogisticsPartner: Send + Sync {
    /// Hands an order to the partner, returning the shipment identifier.
    ///
    /// Fails with `AlreadyRegistered` if the order was handed over before.
    async fn register_shipment(&self, order_id: &OrderId) -> Result<ShippingId, LogisticsError>;

    /// Reports where a shipment currently is.
    async fn check_shipment_status(
        &self,
        shipping_id: &ShippingId,
    ) -> Result<ShipmentStatus, LogisticsError>;
}

#[derive(Debug, Clone)]
struct Shipment {
    order_id: OrderId,
    status: ShipmentStatus,
}

#[derive(Debug, Default)]
struct InMemoryLogisticsState {
    shipments: HashMap<ShippingId, Shipment>,
    unavailable: bool,
}

/// In-memory logistics partner for local runs and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLogisticsPartner {
    state: Arc<RwLock<InMemoryLogisticsState>>,
}

impl InMemoryLogisticsPartner {
    /// Creates a new in-memory logistics partner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `Unavailable` until reset.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Moves a shipment along, as the partner would while delivering it.
    pub async fn update_status(
        &self,
        shipping_id: &ShippingId,
        status: ShipmentStatus,
    ) -> Result<(), LogisticsError> {
        let mut state = self.state.write().await;
        let shipment = state
            .shipments
            .get_mut(shipping_id)
            .ok_or_else(|| LogisticsError::ShipmentNotFound(shipping_id.clone()))?;
        shipment.status = status;
        Ok(())
    }

    /// Returns the number of registered shipments.
    pub async fn shipment_count(&self) -> usize {
        self.state.read().await.shipments.len()
    }
}

#[async_trait]
impl LogisticsPartner for InMemoryLogisticsPartner {
    async fn register_shipment(&self, order_id: &OrderId) -> Result<ShippingId, LogisticsError> {
        let mut state = self.state.write().await;

        if state.unavailable {
            return Err(LogisticsError::Unavailable(
                "logistics partner unavailable".to_string(),
            ));
        }

        if state.shipments.values().any(|s| &s.order_id == order_id) {
            return Err(LogisticsError::AlreadyRegistered {
                order_id: order_id.clone(),
            });
        }

        let shipping_id = ShippingId::generate();
        state.shipments.insert(
            shipping_id.clone(),
            Shipment {
                order_id: order_id.clone(),
                status: ShipmentStatus::Shipped,
            },
        );

        Ok(shipping_id)
    }

    async fn check_shipment_status(
        &self,
        shipping_id: &ShippingId,
    ) -> Result<ShipmentStatus, LogisticsError> {
        let state = self.state.read().await;

        if state.unavailable {
            return Err(LogisticsError::Unavailable(
                "logistics partner unavailable".to_string(),
            ));
        }

        state
            .shipments
            .get(shipping_id)
            .map(|s| s.status)
            .ok_or_else(|| LogisticsError::ShipmentNotFound(shipping_id.clone()))
    }
}
