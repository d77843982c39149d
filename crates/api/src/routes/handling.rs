//! Back-office handling endpoints under `/handling/v1`.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{OrderId, ShippingId};
use domain::Order;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ShipOrderResponse {
    pub shipping_id: ShippingId,
}

/// GET /handling/v1/order/{order_id}/view
pub async fn view_order(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Order>, ApiError> {
    let order = state.ordering.view_order(&order_id).await?;
    Ok(Json(order))
}

/// POST /handling/v1/order/{order_id}/cancel
#[tracing::instrument(skip(state))]
pub async fn cancel_order(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<StatusCode, ApiError> {
    state.ordering.cancel_order(&order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /handling/v1/order/{order_id}/ship
#[tracing::instrument(skip(state))]
pub async fn ship_order(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<ShipOrderResponse>, ApiError> {
    let shipping_id = state.ordering.ship_order(&order_id).await?;
    Ok(Json(ShipOrderResponse { shipping_id }))
}

/// POST /handling/v1/order/{order_id}/complete
#[tracing::instrument(skip(state))]
pub async fn complete_order(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<StatusCode, ApiError> {
    state.ordering.complete_order(&order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
