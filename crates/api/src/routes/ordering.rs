//! Customer-facing ordering endpoints under `/ordering/v1`.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CouponCode, CustomerId, OrderId, ProductId, ShippingId};
use domain::{Order, OrderStatus, PaymentSpecification, Product, ShipmentStatus};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct MakeOrderRequest {
    pub customer_id: CustomerId,
}

#[derive(Debug, Deserialize)]
pub struct AddProductRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct ApplyCouponRequest {
    pub coupon_code: CouponCode,
}

// -- Response types --

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse<T> {
    pub status: T,
}

// -- Handlers --

/// GET /ordering/v1/products
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.ordering.list_products().await?;
    Ok(Json(products))
}

/// POST /ordering/v1/order/make
#[tracing::instrument(skip(state, payload))]
pub async fn make_order(
    State(state): State<AppState>,
    payload: Result<Json<MakeOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let Json(req) = payload?;
    let order = state.ordering.make_order(&req.customer_id).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// PUT /ordering/v1/order/{order_id}/addproduct
#[tracing::instrument(skip(state, payload))]
pub async fn add_product(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    payload: Result<Json<AddProductRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = payload?;
    state
        .ordering
        .add_product(&order_id, &req.product_id, req.quantity)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /ordering/v1/order/{order_id}/applycoupon
#[tracing::instrument(skip(state, payload))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    payload: Result<Json<ApplyCouponRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = payload?;
    state
        .ordering
        .apply_coupon(&order_id, &req.coupon_code)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /ordering/v1/order/{order_id}/submit
#[tracing::instrument(skip(state))]
pub async fn submit_order(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<StatusCode, ApiError> {
    state.ordering.submit_order(&order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /ordering/v1/order/{order_id}/makepayment
#[tracing::instrument(skip(state, payload))]
pub async fn make_payment(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    payload: Result<Json<PaymentSpecification>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(payment) = payload?;
    state.ordering.make_payment(&order_id, payment).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /ordering/v1/order/{order_id}/status
pub async fn order_status(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<StatusResponse<OrderStatus>>, ApiError> {
    let status = state.ordering.check_order_status(&order_id).await?;
    Ok(Json(StatusResponse { status }))
}

/// GET /ordering/v1/shipment/{shipping_id}
pub async fn shipment_status(
    State(state): State<AppState>,
    Path(shipping_id): Path<ShippingId>,
) -> Result<Json<StatusResponse<ShipmentStatus>>, ApiError> {
    let status = state.ordering.check_shipment_status(&shipping_id).await?;
    Ok(Json(StatusResponse { status }))
}
