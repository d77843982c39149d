//! HTTP API server with observability for the order fulfillment service.
//!
//! Exposes the ordering and handling use cases over REST, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use ordering::{
    InMemoryLogisticsPartner, InstrumentedOrdering, LoggingOrdering, Ordering, OrderingService,
};
use store::Store;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
#[derive(Clone)]
pub struct AppState {
    pub ordering: Arc<dyn Ordering>,
}

impl AppState {
    pub fn new(ordering: Arc<dyn Ordering>) -> Self {
        Self { ordering }
    }
}

/// Builds the ordering service over `store`, wrapped in the metrics and
/// logging decorators.
pub fn build_ordering<S>(store: S, logistics: InMemoryLogisticsPartner) -> Arc<dyn Ordering>
where
    S: Store + 'static,
{
    let service = OrderingService::new(store, logistics);
    Arc::new(LoggingOrdering::new(InstrumentedOrdering::new(service)))
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: AppState, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let ordering_routes = Router::new()
        .route("/products", get(routes::ordering::list_products))
        .route("/order/make", post(routes::ordering::make_order))
        .route("/order/{order_id}/addproduct", put(routes::ordering::add_product))
        .route("/order/{order_id}/applycoupon", put(routes::ordering::apply_coupon))
        .route("/order/{order_id}/submit", post(routes::ordering::submit_order))
        .route("/order/{order_id}/makepayment", post(routes::ordering::make_payment))
        .route("/order/{order_id}/status", get(routes::ordering::order_status))
        .route("/shipment/{shipping_id}", get(routes::ordering::shipment_status));

    let handling_routes = Router::new()
        .route("/order/{order_id}/view", get(routes::handling::view_order))
        .route("/order/{order_id}/cancel", post(routes::handling::cancel_order))
        .route("/order/{order_id}/ship", post(routes::handling::ship_order))
        .route("/order/{order_id}/complete", post(routes::handling::complete_order));

    Router::new()
        .route("/healthz", get(routes::health::check))
        .nest("/ordering/v1", ordering_routes)
        .nest("/handling/v1", handling_routes)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}
