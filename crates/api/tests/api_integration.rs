//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use ordering::InMemoryLogisticsPartner;
use serde_json::{Value, json};
use store::{DemoData, InMemoryStore, ProductStore};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    router: Router,
    store: InMemoryStore,
    logistics: InMemoryLogisticsPartner,
}

async fn setup() -> TestApp {
    let store = InMemoryStore::new();
    store.seed(DemoData::default()).await;
    let logistics = InMemoryLogisticsPartner::new();

    let ordering = api::build_ordering(store.clone(), logistics.clone());
    let router = api::create_app(api::AppState::new(ordering), get_metrics_handle());

    TestApp {
        router,
        store,
        logistics,
    }
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn make_order(&self) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/ordering/v1/order/make",
                Some(json!({ "customer_id": "CUSTOMER1" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    async fn add_product(&self, order_id: &str, product_id: &str, quantity: u32) -> StatusCode {
        self.send(
            "PUT",
            &format!("/ordering/v1/order/{order_id}/addproduct"),
            Some(json!({ "product_id": product_id, "quantity": quantity })),
        )
        .await
        .0
    }
}

fn payment() -> Value {
    json!({
        "type": "bank_transfer",
        "name_holder": "Hari",
        "identifier_id": "0011223344",
        "proof": "cmVjZWlwdA=="
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = setup().await;
    let (status, body) = app.send("GET", "/healthz", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_list_products() {
    let app = setup().await;
    let (status, body) = app.send("GET", "/ordering/v1/products", None).await;

    assert_eq!(status, StatusCode::OK);
    let products = body.as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["id"], "PRODUCT1");
}

#[tokio::test]
async fn test_make_order() {
    let app = setup().await;
    let (status, body) = app
        .send(
            "POST",
            "/ordering/v1/order/make",
            Some(json!({ "customer_id": "CUSTOMER1" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "Open");
    assert_eq!(body["customer"]["name"], "Hari");
    assert!(body["cart"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_make_order_for_unknown_customer() {
    let app = setup().await;
    let (status, body) = app
        .send(
            "POST",
            "/ordering/v1/order/make",
            Some(json!({ "customer_id": "CUSTOMER9" })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("CUSTOMER9"));
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = setup().await;
    let order_id = app.make_order().await;

    let (status, body) = app
        .send(
            "PUT",
            &format!("/ordering/v1/order/{order_id}/addproduct"),
            Some(json!({ "product_id": "PRODUCT1", "quantity": -1 })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_submit_and_cancel_round_trip() {
    let app = setup().await;
    let order_id = app.make_order().await;

    assert_eq!(
        app.add_product(&order_id, "PRODUCT1", 5).await,
        StatusCode::NO_CONTENT
    );
    let (status, _) = app
        .send(
            "PUT",
            &format!("/ordering/v1/order/{order_id}/applycoupon"),
            Some(json!({ "coupon_code": "DISCOUNT_20%" })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, order) = app
        .send("GET", &format!("/handling/v1/order/{order_id}/view"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["price"], "2500");
    assert_eq!(order["price_after_reduction"], "2000");

    let (status, _) = app
        .send("POST", &format!("/ordering/v1/order/{order_id}/submit"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let phone = app.store.find_product(&"PRODUCT1".into()).await.unwrap();
    assert_eq!(phone.quantity, 195);

    let (status, body) = app
        .send("GET", &format!("/ordering/v1/order/{order_id}/status"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Submitted");

    let (status, _) = app
        .send("POST", &format!("/handling/v1/order/{order_id}/cancel"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let phone = app.store.find_product(&"PRODUCT1".into()).await.unwrap();
    assert_eq!(phone.quantity, 200);
}

#[tokio::test]
async fn test_conflicts_map_to_409() {
    let app = setup().await;
    let order_id = app.make_order().await;
    app.add_product(&order_id, "PRODUCT1", 1).await;

    let submit = format!("/ordering/v1/order/{order_id}/submit");
    assert_eq!(app.send("POST", &submit, None).await.0, StatusCode::NO_CONTENT);

    let (status, body) = app.send("POST", &submit, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "order is already finalized");

    assert_eq!(
        app.add_product(&order_id, "PRODUCT1", 2).await,
        StatusCode::CONFLICT
    );
}

#[tokio::test]
async fn test_oversized_order_is_conflict() {
    let app = setup().await;
    let order_id = app.make_order().await;

    assert_eq!(
        app.add_product(&order_id, "PRODUCT1", 500).await,
        StatusCode::CONFLICT
    );
}

#[tokio::test]
async fn test_payment_validation_is_bad_request() {
    let app = setup().await;
    let order_id = app.make_order().await;
    app.add_product(&order_id, "PRODUCT2", 1).await;
    app.send("POST", &format!("/ordering/v1/order/{order_id}/submit"), None)
        .await;

    let mut card = payment();
    card["type"] = json!("credit_card");
    let (status, _) = app
        .send(
            "POST",
            &format!("/ordering/v1/order/{order_id}/makepayment"),
            Some(card),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut garbled = payment();
    garbled["proof"] = json!("not base64!");
    let (status, _) = app
        .send(
            "POST",
            &format!("/ordering/v1/order/{order_id}/makepayment"),
            Some(garbled),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pay_ship_complete() {
    let app = setup().await;
    let order_id = app.make_order().await;
    app.add_product(&order_id, "PRODUCT2", 10).await;
    app.send("POST", &format!("/ordering/v1/order/{order_id}/submit"), None)
        .await;

    let (status, _) = app
        .send(
            "POST",
            &format!("/ordering/v1/order/{order_id}/makepayment"),
            Some(payment()),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .send("POST", &format!("/handling/v1/order/{order_id}/ship"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let shipping_id = body["shipping_id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send("GET", &format!("/ordering/v1/shipment/{shipping_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "shipped");

    let complete = format!("/handling/v1/order/{order_id}/complete");
    assert_eq!(app.send("POST", &complete, None).await.0, StatusCode::CONFLICT);

    app.logistics
        .update_status(&shipping_id.as_str().into(), domain::ShipmentStatus::Delivered)
        .await
        .unwrap();
    assert_eq!(
        app.send("POST", &complete, None).await.0,
        StatusCode::NO_CONTENT
    );

    let (_, body) = app
        .send("GET", &format!("/ordering/v1/order/{order_id}/status"), None)
        .await;
    assert_eq!(body["status"], "Completed");
}

#[tokio::test]
async fn test_unknown_order_and_shipment() {
    let app = setup().await;

    let (status, _) = app
        .send("GET", "/handling/v1/order/missing/view", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send("GET", "/ordering/v1/shipment/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup().await;
    app.send("GET", "/ordering/v1/products", None).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("ordering_requests_total"));
}
