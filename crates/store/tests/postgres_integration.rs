//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container and need Docker.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use domain::{Customer, DomainError, Money, Order, OrderStatus, Product};
use sqlx::PgPool;
use store::{
    CouponStore, CustomerStore, DemoData, OrderStore, PostgresStore, ProductStore, StoreError,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool, cleared tables and the demo catalog
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE orders, coupons, products, customers")
        .execute(&pool)
        .await
        .unwrap();

    let store = PostgresStore::new(pool);
    store.seed(DemoData::new(Utc::now())).await.unwrap();
    store
}

fn customer() -> Customer {
    Customer::new(
        "CUSTOMER1",
        "Hari",
        "+62-12345",
        "example@email.com",
        "No, Street, City, Indonesia",
    )
}

#[tokio::test]
#[ignore = "requires docker"]
async fn seeded_catalog_is_readable() {
    let store = get_test_store().await;

    let customer = store.find_customer(&"CUSTOMER1".into()).await.unwrap();
    assert_eq!(customer.email, "example@email.com");

    let products = store.find_all_products().await.unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].id.as_str(), "PRODUCT1");
    assert_eq!(products[0].price, Money::from_major(500));

    let coupon = store.find_coupon(&"DISCOUNT_20%".into()).await.unwrap();
    assert_eq!(coupon.quantity, 100);
    assert!(coupon.validate().is_ok());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn seeding_twice_keeps_existing_rows() {
    let store = get_test_store().await;

    let mut phone = store.find_product(&"PRODUCT1".into()).await.unwrap();
    phone.reserve_quantity(10);
    store.update_product(&phone).await.unwrap();

    store.seed(DemoData::new(Utc::now())).await.unwrap();

    let phone = store.find_product(&"PRODUCT1".into()).await.unwrap();
    assert_eq!(phone.quantity, 190);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn reseeding_refreshes_coupon_window() {
    let store = get_test_store().await;

    let mut coupon = store.find_coupon(&"DISCOUNT_20%".into()).await.unwrap();
    coupon.quantity -= 1;
    store.update_coupon(&coupon).await.unwrap();

    // A restart a month later still finds the demo coupon usable.
    let later = Utc::now() + Duration::days(30);
    store.seed(DemoData::new(later)).await.unwrap();

    let coupon = store.find_coupon(&"DISCOUNT_20%".into()).await.unwrap();
    assert_eq!(coupon.quantity, 99);
    assert!(coupon.validate_at(later).is_ok());
    assert!(coupon.end > later);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn store_and_update_order() {
    let store = get_test_store().await;
    let phone = store.find_product(&"PRODUCT1".into()).await.unwrap();

    let mut order = Order::new(customer());
    let id = store.store_order(&mut order).await.unwrap();
    assert_eq!(order.version(), 1);

    order.add_product(phone, 5).unwrap();
    store.update_order(&mut order).await.unwrap();
    assert_eq!(order.version(), 2);

    let stored = store.find_order(&id).await.unwrap();
    assert_eq!(stored, order);
    assert_eq!(stored.price(), Money::from_major(2500));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn stale_update_conflicts() {
    let store = get_test_store().await;

    let mut order = Order::new(customer());
    store.store_order(&mut order).await.unwrap();

    let mut first = order.clone();
    let mut second = order.clone();
    store.update_order(&mut first).await.unwrap();

    let result = store.update_order(&mut second).await;
    assert!(matches!(
        result,
        Err(StoreError::ConcurrencyConflict { expected: 1, actual: 2, .. })
    ));
    assert_eq!(second.version(), 1);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn missing_records_are_not_found() {
    let store = get_test_store().await;

    assert!(matches!(
        store.find_order(&"missing".into()).await,
        Err(StoreError::NotFound { entity: "order", .. })
    ));
    assert!(matches!(
        store.find_customer(&"CUSTOMER9".into()).await,
        Err(StoreError::NotFound { entity: "customer", .. })
    ));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn finalize_and_cancel_round_trip() {
    let store = get_test_store().await;
    let phone = store.find_product(&"PRODUCT1".into()).await.unwrap();
    let coupon = store.find_coupon(&"DISCOUNT_20%".into()).await.unwrap();

    let mut order = Order::new(customer());
    store.store_order(&mut order).await.unwrap();
    order.add_product(phone, 5).unwrap();
    order.apply_coupon(coupon).unwrap();
    store.update_order(&mut order).await.unwrap();

    order.change_status_to(OrderStatus::Submitted).unwrap();
    store.finalize_and_reserve(&mut order).await.unwrap();

    assert_eq!(store.find_product(&"PRODUCT1".into()).await.unwrap().quantity, 195);
    assert_eq!(store.find_coupon(&"DISCOUNT_20%".into()).await.unwrap().quantity, 99);

    order.change_status_to(OrderStatus::Cancelled).unwrap();
    store.cancel_and_release(&mut order).await.unwrap();

    assert_eq!(store.find_product(&"PRODUCT1".into()).await.unwrap().quantity, 200);
    assert_eq!(store.find_coupon(&"DISCOUNT_20%".into()).await.unwrap().quantity, 100);
    assert_eq!(
        store.find_order(order.id()).await.unwrap().status(),
        OrderStatus::Cancelled
    );
}

#[tokio::test]
#[ignore = "requires docker"]
async fn failed_finalize_rolls_back() {
    let store = get_test_store().await;
    let phone = store.find_product(&"PRODUCT1".into()).await.unwrap();
    let coupon = store.find_coupon(&"DISCOUNT_$5".into()).await.unwrap();

    let mut order = Order::new(customer());
    store.store_order(&mut order).await.unwrap();
    order.add_product(phone.clone(), 201).unwrap();
    order.apply_coupon(coupon).unwrap();
    store.update_order(&mut order).await.unwrap();

    order.change_status_to(OrderStatus::Submitted).unwrap();
    let result = store.finalize_and_reserve(&mut order).await;

    assert!(matches!(
        result,
        Err(StoreError::Domain(DomainError::QuantityExceedsStock { .. }))
    ));
    assert_eq!(store.find_product(&"PRODUCT1".into()).await.unwrap().quantity, 200);
    assert_eq!(store.find_coupon(&"DISCOUNT_$5".into()).await.unwrap().quantity, 100);
    assert_eq!(
        store.find_order(order.id()).await.unwrap().status(),
        OrderStatus::Open
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires docker"]
async fn concurrent_submits_never_oversell() {
    let store = Arc::new(get_test_store().await);
    let scarce = Product::new("PRODUCT1", "Sony Xperia 10", Money::from_major(500), 3);
    store.update_product(&scarce).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let mut order = Order::new(customer());
        order.add_product(scarce.clone(), 2).unwrap();
        store.store_order(&mut order).await.unwrap();

        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            order.change_status_to(OrderStatus::Submitted).unwrap();
            store.finalize_and_reserve(&mut order).await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(store.find_product(&"PRODUCT1".into()).await.unwrap().quantity, 1);
}
