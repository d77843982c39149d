//! Ledger bookkeeping of submit and cancel through the fulfillment
//! coordinator, against the in-memory backend.

use std::time::Duration;

use chrono::Utc;
use domain::{Customer, DomainError, Money, Order, OrderStatus, Product};
use store::{
    CouponStore, DemoData, FulfillmentCoordinator, InMemoryStore, OrderStore, ProductStore,
    StoreError,
};

fn customer() -> Customer {
    Customer::new("CUSTOMER1", "Hari", "+62-12345", "example@email.com", "Indonesia")
}

async fn seeded() -> (InMemoryStore, FulfillmentCoordinator) {
    let store = InMemoryStore::new();
    store.seed(DemoData::new(Utc::now())).await;
    (store, FulfillmentCoordinator::new(Duration::from_secs(1)))
}

async fn stock(store: &InMemoryStore, id: &str) -> u32 {
    store.find_product(&id.into()).await.unwrap().quantity
}

async fn coupons_left(store: &InMemoryStore, code: &str) -> u32 {
    store.find_coupon(&code.into()).await.unwrap().quantity
}

#[tokio::test]
async fn submit_and_cancel_move_both_ledgers() {
    let (store, coordinator) = seeded().await;
    let phone = store.find_product(&"PRODUCT1".into()).await.unwrap();
    let coupon = store.find_coupon(&"DISCOUNT_20%".into()).await.unwrap();

    let mut order = Order::new(customer());
    order.add_product(phone, 5).unwrap();
    order.apply_coupon(coupon).unwrap();
    store.store_order(&mut order).await.unwrap();

    order.change_status_to(OrderStatus::Submitted).unwrap();
    coordinator
        .finalize_and_reserve(&store, &mut order)
        .await
        .unwrap();
    assert_eq!(stock(&store, "PRODUCT1").await, 195);
    assert_eq!(coupons_left(&store, "DISCOUNT_20%").await, 99);

    order.change_status_to(OrderStatus::Cancelled).unwrap();
    coordinator
        .cancel_and_release(&store, &mut order)
        .await
        .unwrap();
    assert_eq!(stock(&store, "PRODUCT1").await, 200);
    assert_eq!(coupons_left(&store, "DISCOUNT_20%").await, 100);
}

#[tokio::test]
async fn stock_is_checked_against_live_ledger_not_snapshot() {
    let (store, coordinator) = seeded().await;
    let phone = store.find_product(&"PRODUCT1".into()).await.unwrap();

    let mut order = Order::new(customer());
    order.add_product(phone.clone(), 5).unwrap();
    store.store_order(&mut order).await.unwrap();

    // Stock drops after the product was put in the cart.
    store
        .update_product(&Product::new("PRODUCT1", phone.name, phone.price, 3))
        .await
        .unwrap();

    order.change_status_to(OrderStatus::Submitted).unwrap();
    let result = coordinator.finalize_and_reserve(&store, &mut order).await;

    assert!(matches!(
        result,
        Err(StoreError::Domain(DomainError::QuantityExceedsStock {
            requested: 5,
            available: 3,
            ..
        }))
    ));
    assert_eq!(stock(&store, "PRODUCT1").await, 3);
}

#[tokio::test]
async fn failed_reservation_reserves_nothing() {
    let (store, coordinator) = seeded().await;
    let scarce = Product::new("PRODUCT3", "Limited Edition", Money::from_major(100), 1);
    store.insert_product(scarce.clone()).await;
    let phone = store.find_product(&"PRODUCT1".into()).await.unwrap();
    let coupon = store.find_coupon(&"DISCOUNT_$5".into()).await.unwrap();

    let mut order = Order::new(customer());
    order.add_product(phone, 5).unwrap();
    order.add_product(scarce, 1).unwrap();
    order.apply_coupon(coupon).unwrap();
    store.store_order(&mut order).await.unwrap();

    // PRODUCT1 is reserved first, then PRODUCT3 runs out.
    store
        .update_product(&Product::new(
            "PRODUCT3",
            "Limited Edition",
            Money::from_major(100),
            0,
        ))
        .await
        .unwrap();

    order.change_status_to(OrderStatus::Submitted).unwrap();
    let result = coordinator.finalize_and_reserve(&store, &mut order).await;

    assert!(result.is_err());
    assert_eq!(stock(&store, "PRODUCT1").await, 200);
    assert_eq!(stock(&store, "PRODUCT3").await, 0);
    assert_eq!(coupons_left(&store, "DISCOUNT_$5").await, 100);
    assert_eq!(
        store.find_order(order.id()).await.unwrap().status(),
        OrderStatus::Open
    );
}

#[tokio::test]
async fn shipped_orders_keep_their_reservation() {
    let (store, coordinator) = seeded().await;
    let phone = store.find_product(&"PRODUCT1".into()).await.unwrap();

    let mut order = Order::new(customer());
    order.add_product(phone, 2).unwrap();
    store.store_order(&mut order).await.unwrap();

    order.change_status_to(OrderStatus::Submitted).unwrap();
    coordinator
        .finalize_and_reserve(&store, &mut order)
        .await
        .unwrap();
    order.change_status_to(OrderStatus::Paid).unwrap();
    order.change_status_to(OrderStatus::Shipped).unwrap();
    store.update_order(&mut order).await.unwrap();

    order.change_status_to(OrderStatus::Cancelled).unwrap();
    let result = coordinator.cancel_and_release(&store, &mut order).await;

    assert!(matches!(
        result,
        Err(StoreError::Domain(DomainError::AlreadyShipped))
    ));
    assert_eq!(stock(&store, "PRODUCT1").await, 198);
}
