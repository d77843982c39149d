//! Demo catalog loaded at start-up.

use chrono::{DateTime, Duration, Utc};
use domain::{Coupon, CouponKind, Customer, Money, Product};
use rust_decimal::Decimal;

/// How long seeded coupons stay valid.
const COUPON_VALIDITY_DAYS: i64 = 10;

/// Records inserted into an empty store so the service can be exercised.
#[derive(Debug, Clone)]
pub struct DemoData {
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub coupons: Vec<Coupon>,
}

impl DemoData {
    /// Builds the demo catalog with coupons valid from `now` for ten days.
    pub fn new(now: DateTime<Utc>) -> Self {
        let end = now + Duration::days(COUPON_VALIDITY_DAYS);

        Self {
            customers: vec![Customer::new(
                "CUSTOMER1",
                "Hari",
                "+62-12345",
                "example@email.com",
                "No, Street, City, Indonesia",
            )],
            products: vec![
                Product::new("PRODUCT1", "Sony Xperia 10", Money::from_major(500), 200),
                Product::new("PRODUCT2", "Ultramilk 1L", Money::from_major(5), 2000),
            ],
            coupons: vec![
                Coupon::new(
                    "DISCOUNT_$5",
                    100,
                    Decimal::from(5),
                    CouponKind::Nominal,
                    now,
                    end,
                ),
                Coupon::new(
                    "DISCOUNT_20%",
                    100,
                    Decimal::new(2, 1),
                    CouponKind::Percentage,
                    now,
                    end,
                ),
            ],
        }
    }
}

impl Default for DemoData {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::store::{CouponStore, CustomerStore, ProductStore};

    #[tokio::test]
    async fn test_seeded_store_has_demo_catalog() {
        let store = InMemoryStore::new();
        store.seed(DemoData::default()).await;

        let customer = store.find_customer(&"CUSTOMER1".into()).await.unwrap();
        assert_eq!(customer.name, "Hari");

        let products = store.find_all_products().await.unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].price, Money::from_major(500));
        assert_eq!(products[0].quantity, 200);

        let coupon = store.find_coupon(&"DISCOUNT_20%".into()).await.unwrap();
        assert_eq!(coupon.kind, CouponKind::Percentage);
        assert!(coupon.validate().is_ok());
    }

    #[test]
    fn test_coupons_expire_after_ten_days() {
        let now = Utc::now();
        let data = DemoData::new(now);

        for coupon in &data.coupons {
            assert!(coupon.validate_at(now).is_ok());
            assert!(coupon.validate_at(now + Duration::days(10)).is_err());
        }
    }
}
