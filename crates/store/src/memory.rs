use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{
    Coupon, CouponCode, Customer, CustomerId, Order, OrderId, Product, ProductId,
};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::coordinator::FulfillmentCoordinator;
use crate::seed::DemoData;
use crate::store::{
    CouponStore, CustomerStore, LedgerTransaction, OrderStore, ProductStore, TransactionalStore,
};
use crate::{Result, StoreError};

#[derive(Debug, Default)]
struct Tables {
    customers: HashMap<CustomerId, Customer>,
    products: HashMap<ProductId, Product>,
    coupons: HashMap<CouponCode, Coupon>,
    orders: HashMap<OrderId, Order>,
}

impl Tables {
    fn put_order(&mut self, order: &mut Order) -> Result<()> {
        let stored = self
            .orders
            .get(order.id())
            .ok_or_else(|| StoreError::not_found("order", order.id()))?;

        if stored.version() != order.version() {
            return Err(StoreError::ConcurrencyConflict {
                entity: "order",
                id: order.id().to_string(),
                expected: order.version(),
                actual: stored.version(),
            });
        }

        order.set_version(order.version() + 1);
        self.orders.insert(order.id().clone(), order.clone());
        Ok(())
    }
}

/// In-memory store implementation.
///
/// Every table sits behind a single lock, so a ledger transaction holds
/// exclusive access to all of them until it commits or is dropped. Provides
/// the same interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    coordinator: FulfillmentCoordinator,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the coordinator used for compound operations.
    pub fn with_coordinator(mut self, coordinator: FulfillmentCoordinator) -> Self {
        self.coordinator = coordinator;
        self
    }

    /// Inserts or replaces a product.
    pub async fn insert_product(&self, product: Product) {
        self.tables
            .write()
            .await
            .products
            .insert(product.id.clone(), product);
    }

    /// Inserts or replaces a coupon.
    pub async fn insert_coupon(&self, coupon: Coupon) {
        self.tables
            .write()
            .await
            .coupons
            .insert(coupon.code.clone(), coupon);
    }

    /// Inserts or replaces a customer.
    pub async fn insert_customer(&self, customer: Customer) {
        self.tables
            .write()
            .await
            .customers
            .insert(customer.id.clone(), customer);
    }

    /// Loads the demo catalog.
    pub async fn seed(&self, data: DemoData) {
        let mut tables = self.tables.write().await;
        for customer in data.customers {
            tables.customers.insert(customer.id.clone(), customer);
        }
        for product in data.products {
            tables.products.insert(product.id.clone(), product);
        }
        for coupon in data.coupons {
            tables.coupons.insert(coupon.code.clone(), coupon);
        }
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn find_order(&self, id: &OrderId) -> Result<Order> {
        self.tables
            .read()
            .await
            .orders
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("order", id))
    }

    async fn store_order(&self, order: &mut Order) -> Result<OrderId> {
        let mut tables = self.tables.write().await;

        if let Some(existing) = tables.orders.get(order.id()) {
            return Err(StoreError::ConcurrencyConflict {
                entity: "order",
                id: order.id().to_string(),
                expected: 0,
                actual: existing.version(),
            });
        }

        order.set_version(1);
        tables.orders.insert(order.id().clone(), order.clone());
        Ok(order.id().clone())
    }

    async fn update_order(&self, order: &mut Order) -> Result<()> {
        let mut next = order.clone();
        self.tables.write().await.put_order(&mut next)?;
        *order = next;
        Ok(())
    }

    async fn finalize_and_reserve(&self, order: &mut Order) -> Result<()> {
        self.coordinator.finalize_and_reserve(self, order).await
    }

    async fn cancel_and_release(&self, order: &mut Order) -> Result<()> {
        self.coordinator.cancel_and_release(self, order).await
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn find_product(&self, id: &ProductId) -> Result<Product> {
        self.tables
            .read()
            .await
            .products
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("product", id))
    }

    async fn find_all_products(&self) -> Result<Vec<Product>> {
        let tables = self.tables.read().await;
        let mut products: Vec<_> = tables.products.values().cloned().collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(products)
    }

    async fn update_product(&self, product: &Product) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.products.get_mut(&product.id) {
            Some(stored) => {
                *stored = product.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("product", &product.id)),
        }
    }
}

#[async_trait]
impl CouponStore for InMemoryStore {
    async fn find_coupon(&self, code: &CouponCode) -> Result<Coupon> {
        self.tables
            .read()
            .await
            .coupons
            .get(code)
            .cloned()
            .ok_or_else(|| StoreError::not_found("coupon", code))
    }

    async fn update_coupon(&self, coupon: &Coupon) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.coupons.get_mut(&coupon.code) {
            Some(stored) => {
                *stored = coupon.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("coupon", &coupon.code)),
        }
    }
}

#[async_trait]
impl CustomerStore for InMemoryStore {
    async fn find_customer(&self, id: &CustomerId) -> Result<Customer> {
        self.tables
            .read()
            .await
            .customers
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("customer", id))
    }
}

/// Ledger transaction over the in-memory tables.
///
/// Holds the write lock for its whole lifetime. Writes are staged and only
/// copied into the tables by [`LedgerTransaction::commit`].
pub struct InMemoryTransaction {
    tables: OwnedRwLockWriteGuard<Tables>,
    products: HashMap<ProductId, Product>,
    coupons: HashMap<CouponCode, Coupon>,
    orders: HashMap<OrderId, Order>,
}

#[async_trait]
impl TransactionalStore for InMemoryStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> Result<InMemoryTransaction> {
        let tables = Arc::clone(&self.tables).write_owned().await;
        Ok(InMemoryTransaction {
            tables,
            products: HashMap::new(),
            coupons: HashMap::new(),
            orders: HashMap::new(),
        })
    }
}

#[async_trait]
impl LedgerTransaction for InMemoryTransaction {
    async fn find_product(&mut self, id: &ProductId) -> Result<Product> {
        self.products
            .get(id)
            .or_else(|| self.tables.products.get(id))
            .cloned()
            .ok_or_else(|| StoreError::not_found("product", id))
    }

    async fn update_product(&mut self, product: &Product) -> Result<()> {
        if !self.tables.products.contains_key(&product.id) {
            return Err(StoreError::not_found("product", &product.id));
        }
        self.products.insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn find_coupon(&mut self, code: &CouponCode) -> Result<Coupon> {
        self.coupons
            .get(code)
            .or_else(|| self.tables.coupons.get(code))
            .cloned()
            .ok_or_else(|| StoreError::not_found("coupon", code))
    }

    async fn update_coupon(&mut self, coupon: &Coupon) -> Result<()> {
        if !self.tables.coupons.contains_key(&coupon.code) {
            return Err(StoreError::not_found("coupon", &coupon.code));
        }
        self.coupons.insert(coupon.code.clone(), coupon.clone());
        Ok(())
    }

    async fn find_order(&mut self, id: &OrderId) -> Result<Order> {
        self.orders
            .get(id)
            .or_else(|| self.tables.orders.get(id))
            .cloned()
            .ok_or_else(|| StoreError::not_found("order", id))
    }

    async fn replace_order(&mut self, order: &mut Order) -> Result<()> {
        let stored = self.find_order(order.id()).await?;
        if stored.version() != order.version() {
            return Err(StoreError::ConcurrencyConflict {
                entity: "order",
                id: order.id().to_string(),
                expected: order.version(),
                actual: stored.version(),
            });
        }

        order.set_version(order.version() + 1);
        self.orders.insert(order.id().clone(), order.clone());
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        let InMemoryTransaction {
            mut tables,
            products,
            coupons,
            orders,
        } = self;

        tables.products.extend(products);
        tables.coupons.extend(coupons);
        tables.orders.extend(orders);
        Ok(())
    }
}
