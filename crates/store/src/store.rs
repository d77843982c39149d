use async_trait::async_trait;
use domain::{
    Coupon, CouponCode, Customer, CustomerId, Order, OrderId, Product, ProductId,
};

use crate::Result;

/// Persistence of orders.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Loads an order, failing with `NotFound` if it does not exist.
    async fn find_order(&self, id: &OrderId) -> Result<Order>;

    /// Inserts a new order and returns its identifier.
    ///
    /// The order's version is set to the stored version.
    async fn store_order(&self, order: &mut Order) -> Result<OrderId>;

    /// Overwrites an existing order.
    ///
    /// Fails with `ConcurrencyConflict` if the stored version differs from
    /// `order.version()`. On success the order carries the new version.
    async fn update_order(&self, order: &mut Order) -> Result<()>;

    /// Persists a submitted order while reserving its stock and redeeming its
    /// coupon, all or nothing.
    async fn finalize_and_reserve(&self, order: &mut Order) -> Result<()>;

    /// Persists a cancelled order while releasing whatever the stored order
    /// had reserved, all or nothing.
    async fn cancel_and_release(&self, order: &mut Order) -> Result<()>;
}

/// Read and write access to the product ledger.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_product(&self, id: &ProductId) -> Result<Product>;

    /// Returns every product ordered by identifier.
    async fn find_all_products(&self) -> Result<Vec<Product>>;

    async fn update_product(&self, product: &Product) -> Result<()>;
}

/// Read and write access to the coupon ledger.
#[async_trait]
pub trait CouponStore: Send + Sync {
    async fn find_coupon(&self, code: &CouponCode) -> Result<Coupon>;

    async fn update_coupon(&self, coupon: &Coupon) -> Result<()>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn find_customer(&self, id: &CustomerId) -> Result<Customer>;
}

/// Every store the application service needs.
pub trait Store: OrderStore + ProductStore + CouponStore + CustomerStore {}

impl<T> Store for T where T: OrderStore + ProductStore + CouponStore + CustomerStore {}

/// A unit of work spanning the product ledger, the coupon ledger and the
/// order table.
///
/// Writes become visible only on [`LedgerTransaction::commit`]. Dropping the
/// transaction without committing discards them.
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Loads a product, locking it for the rest of the transaction.
    async fn find_product(&mut self, id: &ProductId) -> Result<Product>;

    async fn update_product(&mut self, product: &Product) -> Result<()>;

    /// Loads a coupon, locking it for the rest of the transaction.
    async fn find_coupon(&mut self, code: &CouponCode) -> Result<Coupon>;

    async fn update_coupon(&mut self, coupon: &Coupon) -> Result<()>;

    /// Loads an order, locking it for the rest of the transaction.
    async fn find_order(&mut self, id: &OrderId) -> Result<Order>;

    /// Overwrites an existing order, with the same version check as
    /// [`OrderStore::update_order`].
    async fn replace_order(&mut self, order: &mut Order) -> Result<()>;

    async fn commit(self) -> Result<()>;
}

/// A backend able to open ledger transactions.
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    type Tx: LedgerTransaction;

    /// Starts a transaction, waiting for any lock it needs.
    async fn begin(&self) -> Result<Self::Tx>;
}
