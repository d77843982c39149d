//! Fulfillment coordinator for the compound submit and cancel operations.

use std::future::Future;
use std::time::Duration;

use domain::{DomainError, Order, OrderStatus};

use crate::store::{LedgerTransaction, TransactionalStore};
use crate::{Result, StoreError};

/// Deadline applied when none is configured.
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs the compound operations that touch the product ledger, the coupon
/// ledger and the order table as one atomic unit.
///
/// Every check is made against the live ledger rows read inside the
/// transaction, never against the snapshots embedded in the order.
#[derive(Debug, Clone, Copy)]
pub struct FulfillmentCoordinator {
    timeout: Duration,
}

impl Default for FulfillmentCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSACTION_TIMEOUT)
    }
}

impl FulfillmentCoordinator {
    /// Creates a coordinator whose operations must finish within `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Redeems the order's coupon, reserves stock for every cart item and
    /// persists the order.
    ///
    /// The stored order must still be `Open` at the version the caller read.
    /// On any failure nothing is written and `order` is left as it was.
    pub async fn finalize_and_reserve<S>(&self, store: &S, order: &mut Order) -> Result<()>
    where
        S: TransactionalStore + ?Sized,
    {
        let (tx, next) = self.with_deadline(finalize(store, order)).await?;
        tx.commit().await?;
        *order = next;
        Ok(())
    }

    /// Releases the reservation held by the stored order and persists the
    /// cancelled order.
    ///
    /// Only `Submitted` and `Paid` orders hold a reservation; cancelling an
    /// `Open` order releases nothing.
    pub async fn cancel_and_release<S>(&self, store: &S, order: &mut Order) -> Result<()>
    where
        S: TransactionalStore + ?Sized,
    {
        let (tx, next) = self.with_deadline(cancel(store, order)).await?;
        tx.commit().await?;
        *order = next;
        Ok(())
    }

    /// Bounds the staging half of an operation. Commit runs outside the
    /// deadline so an acknowledged commit is never reported as a timeout.
    async fn with_deadline<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }
}

async fn finalize<S>(store: &S, order: &Order) -> Result<(S::Tx, Order)>
where
    S: TransactionalStore + ?Sized,
{
    let mut tx = store.begin().await?;

    let stored = tx.find_order(order.id()).await?;
    if stored.status() != OrderStatus::Open {
        return Err(DomainError::AlreadyFinalized.into());
    }
    check_version(&stored, order)?;

    if let Some(applied) = order.coupon() {
        let mut coupon = tx.find_coupon(&applied.code).await?;
        coupon.validate()?;
        coupon.quantity -= 1;
        tx.update_coupon(&coupon).await?;
    }

    // Lock rows in a stable order.
    let mut items: Vec<_> = order.cart().iter().collect();
    items.sort_by(|a, b| a.product.id.cmp(&b.product.id));

    for item in items {
        let mut product = tx.find_product(&item.product.id).await?;
        product.try_reserve_quantity(item.quantity)?;
        product.reserve_quantity(item.quantity);
        tx.update_product(&product).await?;
    }

    let mut next = order.clone();
    tx.replace_order(&mut next).await?;

    Ok((tx, next))
}

async fn cancel<S>(store: &S, order: &Order) -> Result<(S::Tx, Order)>
where
    S: TransactionalStore + ?Sized,
{
    let mut tx = store.begin().await?;

    let stored = tx.find_order(order.id()).await?;
    match stored.status() {
        OrderStatus::Shipped => return Err(DomainError::AlreadyShipped.into()),
        OrderStatus::Cancelled => return Err(DomainError::AlreadyCancelled.into()),
        OrderStatus::Completed => return Err(DomainError::AlreadyCompleted.into()),
        OrderStatus::Open | OrderStatus::Submitted | OrderStatus::Paid => {}
    }
    check_version(&stored, order)?;

    if stored.status().holds_reservation() {
        if let Some(applied) = stored.coupon() {
            let mut coupon = tx.find_coupon(&applied.code).await?;
            coupon.quantity = coupon.quantity.saturating_add(1);
            tx.update_coupon(&coupon).await?;
        }

        let mut items: Vec<_> = stored.cart().iter().collect();
        items.sort_by(|a, b| a.product.id.cmp(&b.product.id));

        for item in items {
            let mut product = tx.find_product(&item.product.id).await?;
            product.rollback_quantity(item.quantity);
            tx.update_product(&product).await?;
        }
    }

    let mut next = order.clone();
    tx.replace_order(&mut next).await?;

    Ok((tx, next))
}

fn check_version(stored: &Order, order: &Order) -> Result<()> {
    if stored.version() != order.version() {
        return Err(StoreError::ConcurrencyConflict {
            entity: "order",
            id: order.id().to_string(),
            expected: order.version(),
            actual: stored.version(),
        });
    }
    Ok(())
}
