//! Product ledger.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::order::Money;

/// A catalog product together with its live stock counter.
///
/// The copy held by the product store is authoritative. Copies embedded in an
/// order's cart are snapshots taken when the product was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier.
    pub id: ProductId,

    /// Human-readable product name.
    pub name: String,

    /// Unit price.
    pub price: Money,

    /// Units currently available for reservation.
    pub quantity: u32,
}

impl Product {
    /// Creates a new product.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
        quantity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            quantity,
        }
    }

    /// Checks whether `quantity` units can be reserved. Does not mutate.
    pub fn try_reserve_quantity(&self, quantity: u32) -> Result<(), DomainError> {
        if quantity > self.quantity {
            return Err(DomainError::QuantityExceedsStock {
                product_id: self.id.clone(),
                requested: quantity,
                available: self.quantity,
            });
        }
        Ok(())
    }

    /// Takes `quantity` units out of stock.
    ///
    /// Must be preceded by [`Product::try_reserve_quantity`] under the same lock.
    pub fn reserve_quantity(&mut self, quantity: u32) {
        self.quantity = self.quantity.saturating_sub(quantity);
    }

    /// Returns `quantity` previously reserved units to stock.
    pub fn rollback_quantity(&mut self, quantity: u32) {
        self.quantity = self.quantity.saturating_add(quantity);
    }
}
