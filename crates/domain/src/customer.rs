//! Customer records.

use common::CustomerId;
use serde::{Deserialize, Serialize};

/// A customer and the contact details copied into each order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub address: String,
}

impl Customer {
    /// Creates a new customer record.
    pub fn new(
        id: impl Into<CustomerId>,
        name: impl Into<String>,
        phone_number: impl Into<String>,
        email: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phone_number: phone_number.into(),
            email: email.into(),
            address: address.into(),
        }
    }
}
