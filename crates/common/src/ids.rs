use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a string-backed identifier newtype.
///
/// Identifiers are opaque strings so that seeded catalog keys (`PRODUCT1`) and generated
/// UUIDs can share one representation across every storage backend.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the identifier, returning the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Unique identifier of an order, fixed when the order is created.
    OrderId
);

string_id!(
    /// Identifier of a customer record.
    CustomerId
);

string_id!(
    /// Identifier of a catalog product.
    ProductId
);

string_id!(
    /// Unique redemption code of a coupon.
    CouponCode
);

string_id!(
    /// Shipment identifier handed out by the logistics partner.
    ShippingId
);

impl OrderId {
    /// Generates a fresh random order ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl ShippingId {
    /// Generates a fresh random shipping ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_order_ids_are_unique() {
        let id1 = OrderId::generate();
        let id2 = OrderId::generate();
        assert_ne!(id1, id2);
        assert!(Uuid::parse_str(id1.as_str()).is_ok());
    }

    #[test]
    fn string_conversions_preserve_value() {
        let id = ProductId::new("PRODUCT1");
        assert_eq!(id.as_str(), "PRODUCT1");

        let code: CouponCode = "DISCOUNT_20%".into();
        assert_eq!(code.to_string(), "DISCOUNT_20%");
        assert_eq!(code.into_inner(), "DISCOUNT_20%");
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = CustomerId::new("CUSTOMER1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"CUSTOMER1\"");

        let deserialized: CustomerId = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, id);
    }
}
