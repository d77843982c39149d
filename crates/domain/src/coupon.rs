//! Coupon ledger.

use chrono::{DateTime, Utc};
use common::CouponCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::order::Money;

/// How a coupon's amount reduces the order price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    /// Amount is a fraction of the price (`0.2` = 20%).
    Percentage,
    /// Amount is subtracted from the price as is.
    Nominal,
}

impl CouponKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponKind::Percentage => "percentage",
            CouponKind::Nominal => "nominal",
        }
    }
}

impl std::str::FromStr for CouponKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(CouponKind::Percentage),
            "nominal" => Ok(CouponKind::Nominal),
            other => Err(format!("unknown coupon kind: {other}")),
        }
    }
}

/// A discount coupon together with its live redemption counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    /// Unique redemption code.
    pub code: CouponCode,

    /// Redemptions left. Zero means exhausted.
    pub quantity: u32,

    /// Discount amount, interpreted according to `kind`.
    pub amount: Decimal,

    pub kind: CouponKind,

    /// First instant the coupon is usable (inclusive).
    pub begin: DateTime<Utc>,

    /// End of validity (exclusive).
    pub end: DateTime<Utc>,
}

impl Coupon {
    /// Creates a new coupon.
    pub fn new(
        code: impl Into<CouponCode>,
        quantity: u32,
        amount: Decimal,
        kind: CouponKind,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            code: code.into(),
            quantity,
            amount,
            kind,
            begin,
            end,
        }
    }

    /// Checks that the coupon can be redeemed right now.
    pub fn validate(&self) -> Result<(), DomainError> {
        self.validate_at(Utc::now())
    }

    /// Checks that the coupon can be redeemed at `now`.
    pub fn validate_at(&self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.quantity == 0 || now < self.begin || now >= self.end {
            return Err(DomainError::InvalidCoupon {
                code: self.code.clone(),
            });
        }
        Ok(())
    }

    /// Applies the reduction to `price`. The result is not clamped at zero.
    pub fn price_after_reduction(&self, price: Money) -> Money {
        match self.kind {
            CouponKind::Nominal => price - Money::new(self.amount),
            CouponKind::Percentage => price - price.scale(self.amount),
        }
    }
}
