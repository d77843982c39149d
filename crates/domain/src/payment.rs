//! Payment specification.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Accepts proofs with or without trailing `=` padding.
const PROOF_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Means of payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    BankTransfer,
    CreditCard,
    EWallet,
}

impl PaymentType {
    /// Returns the payment type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::BankTransfer => "bank_transfer",
            PaymentType::CreditCard => "credit_card",
            PaymentType::EWallet => "e_wallet",
        }
    }
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment details submitted by the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSpecification {
    #[serde(rename = "type")]
    pub payment_type: PaymentType,

    /// Name of the account holder.
    pub name_holder: String,

    /// Account or transfer reference.
    pub identifier_id: String,

    /// Base64 encoded proof of transfer.
    pub proof: String,
}

impl PaymentSpecification {
    /// Checks the payment type and that the proof decodes as base64.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.payment_type != PaymentType::BankTransfer {
            return Err(DomainError::PaymentTypeNotAllowed(self.payment_type));
        }

        PROOF_ENGINE
            .decode(&self.proof)
            .map_err(|_| DomainError::PaymentProofNotDecodable)?;

        Ok(())
    }
}
