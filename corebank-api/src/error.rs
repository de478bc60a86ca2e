use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::Currency;

pub type BankingResult<T> = Result<T, BankingError>;

#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum BankingError {
    // Journal construction errors
    #[error("Journal entry not balanced for {currency}: debits={debits}, credits={credits}")]
    Unbalanced {
        currency: Currency,
        debits: Decimal,
        credits: Decimal,
    },

    #[error("Journal entry must have at least one line")]
    EmptyEntry,

    #[error("Malformed journal line: {0}")]
    LineMalformed(String),

    // State machine violations
    #[error("{entity} {id} is in state {state}, expected {expected}")]
    BadState {
        entity: String,
        id: Uuid,
        state: String,
        expected: String,
    },

    #[error("Insufficient funds in account {account_id}: requested {requested}, available {available}")]
    InsufficientFunds {
        account_id: Uuid,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch {
        expected: Currency,
        actual: Currency,
    },

    // Compliance gate outcomes surfaced to callers
    #[error("Transaction blocked by compliance: {}", reasons.join("; "))]
    ComplianceBlocked { reasons: Vec<String> },

    #[error("Transaction held for compliance review: {}", reasons.join("; "))]
    ComplianceReviewRequired { reasons: Vec<String> },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    // Should be impossible; indicates a bug rather than bad input
    #[error("Internal invariant violated: {0}")]
    Invariant(String),

    #[error("Validation error in {field}: {message}")]
    Validation { field: String, message: String },
}

impl BankingError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        BankingError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BankingError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn bad_state(
        entity: &'static str,
        id: Uuid,
        state: impl ToString,
        expected: &'static str,
    ) -> Self {
        BankingError::BadState {
            entity: entity.to_string(),
            id,
            state: state.to_string(),
            expected: expected.to_string(),
        }
    }
}

impl From<anyhow::Error> for BankingError {
    fn from(err: anyhow::Error) -> Self {
        BankingError::Invariant(err.to_string())
    }
}

impl From<serde_json::Error> for BankingError {
    fn from(err: serde_json::Error) -> Self {
        BankingError::StorageFailure(format!("record serialization failed: {err}"))
    }
}
