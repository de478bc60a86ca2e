use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use corebank_api::domain::{AccountState, LedgerAccountType, ProductType};

use crate::storage::StorageModel;
use crate::tables;

/// Storage model for the `accounts` table. Money persists as
/// `(amount-as-string, ISO currency code)` pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountModel {
    pub id: Uuid,
    pub account_number: String,
    pub customer_id: Uuid,
    pub product_type: ProductType,
    pub account_type: LedgerAccountType,
    pub currency: String,
    pub name: String,
    pub state: AccountState,
    pub interest_rate: Option<Decimal>,
    pub credit_limit_amount: Option<String>,
    pub credit_limit_currency: Option<String>,
    pub minimum_balance_amount: Option<String>,
    pub minimum_balance_currency: Option<String>,
    pub daily_limit_amount: Option<String>,
    pub daily_limit_currency: Option<String>,
    pub monthly_limit_amount: Option<String>,
    pub monthly_limit_currency: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StorageModel for AccountModel {
    const TABLE: &'static str = tables::ACCOUNTS;

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountHoldModel {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: String,
    pub currency: String,
    pub reason: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub released_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StorageModel for AccountHoldModel {
    const TABLE: &'static str = tables::ACCOUNT_HOLDS;

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}
