use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ledger::LedgerAccountType;
use super::money::{Currency, Money};
use crate::{BankingError, BankingResult};

/// Banking product types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProductType {
    /// Savings account (asset)
    Savings,
    /// Checking account (asset)
    Checking,
    /// Revolving credit line (liability)
    CreditLine,
    /// Loan (liability)
    Loan,
    /// General-ledger internal account
    GlInternal,
}

impl ProductType {
    /// Accounting classification implied by the product.
    pub fn ledger_account_type(&self) -> LedgerAccountType {
        match self {
            ProductType::Savings | ProductType::Checking => LedgerAccountType::Asset,
            ProductType::CreditLine | ProductType::Loan => LedgerAccountType::Liability,
            ProductType::GlInternal => LedgerAccountType::Asset,
        }
    }

    pub fn account_number_prefix(&self) -> &'static str {
        match self {
            ProductType::Savings => "SAV",
            ProductType::Checking => "CHK",
            ProductType::CreditLine => "CRD",
            ProductType::Loan => "LON",
            ProductType::GlInternal => "GL",
        }
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProductType::Savings => "savings",
            ProductType::Checking => "checking",
            ProductType::CreditLine => "credit_line",
            ProductType::Loan => "loan",
            ProductType::GlInternal => "gl_internal",
        };
        f.write_str(s)
    }
}

/// Account lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountState {
    Active,
    Frozen,
    Closed,
    Dormant,
}

impl std::fmt::Display for AccountState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AccountState::Active => "active",
            AccountState::Frozen => "frozen",
            AccountState::Closed => "closed",
            AccountState::Dormant => "dormant",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub account_number: String,
    pub customer_id: Uuid,
    pub product_type: ProductType,
    pub account_type: LedgerAccountType,
    pub currency: Currency,
    pub name: String,
    pub state: AccountState,
    /// Annual interest rate override for this account.
    pub interest_rate: Option<Decimal>,
    pub credit_limit: Option<Money>,
    pub minimum_balance: Option<Money>,
    pub daily_transaction_limit: Option<Money>,
    pub monthly_transaction_limit: Option<Money>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Money fields must match the account currency.
    pub fn validate_currency_consistency(&self) -> BankingResult<()> {
        for (field, money) in [
            ("credit_limit", &self.credit_limit),
            ("minimum_balance", &self.minimum_balance),
            ("daily_transaction_limit", &self.daily_transaction_limit),
            ("monthly_transaction_limit", &self.monthly_transaction_limit),
        ] {
            if let Some(amount) = money {
                if amount.currency() != self.currency {
                    return Err(BankingError::validation(
                        field,
                        format!(
                            "currency {} does not match account currency {}",
                            amount.currency(),
                            self.currency
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn is_asset_account(&self) -> bool {
        self.account_type == LedgerAccountType::Asset
    }

    pub fn is_liability_account(&self) -> bool {
        self.account_type == LedgerAccountType::Liability
    }

    pub fn is_credit_product(&self) -> bool {
        self.product_type == ProductType::CreditLine
    }

    pub fn is_deposit_product(&self) -> bool {
        matches!(self.product_type, ProductType::Savings | ProductType::Checking)
    }

    pub fn is_loan_product(&self) -> bool {
        self.product_type == ProductType::Loan
    }

    pub fn can_transact(&self) -> bool {
        self.state == AccountState::Active
    }

    pub fn can_credit(&self) -> bool {
        self.state != AccountState::Closed
    }

    pub fn can_debit(&self) -> bool {
        self.state == AccountState::Active
    }
}

/// Request payload for opening an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountOpening {
    pub customer_id: Uuid,
    pub product_type: ProductType,
    pub currency: Currency,
    pub name: String,
    pub account_number: Option<String>,
    pub interest_rate: Option<Decimal>,
    pub credit_limit: Option<Money>,
    pub minimum_balance: Option<Money>,
    pub daily_transaction_limit: Option<Money>,
    pub monthly_transaction_limit: Option<Money>,
}

impl AccountOpening {
    pub fn new(
        customer_id: Uuid,
        product_type: ProductType,
        currency: Currency,
        name: &str,
    ) -> Self {
        AccountOpening {
            customer_id,
            product_type,
            currency,
            name: name.to_string(),
            account_number: None,
            interest_rate: None,
            credit_limit: None,
            minimum_balance: None,
            daily_transaction_limit: None,
            monthly_transaction_limit: None,
        }
    }
}

/// A reservation against an account. Reduces available balance, never book
/// balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountHold {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: Money,
    pub reason: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub released_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountHold {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        if self.released_at.is_some() {
            return false;
        }
        if let Some(expires_at) = self.expires_at {
            if now > expires_at {
                return false;
            }
        }
        true
    }
}
