//! Domain <-> storage-model mappers. One mapper per entity owner; other
//! modules convert records only through these.

pub mod account_mapper;
pub mod audit_mapper;
pub mod compliance_mapper;
pub mod credit_mapper;
pub mod interest_mapper;
pub mod ledger_mapper;
pub mod loan_mapper;
pub mod transaction_mapper;

pub use account_mapper::{AccountHoldMapper, AccountMapper};
pub use audit_mapper::AuditEventMapper;
pub use compliance_mapper::{
    ComplianceViolationMapper, LargeTransactionReportMapper, SuspiciousActivityAlertMapper,
};
pub use credit_mapper::{CreditStatementMapper, CreditTransactionMapper};
pub use interest_mapper::{GracePeriodMapper, InterestAccrualMapper, InterestRateConfigMapper};
pub use ledger_mapper::JournalEntryMapper;
pub use loan_mapper::{AmortizationEntryMapper, LoanMapper, LoanPaymentMapper};
pub use transaction_mapper::TransactionMapper;

use std::str::FromStr;

use rust_decimal::Decimal;

use corebank_api::domain::{Currency, Money};
use corebank_api::{BankingError, BankingResult};

/// Money persists as an `(amount-as-string, ISO code)` pair.
pub(crate) fn money_to_fields(money: &Money) -> (String, String) {
    (money.amount().to_string(), money.currency().code().to_string())
}

pub(crate) fn money_from_fields(amount: &str, currency: &str) -> BankingResult<Money> {
    let amount = Decimal::from_str(amount).map_err(|err| {
        BankingError::StorageFailure(format!("corrupt money amount {amount:?}: {err}"))
    })?;
    Ok(Money::new(amount, Currency::from_str(currency)?))
}

pub(crate) fn opt_money_to_fields(money: &Option<Money>) -> (Option<String>, Option<String>) {
    match money {
        Some(money) => {
            let (amount, currency) = money_to_fields(money);
            (Some(amount), Some(currency))
        }
        None => (None, None),
    }
}

pub(crate) fn opt_money_from_fields(
    amount: &Option<String>,
    currency: &Option<String>,
) -> BankingResult<Option<Money>> {
    match (amount, currency) {
        (Some(amount), Some(currency)) => Ok(Some(money_from_fields(amount, currency)?)),
        (None, None) => Ok(None),
        _ => Err(BankingError::StorageFailure(
            "money field with amount but no currency (or vice versa)".to_string(),
        )),
    }
}

pub(crate) fn bounded_text<const N: usize>(
    value: &str,
) -> BankingResult<heapless::String<N>> {
    heapless::String::try_from(value).map_err(|_| {
        BankingError::StorageFailure(format!(
            "stored text exceeds bounded capacity of {N} characters"
        ))
    })
}
