pub mod account;
pub mod audit;
pub mod compliance;
pub mod credit;
pub mod interest;
pub mod ledger;
pub mod loan;
pub mod money;
pub mod transaction;

pub use account::{Account, AccountHold, AccountOpening, AccountState, ProductType};
pub use audit::{AuditEvent, AuditEventType, IntegrityReport};
pub use compliance::{
    AlertStatus, ComplianceAction, ComplianceDecision, ComplianceViolation, CustomerProfile,
    CustomerState, KycTier, LargeTransactionReport, SuspiciousActivityAlert,
    SuspiciousActivityType,
};
pub use credit::{
    CreditStatement, CreditTransaction, CreditTransactionCategory, StatementStatus,
};
pub use interest::{
    CompoundingFrequency, GracePeriodTracker, InterestAccrual, InterestCalculationMethod,
    InterestRateConfig,
};
pub use ledger::{JournalEntry, JournalEntryState, JournalLine, LedgerAccountType};
pub use loan::{
    AmortizationEntry, AmortizationMethod, Loan, LoanPayment, LoanState, LoanTerms,
    PaymentFrequency,
};
pub use money::{Currency, Money};
pub use transaction::{
    NewTransaction, Transaction, TransactionChannel, TransactionState, TransactionType,
};

use heapless::String as HeaplessString;

use crate::{BankingError, BankingResult};

/// Copy a string into a fixed-capacity field, rejecting oversized input.
pub(crate) fn bounded<const N: usize>(
    field: &'static str,
    value: &str,
) -> BankingResult<HeaplessString<N>> {
    HeaplessString::try_from(value).map_err(|_| {
        BankingError::validation(field, format!("exceeds maximum length of {N} characters"))
    })
}
