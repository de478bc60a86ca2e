use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Account, CreditStatement, CreditTransaction, CreditTransactionCategory, Money,
};
use crate::error::BankingResult;

/// Revolving credit: statement cycles, minimum payments, grace period
/// bookkeeping, and late fees. All money movement flows through the
/// transaction processor.
pub trait CreditLineService: Send + Sync {
    /// Classify a posted transaction's effect on a credit line and work out
    /// grace eligibility. Purchases and cash advances over the available
    /// credit trigger an overlimit fee first.
    fn record_credit_transaction(
        &self,
        account_id: Uuid,
        transaction_id: Uuid,
        category: CreditTransactionCategory,
        amount: Money,
        description: &str,
        transaction_date: NaiveDate,
        post_date: NaiveDate,
    ) -> BankingResult<CreditTransaction>;

    /// Pay toward the credit line balance. Payment transaction, grace
    /// update, and statement paid-amount update happen in one atomic scope.
    /// Returns the payment transaction id.
    fn make_payment(
        &self,
        account_id: Uuid,
        amount: Money,
        payment_date: NaiveDate,
    ) -> BankingResult<Uuid>;

    fn generate_statement(
        &self,
        account_id: Uuid,
        statement_date: NaiveDate,
    ) -> BankingResult<CreditStatement>;

    /// Charge late fees on CURRENT statements past due without the minimum
    /// paid, transitioning them to OVERDUE.
    fn process_overdue_statements(&self, today: NaiveDate) -> BankingResult<OverdueRunReport>;

    fn adjust_credit_limit(
        &self,
        account_id: Uuid,
        new_limit: Money,
        reason: &str,
    ) -> BankingResult<Account>;

    fn statement(&self, statement_id: Uuid) -> BankingResult<Option<CreditStatement>>;

    /// Statements for an account, most recent first.
    fn account_statements(
        &self,
        account_id: Uuid,
        limit: Option<usize>,
    ) -> BankingResult<Vec<CreditStatement>>;

    fn current_statement(&self, account_id: Uuid) -> BankingResult<Option<CreditStatement>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverdueRunReport {
    pub statements_processed: u32,
    pub late_fees_charged: u32,
    pub errors: Vec<String>,
}
