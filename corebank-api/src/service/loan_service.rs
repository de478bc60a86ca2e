use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{AmortizationEntry, Loan, LoanPayment, LoanTerms, Money};
use crate::error::BankingResult;

/// Loan lifecycle from origination through payoff.
pub trait LoanService: Send + Sync {
    /// Create the loan and its companion liability account, and generate the
    /// amortization schedule. The loan starts ORIGINATED.
    fn originate_loan(&self, customer_id: Uuid, terms: LoanTerms) -> BankingResult<Loan>;

    /// Disburse the full principal to the customer's deposit account via an
    /// internal transfer. ORIGINATED-only; runs in one atomic scope.
    fn disburse_loan(&self, loan_id: Uuid, deposit_account_id: Uuid) -> BankingResult<Loan>;

    /// Apply a payment: interest first, then principal, with late fees and
    /// prepayment penalties added on top. One atomic scope.
    fn make_payment(
        &self,
        loan_id: Uuid,
        payment_amount: Money,
        payment_date: NaiveDate,
        source_account_id: Option<Uuid>,
    ) -> BankingResult<LoanPayment>;

    fn generate_amortization_schedule(&self, loan_id: Uuid)
        -> BankingResult<Vec<AmortizationEntry>>;

    fn amortization_schedule(&self, loan_id: Uuid) -> BankingResult<Vec<AmortizationEntry>>;

    fn loan(&self, loan_id: Uuid) -> BankingResult<Option<Loan>>;

    fn customer_loans(&self, customer_id: Uuid) -> BankingResult<Vec<Loan>>;

    fn loan_payments(&self, loan_id: Uuid) -> BankingResult<Vec<LoanPayment>>;

    /// Charge late fees on loans past their schedule by more than the grace
    /// window, at most once per calendar month. Delinquency is measured
    /// against the amortization schedule.
    fn process_past_due_loans(&self, today: NaiveDate) -> BankingResult<LateFeeRunReport>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LateFeeRunReport {
    pub loans_processed: u32,
    pub late_fees_charged: u32,
    pub errors: Vec<String>,
}
