use uuid::Uuid;

use crate::domain::{NewTransaction, Transaction};
use crate::error::BankingResult;

/// The hot path: idempotent creation, compliance-gated atomic posting, and
/// reversal of money movements. Every engine moves money through this
/// pipeline; nothing posts to the ledger around it.
pub trait TransactionService: Send + Sync {
    /// Persist a transaction intent in PENDING state. When an idempotency
    /// key is supplied and a transaction already exists under it, that
    /// existing transaction is returned unchanged (first-writer-wins).
    fn create_transaction(&self, request: NewTransaction) -> BankingResult<Transaction>;

    /// Run a PENDING transaction through compliance, the funds check, and
    /// atomic journal posting. A compliance REVIEW leaves the transaction
    /// PENDING with the decision recorded; BLOCK marks it FAILED and
    /// surfaces `ComplianceBlocked`.
    fn process_transaction(&self, transaction_id: Uuid) -> BankingResult<Transaction>;

    /// Reverse a COMPLETED transaction: creates a linked REVERSAL
    /// transaction, reverses the journal entry, and flips the original to
    /// REVERSED, all in one atomic scope. Returns the reversal transaction.
    fn reverse_transaction(&self, transaction_id: Uuid, reason: &str)
        -> BankingResult<Transaction>;

    fn transaction(&self, transaction_id: Uuid) -> BankingResult<Option<Transaction>>;

    fn transaction_by_idempotency_key(&self, key: &str) -> BankingResult<Option<Transaction>>;

    fn account_transactions(&self, account_id: Uuid) -> BankingResult<Vec<Transaction>>;
}
