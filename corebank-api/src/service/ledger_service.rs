use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Currency, JournalEntry, JournalEntryState, JournalLine, LedgerAccountType, Money};
use crate::error::BankingResult;

/// The double-entry ledger. Sole authority on balances: every balance is
/// derived from POSTED entries, never cached.
pub trait LedgerService: Send + Sync {
    /// Create a balanced entry in PENDING state.
    fn create_entry(
        &self,
        reference: &str,
        description: &str,
        lines: Vec<JournalLine>,
    ) -> BankingResult<JournalEntry>;

    /// Transition a PENDING entry to POSTED inside one atomic scope.
    /// Re-posting a POSTED entry is a state error, not a duplicate post.
    fn post_entry(&self, entry_id: Uuid) -> BankingResult<JournalEntry>;

    /// Reverse a POSTED entry: creates and posts a counter-entry with
    /// debits and credits swapped, links both entries, and flips the
    /// original to REVERSED, all in one atomic scope. Returns the reverser.
    fn reverse_entry(&self, entry_id: Uuid, reason: &str) -> BankingResult<JournalEntry>;

    fn entry(&self, entry_id: Uuid) -> BankingResult<Option<JournalEntry>>;

    fn entries_for_account(
        &self,
        account_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        state_filter: Option<JournalEntryState>,
    ) -> BankingResult<Vec<JournalEntry>>;

    /// Derive an account balance by replaying POSTED entries, following the
    /// account type's normal-balance sign convention.
    fn account_balance(
        &self,
        account_id: Uuid,
        account_type: LedgerAccountType,
        currency: Currency,
        as_of: Option<DateTime<Utc>>,
    ) -> BankingResult<Money>;

    fn trial_balance(
        &self,
        accounts: &HashMap<Uuid, LedgerAccountType>,
        currency: Currency,
        as_of: Option<DateTime<Utc>>,
    ) -> BankingResult<HashMap<Uuid, Money>>;
}
