use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{Account, AccountHold, AccountOpening, AccountState, Money};
use crate::error::BankingResult;

/// Account lifecycle, holds, and derived balance queries.
pub trait AccountService: Send + Sync {
    fn create_account(&self, opening: AccountOpening) -> BankingResult<Account>;

    fn account(&self, account_id: Uuid) -> BankingResult<Option<Account>>;

    fn account_by_number(&self, account_number: &str) -> BankingResult<Option<Account>>;

    fn customer_accounts(&self, customer_id: Uuid) -> BankingResult<Vec<Account>>;

    fn update_state(
        &self,
        account_id: Uuid,
        new_state: AccountState,
        reason: &str,
    ) -> BankingResult<Account>;

    fn freeze_account(&self, account_id: Uuid, reason: &str) -> BankingResult<Account>;

    fn unfreeze_account(&self, account_id: Uuid, reason: &str) -> BankingResult<Account>;

    /// Close an account. Deposit accounts must carry a zero book balance.
    fn close_account(&self, account_id: Uuid, reason: &str) -> BankingResult<Account>;

    fn update_interest_rate(&self, account_id: Uuid, new_rate: Decimal) -> BankingResult<Account>;

    fn update_credit_limit(&self, account_id: Uuid, new_limit: Money) -> BankingResult<Account>;

    fn place_hold(
        &self,
        account_id: Uuid,
        amount: Money,
        reason: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> BankingResult<AccountHold>;

    /// Release a hold. Releasing an already-released hold is an error.
    fn release_hold(&self, hold_id: Uuid, reason: &str) -> BankingResult<AccountHold>;

    fn active_holds(&self, account_id: Uuid) -> BankingResult<Vec<AccountHold>>;

    /// Ledger-derived balance. For credit lines the sign is flipped once
    /// here to the customer frame (owed money is negative); no other
    /// component re-flips it.
    fn book_balance(&self, account_id: Uuid) -> BankingResult<Money>;

    /// Book balance minus active holds, plus the credit limit for liability
    /// products that have one.
    fn available_balance(&self, account_id: Uuid) -> BankingResult<Money>;

    /// Remaining credit on a credit product: limit minus used minus holds,
    /// floored at zero.
    fn credit_available(&self, account_id: Uuid) -> BankingResult<Money>;
}
