//! Fixed general-ledger account ids. These are stable across processes so
//! trial balances are well-defined; every cash movement against the outside
//! world settles through one of them.

use uuid::Uuid;

/// Bank cash/settlement account (asset). Deposits credit it, withdrawals
/// debit it.
pub const GL_CASH_ACCOUNT_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_4740_0001_0001);

/// Fee income (revenue).
pub const GL_FEE_REVENUE_ACCOUNT_ID: Uuid =
    Uuid::from_u128(0x0000_0000_0000_0000_0000_4740_0001_0002);

/// Interest paid out to depositors (expense).
pub const GL_INTEREST_EXPENSE_ACCOUNT_ID: Uuid =
    Uuid::from_u128(0x0000_0000_0000_0000_0000_4740_0001_0003);

/// Interest earned on credit products (revenue).
pub const GL_INTEREST_REVENUE_ACCOUNT_ID: Uuid =
    Uuid::from_u128(0x0000_0000_0000_0000_0000_4740_0001_0004);
