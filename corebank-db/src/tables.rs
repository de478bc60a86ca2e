//! Authoritative table registry. Every persisted record lives in one of
//! these tables.

pub const ACCOUNTS: &str = "accounts";
pub const ACCOUNT_HOLDS: &str = "account_holds";
pub const JOURNAL_ENTRIES: &str = "journal_entries";
pub const TRANSACTIONS: &str = "transactions";
pub const INTEREST_RATE_CONFIGS: &str = "interest_rate_configs";
pub const INTEREST_ACCRUALS: &str = "interest_accruals";
pub const GRACE_PERIODS: &str = "grace_periods";
pub const CREDIT_STATEMENTS: &str = "credit_statements";
pub const CREDIT_TRANSACTIONS: &str = "credit_transactions";
pub const LOANS: &str = "loans";
pub const LOAN_PAYMENTS: &str = "loan_payments";
pub const AMORTIZATION_SCHEDULES: &str = "amortization_schedules";
pub const COMPLIANCE_VIOLATIONS: &str = "compliance_violations";
pub const SUSPICIOUS_ACTIVITY_ALERTS: &str = "suspicious_activity_alerts";
pub const LARGE_TRANSACTION_REPORTS: &str = "large_transaction_reports";
pub const AUDIT_EVENTS: &str = "audit_events";
