pub mod account_service;
pub mod audit_service;
pub mod compliance_service;
pub mod credit_service;
pub mod customer_directory;
pub mod interest_service;
pub mod ledger_service;
pub mod loan_service;
pub mod transaction_service;

pub use account_service::AccountService;
pub use audit_service::AuditTrail;
pub use compliance_service::ComplianceService;
pub use credit_service::{CreditLineService, OverdueRunReport};
pub use customer_directory::CustomerDirectory;
pub use interest_service::{
    AccountAccrual, AccrualRunReport, InterestPosting, InterestPostingReport, InterestService,
};
pub use ledger_service::LedgerService;
pub use loan_service::{LateFeeRunReport, LoanService};
pub use transaction_service::TransactionService;
