pub mod account;
pub mod audit;
pub mod compliance;
pub mod credit;
pub mod interest;
pub mod ledger;
pub mod loan;
pub mod transaction;

pub use account::{AccountHoldModel, AccountModel};
pub use audit::AuditEventModel;
pub use compliance::{
    ComplianceViolationModel, LargeTransactionReportModel, SuspiciousActivityAlertModel,
};
pub use credit::{CreditStatementModel, CreditTransactionModel};
pub use interest::{GracePeriodModel, InterestAccrualModel, InterestRateConfigModel};
pub use ledger::{JournalEntryModel, JournalLineModel};
pub use loan::{AmortizationEntryModel, LoanModel, LoanPaymentModel, LoanTermsModel};
pub use transaction::TransactionModel;
