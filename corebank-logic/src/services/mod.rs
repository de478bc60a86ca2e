pub mod account_service_impl;
pub mod audit_trail_impl;
pub mod compliance_service_impl;
pub mod credit_service_impl;
pub mod interest_service_impl;
pub mod ledger_service_impl;
pub mod loan_service_impl;
pub mod transaction_service_impl;

pub use account_service_impl::AccountServiceImpl;
pub use audit_trail_impl::AuditTrailImpl;
pub use compliance_service_impl::ComplianceServiceImpl;
pub use credit_service_impl::CreditLineServiceImpl;
pub use interest_service_impl::InterestServiceImpl;
pub use ledger_service_impl::LedgerServiceImpl;
pub use loan_service_impl::LoanServiceImpl;
pub use transaction_service_impl::TransactionServiceImpl;

use std::sync::Arc;

use serde_json::Value;

use corebank_api::observer::DomainObserver;
use corebank_api::service::{
    AccountService, AuditTrail, ComplianceService, CreditLineService, CustomerDirectory,
    InterestService, LedgerService, LoanService, TransactionService,
};
use corebank_api::BankingResult;
use corebank_db::{StorageInterface, StorageModel};

use crate::config::CoreConfig;

pub(crate) fn save_model<M: StorageModel>(
    storage: &dyn StorageInterface,
    model: &M,
) -> BankingResult<()> {
    storage.save(M::TABLE, &model.record_id(), model.to_record()?)
}

pub(crate) fn load_model<M: StorageModel>(
    storage: &dyn StorageInterface,
    id: &str,
) -> BankingResult<Option<M>> {
    storage.load(M::TABLE, id)?.map(M::from_record).transpose()
}

pub(crate) fn all_models<M: StorageModel>(
    storage: &dyn StorageInterface,
) -> BankingResult<Vec<M>> {
    storage
        .load_all(M::TABLE)?
        .into_iter()
        .map(M::from_record)
        .collect()
}

pub(crate) fn find_models<M: StorageModel>(
    storage: &dyn StorageInterface,
    filter: &[(&str, Value)],
) -> BankingResult<Vec<M>> {
    storage
        .find(M::TABLE, filter)?
        .into_iter()
        .map(M::from_record)
        .collect()
}

/// The assembled engine. The host builds this explicitly and passes it into
/// its handlers; there is no module-level state.
pub struct CoreServices {
    pub audit: Arc<dyn AuditTrail>,
    pub ledger: Arc<dyn LedgerService>,
    pub accounts: Arc<dyn AccountService>,
    pub compliance: Arc<dyn ComplianceService>,
    pub transactions: Arc<dyn TransactionService>,
    pub interest: Arc<dyn InterestService>,
    pub credit: Arc<dyn CreditLineService>,
    pub loans: Arc<dyn LoanService>,
}

impl CoreServices {
    pub fn assemble(
        storage: Arc<dyn StorageInterface>,
        customers: Arc<dyn CustomerDirectory>,
        observer: Arc<dyn DomainObserver>,
        config: Arc<CoreConfig>,
    ) -> BankingResult<Self> {
        let audit: Arc<dyn AuditTrail> = Arc::new(AuditTrailImpl::new(Arc::clone(&storage)));
        let ledger: Arc<dyn LedgerService> = Arc::new(LedgerServiceImpl::new(
            Arc::clone(&storage),
            Arc::clone(&audit),
        ));
        let accounts: Arc<dyn AccountService> = Arc::new(AccountServiceImpl::new(
            Arc::clone(&storage),
            Arc::clone(&ledger),
            Arc::clone(&audit),
            Arc::clone(&observer),
        ));
        let compliance: Arc<dyn ComplianceService> = Arc::new(ComplianceServiceImpl::new(
            Arc::clone(&storage),
            customers,
            Arc::clone(&audit),
            Arc::clone(&config),
        ));
        let transactions: Arc<dyn TransactionService> = Arc::new(TransactionServiceImpl::new(
            Arc::clone(&storage),
            Arc::clone(&ledger),
            Arc::clone(&accounts),
            Arc::clone(&compliance),
            Arc::clone(&audit),
            Arc::clone(&observer),
        ));
        let interest: Arc<dyn InterestService> = Arc::new(InterestServiceImpl::new(
            Arc::clone(&storage),
            Arc::clone(&accounts),
            Arc::clone(&transactions),
            Arc::clone(&audit),
            Arc::clone(&config),
        )?);
        let credit: Arc<dyn CreditLineService> = Arc::new(CreditLineServiceImpl::new(
            Arc::clone(&storage),
            Arc::clone(&accounts),
            Arc::clone(&transactions),
            Arc::clone(&interest),
            Arc::clone(&audit),
            Arc::clone(&config),
        ));
        let loans: Arc<dyn LoanService> = Arc::new(LoanServiceImpl::new(
            Arc::clone(&storage),
            Arc::clone(&accounts),
            Arc::clone(&transactions),
            Arc::clone(&audit),
        ));

        Ok(CoreServices {
            audit,
            ledger,
            accounts,
            compliance,
            transactions,
            interest,
            credit,
            loans,
        })
    }
}
