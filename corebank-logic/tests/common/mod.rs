use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use uuid::Uuid;

use corebank_api::domain::{
    AccountOpening, Currency, CustomerProfile, CustomerState, KycTier, Money, ProductType,
};
use corebank_api::observer::NoopObserver;
use corebank_api::service::CustomerDirectory;
use corebank_api::BankingResult;
use corebank_db::StorageInterface;
use corebank_db_memory::MemoryStorage;
use corebank_logic::{CoreConfig, CoreServices};

/// In-memory customer registry standing in for the external directory.
#[derive(Default)]
pub struct StubCustomerDirectory {
    profiles: Mutex<HashMap<Uuid, CustomerProfile>>,
}

impl StubCustomerDirectory {
    pub fn add_customer(&self, kyc_tier: KycTier) -> Uuid {
        let customer_id = Uuid::new_v4();
        self.profiles.lock().unwrap().insert(
            customer_id,
            CustomerProfile {
                customer_id,
                state: CustomerState::Active,
                kyc_tier,
            },
        );
        customer_id
    }

    pub fn deactivate(&self, customer_id: Uuid) {
        if let Some(profile) = self.profiles.lock().unwrap().get_mut(&customer_id) {
            profile.state = CustomerState::Suspended;
        }
    }
}

impl CustomerDirectory for StubCustomerDirectory {
    fn profile(&self, customer_id: Uuid) -> BankingResult<Option<CustomerProfile>> {
        Ok(self.profiles.lock().unwrap().get(&customer_id).cloned())
    }
}

pub struct TestBank {
    pub storage: Arc<MemoryStorage>,
    pub customers: Arc<StubCustomerDirectory>,
    pub services: CoreServices,
}

pub fn test_bank() -> TestBank {
    let storage = Arc::new(MemoryStorage::new());
    let customers = Arc::new(StubCustomerDirectory::default());
    let services = CoreServices::assemble(
        Arc::clone(&storage) as Arc<dyn StorageInterface>,
        Arc::clone(&customers) as Arc<dyn CustomerDirectory>,
        Arc::new(NoopObserver),
        Arc::new(CoreConfig::default()),
    )
    .expect("service graph assembles");
    TestBank {
        storage,
        customers,
        services,
    }
}

pub fn usd(amount: Decimal) -> Money {
    Money::new(amount, Currency::Usd)
}

/// Open a USD account of the given product for a fresh Tier-2 customer.
pub fn open_account(bank: &TestBank, product_type: ProductType) -> (Uuid, Uuid) {
    let customer_id = bank.customers.add_customer(KycTier::Tier2);
    let account = bank
        .services
        .accounts
        .create_account(AccountOpening::new(
            customer_id,
            product_type,
            Currency::Usd,
            "test account",
        ))
        .expect("account opens");
    (customer_id, account.id)
}

/// Open a USD credit line with the given limit for a fresh Tier-2 customer.
pub fn open_credit_line(bank: &TestBank, limit: Decimal) -> (Uuid, Uuid) {
    let customer_id = bank.customers.add_customer(KycTier::Tier2);
    let mut opening = AccountOpening::new(
        customer_id,
        ProductType::CreditLine,
        Currency::Usd,
        "test credit line",
    );
    opening.credit_limit = Some(usd(limit));
    let account = bank
        .services
        .accounts
        .create_account(opening)
        .expect("credit line opens");
    (customer_id, account.id)
}
