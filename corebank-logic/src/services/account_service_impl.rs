use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use corebank_api::domain::{
    Account, AccountHold, AccountOpening, AccountState, AuditEventType, Money,
};
use corebank_api::observer::DomainObserver;
use corebank_api::service::{AccountService, AuditTrail, LedgerService};
use corebank_api::{BankingError, BankingResult};
use corebank_db::models::{AccountHoldModel, AccountModel};
use corebank_db::StorageInterface;

use crate::mappers::{AccountHoldMapper, AccountMapper};
use crate::services::{find_models, load_model, save_model};

pub struct AccountServiceImpl {
    storage: Arc<dyn StorageInterface>,
    ledger: Arc<dyn LedgerService>,
    audit: Arc<dyn AuditTrail>,
    observer: Arc<dyn DomainObserver>,
}

impl AccountServiceImpl {
    pub fn new(
        storage: Arc<dyn StorageInterface>,
        ledger: Arc<dyn LedgerService>,
        audit: Arc<dyn AuditTrail>,
        observer: Arc<dyn DomainObserver>,
    ) -> Self {
        AccountServiceImpl {
            storage,
            ledger,
            audit,
            observer,
        }
    }

    fn require_account(&self, account_id: Uuid) -> BankingResult<Account> {
        self.account(account_id)?
            .ok_or_else(|| BankingError::not_found("account", account_id))
    }

    fn save_account(&self, account: &Account) -> BankingResult<()> {
        save_model(self.storage.as_ref(), &AccountMapper::to_model(account))
    }

    fn generate_account_number(product_type: corebank_api::domain::ProductType) -> String {
        let suffix: u32 = rand::random::<u32>() % 10_000;
        format!(
            "{}{}{:04}",
            product_type.account_number_prefix(),
            Utc::now().timestamp(),
            suffix
        )
    }

    fn holds_total(&self, account: &Account) -> BankingResult<Money> {
        let mut total = Money::zero(account.currency);
        for hold in self.active_holds(account.id)? {
            total = total.checked_add(&hold.amount)?;
        }
        Ok(total)
    }
}

impl AccountService for AccountServiceImpl {
    fn create_account(&self, opening: AccountOpening) -> BankingResult<Account> {
        let now = Utc::now();
        let account_number = opening
            .account_number
            .unwrap_or_else(|| Self::generate_account_number(opening.product_type));

        let account = Account {
            id: Uuid::new_v4(),
            account_number: account_number.clone(),
            customer_id: opening.customer_id,
            product_type: opening.product_type,
            account_type: opening.product_type.ledger_account_type(),
            currency: opening.currency,
            name: opening.name,
            state: AccountState::Active,
            interest_rate: opening.interest_rate,
            credit_limit: opening.credit_limit,
            minimum_balance: opening.minimum_balance,
            daily_transaction_limit: opening.daily_transaction_limit,
            monthly_transaction_limit: opening.monthly_transaction_limit,
            created_at: now,
            updated_at: now,
        };
        account.validate_currency_consistency()?;

        self.save_account(&account)?;
        self.audit.record(
            AuditEventType::AccountCreated,
            "account",
            &account.id.to_string(),
            BTreeMap::from([
                ("account_number".to_string(), account_number),
                ("customer_id".to_string(), account.customer_id.to_string()),
                ("product_type".to_string(), account.product_type.to_string()),
                ("currency".to_string(), account.currency.code().to_string()),
                ("name".to_string(), account.name.clone()),
            ]),
        )?;
        self.observer
            .on_account_event(&account, AuditEventType::AccountCreated);

        tracing::info!(
            account_id = %account.id,
            product = %account.product_type,
            "account created"
        );
        Ok(account)
    }

    fn account(&self, account_id: Uuid) -> BankingResult<Option<Account>> {
        load_model::<AccountModel>(self.storage.as_ref(), &account_id.to_string())?
            .map(AccountMapper::from_model)
            .transpose()
    }

    fn account_by_number(&self, account_number: &str) -> BankingResult<Option<Account>> {
        let models: Vec<AccountModel> = find_models(
            self.storage.as_ref(),
            &[("account_number", json!(account_number))],
        )?;
        models
            .into_iter()
            .next()
            .map(AccountMapper::from_model)
            .transpose()
    }

    fn customer_accounts(&self, customer_id: Uuid) -> BankingResult<Vec<Account>> {
        let models: Vec<AccountModel> = find_models(
            self.storage.as_ref(),
            &[("customer_id", json!(customer_id))],
        )?;
        models.into_iter().map(AccountMapper::from_model).collect()
    }

    fn update_state(
        &self,
        account_id: Uuid,
        new_state: AccountState,
        reason: &str,
    ) -> BankingResult<Account> {
        let mut account = self.require_account(account_id)?;
        let old_state = account.state;
        account.state = new_state;
        account.updated_at = Utc::now();
        self.save_account(&account)?;

        let event_type = match (old_state, new_state) {
            (_, AccountState::Frozen) => AuditEventType::AccountFrozen,
            (AccountState::Frozen, AccountState::Active) => AuditEventType::AccountUnfrozen,
            (_, AccountState::Closed) => AuditEventType::AccountClosed,
            _ => AuditEventType::AccountUpdated,
        };
        self.audit.record(
            event_type,
            "account",
            &account.id.to_string(),
            BTreeMap::from([
                ("old_state".to_string(), old_state.to_string()),
                ("new_state".to_string(), new_state.to_string()),
                ("reason".to_string(), reason.to_string()),
            ]),
        )?;
        self.observer.on_account_event(&account, event_type);

        Ok(account)
    }

    fn freeze_account(&self, account_id: Uuid, reason: &str) -> BankingResult<Account> {
        self.update_state(account_id, AccountState::Frozen, reason)
    }

    fn unfreeze_account(&self, account_id: Uuid, reason: &str) -> BankingResult<Account> {
        self.update_state(account_id, AccountState::Active, reason)
    }

    fn close_account(&self, account_id: Uuid, reason: &str) -> BankingResult<Account> {
        let account = self.require_account(account_id)?;
        if account.is_deposit_product() {
            let balance = self.book_balance(account_id)?;
            if !balance.is_zero() {
                return Err(BankingError::validation(
                    "balance",
                    format!("cannot close account with non-zero balance: {balance}"),
                ));
            }
        }
        self.update_state(account_id, AccountState::Closed, reason)
    }

    fn update_interest_rate(&self, account_id: Uuid, new_rate: Decimal) -> BankingResult<Account> {
        let mut account = self.require_account(account_id)?;
        account.interest_rate = Some(new_rate);
        account.updated_at = Utc::now();
        self.save_account(&account)?;

        self.audit.record(
            AuditEventType::AccountUpdated,
            "account",
            &account.id.to_string(),
            BTreeMap::from([("new_interest_rate".to_string(), new_rate.to_string())]),
        )?;
        Ok(account)
    }

    fn update_credit_limit(&self, account_id: Uuid, new_limit: Money) -> BankingResult<Account> {
        let mut account = self.require_account(account_id)?;
        if new_limit.currency() != account.currency {
            return Err(BankingError::CurrencyMismatch {
                expected: account.currency,
                actual: new_limit.currency(),
            });
        }
        account.credit_limit = Some(new_limit);
        account.updated_at = Utc::now();
        self.save_account(&account)?;
        Ok(account)
    }

    fn place_hold(
        &self,
        account_id: Uuid,
        amount: Money,
        reason: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> BankingResult<AccountHold> {
        let account = self.require_account(account_id)?;
        if amount.currency() != account.currency {
            return Err(BankingError::CurrencyMismatch {
                expected: account.currency,
                actual: amount.currency(),
            });
        }
        if !amount.is_positive() {
            return Err(BankingError::validation(
                "amount",
                "hold amount must be positive",
            ));
        }

        let now = Utc::now();
        let hold = AccountHold {
            id: Uuid::new_v4(),
            account_id,
            amount,
            reason: reason.to_string(),
            expires_at,
            released_at: None,
            created_at: now,
            updated_at: now,
        };
        save_model(self.storage.as_ref(), &AccountHoldMapper::to_model(&hold))?;

        self.audit.record(
            AuditEventType::AccountHoldPlaced,
            "account",
            &account_id.to_string(),
            BTreeMap::from([
                ("hold_id".to_string(), hold.id.to_string()),
                ("amount".to_string(), amount.to_string()),
                ("reason".to_string(), reason.to_string()),
            ]),
        )?;
        Ok(hold)
    }

    fn release_hold(&self, hold_id: Uuid, reason: &str) -> BankingResult<AccountHold> {
        let model: AccountHoldModel =
            load_model(self.storage.as_ref(), &hold_id.to_string())?
                .ok_or_else(|| BankingError::not_found("hold", hold_id))?;
        let mut hold = AccountHoldMapper::from_model(model)?;

        if hold.released_at.is_some() {
            return Err(BankingError::bad_state(
                "hold",
                hold_id,
                "released",
                "active",
            ));
        }

        let now = Utc::now();
        hold.released_at = Some(now);
        hold.updated_at = now;
        save_model(self.storage.as_ref(), &AccountHoldMapper::to_model(&hold))?;

        self.audit.record(
            AuditEventType::AccountHoldReleased,
            "account",
            &hold.account_id.to_string(),
            BTreeMap::from([
                ("hold_id".to_string(), hold_id.to_string()),
                ("amount".to_string(), hold.amount.to_string()),
                ("reason".to_string(), reason.to_string()),
            ]),
        )?;
        Ok(hold)
    }

    fn active_holds(&self, account_id: Uuid) -> BankingResult<Vec<AccountHold>> {
        let models: Vec<AccountHoldModel> = find_models(
            self.storage.as_ref(),
            &[("account_id", json!(account_id))],
        )?;
        let now = Utc::now();
        let holds = models
            .into_iter()
            .map(AccountHoldMapper::from_model)
            .collect::<BankingResult<Vec<_>>>()?;
        Ok(holds.into_iter().filter(|hold| hold.is_active(now)).collect())
    }

    fn book_balance(&self, account_id: Uuid) -> BankingResult<Money> {
        let account = self.require_account(account_id)?;
        let balance = self.ledger.account_balance(
            account_id,
            account.account_type,
            account.currency,
            None,
        )?;

        // The one place the credit-line sign convention flips: in the
        // customer frame, owed money reads negative.
        if account.is_credit_product() {
            return Ok(balance.negate());
        }
        Ok(balance)
    }

    fn available_balance(&self, account_id: Uuid) -> BankingResult<Money> {
        let account = self.require_account(account_id)?;
        let mut available = self.book_balance(account_id)?;

        available = available.checked_sub(&self.holds_total(&account)?)?;

        if account.is_liability_account() {
            if let Some(credit_limit) = account.credit_limit {
                available = available.checked_add(&credit_limit)?;
            }
        }
        Ok(available)
    }

    fn credit_available(&self, account_id: Uuid) -> BankingResult<Money> {
        let account = self.require_account(account_id)?;
        if !account.is_credit_product() {
            return Err(BankingError::validation(
                "account",
                "account is not a credit product",
            ));
        }
        let Some(credit_limit) = account.credit_limit else {
            return Ok(Money::zero(account.currency));
        };

        let book = self.book_balance(account_id)?;
        let used = if book.is_negative() {
            book.negate()
        } else {
            Money::zero(account.currency)
        };

        let mut available = credit_limit.checked_sub(&used)?;
        available = available.checked_sub(&self.holds_total(&account)?)?;

        if available.is_positive() {
            Ok(available)
        } else {
            Ok(Money::zero(account.currency))
        }
    }
}
