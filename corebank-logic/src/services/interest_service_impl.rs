use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;

use corebank_api::domain::{
    Account, AccountState, AuditEventType, CompoundingFrequency, GracePeriodTracker,
    InterestAccrual, InterestRateConfig, Money, NewTransaction, ProductType, TransactionChannel,
    TransactionState, TransactionType,
};
use corebank_api::service::{
    AccountAccrual, AccountService, AccrualRunReport, AuditTrail, InterestPosting,
    InterestPostingReport, InterestService, TransactionService,
};
use corebank_api::{BankingError, BankingResult};
use corebank_db::models::{AccountModel, GracePeriodModel, InterestAccrualModel};
use corebank_db::StorageInterface;

use crate::config::CoreConfig;
use crate::mappers::{AccountMapper, GracePeriodMapper, InterestAccrualMapper, InterestRateConfigMapper};
use crate::services::{all_models, find_models, save_model};

pub struct InterestServiceImpl {
    storage: Arc<dyn StorageInterface>,
    accounts: Arc<dyn AccountService>,
    transactions: Arc<dyn TransactionService>,
    audit: Arc<dyn AuditTrail>,
    config: Arc<CoreConfig>,
}

impl InterestServiceImpl {
    pub fn new(
        storage: Arc<dyn StorageInterface>,
        accounts: Arc<dyn AccountService>,
        transactions: Arc<dyn TransactionService>,
        audit: Arc<dyn AuditTrail>,
        config: Arc<CoreConfig>,
    ) -> BankingResult<Self> {
        let service = InterestServiceImpl {
            storage,
            accounts,
            transactions,
            audit,
            config,
        };
        service.seed_default_rate_configs()?;
        Ok(service)
    }

    /// Install the configured default rates for any (product, currency)
    /// pair that has no stored configuration yet.
    fn seed_default_rate_configs(&self) -> BankingResult<()> {
        for default in &self.config.interest.default_rates {
            if self
                .rate_config(default.product_type, default.currency)?
                .is_some()
            {
                continue;
            }
            let now = Utc::now();
            let config = InterestRateConfig {
                id: Uuid::new_v4(),
                product_type: default.product_type,
                currency: default.currency,
                annual_rate: default.annual_rate,
                calculation_method: default.calculation_method,
                compounding_frequency: CompoundingFrequency::Daily,
                minimum_balance: default
                    .minimum_balance
                    .map(|amount| Money::new(amount, default.currency)),
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            config.validate()?;
            save_model(
                self.storage.as_ref(),
                &InterestRateConfigMapper::to_model(&config),
            )?;
        }
        Ok(())
    }

    /// Rate resolution: an account-level rate wins, with the account's own
    /// minimum-balance floor; otherwise the (product, currency) default,
    /// tightened to the account's floor when that is higher. The configured
    /// rate is always used as-is.
    fn rate_config_for_account(
        &self,
        account: &Account,
    ) -> BankingResult<Option<InterestRateConfig>> {
        if let Some(rate) = account.interest_rate {
            let now = Utc::now();
            let config = InterestRateConfig {
                // Account-level overrides are synthesized per run and keyed
                // by the account id.
                id: account.id,
                product_type: account.product_type,
                currency: account.currency,
                annual_rate: rate,
                calculation_method:
                    corebank_api::domain::InterestCalculationMethod::Actual365,
                compounding_frequency: CompoundingFrequency::Daily,
                minimum_balance: account.minimum_balance,
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            config.validate()?;
            return Ok(Some(config));
        }

        let Some(mut config) = self.rate_config(account.product_type, account.currency)? else {
            return Ok(None);
        };
        if let Some(account_minimum) = account.minimum_balance {
            let tighter = match &config.minimum_balance {
                Some(config_minimum) => account_minimum > *config_minimum,
                None => true,
            };
            if tighter {
                config.minimum_balance = Some(account_minimum);
            }
        }
        Ok(Some(config))
    }

    fn accrual_exists(&self, account_id: Uuid, accrual_date: NaiveDate) -> BankingResult<bool> {
        let rows: Vec<InterestAccrualModel> = find_models(
            self.storage.as_ref(),
            &[
                ("account_id", json!(account_id)),
                ("accrual_date", json!(accrual_date)),
            ],
        )?;
        Ok(!rows.is_empty())
    }

    fn unposted_accruals(&self, account_id: Uuid) -> BankingResult<Vec<InterestAccrual>> {
        let rows: Vec<InterestAccrualModel> = find_models(
            self.storage.as_ref(),
            &[("account_id", json!(account_id)), ("posted", json!(false))],
        )?;
        rows.into_iter().map(InterestAccrualMapper::from_model).collect()
    }

    /// Positive "amount owed / amount on deposit" basis for the day's
    /// accrual, or None when nothing should accrue.
    fn principal_basis(
        &self,
        account: &Account,
        config: &InterestRateConfig,
    ) -> BankingResult<Option<Money>> {
        let book = self.accounts.book_balance(account.id)?;
        match account.product_type {
            ProductType::Savings | ProductType::Checking => {
                if !book.is_positive() {
                    return Ok(None);
                }
                if let Some(minimum) = &config.minimum_balance {
                    if book < *minimum {
                        return Ok(None);
                    }
                }
                Ok(Some(book))
            }
            ProductType::CreditLine => {
                // Customer frame: owed money reads negative.
                if !book.is_negative() {
                    return Ok(None);
                }
                if let Some(tracker) = self.current_grace_period(account.id)? {
                    if tracker.is_grace_period_valid() {
                        return Ok(None);
                    }
                }
                Ok(Some(book.negate()))
            }
            ProductType::Loan => {
                // Liability frame: outstanding principal reads positive.
                if !book.is_positive() {
                    return Ok(None);
                }
                Ok(Some(book))
            }
            ProductType::GlInternal => Ok(None),
        }
    }

    fn accrue_for_account(
        &self,
        account: &Account,
        accrual_date: NaiveDate,
    ) -> BankingResult<Option<InterestAccrual>> {
        if self.accrual_exists(account.id, accrual_date)? {
            return Ok(None);
        }
        let Some(config) = self.rate_config_for_account(account)? else {
            return Ok(None);
        };
        let Some(principal) = self.principal_basis(account, &config)? else {
            return Ok(None);
        };

        let daily_rate = config.daily_rate();
        let accrued = principal.mul(daily_rate);

        let mut cumulative = Money::zero(account.currency);
        for previous in self.unposted_accruals(account.id)? {
            cumulative = cumulative.checked_add(&previous.accrued_amount)?;
        }
        cumulative = cumulative.checked_add(&accrued)?;

        let now = Utc::now();
        let accrual = InterestAccrual {
            id: Uuid::new_v4(),
            account_id: account.id,
            accrual_date,
            principal_balance: principal,
            daily_rate,
            accrued_amount: accrued,
            cumulative_accrued: cumulative,
            calculation_method: config.calculation_method,
            rate_config_id: config.id,
            posted: false,
            created_at: now,
            updated_at: now,
        };
        save_model(
            self.storage.as_ref(),
            &InterestAccrualMapper::to_model(&accrual),
        )?;

        self.audit.record(
            AuditEventType::InterestAccrued,
            "account",
            &account.id.to_string(),
            BTreeMap::from([
                ("accrual_date".to_string(), accrual_date.to_string()),
                ("accrued_amount".to_string(), accrued.to_string()),
                ("principal_balance".to_string(), principal.to_string()),
                ("daily_rate".to_string(), daily_rate.to_string()),
            ]),
        )?;
        Ok(Some(accrual))
    }

    fn month_bounds(month: u32, year: i32) -> BankingResult<(NaiveDate, NaiveDate)> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| BankingError::validation("month", "invalid posting month"))?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| BankingError::validation("month", "invalid posting month"))?;
        let end = next_month
            .pred_opt()
            .ok_or_else(|| BankingError::validation("month", "invalid posting month"))?;
        Ok((start, end))
    }

    /// Post one account's accrued interest as a transaction through the
    /// processor, collapsing retries via the stable `INT-` idempotency key.
    fn post_for_account(
        &self,
        account: &Account,
        accruals: &mut [InterestAccrual],
        month: u32,
        year: i32,
    ) -> BankingResult<Option<Uuid>> {
        let mut total = Money::zero(account.currency);
        for accrual in accruals.iter() {
            total = total.checked_add(&accrual.accrued_amount)?;
        }
        // Totals below one cent are carried, not posted.
        if total.amount() < rust_decimal::Decimal::new(1, 2) {
            return Ok(None);
        }

        let period = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| BankingError::validation("month", "invalid posting month"))?;
        let period_label = period.format("%B %Y");
        let reference = format!("INT-{}-{year}{month:02}", account.id);

        let request = match account.product_type {
            ProductType::Savings | ProductType::Checking => NewTransaction::new(
                TransactionType::InterestCredit,
                total,
                &format!("Interest earned for {period_label}"),
                TransactionChannel::System,
            )
            .to_account(account.id)
            .idempotency_key(&reference),
            ProductType::CreditLine | ProductType::Loan => NewTransaction::new(
                TransactionType::InterestDebit,
                total,
                &format!("Interest charged for {period_label}"),
                TransactionChannel::System,
            )
            .from_account(account.id)
            .idempotency_key(&reference),
            ProductType::GlInternal => {
                return Err(BankingError::validation(
                    "product_type",
                    "interest posting not supported for internal accounts",
                ))
            }
        };

        let created = self.transactions.create_transaction(request)?;
        let transaction = if created.state == TransactionState::Pending {
            self.transactions.process_transaction(created.id)?
        } else {
            // A previous run already posted this month's interest; just
            // finish marking the accruals.
            created
        };

        for accrual in accruals.iter_mut() {
            accrual.posted = true;
            accrual.updated_at = Utc::now();
            save_model(
                self.storage.as_ref(),
                &InterestAccrualMapper::to_model(accrual),
            )?;
        }

        self.audit.record(
            AuditEventType::InterestPosted,
            "account",
            &account.id.to_string(),
            BTreeMap::from([
                ("transaction_id".to_string(), transaction.id.to_string()),
                ("interest_amount".to_string(), total.to_string()),
                ("accrual_count".to_string(), accruals.len().to_string()),
                ("period".to_string(), format!("{year}-{month:02}")),
            ]),
        )?;
        Ok(Some(transaction.id))
    }

    fn log_job_error(&self, entity_id: Uuid, job: &str, message: &str) {
        let _ = self.audit.record(
            AuditEventType::JobError,
            "account",
            &entity_id.to_string(),
            BTreeMap::from([
                ("job".to_string(), job.to_string()),
                ("error".to_string(), message.to_string()),
            ]),
        );
    }
}

impl InterestService for InterestServiceImpl {
    fn run_daily_accrual(&self, accrual_date: NaiveDate) -> BankingResult<AccrualRunReport> {
        let models: Vec<AccountModel> = all_models(self.storage.as_ref())?;
        let accounts = models
            .into_iter()
            .map(AccountMapper::from_model)
            .collect::<BankingResult<Vec<_>>>()?;

        let mut report = AccrualRunReport {
            accrual_date,
            accounts_processed: 0,
            accruals: Vec::new(),
            errors: Vec::new(),
        };

        for account in accounts
            .iter()
            .filter(|account| account.state == AccountState::Active)
        {
            report.accounts_processed += 1;
            match self.accrue_for_account(account, accrual_date) {
                Ok(Some(accrual)) => report.accruals.push(AccountAccrual {
                    account_id: account.id,
                    product_type: account.product_type,
                    principal_balance: accrual.principal_balance,
                    daily_rate: accrual.daily_rate,
                    accrued_amount: accrual.accrued_amount,
                }),
                Ok(None) => {}
                Err(error) => {
                    let message = format!("accrual failed for {}: {error}", account.id);
                    self.log_job_error(account.id, "daily_accrual", &message);
                    report.errors.push(message);
                }
            }
        }

        tracing::info!(
            date = %accrual_date,
            accruals = report.accruals.len(),
            errors = report.errors.len(),
            "daily interest accrual complete"
        );
        Ok(report)
    }

    fn post_monthly_interest(
        &self,
        month: u32,
        year: i32,
    ) -> BankingResult<InterestPostingReport> {
        let (start, end) = Self::month_bounds(month, year)?;

        let rows: Vec<InterestAccrualModel> =
            find_models(self.storage.as_ref(), &[("posted", json!(false))])?;
        let mut by_account: HashMap<Uuid, Vec<InterestAccrual>> = HashMap::new();
        for row in rows {
            let accrual = InterestAccrualMapper::from_model(row)?;
            // Exactly the requested month; nothing outside it is swept in.
            if accrual.accrual_date >= start && accrual.accrual_date <= end {
                by_account.entry(accrual.account_id).or_default().push(accrual);
            }
        }

        let mut report = InterestPostingReport {
            month,
            year,
            postings: Vec::new(),
            errors: Vec::new(),
        };

        for (account_id, mut accruals) in by_account {
            let result = self
                .accounts
                .account(account_id)?
                .ok_or_else(|| BankingError::not_found("account", account_id))
                .and_then(|account| {
                    let posted =
                        self.post_for_account(&account, &mut accruals, month, year)?;
                    Ok((account, posted))
                });
            match result {
                Ok((account, Some(transaction_id))) => {
                    let mut total = Money::zero(account.currency);
                    for accrual in &accruals {
                        total = total.checked_add(&accrual.accrued_amount)?;
                    }
                    report.postings.push(InterestPosting {
                        account_id,
                        product_type: account.product_type,
                        transaction_id,
                        amount: total,
                        accrual_count: accruals.len(),
                    });
                }
                Ok((_, None)) => {}
                Err(error) => {
                    let message = format!("interest posting failed for {account_id}: {error}");
                    self.log_job_error(account_id, "monthly_interest_posting", &message);
                    report.errors.push(message);
                }
            }
        }

        tracing::info!(
            month,
            year,
            postings = report.postings.len(),
            errors = report.errors.len(),
            "monthly interest posting complete"
        );
        Ok(report)
    }

    fn update_grace_period_status(
        &self,
        account_id: Uuid,
        payment_amount: Money,
        payment_date: NaiveDate,
    ) -> BankingResult<Option<GracePeriodTracker>> {
        let account = self
            .accounts
            .account(account_id)?
            .ok_or_else(|| BankingError::not_found("account", account_id))?;
        if account.product_type != ProductType::CreditLine {
            return Ok(None);
        }
        let Some(mut tracker) = self.current_grace_period(account_id)? else {
            return Ok(None);
        };

        if payment_amount >= tracker.statement_balance {
            tracker.full_payment_received = true;
            tracker.updated_at = Utc::now();
            save_model(self.storage.as_ref(), &GracePeriodMapper::to_model(&tracker))?;
        } else if payment_date > tracker.due_date && tracker.is_grace_period_valid() {
            // Late partial payment: interest accrues from here on.
            tracker.grace_period_active = false;
            tracker.grace_period_lost_date = Some(payment_date);
            tracker.updated_at = Utc::now();
            save_model(self.storage.as_ref(), &GracePeriodMapper::to_model(&tracker))?;
            tracing::info!(%account_id, "grace period lost");
        }
        Ok(Some(tracker))
    }

    fn create_grace_period(
        &self,
        account_id: Uuid,
        statement_date: NaiveDate,
        statement_balance: Money,
        due_date: NaiveDate,
    ) -> BankingResult<GracePeriodTracker> {
        let now = Utc::now();
        let tracker = GracePeriodTracker {
            id: Uuid::new_v4(),
            account_id,
            statement_date,
            statement_balance,
            due_date,
            grace_period_active: true,
            full_payment_received: false,
            grace_period_lost_date: None,
            created_at: now,
            updated_at: now,
        };
        save_model(self.storage.as_ref(), &GracePeriodMapper::to_model(&tracker))?;
        Ok(tracker)
    }

    fn current_grace_period(
        &self,
        account_id: Uuid,
    ) -> BankingResult<Option<GracePeriodTracker>> {
        let rows: Vec<GracePeriodModel> = find_models(
            self.storage.as_ref(),
            &[("account_id", json!(account_id))],
        )?;
        let mut trackers = rows
            .into_iter()
            .map(GracePeriodMapper::from_model)
            .collect::<BankingResult<Vec<_>>>()?;
        trackers.sort_by_key(|tracker| tracker.statement_date);
        Ok(trackers.pop())
    }

    fn upsert_rate_config(&self, config: InterestRateConfig) -> BankingResult<InterestRateConfig> {
        config.validate()?;
        save_model(
            self.storage.as_ref(),
            &InterestRateConfigMapper::to_model(&config),
        )?;
        Ok(config)
    }

    fn rate_config(
        &self,
        product_type: ProductType,
        currency: corebank_api::domain::Currency,
    ) -> BankingResult<Option<InterestRateConfig>> {
        let rows: Vec<corebank_db::models::InterestRateConfigModel> = find_models(
            self.storage.as_ref(),
            &[
                ("product_type", json!(product_type)),
                ("currency", json!(currency.code())),
                ("is_active", json!(true)),
            ],
        )?;
        rows.into_iter()
            .next()
            .map(InterestRateConfigMapper::from_model)
            .transpose()
    }
}
