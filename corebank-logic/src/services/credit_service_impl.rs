use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;

use corebank_api::domain::{
    Account, AuditEventType, CreditStatement, CreditTransaction, CreditTransactionCategory,
    Money, NewTransaction, ProductType, StatementStatus, TransactionChannel, TransactionType,
};
use corebank_api::service::{
    AccountService, AuditTrail, CreditLineService, InterestService, OverdueRunReport,
    TransactionService,
};
use corebank_api::{BankingError, BankingResult};
use corebank_db::models::{CreditStatementModel, CreditTransactionModel};
use corebank_db::{StorageExt, StorageInterface};

use crate::config::CoreConfig;
use crate::mappers::{CreditStatementMapper, CreditTransactionMapper};
use crate::services::{all_models, find_models, load_model, save_model};

pub struct CreditLineServiceImpl {
    storage: Arc<dyn StorageInterface>,
    accounts: Arc<dyn AccountService>,
    transactions: Arc<dyn TransactionService>,
    interest: Arc<dyn InterestService>,
    audit: Arc<dyn AuditTrail>,
    config: Arc<CoreConfig>,
}

impl CreditLineServiceImpl {
    pub fn new(
        storage: Arc<dyn StorageInterface>,
        accounts: Arc<dyn AccountService>,
        transactions: Arc<dyn TransactionService>,
        interest: Arc<dyn InterestService>,
        audit: Arc<dyn AuditTrail>,
        config: Arc<CoreConfig>,
    ) -> Self {
        CreditLineServiceImpl {
            storage,
            accounts,
            transactions,
            interest,
            audit,
            config,
        }
    }

    fn require_credit_line(&self, account_id: Uuid) -> BankingResult<Account> {
        let account = self
            .accounts
            .account(account_id)?
            .ok_or_else(|| BankingError::not_found("account", account_id))?;
        if account.product_type != ProductType::CreditLine {
            return Err(BankingError::validation(
                "account",
                "account must be a credit line",
            ));
        }
        Ok(account)
    }

    fn save_statement(&self, statement: &CreditStatement) -> BankingResult<()> {
        save_model(
            self.storage.as_ref(),
            &CreditStatementMapper::to_model(statement),
        )
    }

    fn save_credit_transaction(&self, credit_txn: &CreditTransaction) -> BankingResult<()> {
        save_model(
            self.storage.as_ref(),
            &CreditTransactionMapper::to_model(credit_txn),
        )
    }

    fn latest_statement(&self, account_id: Uuid) -> BankingResult<Option<CreditStatement>> {
        Ok(self.account_statements(account_id, Some(1))?.into_iter().next())
    }

    /// Charge a fee through the processor and classify it on the line.
    fn charge_fee(
        &self,
        account_id: Uuid,
        fee_amount: Money,
        description: &str,
    ) -> BankingResult<Uuid> {
        let request = NewTransaction::new(
            TransactionType::Fee,
            fee_amount,
            description,
            TransactionChannel::System,
        )
        .from_account(account_id);
        let created = self.transactions.create_transaction(request)?;
        let processed = self.transactions.process_transaction(created.id)?;

        let today = Utc::now().date_naive();
        self.record_credit_transaction(
            account_id,
            processed.id,
            CreditTransactionCategory::Fee,
            fee_amount,
            description,
            today,
            today,
        )?;
        Ok(processed.id)
    }

    /// Grace applies when the prior statement was paid in full (or there is
    /// no prior statement), and only for grace-eligible categories.
    fn grace_applies(
        &self,
        account_id: Uuid,
        category: CreditTransactionCategory,
    ) -> BankingResult<bool> {
        if !category.eligible_for_grace() {
            return Ok(false);
        }
        match self.latest_statement(account_id)? {
            None => Ok(true),
            Some(previous) => Ok(previous.is_paid_full()),
        }
    }

    fn minimum_payment(
        &self,
        current_balance: &Money,
        interest_charged: &Money,
        fees_charged: &Money,
    ) -> BankingResult<Money> {
        let currency = current_balance.currency();
        if !current_balance.is_positive() {
            return Ok(Money::zero(currency));
        }

        let percentage = current_balance.mul(self.config.credit.minimum_payment_rate);

        let mut required = interest_charged.checked_add(fees_charged)?;
        if *current_balance > Money::new(rust_decimal::Decimal::from(1_000), currency) {
            required = required.checked_add(&Money::new(
                rust_decimal::Decimal::from(10),
                currency,
            ))?;
        }

        let floor = self.config.credit_minimum_payment_floor(currency);
        let minimum = percentage.max_of(required)?.max_of(floor)?;

        // Never ask for more than the balance itself.
        minimum.min_of(*current_balance)
    }

    fn update_statement_payments(
        &self,
        account_id: Uuid,
        payment_amount: Money,
        payment_date: NaiveDate,
    ) -> BankingResult<()> {
        let Some(mut statement) = self.current_statement(account_id)? else {
            return Ok(());
        };
        statement.paid_amount = statement.paid_amount.checked_add(&payment_amount)?;
        statement.paid_date = Some(payment_date);
        statement.updated_at = Utc::now();

        if statement.is_paid_full() {
            statement.status = StatementStatus::PaidFull;
        } else if statement.is_minimum_paid() {
            statement.status = StatementStatus::PaidMinimum;
        }
        self.save_statement(&statement)
    }

    fn credit_transactions_since(
        &self,
        account_id: Uuid,
        since: Option<NaiveDate>,
    ) -> BankingResult<Vec<CreditTransaction>> {
        let models: Vec<CreditTransactionModel> = find_models(
            self.storage.as_ref(),
            &[("account_id", json!(account_id))],
        )?;
        let mut transactions = models
            .into_iter()
            .map(CreditTransactionMapper::from_model)
            .collect::<BankingResult<Vec<_>>>()?;
        if let Some(since) = since {
            transactions.retain(|txn| txn.post_date > since);
        }
        transactions.sort_by_key(|txn| txn.post_date);
        Ok(transactions)
    }
}

impl CreditLineService for CreditLineServiceImpl {
    fn record_credit_transaction(
        &self,
        account_id: Uuid,
        transaction_id: Uuid,
        category: CreditTransactionCategory,
        amount: Money,
        description: &str,
        transaction_date: NaiveDate,
        post_date: NaiveDate,
    ) -> BankingResult<CreditTransaction> {
        self.require_credit_line(account_id)?;

        // Spending past the available credit costs an overlimit fee, charged
        // before the transaction is classified.
        if matches!(
            category,
            CreditTransactionCategory::Purchase | CreditTransactionCategory::CashAdvance
        ) {
            let available = self.accounts.credit_available(account_id)?;
            if amount > available {
                let fee = self.config.credit_overlimit_fee(amount.currency());
                self.charge_fee(account_id, fee, "Overlimit fee")?;
                tracing::info!(%account_id, "overlimit fee charged");
            }
        }

        let now = Utc::now();
        let credit_txn = CreditTransaction {
            id: Uuid::new_v4(),
            account_id,
            transaction_id,
            category,
            amount,
            transaction_date,
            post_date,
            description: description.to_string(),
            eligible_for_grace: category.eligible_for_grace(),
            grace_period_applies: self.grace_applies(account_id, category)?,
            interest_charged: Money::zero(amount.currency()),
            statement_id: None,
            created_at: now,
            updated_at: now,
        };
        self.save_credit_transaction(&credit_txn)?;

        let event_type = if category == CreditTransactionCategory::Payment {
            AuditEventType::CreditPaymentMade
        } else {
            AuditEventType::TransactionCreated
        };
        self.audit.record(
            event_type,
            "credit_account",
            &account_id.to_string(),
            BTreeMap::from([
                ("credit_transaction_id".to_string(), credit_txn.id.to_string()),
                ("transaction_id".to_string(), transaction_id.to_string()),
                ("amount".to_string(), amount.to_string()),
                (
                    "eligible_for_grace".to_string(),
                    credit_txn.eligible_for_grace.to_string(),
                ),
            ]),
        )?;
        Ok(credit_txn)
    }

    fn make_payment(
        &self,
        account_id: Uuid,
        amount: Money,
        payment_date: NaiveDate,
    ) -> BankingResult<Uuid> {
        self.require_credit_line(account_id)?;

        self.storage.atomic(|| {
            let request = NewTransaction::new(
                TransactionType::Payment,
                amount,
                "Credit line payment",
                TransactionChannel::Online,
            )
            .to_account(account_id);
            let created = self.transactions.create_transaction(request)?;
            let processed = self.transactions.process_transaction(created.id)?;

            self.record_credit_transaction(
                account_id,
                processed.id,
                CreditTransactionCategory::Payment,
                amount,
                "Payment received",
                payment_date,
                payment_date,
            )?;

            self.interest
                .update_grace_period_status(account_id, amount, payment_date)?;
            self.update_statement_payments(account_id, amount, payment_date)?;

            tracing::info!(%account_id, amount = %amount, "credit line payment applied");
            Ok(processed.id)
        })
    }

    fn generate_statement(
        &self,
        account_id: Uuid,
        statement_date: NaiveDate,
    ) -> BankingResult<CreditStatement> {
        let account = self.require_credit_line(account_id)?;
        let credit_limit = account.credit_limit.ok_or_else(|| {
            BankingError::validation("credit_limit", "credit line has no limit configured")
        })?;
        let currency = account.currency;

        let previous_statement = self.latest_statement(account_id)?;
        let previous_balance = previous_statement
            .as_ref()
            .map(|statement| statement.current_balance)
            .unwrap_or_else(|| Money::zero(currency));
        let since = previous_statement
            .as_ref()
            .map(|statement| statement.statement_date);

        let mut transactions = self.credit_transactions_since(account_id, since)?;

        let mut new_charges = Money::zero(currency);
        let mut payments_credits = Money::zero(currency);
        let mut interest_charged = Money::zero(currency);
        let mut fees_charged = Money::zero(currency);
        for txn in &transactions {
            match txn.category {
                category if category.is_charge() => {
                    new_charges = new_charges.checked_add(&txn.amount)?;
                }
                CreditTransactionCategory::Payment => {
                    payments_credits = payments_credits.checked_add(&txn.amount)?;
                }
                CreditTransactionCategory::Interest => {
                    interest_charged = interest_charged.checked_add(&txn.amount)?;
                }
                CreditTransactionCategory::Fee => {
                    fees_charged = fees_charged.checked_add(&txn.amount)?;
                }
                _ => {}
            }
        }

        let current_balance = previous_balance
            .checked_add(&new_charges)?
            .checked_add(&interest_charged)?
            .checked_add(&fees_charged)?
            .checked_sub(&payments_credits)?;

        let minimum_payment =
            self.minimum_payment(&current_balance, &interest_charged, &fees_charged)?;

        let mut available_credit = credit_limit.checked_sub(&current_balance)?;
        if available_credit.is_negative() {
            available_credit = Money::zero(currency);
        }

        let due_date =
            statement_date + Duration::days(i64::from(self.config.credit.grace_period_days));

        let now = Utc::now();
        let statement = CreditStatement {
            id: Uuid::new_v4(),
            account_id,
            statement_date,
            due_date,
            previous_balance,
            new_charges,
            payments_credits,
            interest_charged,
            fees_charged,
            current_balance,
            minimum_payment_due: minimum_payment,
            available_credit,
            credit_limit,
            grace_period_active: true,
            status: StatementStatus::Current,
            paid_amount: Money::zero(currency),
            paid_date: None,
            created_at: now,
            updated_at: now,
        };
        statement.validate_currency_consistency()?;
        self.save_statement(&statement)?;

        // Bill the included transactions onto this statement.
        for txn in &mut transactions {
            txn.statement_id = Some(statement.id);
            txn.updated_at = now;
            self.save_credit_transaction(txn)?;
        }

        if !current_balance.is_zero() {
            self.interest.create_grace_period(
                account_id,
                statement_date,
                current_balance,
                due_date,
            )?;
        }

        self.audit.record(
            AuditEventType::CreditStatementGenerated,
            "credit_account",
            &account_id.to_string(),
            BTreeMap::from([
                ("statement_id".to_string(), statement.id.to_string()),
                ("statement_date".to_string(), statement_date.to_string()),
                ("due_date".to_string(), due_date.to_string()),
                ("current_balance".to_string(), current_balance.to_string()),
                ("minimum_payment".to_string(), minimum_payment.to_string()),
            ]),
        )?;

        tracing::info!(
            %account_id,
            balance = %current_balance,
            "credit statement generated"
        );
        Ok(statement)
    }

    fn process_overdue_statements(&self, today: NaiveDate) -> BankingResult<OverdueRunReport> {
        let models: Vec<CreditStatementModel> = all_models(self.storage.as_ref())?;
        let statements = models
            .into_iter()
            .map(CreditStatementMapper::from_model)
            .collect::<BankingResult<Vec<_>>>()?;

        let mut report = OverdueRunReport {
            statements_processed: 0,
            late_fees_charged: 0,
            errors: Vec::new(),
        };

        for mut statement in statements
            .into_iter()
            .filter(|statement| statement.status == StatementStatus::Current)
        {
            if !statement.is_overdue(today) || statement.is_minimum_paid() {
                continue;
            }
            report.statements_processed += 1;

            let fee = self
                .config
                .credit_late_fee(statement.current_balance.currency());
            match self.charge_fee(statement.account_id, fee, "Late payment fee") {
                Ok(_) => {
                    report.late_fees_charged += 1;
                    statement.status = StatementStatus::Overdue;
                    statement.updated_at = Utc::now();
                    self.save_statement(&statement)?;
                }
                Err(error) => {
                    let message = format!(
                        "late fee failed for statement {}: {error}",
                        statement.id
                    );
                    let _ = self.audit.record(
                        AuditEventType::JobError,
                        "credit_account",
                        &statement.account_id.to_string(),
                        BTreeMap::from([
                            ("job".to_string(), "overdue_processing".to_string()),
                            ("error".to_string(), message.clone()),
                        ]),
                    );
                    report.errors.push(message);
                }
            }
        }

        Ok(report)
    }

    fn adjust_credit_limit(
        &self,
        account_id: Uuid,
        new_limit: Money,
        reason: &str,
    ) -> BankingResult<Account> {
        let account = self.require_credit_line(account_id)?;
        let old_limit = account.credit_limit;
        let updated = self.accounts.update_credit_limit(account_id, new_limit)?;

        self.audit.record(
            AuditEventType::CreditLimitChanged,
            "credit_account",
            &account_id.to_string(),
            BTreeMap::from([
                (
                    "old_limit".to_string(),
                    old_limit.map_or_else(|| "none".to_string(), |limit| limit.to_string()),
                ),
                ("new_limit".to_string(), new_limit.to_string()),
                ("reason".to_string(), reason.to_string()),
            ]),
        )?;
        Ok(updated)
    }

    fn statement(&self, statement_id: Uuid) -> BankingResult<Option<CreditStatement>> {
        load_model::<CreditStatementModel>(self.storage.as_ref(), &statement_id.to_string())?
            .map(CreditStatementMapper::from_model)
            .transpose()
    }

    fn account_statements(
        &self,
        account_id: Uuid,
        limit: Option<usize>,
    ) -> BankingResult<Vec<CreditStatement>> {
        let models: Vec<CreditStatementModel> = find_models(
            self.storage.as_ref(),
            &[("account_id", json!(account_id))],
        )?;
        let mut statements = models
            .into_iter()
            .map(CreditStatementMapper::from_model)
            .collect::<BankingResult<Vec<_>>>()?;
        statements.sort_by(|a, b| b.statement_date.cmp(&a.statement_date));
        if let Some(limit) = limit {
            statements.truncate(limit);
        }
        Ok(statements)
    }

    fn current_statement(&self, account_id: Uuid) -> BankingResult<Option<CreditStatement>> {
        Ok(self
            .account_statements(account_id, None)?
            .into_iter()
            .find(|statement| statement.status == StatementStatus::Current))
    }
}
