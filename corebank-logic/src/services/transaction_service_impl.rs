use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use corebank_api::domain::{
    Account, AuditEventType, ComplianceDecision, JournalLine, NewTransaction, Transaction,
    TransactionState, TransactionType,
};
use corebank_api::observer::DomainObserver;
use corebank_api::service::{
    AccountService, AuditTrail, ComplianceService, LedgerService, TransactionService,
};
use corebank_api::{BankingError, BankingResult};
use corebank_db::models::TransactionModel;
use corebank_db::{StorageExt, StorageInterface};

use crate::constants::{
    GL_CASH_ACCOUNT_ID, GL_FEE_REVENUE_ACCOUNT_ID, GL_INTEREST_EXPENSE_ACCOUNT_ID,
    GL_INTEREST_REVENUE_ACCOUNT_ID,
};
use crate::mappers::TransactionMapper;
use crate::services::{find_models, load_model, save_model};

/// The money-movement pipeline: create (durable, idempotent) then process
/// (compliance -> funds -> atomic journal posting).
pub struct TransactionServiceImpl {
    storage: Arc<dyn StorageInterface>,
    ledger: Arc<dyn LedgerService>,
    accounts: Arc<dyn AccountService>,
    compliance: Arc<dyn ComplianceService>,
    audit: Arc<dyn AuditTrail>,
    observer: Arc<dyn DomainObserver>,
}

impl TransactionServiceImpl {
    pub fn new(
        storage: Arc<dyn StorageInterface>,
        ledger: Arc<dyn LedgerService>,
        accounts: Arc<dyn AccountService>,
        compliance: Arc<dyn ComplianceService>,
        audit: Arc<dyn AuditTrail>,
        observer: Arc<dyn DomainObserver>,
    ) -> Self {
        TransactionServiceImpl {
            storage,
            ledger,
            accounts,
            compliance,
            audit,
            observer,
        }
    }

    fn require_transaction(&self, transaction_id: Uuid) -> BankingResult<Transaction> {
        self.transaction(transaction_id)?
            .ok_or_else(|| BankingError::not_found("transaction", transaction_id))
    }

    fn save_transaction(&self, transaction: &Transaction) -> BankingResult<()> {
        save_model(
            self.storage.as_ref(),
            &TransactionMapper::to_model(transaction),
        )
    }

    fn require_side(
        request: &NewTransaction,
        side: Option<Uuid>,
        field: &str,
    ) -> BankingResult<Uuid> {
        side.ok_or_else(|| {
            BankingError::validation(
                field,
                format!(
                    "{} transactions require a {field} account",
                    request.transaction_type
                ),
            )
        })
    }

    /// Type-specific account side requirements.
    fn validate_sides(request: &NewTransaction) -> BankingResult<()> {
        match request.transaction_type {
            TransactionType::Deposit | TransactionType::InterestCredit => {
                Self::require_side(request, request.to_account_id, "to")?;
            }
            TransactionType::Withdrawal
            | TransactionType::Fee
            | TransactionType::InterestDebit => {
                Self::require_side(request, request.from_account_id, "from")?;
            }
            TransactionType::TransferInternal => {
                Self::require_side(request, request.from_account_id, "from")?;
                Self::require_side(request, request.to_account_id, "to")?;
            }
            TransactionType::Payment => {
                Self::require_side(request, request.to_account_id, "to")?;
            }
            TransactionType::Reversal => {
                return Err(BankingError::validation(
                    "transaction_type",
                    "reversal transactions are created by reverse_transaction",
                ));
            }
        }
        Ok(())
    }

    fn require_account(&self, account_id: Uuid) -> BankingResult<Account> {
        self.accounts
            .account(account_id)?
            .ok_or_else(|| BankingError::not_found("account", account_id))
    }

    fn fail_transaction(&self, transaction: &mut Transaction, message: String) -> BankingResult<()> {
        transaction.state = TransactionState::Failed;
        transaction.error_message = Some(message.clone());
        transaction.updated_at = Utc::now();
        self.save_transaction(transaction)?;

        self.audit.record(
            AuditEventType::TransactionFailed,
            "transaction",
            &transaction.id.to_string(),
            BTreeMap::from([("error".to_string(), message)]),
        )?;
        self.observer
            .on_transaction_event(transaction, AuditEventType::TransactionFailed);
        Ok(())
    }

    /// Double-entry lines for each transaction type. Customer deposit
    /// accounts are debit-normal in the customer frame; credit products are
    /// credit-normal liabilities, so charges credit them and payments debit
    /// them. The fixed GL accounts absorb the other side.
    fn build_lines(&self, transaction: &Transaction) -> BankingResult<Vec<JournalLine>> {
        let amount = transaction.amount;
        let description = transaction.description.as_str();
        let from = transaction.from_account_id;
        let to = transaction.to_account_id;
        let missing =
            |side: &str| BankingError::Invariant(format!("processed transaction lost {side} side"));

        let lines = match transaction.transaction_type {
            TransactionType::Deposit => vec![
                JournalLine::debit(to.ok_or_else(|| missing("to"))?, description, amount)?,
                JournalLine::credit(GL_CASH_ACCOUNT_ID, description, amount)?,
            ],
            TransactionType::Withdrawal => vec![
                JournalLine::debit(GL_CASH_ACCOUNT_ID, description, amount)?,
                JournalLine::credit(from.ok_or_else(|| missing("from"))?, description, amount)?,
            ],
            TransactionType::TransferInternal => vec![
                JournalLine::debit(to.ok_or_else(|| missing("to"))?, description, amount)?,
                JournalLine::credit(from.ok_or_else(|| missing("from"))?, description, amount)?,
            ],
            // Paying down a liability debits it; the funds come from the
            // source account when present, else from bank cash.
            TransactionType::Payment => vec![
                JournalLine::debit(to.ok_or_else(|| missing("to"))?, description, amount)?,
                JournalLine::credit(from.unwrap_or(GL_CASH_ACCOUNT_ID), description, amount)?,
            ],
            TransactionType::Fee => vec![
                JournalLine::debit(GL_FEE_REVENUE_ACCOUNT_ID, description, amount)?,
                JournalLine::credit(from.ok_or_else(|| missing("from"))?, description, amount)?,
            ],
            TransactionType::InterestCredit => vec![
                JournalLine::debit(to.ok_or_else(|| missing("to"))?, description, amount)?,
                JournalLine::credit(GL_INTEREST_EXPENSE_ACCOUNT_ID, description, amount)?,
            ],
            TransactionType::InterestDebit => vec![
                JournalLine::debit(GL_INTEREST_REVENUE_ACCOUNT_ID, description, amount)?,
                JournalLine::credit(from.ok_or_else(|| missing("from"))?, description, amount)?,
            ],
            TransactionType::Reversal => {
                return Err(BankingError::Invariant(
                    "reversal transactions are posted through reverse_transaction".to_string(),
                ))
            }
        };
        Ok(lines)
    }
}

impl TransactionService for TransactionServiceImpl {
    fn create_transaction(&self, request: NewTransaction) -> BankingResult<Transaction> {
        Self::validate_sides(&request)?;

        // Referenced accounts must exist and match the amount currency.
        for account_id in [request.from_account_id, request.to_account_id]
            .into_iter()
            .flatten()
        {
            let account = self.require_account(account_id)?;
            if account.currency != request.amount.currency() {
                return Err(BankingError::CurrencyMismatch {
                    expected: account.currency,
                    actual: request.amount.currency(),
                });
            }
        }

        let now = Utc::now();
        let mut transaction = Transaction {
            id: Uuid::new_v4(),
            transaction_type: request.transaction_type,
            from_account_id: request.from_account_id,
            to_account_id: request.to_account_id,
            amount: request.amount,
            currency: request.amount.currency(),
            description: heapless::String::new(),
            idempotency_key: heapless::String::new(),
            channel: request.channel,
            state: TransactionState::Pending,
            compliance_decision: None,
            error_message: None,
            journal_entry_id: None,
            original_transaction_id: None,
            reversal_transaction_id: None,
            processed_at: None,
            created_at: now,
            updated_at: now,
        };
        transaction.set_description(&request.description)?;
        let key_supplied = request.idempotency_key.is_some();
        let key = request
            .idempotency_key
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        transaction.idempotency_key = heapless::String::try_from(key.as_str())
            .map_err(|_| BankingError::validation("idempotency_key", "key too long"))?;

        // The key lookup and the insert share one scope, so concurrent
        // creators with the same key converge on the first writer.
        let (transaction, collapsed) = self.storage.atomic(|| {
            if key_supplied {
                if let Some(existing) = self.transaction_by_idempotency_key(&key)? {
                    return Ok((existing, true));
                }
            }

            self.save_transaction(&transaction)?;
            self.audit.record(
                AuditEventType::TransactionCreated,
                "transaction",
                &transaction.id.to_string(),
                BTreeMap::from([
                    ("type".to_string(), transaction.transaction_type.to_string()),
                    ("amount".to_string(), transaction.amount.to_string()),
                    ("idempotency_key".to_string(), key.clone()),
                ]),
            )?;
            Ok((transaction.clone(), false))
        })?;

        if collapsed {
            tracing::debug!(
                transaction_id = %transaction.id,
                idempotency_key = %key,
                "idempotent create collapsed to existing transaction"
            );
            return Ok(transaction);
        }

        self.observer
            .on_transaction_event(&transaction, AuditEventType::TransactionCreated);
        Ok(transaction)
    }

    fn process_transaction(&self, transaction_id: Uuid) -> BankingResult<Transaction> {
        let mut transaction = self.require_transaction(transaction_id)?;
        if transaction.state != TransactionState::Pending {
            return Err(BankingError::bad_state(
                "transaction",
                transaction_id,
                transaction.state,
                "pending",
            ));
        }

        // Account-state gates: a frozen account cannot be debited, a closed
        // account cannot be credited.
        let from_account = transaction
            .from_account_id
            .map(|id| self.require_account(id))
            .transpose()?;
        let to_account = transaction
            .to_account_id
            .map(|id| self.require_account(id))
            .transpose()?;

        if let Some(account) = &from_account {
            if !account.can_debit() {
                let error = BankingError::bad_state(
                    "account",
                    account.id,
                    account.state,
                    "active",
                );
                self.fail_transaction(&mut transaction, error.to_string())?;
                return Err(error);
            }
        }
        if let Some(account) = &to_account {
            if !account.can_credit() {
                let error = BankingError::bad_state(
                    "account",
                    account.id,
                    account.state,
                    "active, frozen or dormant",
                );
                self.fail_transaction(&mut transaction, error.to_string())?;
                return Err(error);
            }
        }

        // Compliance gate for customer-initiated transactions.
        if transaction.channel.is_customer_initiated() {
            let gate_account = from_account.as_ref().or(to_account.as_ref()).ok_or_else(
                || BankingError::Invariant("transaction with no account sides".to_string()),
            )?;
            let decision = self.compliance.check_transaction(
                gate_account.customer_id,
                gate_account.id,
                transaction.amount,
                transaction.transaction_type,
                Some(transaction.id),
            )?;

            match &decision {
                ComplianceDecision::Allow => {
                    transaction.compliance_decision = Some(decision);
                }
                ComplianceDecision::Review(reasons) => {
                    // Parked for manual review; the transaction stays
                    // PENDING with the decision on record.
                    transaction.compliance_decision = Some(decision.clone());
                    transaction.updated_at = Utc::now();
                    self.save_transaction(&transaction)?;
                    tracing::info!(
                        %transaction_id,
                        reasons = reasons.len(),
                        "transaction held for compliance review"
                    );
                    return Ok(transaction);
                }
                ComplianceDecision::Blocked(reasons) => {
                    let error = BankingError::ComplianceBlocked {
                        reasons: reasons.clone(),
                    };
                    transaction.compliance_decision = Some(decision.clone());
                    self.fail_transaction(&mut transaction, error.to_string())?;
                    return Err(error);
                }
            }
        }

        // Available-funds check on the debited customer account. System
        // postings (interest, bank-assessed fees, disbursements) bypass it.
        if transaction.channel.is_customer_initiated() {
            if let Some(debited_id) = transaction.debited_account() {
                let debited = self.require_account(debited_id)?;
                if debited.is_deposit_product() || debited.is_credit_product() {
                    let available = self.accounts.available_balance(debited_id)?;
                    if available < transaction.amount {
                        let error = BankingError::InsufficientFunds {
                            account_id: debited_id,
                            requested: transaction.amount.amount(),
                            available: available.amount(),
                        };
                        self.fail_transaction(&mut transaction, error.to_string())?;
                        return Err(error);
                    }
                }
            }
        }

        let lines = self.build_lines(&transaction)?;
        let posting = self.storage.atomic(|| {
            // Re-check under the scope: a concurrent processor of the same
            // transaction observes the non-PENDING state and fails here.
            let current = self.require_transaction(transaction.id)?;
            if current.state != TransactionState::Pending {
                return Err(BankingError::bad_state(
                    "transaction",
                    transaction.id,
                    current.state,
                    "pending",
                ));
            }

            let entry = self.ledger.create_entry(
                &transaction.id.to_string(),
                transaction.description.as_str(),
                lines,
            )?;
            let posted = self.ledger.post_entry(entry.id)?;

            let now = Utc::now();
            transaction.state = TransactionState::Completed;
            transaction.journal_entry_id = Some(posted.id);
            transaction.processed_at = Some(now);
            transaction.updated_at = now;
            self.save_transaction(&transaction)?;
            Ok(posted.id)
        });

        if let Err(error) = posting {
            // A lost race on the transaction's own state must not clobber
            // the winner's COMPLETED record.
            let lost_race = matches!(
                &error,
                BankingError::BadState { entity, id, .. }
                    if entity == "transaction" && *id == transaction.id
            );
            if !lost_race {
                self.fail_transaction(&mut transaction, error.to_string())?;
            }
            return Err(error);
        }

        self.audit.record(
            AuditEventType::TransactionPosted,
            "transaction",
            &transaction.id.to_string(),
            BTreeMap::from([
                ("journal_entry_id".to_string(),
                 transaction
                     .journal_entry_id
                     .map_or_else(String::new, |id| id.to_string())),
                ("amount".to_string(), transaction.amount.to_string()),
            ]),
        )?;
        self.observer
            .on_transaction_event(&transaction, AuditEventType::TransactionPosted);

        tracing::info!(
            %transaction_id,
            transaction_type = %transaction.transaction_type,
            amount = %transaction.amount,
            "transaction posted"
        );
        Ok(transaction)
    }

    fn reverse_transaction(
        &self,
        transaction_id: Uuid,
        reason: &str,
    ) -> BankingResult<Transaction> {
        let mut original = self.require_transaction(transaction_id)?;
        if original.state != TransactionState::Completed {
            return Err(BankingError::bad_state(
                "transaction",
                transaction_id,
                original.state,
                "completed",
            ));
        }
        let journal_entry_id = original.journal_entry_id.ok_or_else(|| {
            BankingError::Invariant(format!(
                "completed transaction {transaction_id} has no journal entry"
            ))
        })?;

        let reversal = self.storage.atomic(|| {
            // Re-check under the scope so double reversals lose cleanly.
            let current = self.require_transaction(transaction_id)?;
            if current.state != TransactionState::Completed {
                return Err(BankingError::bad_state(
                    "transaction",
                    transaction_id,
                    current.state,
                    "completed",
                ));
            }

            let now = Utc::now();
            let mut reversal = Transaction {
                id: Uuid::new_v4(),
                transaction_type: TransactionType::Reversal,
                from_account_id: original.from_account_id,
                to_account_id: original.to_account_id,
                amount: original.amount,
                currency: original.currency,
                description: heapless::String::new(),
                idempotency_key: heapless::String::new(),
                channel: original.channel,
                state: TransactionState::Pending,
                compliance_decision: None,
                error_message: None,
                journal_entry_id: None,
                original_transaction_id: Some(original.id),
                reversal_transaction_id: None,
                processed_at: None,
                created_at: now,
                updated_at: now,
            };
            reversal.set_description(&format!("REVERSAL: {reason}"))?;
            reversal.idempotency_key =
                heapless::String::try_from(format!("REV-{}", original.id).as_str())
                    .map_err(|_| BankingError::validation("idempotency_key", "key too long"))?;
            self.save_transaction(&reversal)?;

            let reversing_entry = self.ledger.reverse_entry(journal_entry_id, reason)?;

            let now = Utc::now();
            reversal.state = TransactionState::Completed;
            reversal.journal_entry_id = Some(reversing_entry.id);
            reversal.processed_at = Some(now);
            reversal.updated_at = now;
            self.save_transaction(&reversal)?;

            original.state = TransactionState::Reversed;
            original.reversal_transaction_id = Some(reversal.id);
            original.updated_at = now;
            self.save_transaction(&original)?;
            Ok(reversal)
        })?;

        self.audit.record(
            AuditEventType::TransactionReversed,
            "transaction",
            &original.id.to_string(),
            BTreeMap::from([
                ("reversal_transaction_id".to_string(), reversal.id.to_string()),
                ("reason".to_string(), reason.to_string()),
            ]),
        )?;
        self.observer
            .on_transaction_event(&original, AuditEventType::TransactionReversed);

        tracing::info!(
            original = %original.id,
            reversal = %reversal.id,
            "transaction reversed"
        );
        Ok(reversal)
    }

    fn transaction(&self, transaction_id: Uuid) -> BankingResult<Option<Transaction>> {
        load_model::<TransactionModel>(self.storage.as_ref(), &transaction_id.to_string())?
            .map(TransactionMapper::from_model)
            .transpose()
    }

    fn transaction_by_idempotency_key(&self, key: &str) -> BankingResult<Option<Transaction>> {
        let models: Vec<TransactionModel> = find_models(
            self.storage.as_ref(),
            &[("idempotency_key", json!(key))],
        )?;
        models
            .into_iter()
            .next()
            .map(TransactionMapper::from_model)
            .transpose()
    }

    fn account_transactions(&self, account_id: Uuid) -> BankingResult<Vec<Transaction>> {
        let models: Vec<TransactionModel> =
            crate::services::all_models(self.storage.as_ref())?;
        let mut transactions = models
            .into_iter()
            .map(TransactionMapper::from_model)
            .collect::<BankingResult<Vec<_>>>()?;
        transactions.retain(|transaction| {
            transaction.from_account_id == Some(account_id)
                || transaction.to_account_id == Some(account_id)
        });
        transactions.sort_by_key(|transaction| transaction.created_at);
        Ok(transactions)
    }
}
