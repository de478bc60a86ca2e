use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use corebank_api::domain::{
    Currency, JournalEntry, JournalEntryState, JournalLine, LedgerAccountType, Money,
};
use corebank_api::service::{AuditTrail, LedgerService};
use corebank_api::{BankingError, BankingResult};
use corebank_db::models::JournalEntryModel;
use corebank_db::{StorageExt, StorageInterface};

use crate::mappers::JournalEntryMapper;
use crate::services::{all_models, load_model, save_model};

pub struct LedgerServiceImpl {
    storage: Arc<dyn StorageInterface>,
    audit: Arc<dyn AuditTrail>,
}

impl LedgerServiceImpl {
    pub fn new(storage: Arc<dyn StorageInterface>, audit: Arc<dyn AuditTrail>) -> Self {
        LedgerServiceImpl { storage, audit }
    }

    fn load_entry(&self, entry_id: Uuid) -> BankingResult<JournalEntry> {
        let model: JournalEntryModel =
            load_model(self.storage.as_ref(), &entry_id.to_string())?
                .ok_or_else(|| BankingError::not_found("journal entry", entry_id))?;
        JournalEntryMapper::from_model(model)
    }

    fn save_entry(&self, entry: &JournalEntry) -> BankingResult<()> {
        save_model(self.storage.as_ref(), &JournalEntryMapper::to_model(entry))
    }
}

impl LedgerService for LedgerServiceImpl {
    fn create_entry(
        &self,
        reference: &str,
        description: &str,
        lines: Vec<JournalLine>,
    ) -> BankingResult<JournalEntry> {
        let entry = JournalEntry::new(reference, description, lines)?;
        self.save_entry(&entry)?;

        let accounts = entry
            .affected_accounts()
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let currencies = entry
            .currencies()
            .iter()
            .map(|currency| currency.code().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.audit.record(
            corebank_api::domain::AuditEventType::JournalEntryCreated,
            "journal_entry",
            &entry.id.to_string(),
            BTreeMap::from([
                ("reference".to_string(), reference.to_string()),
                ("line_count".to_string(), entry.lines.len().to_string()),
                ("accounts".to_string(), accounts),
                ("currencies".to_string(), currencies),
            ]),
        )?;

        tracing::debug!(entry_id = %entry.id, reference, "journal entry created");
        Ok(entry)
    }

    fn post_entry(&self, entry_id: Uuid) -> BankingResult<JournalEntry> {
        // State is checked inside the scope: a concurrent poster observes
        // POSTED and fails rather than double-posting.
        let entry = self.storage.atomic(|| {
            let mut entry = self.load_entry(entry_id)?;
            if entry.state != JournalEntryState::Pending {
                return Err(BankingError::bad_state(
                    "journal entry",
                    entry_id,
                    entry.state,
                    "pending",
                ));
            }

            let now = Utc::now();
            entry.state = JournalEntryState::Posted;
            entry.posted_at = Some(now);
            entry.updated_at = now;
            self.save_entry(&entry)?;

            self.audit.record(
                corebank_api::domain::AuditEventType::JournalEntryPosted,
                "journal_entry",
                &entry.id.to_string(),
                BTreeMap::from([
                    ("reference".to_string(), entry.reference.to_string()),
                    ("posted_at".to_string(), now.to_rfc3339()),
                ]),
            )?;
            Ok(entry)
        })?;

        tracing::debug!(entry_id = %entry.id, "journal entry posted");
        Ok(entry)
    }

    fn reverse_entry(&self, entry_id: Uuid, reason: &str) -> BankingResult<JournalEntry> {
        let reversing_entry = self.storage.atomic(|| {
            let mut original = self.load_entry(entry_id)?;
            if original.state != JournalEntryState::Posted {
                return Err(BankingError::bad_state(
                    "journal entry",
                    entry_id,
                    original.state,
                    "posted",
                ));
            }

            // Swap each line's sides so the counter-entry cancels the
            // original.
            let reversing_lines = original
                .lines
                .iter()
                .map(|line| {
                    let description = format!("REVERSAL: {}", line.description);
                    if line.is_debit() {
                        JournalLine::credit(line.account_id, &description, line.debit)
                    } else {
                        JournalLine::debit(line.account_id, &description, line.credit)
                    }
                })
                .collect::<BankingResult<Vec<_>>>()?;

            let mut reversing_entry = self.create_entry(
                &format!("REV-{}", original.reference),
                &format!("REVERSAL: {reason}"),
                reversing_lines,
            )?;
            reversing_entry.reverses = Some(original.id);
            self.save_entry(&reversing_entry)?;

            let posted = self.post_entry(reversing_entry.id)?;

            let now = Utc::now();
            original.state = JournalEntryState::Reversed;
            original.reversed_by = Some(posted.id);
            original.updated_at = now;
            self.save_entry(&original)?;

            self.audit.record(
                corebank_api::domain::AuditEventType::JournalEntryReversed,
                "journal_entry",
                &original.id.to_string(),
                BTreeMap::from([
                    ("original_reference".to_string(), original.reference.to_string()),
                    ("reversing_entry_id".to_string(), posted.id.to_string()),
                    ("reversal_reason".to_string(), reason.to_string()),
                ]),
            )?;
            Ok(posted)
        })?;

        tracing::info!(
            original = %entry_id,
            reverser = %reversing_entry.id,
            "journal entry reversed"
        );
        Ok(reversing_entry)
    }

    fn entry(&self, entry_id: Uuid) -> BankingResult<Option<JournalEntry>> {
        load_model::<JournalEntryModel>(self.storage.as_ref(), &entry_id.to_string())?
            .map(JournalEntryMapper::from_model)
            .transpose()
    }

    fn entries_for_account(
        &self,
        account_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        state_filter: Option<JournalEntryState>,
    ) -> BankingResult<Vec<JournalEntry>> {
        let models: Vec<JournalEntryModel> = all_models(self.storage.as_ref())?;
        let mut entries = models
            .into_iter()
            .map(JournalEntryMapper::from_model)
            .collect::<BankingResult<Vec<_>>>()?;

        entries.retain(|entry| {
            entry.affected_accounts().contains(&account_id)
                && start.map_or(true, |start| entry.created_at >= start)
                && end.map_or(true, |end| entry.created_at <= end)
                && state_filter.map_or(true, |state| entry.state == state)
        });
        entries.sort_by_key(|entry| entry.created_at);
        Ok(entries)
    }

    fn account_balance(
        &self,
        account_id: Uuid,
        account_type: LedgerAccountType,
        currency: Currency,
        as_of: Option<DateTime<Utc>>,
    ) -> BankingResult<Money> {
        // Only POSTED entries count; reversed originals drop out because
        // they are no longer POSTED, while the reversing entry is.
        let entries = self.entries_for_account(
            account_id,
            None,
            as_of,
            Some(JournalEntryState::Posted),
        )?;

        let mut running = Decimal::ZERO;
        for entry in &entries {
            for line in &entry.lines {
                if line.account_id == account_id && line.currency() == currency {
                    running += line.debit.amount() - line.credit.amount();
                }
            }
        }

        if account_type.is_credit_normal() {
            running = -running;
        }
        Ok(Money::new(running, currency))
    }

    fn trial_balance(
        &self,
        accounts: &HashMap<Uuid, LedgerAccountType>,
        currency: Currency,
        as_of: Option<DateTime<Utc>>,
    ) -> BankingResult<HashMap<Uuid, Money>> {
        accounts
            .iter()
            .map(|(account_id, account_type)| {
                self.account_balance(*account_id, *account_type, currency, as_of)
                    .map(|balance| (*account_id, balance))
            })
            .collect()
    }
}
