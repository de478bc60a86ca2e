use std::str::FromStr;

use corebank_api::domain::{Currency, Transaction};
use corebank_api::BankingResult;
use corebank_db::models::TransactionModel;

use super::{bounded_text, money_from_fields};

pub struct TransactionMapper;

impl TransactionMapper {
    pub fn to_model(transaction: &Transaction) -> TransactionModel {
        TransactionModel {
            id: transaction.id,
            transaction_type: transaction.transaction_type,
            from_account_id: transaction.from_account_id,
            to_account_id: transaction.to_account_id,
            amount: transaction.amount.amount().to_string(),
            currency: transaction.currency.code().to_string(),
            description: transaction.description.to_string(),
            idempotency_key: transaction.idempotency_key.to_string(),
            channel: transaction.channel,
            state: transaction.state,
            compliance_decision: transaction.compliance_decision.clone(),
            error_message: transaction.error_message.clone(),
            journal_entry_id: transaction.journal_entry_id,
            original_transaction_id: transaction.original_transaction_id,
            reversal_transaction_id: transaction.reversal_transaction_id,
            processed_at: transaction.processed_at,
            created_at: transaction.created_at,
            updated_at: transaction.updated_at,
        }
    }

    pub fn from_model(model: TransactionModel) -> BankingResult<Transaction> {
        Ok(Transaction {
            id: model.id,
            transaction_type: model.transaction_type,
            from_account_id: model.from_account_id,
            to_account_id: model.to_account_id,
            amount: money_from_fields(&model.amount, &model.currency)?,
            currency: Currency::from_str(&model.currency)?,
            description: bounded_text(&model.description)?,
            idempotency_key: bounded_text(&model.idempotency_key)?,
            channel: model.channel,
            state: model.state,
            compliance_decision: model.compliance_decision,
            error_message: model.error_message,
            journal_entry_id: model.journal_entry_id,
            original_transaction_id: model.original_transaction_id,
            reversal_transaction_id: model.reversal_transaction_id,
            processed_at: model.processed_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
