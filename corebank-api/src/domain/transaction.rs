use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::compliance::ComplianceDecision;
use super::money::{Currency, Money};
use super::bounded;
use crate::BankingResult;

/// Economic intent of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    TransferInternal,
    Payment,
    Fee,
    InterestCredit,
    InterestDebit,
    Reversal,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::TransferInternal => "transfer_internal",
            TransactionType::Payment => "payment",
            TransactionType::Fee => "fee",
            TransactionType::InterestCredit => "interest_credit",
            TransactionType::InterestDebit => "interest_debit",
            TransactionType::Reversal => "reversal",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionState {
    Pending,
    Processing,
    Completed,
    Failed,
    Reversed,
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransactionState::Pending => "pending",
            TransactionState::Processing => "processing",
            TransactionState::Completed => "completed",
            TransactionState::Failed => "failed",
            TransactionState::Reversed => "reversed",
        };
        f.write_str(s)
    }
}

/// Originating channel. System-channel transactions are issued by the
/// engines themselves (interest, fees, disbursements) and skip the
/// compliance gate and the customer funds check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionChannel {
    Branch,
    Atm,
    Online,
    Mobile,
    Api,
    System,
}

impl TransactionChannel {
    pub fn is_customer_initiated(&self) -> bool {
        !matches!(self, TransactionChannel::System)
    }
}

/// An intent to move money. Balances change only when the linked journal
/// entry posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub transaction_type: TransactionType,
    pub from_account_id: Option<Uuid>,
    pub to_account_id: Option<Uuid>,
    pub amount: Money,
    pub currency: Currency,
    pub description: HeaplessString<500>,
    pub idempotency_key: HeaplessString<100>,
    pub channel: TransactionChannel,
    pub state: TransactionState,
    pub compliance_decision: Option<ComplianceDecision>,
    pub error_message: Option<String>,
    /// Set once the transaction has COMPLETED.
    pub journal_entry_id: Option<Uuid>,
    /// For REVERSAL transactions: the transaction being reversed.
    pub original_transaction_id: Option<Uuid>,
    /// For REVERSED transactions: the reversal that undid this one.
    pub reversal_transaction_id: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn set_description(&mut self, description: &str) -> BankingResult<()> {
        self.description = bounded("description", description)?;
        Ok(())
    }

    /// Customer-side account whose available funds cover this transaction,
    /// when the type has one.
    pub fn debited_account(&self) -> Option<Uuid> {
        match self.transaction_type {
            TransactionType::Withdrawal
            | TransactionType::Fee
            | TransactionType::InterestDebit
            | TransactionType::TransferInternal => self.from_account_id,
            TransactionType::Payment => self.from_account_id,
            _ => None,
        }
    }
}

/// Request payload for creating a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub transaction_type: TransactionType,
    pub amount: Money,
    pub description: String,
    pub channel: TransactionChannel,
    pub from_account_id: Option<Uuid>,
    pub to_account_id: Option<Uuid>,
    /// Client-supplied token collapsing duplicate creations. Generated when
    /// absent.
    pub idempotency_key: Option<String>,
}

impl NewTransaction {
    pub fn new(
        transaction_type: TransactionType,
        amount: Money,
        description: &str,
        channel: TransactionChannel,
    ) -> Self {
        NewTransaction {
            transaction_type,
            amount,
            description: description.to_string(),
            channel,
            from_account_id: None,
            to_account_id: None,
            idempotency_key: None,
        }
    }

    pub fn from_account(mut self, account_id: Uuid) -> Self {
        self.from_account_id = Some(account_id);
        self
    }

    pub fn to_account(mut self, account_id: Uuid) -> Self {
        self.to_account_id = Some(account_id);
        self
    }

    pub fn idempotency_key(mut self, key: &str) -> Self {
        self.idempotency_key = Some(key.to_string());
        self
    }
}
