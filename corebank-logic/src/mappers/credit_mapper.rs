use std::str::FromStr;

use rust_decimal::Decimal;

use corebank_api::domain::{CreditStatement, CreditTransaction, Currency, Money};
use corebank_api::{BankingError, BankingResult};
use corebank_db::models::{CreditStatementModel, CreditTransactionModel};

use super::{money_from_fields, money_to_fields};

pub struct CreditStatementMapper;

impl CreditStatementMapper {
    pub fn to_model(statement: &CreditStatement) -> CreditStatementModel {
        CreditStatementModel {
            id: statement.id,
            account_id: statement.account_id,
            statement_date: statement.statement_date,
            due_date: statement.due_date,
            previous_balance_amount: statement.previous_balance.amount().to_string(),
            new_charges_amount: statement.new_charges.amount().to_string(),
            payments_credits_amount: statement.payments_credits.amount().to_string(),
            interest_charged_amount: statement.interest_charged.amount().to_string(),
            fees_charged_amount: statement.fees_charged.amount().to_string(),
            current_balance_amount: statement.current_balance.amount().to_string(),
            minimum_payment_due_amount: statement.minimum_payment_due.amount().to_string(),
            available_credit_amount: statement.available_credit.amount().to_string(),
            credit_limit_amount: statement.credit_limit.amount().to_string(),
            paid_amount: statement.paid_amount.amount().to_string(),
            currency: statement.current_balance.currency().code().to_string(),
            grace_period_active: statement.grace_period_active,
            status: statement.status,
            paid_date: statement.paid_date,
            created_at: statement.created_at,
            updated_at: statement.updated_at,
        }
    }

    pub fn from_model(model: CreditStatementModel) -> BankingResult<CreditStatement> {
        let currency = Currency::from_str(&model.currency)?;
        let money = |amount: &str| -> BankingResult<Money> {
            let amount = Decimal::from_str(amount).map_err(|err| {
                BankingError::StorageFailure(format!("corrupt statement amount {amount:?}: {err}"))
            })?;
            Ok(Money::new(amount, currency))
        };
        Ok(CreditStatement {
            id: model.id,
            account_id: model.account_id,
            statement_date: model.statement_date,
            due_date: model.due_date,
            previous_balance: money(&model.previous_balance_amount)?,
            new_charges: money(&model.new_charges_amount)?,
            payments_credits: money(&model.payments_credits_amount)?,
            interest_charged: money(&model.interest_charged_amount)?,
            fees_charged: money(&model.fees_charged_amount)?,
            current_balance: money(&model.current_balance_amount)?,
            minimum_payment_due: money(&model.minimum_payment_due_amount)?,
            available_credit: money(&model.available_credit_amount)?,
            credit_limit: money(&model.credit_limit_amount)?,
            grace_period_active: model.grace_period_active,
            status: model.status,
            paid_amount: money(&model.paid_amount)?,
            paid_date: model.paid_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

pub struct CreditTransactionMapper;

impl CreditTransactionMapper {
    pub fn to_model(credit_txn: &CreditTransaction) -> CreditTransactionModel {
        let (amount, currency) = money_to_fields(&credit_txn.amount);
        let (interest_charged_amount, interest_charged_currency) =
            money_to_fields(&credit_txn.interest_charged);
        CreditTransactionModel {
            id: credit_txn.id,
            account_id: credit_txn.account_id,
            transaction_id: credit_txn.transaction_id,
            category: credit_txn.category,
            amount,
            currency,
            transaction_date: credit_txn.transaction_date,
            post_date: credit_txn.post_date,
            description: credit_txn.description.clone(),
            eligible_for_grace: credit_txn.eligible_for_grace,
            grace_period_applies: credit_txn.grace_period_applies,
            interest_charged_amount,
            interest_charged_currency,
            statement_id: credit_txn.statement_id,
            created_at: credit_txn.created_at,
            updated_at: credit_txn.updated_at,
        }
    }

    pub fn from_model(model: CreditTransactionModel) -> BankingResult<CreditTransaction> {
        Ok(CreditTransaction {
            id: model.id,
            account_id: model.account_id,
            transaction_id: model.transaction_id,
            category: model.category,
            amount: money_from_fields(&model.amount, &model.currency)?,
            transaction_date: model.transaction_date,
            post_date: model.post_date,
            description: model.description,
            eligible_for_grace: model.eligible_for_grace,
            grace_period_applies: model.grace_period_applies,
            interest_charged: money_from_fields(
                &model.interest_charged_amount,
                &model.interest_charged_currency,
            )?,
            statement_id: model.statement_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
