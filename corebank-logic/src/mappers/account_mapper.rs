use corebank_api::domain::{Account, AccountHold};
use corebank_api::BankingResult;
use corebank_db::models::{AccountHoldModel, AccountModel};

use super::{money_from_fields, money_to_fields, opt_money_from_fields, opt_money_to_fields};
use std::str::FromStr;

pub struct AccountMapper;

impl AccountMapper {
    pub fn to_model(account: &Account) -> AccountModel {
        let (credit_limit_amount, credit_limit_currency) =
            opt_money_to_fields(&account.credit_limit);
        let (minimum_balance_amount, minimum_balance_currency) =
            opt_money_to_fields(&account.minimum_balance);
        let (daily_limit_amount, daily_limit_currency) =
            opt_money_to_fields(&account.daily_transaction_limit);
        let (monthly_limit_amount, monthly_limit_currency) =
            opt_money_to_fields(&account.monthly_transaction_limit);

        AccountModel {
            id: account.id,
            account_number: account.account_number.clone(),
            customer_id: account.customer_id,
            product_type: account.product_type,
            account_type: account.account_type,
            currency: account.currency.code().to_string(),
            name: account.name.clone(),
            state: account.state,
            interest_rate: account.interest_rate,
            credit_limit_amount,
            credit_limit_currency,
            minimum_balance_amount,
            minimum_balance_currency,
            daily_limit_amount,
            daily_limit_currency,
            monthly_limit_amount,
            monthly_limit_currency,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }

    pub fn from_model(model: AccountModel) -> BankingResult<Account> {
        Ok(Account {
            id: model.id,
            account_number: model.account_number,
            customer_id: model.customer_id,
            product_type: model.product_type,
            account_type: model.account_type,
            currency: corebank_api::domain::Currency::from_str(&model.currency)?,
            name: model.name,
            state: model.state,
            interest_rate: model.interest_rate,
            credit_limit: opt_money_from_fields(
                &model.credit_limit_amount,
                &model.credit_limit_currency,
            )?,
            minimum_balance: opt_money_from_fields(
                &model.minimum_balance_amount,
                &model.minimum_balance_currency,
            )?,
            daily_transaction_limit: opt_money_from_fields(
                &model.daily_limit_amount,
                &model.daily_limit_currency,
            )?,
            monthly_transaction_limit: opt_money_from_fields(
                &model.monthly_limit_amount,
                &model.monthly_limit_currency,
            )?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

pub struct AccountHoldMapper;

impl AccountHoldMapper {
    pub fn to_model(hold: &AccountHold) -> AccountHoldModel {
        let (amount, currency) = money_to_fields(&hold.amount);
        AccountHoldModel {
            id: hold.id,
            account_id: hold.account_id,
            amount,
            currency,
            reason: hold.reason.clone(),
            expires_at: hold.expires_at,
            released_at: hold.released_at,
            created_at: hold.created_at,
            updated_at: hold.updated_at,
        }
    }

    pub fn from_model(model: AccountHoldModel) -> BankingResult<AccountHold> {
        Ok(AccountHold {
            id: model.id,
            account_id: model.account_id,
            amount: money_from_fields(&model.amount, &model.currency)?,
            reason: model.reason,
            expires_at: model.expires_at,
            released_at: model.released_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
