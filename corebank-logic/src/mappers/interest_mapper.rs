use std::str::FromStr;

use corebank_api::domain::{
    Currency, GracePeriodTracker, InterestAccrual, InterestRateConfig,
};
use corebank_api::BankingResult;
use corebank_db::models::{GracePeriodModel, InterestAccrualModel, InterestRateConfigModel};

use super::{money_from_fields, money_to_fields, opt_money_from_fields, opt_money_to_fields};

pub struct InterestRateConfigMapper;

impl InterestRateConfigMapper {
    pub fn to_model(config: &InterestRateConfig) -> InterestRateConfigModel {
        let (minimum_balance_amount, minimum_balance_currency) =
            opt_money_to_fields(&config.minimum_balance);
        InterestRateConfigModel {
            id: config.id,
            product_type: config.product_type,
            currency: config.currency.code().to_string(),
            annual_rate: config.annual_rate,
            calculation_method: config.calculation_method,
            compounding_frequency: config.compounding_frequency,
            minimum_balance_amount,
            minimum_balance_currency,
            is_active: config.is_active,
            created_at: config.created_at,
            updated_at: config.updated_at,
        }
    }

    pub fn from_model(model: InterestRateConfigModel) -> BankingResult<InterestRateConfig> {
        Ok(InterestRateConfig {
            id: model.id,
            product_type: model.product_type,
            currency: Currency::from_str(&model.currency)?,
            annual_rate: model.annual_rate,
            calculation_method: model.calculation_method,
            compounding_frequency: model.compounding_frequency,
            minimum_balance: opt_money_from_fields(
                &model.minimum_balance_amount,
                &model.minimum_balance_currency,
            )?,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

pub struct InterestAccrualMapper;

impl InterestAccrualMapper {
    pub fn to_model(accrual: &InterestAccrual) -> InterestAccrualModel {
        let (principal_amount, principal_currency) = money_to_fields(&accrual.principal_balance);
        let (accrued_amount, accrued_currency) = money_to_fields(&accrual.accrued_amount);
        let (cumulative_amount, cumulative_currency) = money_to_fields(&accrual.cumulative_accrued);
        InterestAccrualModel {
            id: accrual.id,
            account_id: accrual.account_id,
            accrual_date: accrual.accrual_date,
            principal_amount,
            principal_currency,
            daily_rate: accrual.daily_rate,
            accrued_amount,
            accrued_currency,
            cumulative_amount,
            cumulative_currency,
            calculation_method: accrual.calculation_method,
            rate_config_id: accrual.rate_config_id,
            posted: accrual.posted,
            created_at: accrual.created_at,
            updated_at: accrual.updated_at,
        }
    }

    pub fn from_model(model: InterestAccrualModel) -> BankingResult<InterestAccrual> {
        Ok(InterestAccrual {
            id: model.id,
            account_id: model.account_id,
            accrual_date: model.accrual_date,
            principal_balance: money_from_fields(&model.principal_amount, &model.principal_currency)?,
            daily_rate: model.daily_rate,
            accrued_amount: money_from_fields(&model.accrued_amount, &model.accrued_currency)?,
            cumulative_accrued: money_from_fields(
                &model.cumulative_amount,
                &model.cumulative_currency,
            )?,
            calculation_method: model.calculation_method,
            rate_config_id: model.rate_config_id,
            posted: model.posted,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

pub struct GracePeriodMapper;

impl GracePeriodMapper {
    pub fn to_model(tracker: &GracePeriodTracker) -> GracePeriodModel {
        let (statement_balance_amount, statement_balance_currency) =
            money_to_fields(&tracker.statement_balance);
        GracePeriodModel {
            id: tracker.id,
            account_id: tracker.account_id,
            statement_date: tracker.statement_date,
            statement_balance_amount,
            statement_balance_currency,
            due_date: tracker.due_date,
            grace_period_active: tracker.grace_period_active,
            full_payment_received: tracker.full_payment_received,
            grace_period_lost_date: tracker.grace_period_lost_date,
            created_at: tracker.created_at,
            updated_at: tracker.updated_at,
        }
    }

    pub fn from_model(model: GracePeriodModel) -> BankingResult<GracePeriodTracker> {
        Ok(GracePeriodTracker {
            id: model.id,
            account_id: model.account_id,
            statement_date: model.statement_date,
            statement_balance: money_from_fields(
                &model.statement_balance_amount,
                &model.statement_balance_currency,
            )?,
            due_date: model.due_date,
            grace_period_active: model.grace_period_active,
            full_payment_received: model.full_payment_received,
            grace_period_lost_date: model.grace_period_lost_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
