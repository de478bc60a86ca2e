use std::str::FromStr;

use rust_decimal::Decimal;

use corebank_api::domain::{
    AmortizationEntry, Currency, Loan, LoanPayment, LoanTerms, Money,
};
use corebank_api::{BankingError, BankingResult};
use corebank_db::models::{AmortizationEntryModel, LoanModel, LoanPaymentModel, LoanTermsModel};
use uuid::Uuid;

use super::money_from_fields;

fn decimal_field(value: &str, field: &str) -> BankingResult<Decimal> {
    Decimal::from_str(value).map_err(|err| {
        BankingError::StorageFailure(format!("corrupt {field} amount {value:?}: {err}"))
    })
}

pub struct LoanMapper;

impl LoanMapper {
    pub fn to_model(loan: &Loan) -> LoanModel {
        let currency = loan.terms.principal_amount.currency();
        LoanModel {
            id: loan.id,
            account_id: loan.account_id,
            customer_id: loan.customer_id,
            terms: Self::terms_to_model(&loan.terms),
            state: loan.state,
            current_balance_amount: loan.current_balance.amount().to_string(),
            total_paid_amount: loan.total_paid.amount().to_string(),
            interest_paid_amount: loan.interest_paid.amount().to_string(),
            principal_paid_amount: loan.principal_paid.amount().to_string(),
            currency: currency.code().to_string(),
            originated_date: loan.originated_date,
            disbursed_date: loan.disbursed_date,
            first_payment_date: loan.first_payment_date,
            last_payment_date: loan.last_payment_date,
            maturity_date: loan.maturity_date,
            days_past_due: loan.days_past_due,
            last_late_fee_date: loan.last_late_fee_date,
            created_at: loan.created_at,
            updated_at: loan.updated_at,
        }
    }

    pub fn from_model(model: LoanModel) -> BankingResult<Loan> {
        let currency = Currency::from_str(&model.currency)?;
        let money = |amount: &str, field: &str| -> BankingResult<Money> {
            Ok(Money::new(decimal_field(amount, field)?, currency))
        };
        Ok(Loan {
            id: model.id,
            account_id: model.account_id,
            customer_id: model.customer_id,
            terms: Self::terms_from_model(model.terms)?,
            state: model.state,
            current_balance: money(&model.current_balance_amount, "current_balance")?,
            total_paid: money(&model.total_paid_amount, "total_paid")?,
            interest_paid: money(&model.interest_paid_amount, "interest_paid")?,
            principal_paid: money(&model.principal_paid_amount, "principal_paid")?,
            originated_date: model.originated_date,
            disbursed_date: model.disbursed_date,
            first_payment_date: model.first_payment_date,
            last_payment_date: model.last_payment_date,
            maturity_date: model.maturity_date,
            days_past_due: model.days_past_due,
            last_late_fee_date: model.last_late_fee_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    fn terms_to_model(terms: &LoanTerms) -> LoanTermsModel {
        LoanTermsModel {
            principal_amount: terms.principal_amount.amount().to_string(),
            principal_currency: terms.principal_amount.currency().code().to_string(),
            annual_interest_rate: terms.annual_interest_rate,
            term_months: terms.term_months,
            payment_frequency: terms.payment_frequency,
            amortization_method: terms.amortization_method,
            first_payment_date: terms.first_payment_date,
            allow_prepayment: terms.allow_prepayment,
            prepayment_penalty_rate: terms.prepayment_penalty_rate,
            grace_period_days: terms.grace_period_days,
            late_fee_amount: terms.late_fee.amount().to_string(),
            late_fee_currency: terms.late_fee.currency().code().to_string(),
        }
    }

    fn terms_from_model(model: LoanTermsModel) -> BankingResult<LoanTerms> {
        Ok(LoanTerms {
            principal_amount: money_from_fields(&model.principal_amount, &model.principal_currency)?,
            annual_interest_rate: model.annual_interest_rate,
            term_months: model.term_months,
            payment_frequency: model.payment_frequency,
            amortization_method: model.amortization_method,
            first_payment_date: model.first_payment_date,
            allow_prepayment: model.allow_prepayment,
            prepayment_penalty_rate: model.prepayment_penalty_rate,
            grace_period_days: model.grace_period_days,
            late_fee: money_from_fields(&model.late_fee_amount, &model.late_fee_currency)?,
        })
    }
}

pub struct LoanPaymentMapper;

impl LoanPaymentMapper {
    pub fn to_model(payment: &LoanPayment) -> LoanPaymentModel {
        LoanPaymentModel {
            id: payment.id,
            loan_id: payment.loan_id,
            transaction_id: payment.transaction_id,
            payment_date: payment.payment_date,
            payment_amount: payment.payment_amount.amount().to_string(),
            principal_amount: payment.principal_amount.amount().to_string(),
            interest_amount: payment.interest_amount.amount().to_string(),
            late_fee_amount: payment.late_fee.amount().to_string(),
            prepayment_penalty_amount: payment.prepayment_penalty.amount().to_string(),
            currency: payment.payment_amount.currency().code().to_string(),
            scheduled_payment_number: payment.scheduled_payment_number,
            created_at: payment.created_at,
            updated_at: payment.updated_at,
        }
    }

    pub fn from_model(model: LoanPaymentModel) -> BankingResult<LoanPayment> {
        let currency = Currency::from_str(&model.currency)?;
        let money = |amount: &str, field: &str| -> BankingResult<Money> {
            Ok(Money::new(decimal_field(amount, field)?, currency))
        };
        Ok(LoanPayment {
            id: model.id,
            loan_id: model.loan_id,
            transaction_id: model.transaction_id,
            payment_date: model.payment_date,
            payment_amount: money(&model.payment_amount, "payment")?,
            principal_amount: money(&model.principal_amount, "principal")?,
            interest_amount: money(&model.interest_amount, "interest")?,
            late_fee: money(&model.late_fee_amount, "late_fee")?,
            prepayment_penalty: money(&model.prepayment_penalty_amount, "prepayment_penalty")?,
            scheduled_payment_number: model.scheduled_payment_number,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

pub struct AmortizationEntryMapper;

impl AmortizationEntryMapper {
    pub fn to_model(loan_id: Uuid, entry: &AmortizationEntry) -> AmortizationEntryModel {
        let now = chrono::Utc::now();
        AmortizationEntryModel {
            loan_id,
            payment_number: entry.payment_number,
            payment_date: entry.payment_date,
            payment_amount: entry.payment_amount.amount().to_string(),
            principal_amount: entry.principal_amount.amount().to_string(),
            interest_amount: entry.interest_amount.amount().to_string(),
            remaining_balance_amount: entry.remaining_balance.amount().to_string(),
            currency: entry.payment_amount.currency().code().to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn from_model(model: AmortizationEntryModel) -> BankingResult<AmortizationEntry> {
        let currency = Currency::from_str(&model.currency)?;
        let money = |amount: &str, field: &str| -> BankingResult<Money> {
            Ok(Money::new(decimal_field(amount, field)?, currency))
        };
        Ok(AmortizationEntry {
            payment_number: model.payment_number,
            payment_date: model.payment_date,
            payment_amount: money(&model.payment_amount, "payment")?,
            principal_amount: money(&model.principal_amount, "principal")?,
            interest_amount: money(&model.interest_amount, "interest")?,
            remaining_balance: money(&model.remaining_balance_amount, "remaining_balance")?,
        })
    }
}
