use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, Duration, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use corebank_api::domain::{
    AccountOpening, AmortizationEntry, AmortizationMethod, AuditEventType, Loan, LoanPayment,
    LoanState, LoanTerms, Money, NewTransaction, PaymentFrequency, ProductType,
    TransactionChannel, TransactionType,
};
use corebank_api::service::{
    AccountService, AuditTrail, LateFeeRunReport, LoanService, TransactionService,
};
use corebank_api::{BankingError, BankingResult};
use corebank_db::models::{AmortizationEntryModel, LoanModel};
use corebank_db::{StorageExt, StorageInterface};

use crate::mappers::{AmortizationEntryMapper, LoanMapper, LoanPaymentMapper};
use crate::services::{all_models, find_models, load_model, save_model};

pub struct LoanServiceImpl {
    storage: Arc<dyn StorageInterface>,
    accounts: Arc<dyn AccountService>,
    transactions: Arc<dyn TransactionService>,
    audit: Arc<dyn AuditTrail>,
}

impl LoanServiceImpl {
    pub fn new(
        storage: Arc<dyn StorageInterface>,
        accounts: Arc<dyn AccountService>,
        transactions: Arc<dyn TransactionService>,
        audit: Arc<dyn AuditTrail>,
    ) -> Self {
        LoanServiceImpl {
            storage,
            accounts,
            transactions,
            audit,
        }
    }

    fn require_loan(&self, loan_id: Uuid) -> BankingResult<Loan> {
        self.loan(loan_id)?
            .ok_or_else(|| BankingError::not_found("loan", loan_id))
    }

    fn save_loan(&self, loan: &Loan) -> BankingResult<()> {
        save_model(self.storage.as_ref(), &LoanMapper::to_model(loan))
    }

    fn next_payment_date(date: NaiveDate, frequency: PaymentFrequency) -> NaiveDate {
        match frequency {
            PaymentFrequency::Weekly => date + Duration::days(7),
            PaymentFrequency::BiWeekly => date + Duration::days(14),
            // Month arithmetic clamps to the end of shorter months.
            PaymentFrequency::Monthly => date
                .checked_add_months(Months::new(1))
                .unwrap_or(date),
            PaymentFrequency::Quarterly => date
                .checked_add_months(Months::new(3))
                .unwrap_or(date),
            PaymentFrequency::SemiAnnually => date
                .checked_add_months(Months::new(6))
                .unwrap_or(date),
            PaymentFrequency::Annually => date
                .checked_add_months(Months::new(12))
                .unwrap_or(date),
        }
    }

    fn equal_installment_schedule(loan: &Loan) -> BankingResult<Vec<AmortizationEntry>> {
        let terms = &loan.terms;
        let mut payment_amount = terms.scheduled_payment()?;
        let periodic_rate = terms.periodic_rate();
        let total_payments = terms.total_payments();

        let mut schedule = Vec::with_capacity(total_payments as usize);
        let mut remaining = terms.principal_amount;
        let mut payment_date = terms.first_payment_date;

        for payment_number in 1..=total_payments {
            let interest = remaining.mul(periodic_rate);
            let mut principal = payment_amount.checked_sub(&interest)?;

            if payment_number == total_payments || principal > remaining {
                // Close the balance exactly on the final payment.
                principal = remaining;
                payment_amount = principal.checked_add(&interest)?;
                remaining = Money::zero(remaining.currency());
            } else {
                remaining = remaining.checked_sub(&principal)?;
            }

            schedule.push(AmortizationEntry {
                payment_number,
                payment_date,
                payment_amount,
                principal_amount: principal,
                interest_amount: interest,
                remaining_balance: remaining,
            });

            if remaining.is_zero() {
                break;
            }
            payment_date = Self::next_payment_date(payment_date, terms.payment_frequency);
        }
        Ok(schedule)
    }

    fn equal_principal_schedule(loan: &Loan) -> BankingResult<Vec<AmortizationEntry>> {
        let terms = &loan.terms;
        let periodic_rate = terms.periodic_rate();
        let total_payments = terms.total_payments();
        let principal_per_payment = terms
            .principal_amount
            .div(Decimal::from(total_payments))?;

        let mut schedule = Vec::with_capacity(total_payments as usize);
        let mut remaining = terms.principal_amount;
        let mut payment_date = terms.first_payment_date;

        for payment_number in 1..=total_payments {
            let interest = remaining.mul(periodic_rate);
            let mut principal = principal_per_payment;
            if payment_number == total_payments || principal > remaining {
                // Absorb rounding drift into the final payment.
                principal = remaining;
            }
            let payment_amount = principal.checked_add(&interest)?;
            remaining = remaining.checked_sub(&principal)?;

            schedule.push(AmortizationEntry {
                payment_number,
                payment_date,
                payment_amount,
                principal_amount: principal,
                interest_amount: interest,
                remaining_balance: remaining,
            });

            if remaining.is_zero() {
                break;
            }
            payment_date = Self::next_payment_date(payment_date, terms.payment_frequency);
        }
        Ok(schedule)
    }

    fn bullet_schedule(loan: &Loan) -> BankingResult<Vec<AmortizationEntry>> {
        let terms = &loan.terms;
        let periodic_rate = terms.periodic_rate();
        let total_payments = terms.total_payments();
        let remaining = terms.principal_amount;
        let interest_payment = remaining.mul(periodic_rate);

        let mut schedule = Vec::with_capacity(total_payments as usize);
        let mut payment_date = terms.first_payment_date;

        for payment_number in 1..total_payments {
            schedule.push(AmortizationEntry {
                payment_number,
                payment_date,
                payment_amount: interest_payment,
                principal_amount: Money::zero(remaining.currency()),
                interest_amount: interest_payment,
                remaining_balance: remaining,
            });
            payment_date = Self::next_payment_date(payment_date, terms.payment_frequency);
        }

        schedule.push(AmortizationEntry {
            payment_number: total_payments,
            payment_date,
            payment_amount: remaining.checked_add(&interest_payment)?,
            principal_amount: remaining,
            interest_amount: interest_payment,
            remaining_balance: Money::zero(remaining.currency()),
        });
        Ok(schedule)
    }

    /// Interest due first, remainder to principal. A payment smaller than
    /// the interest due is all interest.
    fn payment_allocation(
        loan: &Loan,
        payment_amount: &Money,
    ) -> BankingResult<(Money, Money)> {
        let periodic_rate = loan.terms.periodic_rate();
        let mut interest_due = loan.current_balance.mul(periodic_rate);
        let mut principal_due = payment_amount.checked_sub(&interest_due)?;

        if principal_due.is_negative() {
            principal_due = Money::zero(payment_amount.currency());
            interest_due = *payment_amount;
        }
        Ok((interest_due, principal_due))
    }

    /// Delinquency measured against the amortization schedule: days since
    /// the first scheduled date whose cumulative scheduled amount exceeds
    /// what the loan has actually paid.
    fn days_past_due(&self, loan: &Loan, as_of: NaiveDate) -> BankingResult<u32> {
        let schedule = self.amortization_schedule(loan.id)?;
        let tolerance = Decimal::ONE
            / Decimal::from(10u32.pow(loan.current_balance.currency().precision()));

        let mut scheduled_total = Decimal::ZERO;
        for entry in &schedule {
            scheduled_total += entry.payment_amount.amount();
            if loan.total_paid.amount() + tolerance < scheduled_total {
                let overdue_days = (as_of - entry.payment_date).num_days();
                return Ok(overdue_days.max(0) as u32);
            }
        }
        Ok(0)
    }

    fn charge_late_fee(&self, loan: &mut Loan, today: NaiveDate) -> BankingResult<()> {
        let request = NewTransaction::new(
            TransactionType::Fee,
            loan.terms.late_fee,
            "Late payment fee",
            TransactionChannel::System,
        )
        .from_account(loan.account_id);
        let created = self.transactions.create_transaction(request)?;
        self.transactions.process_transaction(created.id)?;

        loan.last_late_fee_date = Some(today);
        loan.updated_at = Utc::now();
        self.save_loan(loan)?;

        self.audit.record(
            AuditEventType::LoanLateFeeCharged,
            "loan",
            &loan.id.to_string(),
            BTreeMap::from([
                ("late_fee".to_string(), loan.terms.late_fee.to_string()),
                ("charged_on".to_string(), today.to_string()),
            ]),
        )?;
        Ok(())
    }
}

impl LoanService for LoanServiceImpl {
    fn originate_loan(&self, customer_id: Uuid, terms: LoanTerms) -> BankingResult<Loan> {
        terms.validate()?;
        let currency = terms.principal_amount.currency();

        let mut opening = AccountOpening::new(
            customer_id,
            ProductType::Loan,
            currency,
            &format!("Loan Account - {}", terms.principal_amount),
        );
        opening.minimum_balance = Some(Money::zero(currency));
        let loan_account = self.accounts.create_account(opening)?;

        let today = Utc::now().date_naive();
        let maturity_date =
            terms.first_payment_date + Duration::days(i64::from(terms.term_months) * 30);
        let now = Utc::now();
        let loan = Loan {
            id: Uuid::new_v4(),
            account_id: loan_account.id,
            customer_id,
            current_balance: terms.principal_amount,
            total_paid: Money::zero(currency),
            interest_paid: Money::zero(currency),
            principal_paid: Money::zero(currency),
            state: LoanState::Originated,
            originated_date: Some(today),
            disbursed_date: None,
            first_payment_date: Some(terms.first_payment_date),
            last_payment_date: None,
            maturity_date: Some(maturity_date),
            days_past_due: 0,
            last_late_fee_date: None,
            terms,
            created_at: now,
            updated_at: now,
        };
        self.save_loan(&loan)?;
        self.generate_amortization_schedule(loan.id)?;

        self.audit.record(
            AuditEventType::LoanOriginated,
            "loan",
            &loan.id.to_string(),
            BTreeMap::from([
                ("customer_id".to_string(), customer_id.to_string()),
                (
                    "principal_amount".to_string(),
                    loan.terms.principal_amount.to_string(),
                ),
                (
                    "annual_rate".to_string(),
                    loan.terms.annual_interest_rate.to_string(),
                ),
                ("term_months".to_string(), loan.terms.term_months.to_string()),
            ]),
        )?;

        tracing::info!(loan_id = %loan.id, principal = %loan.terms.principal_amount, "loan originated");
        Ok(loan)
    }

    fn disburse_loan(&self, loan_id: Uuid, deposit_account_id: Uuid) -> BankingResult<Loan> {
        let mut loan = self.require_loan(loan_id)?;
        if loan.state != LoanState::Originated {
            return Err(BankingError::bad_state(
                "loan",
                loan_id,
                loan.state,
                "originated",
            ));
        }

        let loan = self.storage.atomic(|| {
            let request = NewTransaction::new(
                TransactionType::TransferInternal,
                loan.terms.principal_amount,
                "Loan disbursement",
                TransactionChannel::System,
            )
            .from_account(loan.account_id)
            .to_account(deposit_account_id)
            .idempotency_key(&format!("LOAN-DISB-{loan_id}"));
            let created = self.transactions.create_transaction(request)?;
            let processed = self.transactions.process_transaction(created.id)?;

            let today = Utc::now().date_naive();
            loan.state = LoanState::Disbursed;
            loan.disbursed_date = Some(today);
            loan.updated_at = Utc::now();
            self.save_loan(&loan)?;

            self.audit.record(
                AuditEventType::LoanDisbursed,
                "loan",
                &loan.id.to_string(),
                BTreeMap::from([
                    ("transaction_id".to_string(), processed.id.to_string()),
                    (
                        "disbursement_account".to_string(),
                        deposit_account_id.to_string(),
                    ),
                    ("amount".to_string(), loan.terms.principal_amount.to_string()),
                ]),
            )?;
            Ok(loan.clone())
        })?;

        tracing::info!(%loan_id, "loan disbursed");
        Ok(loan)
    }

    fn make_payment(
        &self,
        loan_id: Uuid,
        payment_amount: Money,
        payment_date: NaiveDate,
        source_account_id: Option<Uuid>,
    ) -> BankingResult<LoanPayment> {
        let mut loan = self.require_loan(loan_id)?;
        if !loan.is_in_repayment() {
            return Err(BankingError::bad_state(
                "loan",
                loan_id,
                loan.state,
                "disbursed or active",
            ));
        }
        let currency = payment_amount.currency();

        // Past-due loans pay the fixed late fee off the top.
        let mut late_fee = Money::zero(currency);
        let mut net_payment = payment_amount;
        if loan.is_past_due() {
            late_fee = loan.terms.late_fee;
            net_payment = net_payment.checked_sub(&late_fee)?;
        }

        let (interest_due, principal_due) = Self::payment_allocation(&loan, &net_payment)?;

        let mut prepayment_penalty = Money::zero(currency);
        if let Some(penalty_rate) = loan.terms.prepayment_penalty_rate {
            let scheduled = loan.terms.scheduled_payment()?;
            if net_payment > scheduled {
                prepayment_penalty = net_payment.checked_sub(&scheduled)?.mul(penalty_rate);
            }
        }

        let payment = self.storage.atomic(|| {
            let total_charge = net_payment
                .checked_add(&late_fee)?
                .checked_add(&prepayment_penalty)?;
            let mut request = NewTransaction::new(
                TransactionType::Payment,
                total_charge,
                "Loan payment",
                TransactionChannel::System,
            )
            .to_account(loan.account_id);
            if let Some(source) = source_account_id {
                request = request.from_account(source);
            }
            let created = self.transactions.create_transaction(request)?;
            let processed = self.transactions.process_transaction(created.id)?;

            let now = Utc::now();
            let payment = LoanPayment {
                id: Uuid::new_v4(),
                loan_id,
                transaction_id: processed.id,
                payment_date,
                payment_amount: net_payment,
                principal_amount: principal_due.min_of(net_payment)?,
                interest_amount: interest_due.min_of(net_payment)?,
                late_fee,
                prepayment_penalty,
                scheduled_payment_number: None,
                created_at: now,
                updated_at: now,
            };
            save_model(self.storage.as_ref(), &LoanPaymentMapper::to_model(&payment))?;

            loan.current_balance = loan.current_balance.checked_sub(&payment.principal_amount)?;
            loan.total_paid = loan.total_paid.checked_add(&payment.payment_amount)?;
            loan.principal_paid = loan.principal_paid.checked_add(&payment.principal_amount)?;
            loan.interest_paid = loan.interest_paid.checked_add(&payment.interest_amount)?;
            loan.last_payment_date = Some(payment_date);

            if !loan.current_balance.is_positive() {
                loan.current_balance = Money::zero(currency);
                loan.state = LoanState::PaidOff;
            } else {
                loan.state = LoanState::Active;
            }
            loan.days_past_due = self.days_past_due(&loan, payment_date)?;
            loan.updated_at = now;
            self.save_loan(&loan)?;

            self.audit.record(
                AuditEventType::LoanPaymentMade,
                "loan",
                &loan.id.to_string(),
                BTreeMap::from([
                    ("payment_id".to_string(), payment.id.to_string()),
                    ("transaction_id".to_string(), processed.id.to_string()),
                    ("payment_amount".to_string(), payment.payment_amount.to_string()),
                    (
                        "principal_amount".to_string(),
                        payment.principal_amount.to_string(),
                    ),
                    (
                        "interest_amount".to_string(),
                        payment.interest_amount.to_string(),
                    ),
                    (
                        "remaining_balance".to_string(),
                        loan.current_balance.to_string(),
                    ),
                ]),
            )?;
            Ok(payment)
        })?;

        tracing::info!(
            %loan_id,
            amount = %payment.payment_amount,
            remaining = %loan.current_balance,
            "loan payment applied"
        );
        Ok(payment)
    }

    fn generate_amortization_schedule(
        &self,
        loan_id: Uuid,
    ) -> BankingResult<Vec<AmortizationEntry>> {
        let loan = self.require_loan(loan_id)?;

        let schedule = match loan.terms.amortization_method {
            AmortizationMethod::EqualInstallment => Self::equal_installment_schedule(&loan)?,
            AmortizationMethod::EqualPrincipal => Self::equal_principal_schedule(&loan)?,
            AmortizationMethod::Bullet => Self::bullet_schedule(&loan)?,
            AmortizationMethod::Custom => {
                return Err(BankingError::validation(
                    "amortization_method",
                    "custom schedules are supplied externally",
                ))
            }
        };

        for entry in &schedule {
            entry.validate()?;
            save_model(
                self.storage.as_ref(),
                &AmortizationEntryMapper::to_model(loan_id, entry),
            )?;
        }
        Ok(schedule)
    }

    fn amortization_schedule(&self, loan_id: Uuid) -> BankingResult<Vec<AmortizationEntry>> {
        let models: Vec<AmortizationEntryModel> = find_models(
            self.storage.as_ref(),
            &[("loan_id", json!(loan_id))],
        )?;
        let mut schedule = models
            .into_iter()
            .map(AmortizationEntryMapper::from_model)
            .collect::<BankingResult<Vec<_>>>()?;
        schedule.sort_by_key(|entry| entry.payment_number);
        Ok(schedule)
    }

    fn loan(&self, loan_id: Uuid) -> BankingResult<Option<Loan>> {
        load_model::<LoanModel>(self.storage.as_ref(), &loan_id.to_string())?
            .map(LoanMapper::from_model)
            .transpose()
    }

    fn customer_loans(&self, customer_id: Uuid) -> BankingResult<Vec<Loan>> {
        let models: Vec<LoanModel> = find_models(
            self.storage.as_ref(),
            &[("customer_id", json!(customer_id))],
        )?;
        models.into_iter().map(LoanMapper::from_model).collect()
    }

    fn loan_payments(&self, loan_id: Uuid) -> BankingResult<Vec<LoanPayment>> {
        let models: Vec<corebank_db::models::LoanPaymentModel> = find_models(
            self.storage.as_ref(),
            &[("loan_id", json!(loan_id))],
        )?;
        let mut payments = models
            .into_iter()
            .map(LoanPaymentMapper::from_model)
            .collect::<BankingResult<Vec<_>>>()?;
        payments.sort_by_key(|payment| payment.payment_date);
        Ok(payments)
    }

    fn process_past_due_loans(&self, today: NaiveDate) -> BankingResult<LateFeeRunReport> {
        let models: Vec<LoanModel> = all_models(self.storage.as_ref())?;
        let loans = models
            .into_iter()
            .map(LoanMapper::from_model)
            .collect::<BankingResult<Vec<_>>>()?;

        let mut report = LateFeeRunReport {
            loans_processed: 0,
            late_fees_charged: 0,
            errors: Vec::new(),
        };

        for mut loan in loans.into_iter().filter(Loan::is_in_repayment) {
            let outcome = (|| -> BankingResult<bool> {
                let days_past_due = self.days_past_due(&loan, today)?;
                if days_past_due <= loan.terms.grace_period_days {
                    return Ok(false);
                }
                report.loans_processed += 1;

                // At most one late fee per calendar month.
                let already_charged_this_month = loan.last_late_fee_date.is_some_and(|date| {
                    date.month() == today.month() && date.year() == today.year()
                });
                let mut charged = false;
                if !already_charged_this_month {
                    self.charge_late_fee(&mut loan, today)?;
                    charged = true;
                }

                loan.days_past_due = days_past_due;
                loan.updated_at = Utc::now();
                self.save_loan(&loan)?;
                Ok(charged)
            })();

            match outcome {
                Ok(true) => report.late_fees_charged += 1,
                Ok(false) => {}
                Err(error) => {
                    let message = format!("past-due processing failed for {}: {error}", loan.id);
                    let _ = self.audit.record(
                        AuditEventType::JobError,
                        "loan",
                        &loan.id.to_string(),
                        BTreeMap::from([
                            ("job".to_string(), "past_due_loans".to_string()),
                            ("error".to_string(), message.clone()),
                        ]),
                    );
                    report.errors.push(message);
                }
            }
        }

        Ok(report)
    }
}
