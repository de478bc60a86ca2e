use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, Duration, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use corebank_api::domain::{
    AlertStatus, AuditEventType, ComplianceAction, ComplianceDecision, ComplianceViolation,
    CustomerProfile, KycTier, LargeTransactionReport, Money, SuspiciousActivityAlert,
    SuspiciousActivityType, TransactionState, TransactionType,
};
use corebank_api::service::{AuditTrail, ComplianceService, CustomerDirectory};
use corebank_api::{BankingError, BankingResult};
use corebank_db::models::{
    AccountModel, ComplianceViolationModel, SuspiciousActivityAlertModel, TransactionModel,
};
use corebank_db::StorageInterface;

use crate::config::CoreConfig;
use crate::mappers::{
    AccountMapper, ComplianceViolationMapper, LargeTransactionReportMapper,
    SuspiciousActivityAlertMapper, TransactionMapper,
};
use crate::services::{all_models, find_models, load_model, save_model};

/// How many recent violations within one hour trip the velocity check.
const VELOCITY_LIMIT: usize = 5;

pub struct ComplianceServiceImpl {
    storage: Arc<dyn StorageInterface>,
    customers: Arc<dyn CustomerDirectory>,
    audit: Arc<dyn AuditTrail>,
    config: Arc<CoreConfig>,
}

impl ComplianceServiceImpl {
    pub fn new(
        storage: Arc<dyn StorageInterface>,
        customers: Arc<dyn CustomerDirectory>,
        audit: Arc<dyn AuditTrail>,
        config: Arc<CoreConfig>,
    ) -> Self {
        ComplianceServiceImpl {
            storage,
            customers,
            audit,
            config,
        }
    }

    /// Sum of the customer's COMPLETED transactions in the period, in the
    /// requested currency.
    fn transaction_total_since(
        &self,
        customer_id: Uuid,
        amount: &Money,
        since: chrono::DateTime<Utc>,
    ) -> BankingResult<Money> {
        let account_models: Vec<AccountModel> = find_models(
            self.storage.as_ref(),
            &[("customer_id", json!(customer_id))],
        )?;
        let account_ids: Vec<Uuid> = account_models
            .into_iter()
            .map(AccountMapper::from_model)
            .collect::<BankingResult<Vec<_>>>()?
            .into_iter()
            .map(|account| account.id)
            .collect();

        let mut total = Money::zero(amount.currency());
        let transactions: Vec<TransactionModel> = all_models(self.storage.as_ref())?;
        for model in transactions {
            let transaction = TransactionMapper::from_model(model)?;
            if transaction.state != TransactionState::Completed {
                continue;
            }
            if transaction.currency != amount.currency() {
                continue;
            }
            match transaction.processed_at {
                Some(processed_at) if processed_at >= since => {}
                _ => continue,
            }
            let touches_customer = transaction
                .from_account_id
                .map_or(false, |id| account_ids.contains(&id))
                || transaction
                    .to_account_id
                    .map_or(false, |id| account_ids.contains(&id));
            if touches_customer {
                total = total.checked_add(&transaction.amount)?;
            }
        }
        Ok(total)
    }

    fn check_kyc_limits(
        &self,
        profile: &CustomerProfile,
        amount: &Money,
    ) -> BankingResult<Vec<String>> {
        let limits = self.config.tier_limits(profile.kyc_tier)?;
        let mut violations = Vec::new();

        // Limits are USD-denominated and applied in the transaction
        // currency.
        let single = Money::new(limits.single_transaction_limit, amount.currency());
        if amount > &single {
            violations.push(format!(
                "transaction amount {amount} exceeds single transaction limit {single} for {}",
                profile.kyc_tier
            ));
        }

        let now = Utc::now();
        let start_of_day = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .unwrap_or(now);
        let daily_total = self.transaction_total_since(profile.customer_id, amount, start_of_day)?;
        let daily_limit = Money::new(limits.daily_transaction_limit, amount.currency());
        if daily_total.checked_add(amount)? > daily_limit {
            violations.push(format!(
                "transaction would exceed daily limit {daily_limit} (current: {daily_total}, proposed: {amount})"
            ));
        }

        let start_of_month = now
            .date_naive()
            .with_day(1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .unwrap_or(now);
        let monthly_total =
            self.transaction_total_since(profile.customer_id, amount, start_of_month)?;
        let monthly_limit = Money::new(limits.monthly_transaction_limit, amount.currency());
        if monthly_total.checked_add(amount)? > monthly_limit {
            violations.push(format!(
                "transaction would exceed monthly limit {monthly_limit} (current: {monthly_total}, proposed: {amount})"
            ));
        }

        Ok(violations)
    }

    fn requires_large_transaction_report(&self, amount: &Money) -> bool {
        let threshold = self.config.large_transaction_threshold();
        amount.currency() == threshold.currency() && amount >= &threshold
    }

    fn file_large_transaction_report(
        &self,
        customer_id: Uuid,
        transaction_id: Option<Uuid>,
        amount: &Money,
        transaction_type: TransactionType,
    ) -> BankingResult<LargeTransactionReport> {
        let now = Utc::now();
        let report = LargeTransactionReport {
            id: Uuid::new_v4(),
            customer_id,
            transaction_id,
            amount: *amount,
            transaction_type: transaction_type.to_string(),
            reporting_threshold: self.config.large_transaction_threshold(),
            filed_at: None,
            filing_reference: None,
            created_at: now,
            updated_at: now,
        };
        save_model(
            self.storage.as_ref(),
            &LargeTransactionReportMapper::to_model(&report),
        )?;

        self.audit.record(
            AuditEventType::LargeTransactionReported,
            "transaction",
            &transaction_id.map_or_else(|| "pending".to_string(), |id| id.to_string()),
            BTreeMap::from([
                ("customer_id".to_string(), customer_id.to_string()),
                ("amount".to_string(), amount.to_string()),
                ("report_id".to_string(), report.id.to_string()),
            ]),
        )?;
        Ok(report)
    }

    fn is_round_amount(amount: &Money) -> bool {
        let value = amount.amount();
        if value.fract() != Decimal::ZERO {
            return false;
        }
        value % Decimal::from(1000) == Decimal::ZERO || value % Decimal::from(500) == Decimal::ZERO
    }

    fn is_structured_amount(&self, amount: &Money) -> bool {
        let threshold = self.config.large_transaction_threshold();
        if amount.currency() != threshold.currency() {
            return false;
        }
        let lower = threshold.amount() * Decimal::new(95, 2);
        let upper = threshold.amount() * Decimal::new(999, 3);
        amount.amount() >= lower && amount.amount() <= upper
    }

    fn raise_alert(
        &self,
        customer_id: Uuid,
        account_id: Uuid,
        transaction_id: Option<Uuid>,
        activity_type: SuspiciousActivityType,
        description: String,
        risk_score: u8,
    ) -> BankingResult<SuspiciousActivityAlert> {
        let now = Utc::now();
        let alert = SuspiciousActivityAlert {
            id: Uuid::new_v4(),
            customer_id,
            account_id: Some(account_id),
            transaction_id,
            activity_type,
            description: description.clone(),
            risk_score,
            status: AlertStatus::Open,
            assigned_to: None,
            resolution_notes: None,
            resolved_at: None,
            created_at: now,
            updated_at: now,
        };
        save_model(
            self.storage.as_ref(),
            &SuspiciousActivityAlertMapper::to_model(&alert),
        )?;

        self.audit.record(
            AuditEventType::SuspiciousActivityFlagged,
            "customer",
            &customer_id.to_string(),
            BTreeMap::from([
                ("alert_id".to_string(), alert.id.to_string()),
                ("risk_score".to_string(), risk_score.to_string()),
                ("description".to_string(), description),
            ]),
        )?;
        Ok(alert)
    }

    fn check_suspicious_patterns(
        &self,
        profile: &CustomerProfile,
        account_id: Uuid,
        transaction_id: Option<Uuid>,
        amount: &Money,
    ) -> BankingResult<Vec<SuspiciousActivityAlert>> {
        let mut alerts = Vec::new();

        if Self::is_round_amount(amount) && amount.amount() >= Decimal::from(5_000) {
            let risk_score = match profile.kyc_tier {
                KycTier::Tier0 => 60,
                KycTier::Tier1 => 40,
                _ => 30,
            };
            alerts.push(self.raise_alert(
                profile.customer_id,
                account_id,
                transaction_id,
                SuspiciousActivityType::RoundDollarAmounts,
                format!("round dollar amount: {amount}"),
                risk_score,
            )?);
        }

        if self.is_structured_amount(amount) {
            alerts.push(self.raise_alert(
                profile.customer_id,
                account_id,
                transaction_id,
                SuspiciousActivityType::StructuredTransaction,
                format!("transaction amount {amount} just below reporting threshold"),
                70,
            )?);
        }

        let unusual_for_tier = matches!(profile.kyc_tier, KycTier::Tier0 | KycTier::Tier1)
            && amount.amount() > Decimal::from(5_000);
        if unusual_for_tier {
            alerts.push(self.raise_alert(
                profile.customer_id,
                account_id,
                transaction_id,
                SuspiciousActivityType::UnusualTransactionSize,
                format!("transaction amount {amount} unusual for customer pattern"),
                50,
            )?);
        }

        Ok(alerts)
    }

    fn check_velocity(
        &self,
        customer_id: Uuid,
        account_id: Uuid,
        transaction_id: Option<Uuid>,
    ) -> BankingResult<Option<String>> {
        let one_hour_ago = Utc::now() - Duration::hours(1);
        let models: Vec<ComplianceViolationModel> = find_models(
            self.storage.as_ref(),
            &[("customer_id", json!(customer_id))],
        )?;
        let recent = models
            .iter()
            .filter(|model| model.created_at > one_hour_ago)
            .count();

        if recent >= VELOCITY_LIMIT {
            self.raise_alert(
                customer_id,
                account_id,
                transaction_id,
                SuspiciousActivityType::HighVelocity,
                format!("high velocity: {recent} flagged transactions in the last hour"),
                60,
            )?;
            return Ok(Some(format!(
                "high transaction velocity detected: {recent} flagged transactions in the last hour"
            )));
        }
        Ok(None)
    }

    fn record_violation(
        &self,
        customer_id: Uuid,
        account_id: Uuid,
        transaction_id: Option<Uuid>,
        description: String,
        amount: &Money,
        action_taken: ComplianceAction,
    ) -> BankingResult<()> {
        let now = Utc::now();
        let violation = ComplianceViolation {
            id: Uuid::new_v4(),
            customer_id,
            account_id,
            transaction_id,
            description,
            amount: *amount,
            action_taken,
            reviewer: None,
            review_notes: None,
            created_at: now,
            updated_at: now,
        };
        save_model(
            self.storage.as_ref(),
            &ComplianceViolationMapper::to_model(&violation),
        )
    }
}

impl ComplianceService for ComplianceServiceImpl {
    fn check_transaction(
        &self,
        customer_id: Uuid,
        account_id: Uuid,
        amount: Money,
        transaction_type: TransactionType,
        transaction_id: Option<Uuid>,
    ) -> BankingResult<ComplianceDecision> {
        let Some(profile) = self.customers.profile(customer_id)? else {
            return Ok(ComplianceDecision::Blocked(vec![
                "customer not found".to_string()
            ]));
        };
        if !profile.is_active() {
            return Ok(ComplianceDecision::Blocked(vec![
                "customer account is inactive".to_string(),
            ]));
        }

        let mut reasons = Vec::new();
        let mut blocked = false;
        let mut review = false;

        let kyc_violations = self.check_kyc_limits(&profile, &amount)?;
        if !kyc_violations.is_empty() {
            reasons.extend(kyc_violations);
            blocked = true;
        }

        // Reporting is a side record, never a block.
        if self.requires_large_transaction_report(&amount) {
            self.file_large_transaction_report(
                customer_id,
                transaction_id,
                &amount,
                transaction_type,
            )?;
            reasons.push(format!("large transaction report required for {amount}"));
        }

        for alert in
            self.check_suspicious_patterns(&profile, account_id, transaction_id, &amount)?
        {
            reasons.push(format!("suspicious activity detected: {}", alert.description));
            if alert.is_high_risk() {
                review = true;
            }
        }

        if let Some(velocity_reason) =
            self.check_velocity(customer_id, account_id, transaction_id)?
        {
            reasons.push(velocity_reason);
            review = true;
        }

        let action = if blocked {
            ComplianceAction::Block
        } else if review {
            ComplianceAction::Review
        } else {
            ComplianceAction::Allow
        };
        if !reasons.is_empty() {
            self.record_violation(
                customer_id,
                account_id,
                transaction_id,
                reasons.join("; "),
                &amount,
                action,
            )?;
        }

        tracing::debug!(
            %customer_id,
            %account_id,
            ?action,
            reasons = reasons.len(),
            "compliance check complete"
        );
        Ok(match action {
            ComplianceAction::Block => ComplianceDecision::Blocked(reasons),
            ComplianceAction::Review => ComplianceDecision::Review(reasons),
            _ => ComplianceDecision::Allow,
        })
    }

    fn customer_violations(&self, customer_id: Uuid) -> BankingResult<Vec<ComplianceViolation>> {
        let models: Vec<ComplianceViolationModel> = find_models(
            self.storage.as_ref(),
            &[("customer_id", json!(customer_id))],
        )?;
        models
            .into_iter()
            .map(ComplianceViolationMapper::from_model)
            .collect()
    }

    fn alerts(
        &self,
        status: Option<AlertStatus>,
        min_risk_score: Option<u8>,
    ) -> BankingResult<Vec<SuspiciousActivityAlert>> {
        let models: Vec<SuspiciousActivityAlertModel> = all_models(self.storage.as_ref())?;
        let mut alerts = models
            .into_iter()
            .map(SuspiciousActivityAlertMapper::from_model)
            .collect::<BankingResult<Vec<_>>>()?;

        if let Some(status) = status {
            alerts.retain(|alert| alert.status == status);
        }
        if let Some(min_risk_score) = min_risk_score {
            alerts.retain(|alert| alert.risk_score >= min_risk_score);
        }
        alerts.sort_by(|a, b| {
            b.risk_score
                .cmp(&a.risk_score)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(alerts)
    }

    fn resolve_alert(
        &self,
        alert_id: Uuid,
        resolution: AlertStatus,
        notes: &str,
        reviewer: &str,
    ) -> BankingResult<SuspiciousActivityAlert> {
        let model: SuspiciousActivityAlertModel =
            load_model(self.storage.as_ref(), &alert_id.to_string())?
                .ok_or_else(|| BankingError::not_found("alert", alert_id))?;
        let mut alert = SuspiciousActivityAlertMapper::from_model(model)?;

        let now = Utc::now();
        alert.status = resolution;
        alert.resolution_notes = Some(notes.to_string());
        alert.assigned_to = Some(reviewer.to_string());
        alert.resolved_at = Some(now);
        alert.updated_at = now;
        save_model(
            self.storage.as_ref(),
            &SuspiciousActivityAlertMapper::to_model(&alert),
        )?;
        Ok(alert)
    }
}
