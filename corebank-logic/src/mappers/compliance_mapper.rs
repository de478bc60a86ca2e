use corebank_api::domain::{
    ComplianceViolation, LargeTransactionReport, SuspiciousActivityAlert,
};
use corebank_api::BankingResult;
use corebank_db::models::{
    ComplianceViolationModel, LargeTransactionReportModel, SuspiciousActivityAlertModel,
};

use super::{money_from_fields, money_to_fields};

pub struct ComplianceViolationMapper;

impl ComplianceViolationMapper {
    pub fn to_model(violation: &ComplianceViolation) -> ComplianceViolationModel {
        let (amount, currency) = money_to_fields(&violation.amount);
        ComplianceViolationModel {
            id: violation.id,
            customer_id: violation.customer_id,
            account_id: violation.account_id,
            transaction_id: violation.transaction_id,
            description: violation.description.clone(),
            amount,
            currency,
            action_taken: violation.action_taken,
            reviewer: violation.reviewer.clone(),
            review_notes: violation.review_notes.clone(),
            created_at: violation.created_at,
            updated_at: violation.updated_at,
        }
    }

    pub fn from_model(model: ComplianceViolationModel) -> BankingResult<ComplianceViolation> {
        Ok(ComplianceViolation {
            id: model.id,
            customer_id: model.customer_id,
            account_id: model.account_id,
            transaction_id: model.transaction_id,
            description: model.description,
            amount: money_from_fields(&model.amount, &model.currency)?,
            action_taken: model.action_taken,
            reviewer: model.reviewer,
            review_notes: model.review_notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

pub struct SuspiciousActivityAlertMapper;

impl SuspiciousActivityAlertMapper {
    pub fn to_model(alert: &SuspiciousActivityAlert) -> SuspiciousActivityAlertModel {
        SuspiciousActivityAlertModel {
            id: alert.id,
            customer_id: alert.customer_id,
            account_id: alert.account_id,
            transaction_id: alert.transaction_id,
            activity_type: alert.activity_type,
            description: alert.description.clone(),
            risk_score: alert.risk_score,
            status: alert.status,
            assigned_to: alert.assigned_to.clone(),
            resolution_notes: alert.resolution_notes.clone(),
            resolved_at: alert.resolved_at,
            created_at: alert.created_at,
            updated_at: alert.updated_at,
        }
    }

    pub fn from_model(model: SuspiciousActivityAlertModel) -> BankingResult<SuspiciousActivityAlert> {
        Ok(SuspiciousActivityAlert {
            id: model.id,
            customer_id: model.customer_id,
            account_id: model.account_id,
            transaction_id: model.transaction_id,
            activity_type: model.activity_type,
            description: model.description,
            risk_score: model.risk_score,
            status: model.status,
            assigned_to: model.assigned_to,
            resolution_notes: model.resolution_notes,
            resolved_at: model.resolved_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

pub struct LargeTransactionReportMapper;

impl LargeTransactionReportMapper {
    pub fn to_model(report: &LargeTransactionReport) -> LargeTransactionReportModel {
        let (amount, amount_currency) = money_to_fields(&report.amount);
        let (threshold_amount, threshold_currency) = money_to_fields(&report.reporting_threshold);
        LargeTransactionReportModel {
            id: report.id,
            customer_id: report.customer_id,
            transaction_id: report.transaction_id,
            amount,
            amount_currency,
            transaction_type: report.transaction_type.clone(),
            threshold_amount,
            threshold_currency,
            filed_at: report.filed_at,
            filing_reference: report.filing_reference.clone(),
            created_at: report.created_at,
            updated_at: report.updated_at,
        }
    }

    pub fn from_model(model: LargeTransactionReportModel) -> BankingResult<LargeTransactionReport> {
        Ok(LargeTransactionReport {
            id: model.id,
            customer_id: model.customer_id,
            transaction_id: model.transaction_id,
            amount: money_from_fields(&model.amount, &model.amount_currency)?,
            transaction_type: model.transaction_type,
            reporting_threshold: money_from_fields(
                &model.threshold_amount,
                &model.threshold_currency,
            )?,
            filed_at: model.filed_at,
            filing_reference: model.filing_reference,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
