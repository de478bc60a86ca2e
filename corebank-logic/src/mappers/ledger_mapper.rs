use corebank_api::domain::{JournalEntry, JournalLine};
use corebank_api::BankingResult;
use corebank_db::models::{JournalEntryModel, JournalLineModel};

use super::{bounded_text, money_from_fields, money_to_fields};

pub struct JournalEntryMapper;

impl JournalEntryMapper {
    pub fn to_model(entry: &JournalEntry) -> JournalEntryModel {
        JournalEntryModel {
            id: entry.id,
            reference: entry.reference.to_string(),
            description: entry.description.to_string(),
            lines: entry.lines.iter().map(Self::line_to_model).collect(),
            state: entry.state,
            posted_at: entry.posted_at,
            reversed_by: entry.reversed_by,
            reverses: entry.reverses,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }

    pub fn from_model(model: JournalEntryModel) -> BankingResult<JournalEntry> {
        let lines = model
            .lines
            .into_iter()
            .map(Self::line_from_model)
            .collect::<BankingResult<Vec<_>>>()?;
        Ok(JournalEntry {
            id: model.id,
            reference: bounded_text(&model.reference)?,
            description: bounded_text(&model.description)?,
            lines,
            state: model.state,
            posted_at: model.posted_at,
            reversed_by: model.reversed_by,
            reverses: model.reverses,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    fn line_to_model(line: &JournalLine) -> JournalLineModel {
        let (debit_amount, debit_currency) = money_to_fields(&line.debit);
        let (credit_amount, credit_currency) = money_to_fields(&line.credit);
        JournalLineModel {
            account_id: line.account_id,
            description: line.description.clone(),
            debit_amount,
            debit_currency,
            credit_amount,
            credit_currency,
        }
    }

    fn line_from_model(model: JournalLineModel) -> BankingResult<JournalLine> {
        Ok(JournalLine {
            account_id: model.account_id,
            description: model.description,
            debit: money_from_fields(&model.debit_amount, &model.debit_currency)?,
            credit: money_from_fields(&model.credit_amount, &model.credit_currency)?,
        })
    }
}
