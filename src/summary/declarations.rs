use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{Period, Quarter, TaxError, TrainerId};
use crate::declaration::{Declaration, DeclarationState};

/// Year overview of a trainer's stored declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualDeclarationSummary {
    pub trainer: TrainerId,
    pub year: i32,
    pub total_declarations: usize,
    pub total_vat_collected: Decimal,
    pub total_vat_paid: Decimal,
    pub total_result: Decimal,
    /// One entry per stored declaration, ordered by quarter then model.
    pub per_quarter: Vec<QuarterDeclarationSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterDeclarationSummary {
    pub quarter: Quarter,
    pub model: String,
    pub state: DeclarationState,
    pub result: Decimal,
    pub deadline: NaiveDate,
    pub filed_date: Option<DateTime<Utc>>,
}

/// Roll up the active declarations of `trainer` for `year`.
///
/// Uses the stored totals only; invoices and expenses are never consulted.
pub fn annual_declaration_summary(
    declarations: &[Declaration],
    trainer: &TrainerId,
    year: i32,
) -> Result<AnnualDeclarationSummary, TaxError> {
    // Validates the year; the quarter is irrelevant.
    Period::from_parts(year, Quarter::Q1)?;

    let mut selected: Vec<&Declaration> = declarations
        .iter()
        .filter(|d| d.is_active() && d.trainer() == trainer && d.year() == year)
        .collect();
    selected.sort_by(|a, b| {
        a.period()
            .cmp(&b.period())
            .then_with(|| a.model().cmp(b.model()))
    });

    let mut summary = AnnualDeclarationSummary {
        trainer: trainer.clone(),
        year,
        total_declarations: selected.len(),
        total_vat_collected: Decimal::ZERO,
        total_vat_paid: Decimal::ZERO,
        total_result: Decimal::ZERO,
        per_quarter: Vec::with_capacity(selected.len()),
    };
    for d in selected {
        let totals = d.totals();
        summary.total_vat_collected += totals.vat_collected;
        summary.total_vat_paid += totals.vat_paid;
        summary.total_result += totals.result;
        summary.per_quarter.push(QuarterDeclarationSummary {
            quarter: d.period().quarter(),
            model: d.model().to_string(),
            state: d.state(),
            result: totals.result,
            deadline: d.deadline_date(),
            filed_date: d.filed_date(),
        });
    }
    Ok(summary)
}

/// The active declaration of `trainer` for `period` and `model`, if any.
pub fn declaration_for_period<'a>(
    declarations: &'a [Declaration],
    trainer: &TrainerId,
    period: Period,
    model: &str,
) -> Option<&'a Declaration> {
    declarations.iter().find(|d| {
        d.is_active() && d.trainer() == trainer && d.period() == period && d.model() == model
    })
}

/// Active drafts of `trainer` whose filing deadline has passed on `today`.
pub fn overdue_declarations<'a>(
    declarations: &'a [Declaration],
    trainer: &TrainerId,
    today: NaiveDate,
) -> Vec<&'a Declaration> {
    declarations
        .iter()
        .filter(|d| d.trainer() == trainer && d.is_overdue(today))
        .collect()
}
