use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{ClientId, Period, Quarter, TaxError, TrainerId};
use crate::withholding::{Withholding, WithholdingState};

/// Quarter overview of a trainer's stored withholdings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyWithholdingSummary {
    pub trainer: TrainerId,
    pub period: Period,
    pub total_count: usize,
    pub total_base: Decimal,
    pub total_withheld: Decimal,
    /// Ordered by client id.
    pub per_client: Vec<ClientWithholdingSummary>,
    pub pending_count: usize,
    pub declared_count: usize,
    pub paid_count: usize,
    pub certificates_issued_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientWithholdingSummary {
    pub client_id: ClientId,
    /// Name from the first snapshot seen for this client.
    pub client_name: String,
    pub count: usize,
    pub total_base: Decimal,
    pub total_withheld: Decimal,
}

/// Year overview of a trainer's stored withholdings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualWithholdingSummary {
    pub trainer: TrainerId,
    pub year: i32,
    pub total_count: usize,
    pub total_base: Decimal,
    pub total_withheld: Decimal,
    /// Always four entries, Q1 to Q4; empty quarters are zero.
    pub per_quarter: Vec<QuarterWithholdingTotals>,
    pub certificates_issued_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterWithholdingTotals {
    pub quarter: Quarter,
    pub count: usize,
    pub total_base: Decimal,
    pub total_withheld: Decimal,
}

/// Roll up the active withholdings of `trainer` for one quarter.
pub fn quarterly_withholding_summary(
    withholdings: &[Withholding],
    trainer: &TrainerId,
    year: i32,
    quarter: u8,
) -> Result<QuarterlyWithholdingSummary, TaxError> {
    let period = Period::new(year, quarter)?;

    let mut summary = QuarterlyWithholdingSummary {
        trainer: trainer.clone(),
        period,
        total_count: 0,
        total_base: Decimal::ZERO,
        total_withheld: Decimal::ZERO,
        per_client: Vec::new(),
        pending_count: 0,
        declared_count: 0,
        paid_count: 0,
        certificates_issued_count: 0,
    };
    let mut clients: BTreeMap<&ClientId, ClientWithholdingSummary> = BTreeMap::new();

    for w in withholdings_for_period(withholdings, trainer, period) {
        summary.total_count += 1;
        summary.total_base += w.taxable_base();
        summary.total_withheld += w.amount();
        match w.state() {
            WithholdingState::Pending => summary.pending_count += 1,
            WithholdingState::Declared => summary.declared_count += 1,
            WithholdingState::Paid => summary.paid_count += 1,
        }
        if w.certificate_issued() {
            summary.certificates_issued_count += 1;
        }

        let entry = clients
            .entry(w.client_id())
            .or_insert_with(|| ClientWithholdingSummary {
                client_id: w.client_id().clone(),
                client_name: w.client().name.clone(),
                count: 0,
                total_base: Decimal::ZERO,
                total_withheld: Decimal::ZERO,
            });
        entry.count += 1;
        entry.total_base += w.taxable_base();
        entry.total_withheld += w.amount();
    }

    summary.per_client = clients.into_values().collect();
    Ok(summary)
}

/// Roll up the active withholdings of `trainer` for a whole year.
pub fn annual_withholding_summary(
    withholdings: &[Withholding],
    trainer: &TrainerId,
    year: i32,
) -> Result<AnnualWithholdingSummary, TaxError> {
    Period::from_parts(year, Quarter::Q1)?;

    let mut per_quarter: Vec<QuarterWithholdingTotals> = Quarter::ALL
        .iter()
        .map(|&quarter| QuarterWithholdingTotals {
            quarter,
            count: 0,
            total_base: Decimal::ZERO,
            total_withheld: Decimal::ZERO,
        })
        .collect();

    let mut summary = AnnualWithholdingSummary {
        trainer: trainer.clone(),
        year,
        total_count: 0,
        total_base: Decimal::ZERO,
        total_withheld: Decimal::ZERO,
        per_quarter: Vec::new(),
        certificates_issued_count: 0,
    };

    for w in withholdings
        .iter()
        .filter(|w| w.is_active() && w.trainer() == trainer && w.year() == year)
    {
        summary.total_count += 1;
        summary.total_base += w.taxable_base();
        summary.total_withheld += w.amount();
        if w.certificate_issued() {
            summary.certificates_issued_count += 1;
        }

        let slot = &mut per_quarter[usize::from(w.quarter().number() - 1)];
        slot.count += 1;
        slot.total_base += w.taxable_base();
        slot.total_withheld += w.amount();
    }

    summary.per_quarter = per_quarter;
    Ok(summary)
}

/// Active withholdings of `trainer` in `period`, ordered by date.
pub fn withholdings_for_period<'a>(
    withholdings: &'a [Withholding],
    trainer: &TrainerId,
    period: Period,
) -> Vec<&'a Withholding> {
    let mut found: Vec<&Withholding> = withholdings
        .iter()
        .filter(|w| w.is_active() && w.trainer() == trainer && w.period() == period)
        .collect();
    found.sort_by_key(|w| w.date());
    found
}

/// Active withholdings for one client, optionally limited to a year, newest first.
pub fn withholdings_for_client<'a>(
    withholdings: &'a [Withholding],
    client: &ClientId,
    year: Option<i32>,
) -> Vec<&'a Withholding> {
    let mut found: Vec<&Withholding> = withholdings
        .iter()
        .filter(|w| w.is_active() && w.client_id() == client)
        .filter(|w| year.is_none_or(|y| w.year() == y))
        .collect();
    found.sort_by(|a, b| b.date().cmp(&a.date()));
    found
}
