//! Picking the records that belong to a period.
//!
//! The aggregator trusts its input and never filters. These helpers apply
//! the usual selection (dates inside the quarter, voided and deleted
//! records left out) for callers that hold an unfiltered collection.

use super::period::Period;
use super::types::{ExpenseRecord, ExpenseState, InvoiceRecord, InvoiceState};

/// Invoices dated inside `period` that are neither voided nor deleted.
pub fn select_invoices<'a>(
    invoices: impl IntoIterator<Item = &'a InvoiceRecord>,
    period: &Period,
) -> Vec<InvoiceRecord> {
    invoices
        .into_iter()
        .filter(|i| !i.deleted && i.state != InvoiceState::Voided)
        .filter(|i| period.contains(i.date))
        .cloned()
        .collect()
}

/// Paid, active expenses dated inside `period`.
pub fn select_expenses<'a>(
    expenses: impl IntoIterator<Item = &'a ExpenseRecord>,
    period: &Period,
) -> Vec<ExpenseRecord> {
    expenses
        .into_iter()
        .filter(|e| e.active && e.state == ExpenseState::Paid)
        .filter(|e| period.contains(e.date))
        .cloned()
        .collect()
}
