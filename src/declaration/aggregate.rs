use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::debug;

use super::types::{Declaration, LineItem};
use crate::core::{
    ClientId, ClientRecord, EngineConfig, ExpenseRecord, ExpenseRef, InvoiceRecord, InvoiceRef,
    Period, TaxError, TrainerId, ValidationError, add_money, check_non_negative, check_percentage,
    ensure_valid,
};
use crate::exemption::{self, EvaluationContext, Exemption, ExemptionKind};

/// Builds draft declarations from a quarter's invoices and expenses.
///
/// The records passed in must already be restricted to the quarter and
/// must exclude voided or deleted entries (see
/// [`select_invoices`](crate::core::select_invoices)); nothing is filtered
/// here.
///
/// ```
/// use chrono::NaiveDate;
/// use declara::core::*;
/// use declara::declaration::Aggregator;
/// use rust_decimal_macros::dec;
///
/// let invoice = InvoiceRecord {
///     id: "inv-1".into(),
///     number: "F-2025-001".into(),
///     date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
///     subtotal: dec!(5000),
///     tax_amount: dec!(1050),
///     client_id: "client-1".into(),
///     state: InvoiceState::Paid,
///     deleted: false,
/// };
/// let expense = ExpenseRecord {
///     id: "exp-1".into(),
///     date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
///     amount: dec!(1200),
///     concept: "Studio rent".into(),
///     state: ExpenseState::Paid,
///     active: true,
/// };
///
/// let declaration = Aggregator::new()
///     .build_from_period("trainer-1", 2025, 1, &[invoice], &[expense])
///     .unwrap();
/// assert_eq!(declaration.totals().result, dec!(798));
/// ```
#[derive(Debug, Clone)]
pub struct Aggregator {
    model: String,
    expense_vat_rate: Decimal,
    exemptions: Vec<Exemption>,
    clients: BTreeMap<ClientId, ClientRecord>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            model: config.default_model.clone(),
            expense_vat_rate: config.expense_vat_rate,
            exemptions: Vec::new(),
            clients: BTreeMap::new(),
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn expense_vat_rate(mut self, rate: Decimal) -> Self {
        self.expense_vat_rate = rate;
        self
    }

    /// Exemptions consulted for every income line, evaluated on the invoice date.
    ///
    /// Conditions on `clientName` or `clientTaxId` only match invoices whose
    /// client was registered with [`clients`](Self::clients).
    pub fn exemptions(mut self, exemptions: Vec<Exemption>) -> Self {
        self.exemptions = exemptions;
        self
    }

    /// Client records looked up by `InvoiceRecord::client_id` when
    /// evaluating exemptions.
    pub fn clients(mut self, clients: impl IntoIterator<Item = ClientRecord>) -> Self {
        self.clients = clients.into_iter().map(|c| (c.id.clone(), c)).collect();
        self
    }

    /// Build a draft declaration for `(year, quarter)`.
    ///
    /// Rejects negative amounts before building anything.
    pub fn build_from_period(
        &self,
        trainer: impl Into<TrainerId>,
        year: i32,
        quarter: u8,
        invoices: &[InvoiceRecord],
        expenses: &[ExpenseRecord],
    ) -> Result<Declaration, TaxError> {
        let period = Period::new(year, quarter)?;
        self.validate_inputs(invoices, expenses)?;

        let mut declaration = Declaration::draft(trainer, period, self.model.clone())?;

        let mut total_exemptions = Decimal::ZERO;
        for invoice in invoices {
            let line =
                LineItem::income(InvoiceRef::from(invoice), invoice.subtotal, invoice.tax_amount)?;
            let exempt = self.exempt_vat(invoice, line.vat_amount)?;
            add_money(&mut total_exemptions, exempt, "total_exemptions")?;
            declaration.line_items.push(line);
        }
        for expense in expenses {
            let description = if expense.concept.trim().is_empty() {
                "Expense".to_string()
            } else {
                expense.concept.clone()
            };
            declaration.line_items.push(LineItem::expense(
                ExpenseRef::from(expense),
                expense.amount,
                self.expense_vat_rate,
                description,
            )?);
        }
        declaration.totals.total_exemptions = total_exemptions;
        declaration.recompute_totals()?;

        debug!(
            trainer = %declaration.trainer,
            period = %period,
            invoices = invoices.len(),
            expenses = expenses.len(),
            result = %declaration.totals.result,
            "built declaration from period"
        );
        Ok(declaration)
    }

    /// Build a declaration and reject it if `existing` already holds an
    /// active one for the same trainer, period and model.
    pub fn create_or_reject(
        &self,
        existing: &[Declaration],
        trainer: impl Into<TrainerId>,
        year: i32,
        quarter: u8,
        invoices: &[InvoiceRecord],
        expenses: &[ExpenseRecord],
    ) -> Result<Declaration, TaxError> {
        let trainer = trainer.into();
        let period = Period::new(year, quarter)?;
        ensure_slot_free(existing, &trainer, period, &self.model)?;
        self.build_from_period(trainer, year, quarter, invoices, expenses)
    }

    fn validate_inputs(
        &self,
        invoices: &[InvoiceRecord],
        expenses: &[ExpenseRecord],
    ) -> Result<(), TaxError> {
        let mut errors = Vec::new();
        if self.model.trim().is_empty() {
            errors.push(ValidationError::new("model", "model must not be empty"));
        }
        check_percentage(self.expense_vat_rate, "expense_vat_rate", &mut errors);
        for (i, invoice) in invoices.iter().enumerate() {
            check_non_negative(invoice.subtotal, &format!("invoices.{i}.subtotal"), &mut errors);
            check_non_negative(
                invoice.tax_amount,
                &format!("invoices.{i}.tax_amount"),
                &mut errors,
            );
        }
        for (i, expense) in expenses.iter().enumerate() {
            check_non_negative(expense.amount, &format!("expenses.{i}.amount"), &mut errors);
        }
        ensure_valid(errors)
    }

    fn exempt_vat(
        &self,
        invoice: &InvoiceRecord,
        vat_amount: Decimal,
    ) -> Result<Decimal, TaxError> {
        if self.exemptions.is_empty() {
            return Ok(Decimal::ZERO);
        }
        let mut context = EvaluationContext::for_invoice(invoice);
        if let Some(client) = self.clients.get(&invoice.client_id) {
            context = context.with_client(client);
        }
        exemption::exempt_amount(
            &self.exemptions,
            &context,
            invoice.date,
            &[ExemptionKind::Vat, ExemptionKind::General],
            vat_amount,
        )
    }
}

/// Build a draft declaration with the default configuration.
pub fn build_from_period(
    trainer: impl Into<TrainerId>,
    year: i32,
    quarter: u8,
    invoices: &[InvoiceRecord],
    expenses: &[ExpenseRecord],
) -> Result<Declaration, TaxError> {
    Aggregator::new().build_from_period(trainer, year, quarter, invoices, expenses)
}

/// Accept `candidate` only if no active declaration in `existing` holds its slot.
///
/// This is the application-level guard; storage still needs a unique
/// constraint over active (trainer, year, quarter, model) rows to close
/// the race between concurrent creations.
pub fn create_or_reject(
    existing: &[Declaration],
    candidate: Declaration,
) -> Result<Declaration, TaxError> {
    ensure_slot_free(existing, &candidate.trainer, candidate.period, &candidate.model)?;
    Ok(candidate)
}

fn ensure_slot_free(
    existing: &[Declaration],
    trainer: &TrainerId,
    period: Period,
    model: &str,
) -> Result<(), TaxError> {
    let taken = existing
        .iter()
        .any(|d| d.active && &d.trainer == trainer && d.period == period && d.model == model);
    if taken {
        debug!(trainer = %trainer, period = %period, model, "declaration slot already taken");
        return Err(TaxError::DuplicatePeriod {
            trainer: trainer.clone(),
            period,
            model: model.to_string(),
        });
    }
    Ok(())
}
