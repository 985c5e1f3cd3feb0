use rust_decimal::Decimal;
use tracing::debug;

use super::types::{Withholding, WithholdingInput};
use crate::core::{
    ClientRecord, EngineConfig, InvoiceId, InvoiceRecord, InvoiceRef, TaxError, TrainerId,
    ValidationError, check_percentage, ensure_valid,
};
use crate::exemption::{self, EvaluationContext, Exemption, ExemptionKind};

/// Computes one withholding per invoice.
///
/// ```
/// use chrono::NaiveDate;
/// use declara::core::*;
/// use declara::withholding::WithholdingCalculator;
/// use rust_decimal_macros::dec;
///
/// let client = ClientRecord {
///     id: "client-1".into(),
///     name: "Empresa Alpha SL".into(),
///     tax_id: Some("B12345678".into()),
///     address: None,
/// };
/// let invoice = InvoiceRecord {
///     id: "inv-1".into(),
///     number: "F-2025-001".into(),
///     date: NaiveDate::from_ymd_opt(2025, 5, 10).unwrap(),
///     subtotal: dec!(1000),
///     tax_amount: dec!(210),
///     client_id: "client-1".into(),
///     state: InvoiceState::Paid,
///     deleted: false,
/// };
///
/// let w = WithholdingCalculator::new()
///     .compute_from_invoice("trainer-1", &invoice, &client)
///     .unwrap();
/// assert_eq!(w.amount(), dec!(150));
/// assert_eq!(w.period_label(), "2025-Q2");
/// ```
#[derive(Debug, Clone)]
pub struct WithholdingCalculator {
    percentage: Decimal,
    exemptions: Vec<Exemption>,
}

impl Default for WithholdingCalculator {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl WithholdingCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            percentage: config.default_withholding_percentage,
            exemptions: Vec::new(),
        }
    }

    pub fn percentage(mut self, percentage: Decimal) -> Self {
        self.percentage = percentage;
        self
    }

    /// Income-tax exemptions that discount the base, evaluated on the invoice date.
    pub fn exemptions(mut self, exemptions: Vec<Exemption>) -> Self {
        self.exemptions = exemptions;
        self
    }

    /// Withholding for `invoice` in `pending`, with the client snapshotted.
    pub fn compute_from_invoice(
        &self,
        trainer: impl Into<TrainerId>,
        invoice: &InvoiceRecord,
        client: &ClientRecord,
    ) -> Result<Withholding, TaxError> {
        let mut errors = Vec::new();
        check_percentage(self.percentage, "percentage", &mut errors);
        if invoice.client_id != client.id {
            errors.push(ValidationError::new(
                "client",
                format!(
                    "invoice {} belongs to client {}, not {}",
                    invoice.number, invoice.client_id, client.id
                ),
            ));
        }
        ensure_valid(errors)?;

        let taxable_base = invoice.subtotal - self.exempt_base(invoice, client)?;
        let withholding = Withholding::create(WithholdingInput {
            trainer: trainer.into(),
            invoice: InvoiceRef::from(invoice),
            client: client.clone(),
            taxable_base,
            percentage: Some(self.percentage),
            date: invoice.date,
            year: None,
            quarter: None,
        })?;

        debug!(
            trainer = %withholding.trainer,
            invoice = %invoice.id,
            period = %withholding.period,
            amount = %withholding.amount,
            "computed withholding"
        );
        Ok(withholding)
    }

    /// Compute and reject if `existing` already has an active withholding for the invoice.
    pub fn create_or_reject(
        &self,
        existing: &[Withholding],
        trainer: impl Into<TrainerId>,
        invoice: &InvoiceRecord,
        client: &ClientRecord,
    ) -> Result<Withholding, TaxError> {
        ensure_invoice_free(existing, &invoice.id)?;
        self.compute_from_invoice(trainer, invoice, client)
    }

    fn exempt_base(
        &self,
        invoice: &InvoiceRecord,
        client: &ClientRecord,
    ) -> Result<Decimal, TaxError> {
        if self.exemptions.is_empty() || invoice.subtotal <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        exemption::exempt_amount(
            &self.exemptions,
            &EvaluationContext::for_invoice(invoice).with_client(client),
            invoice.date,
            &[ExemptionKind::IncomeTax, ExemptionKind::General],
            invoice.subtotal,
        )
    }
}

/// Withholding for `invoice` at `percentage` (15 when `None`).
pub fn compute_from_invoice(
    trainer: impl Into<TrainerId>,
    invoice: &InvoiceRecord,
    client: &ClientRecord,
    percentage: Option<Decimal>,
) -> Result<Withholding, TaxError> {
    let mut calculator = WithholdingCalculator::new();
    if let Some(percentage) = percentage {
        calculator = calculator.percentage(percentage);
    }
    calculator.compute_from_invoice(trainer, invoice, client)
}

/// Accept `candidate` only if no active withholding in `existing` references its invoice.
///
/// Storage should back this with a unique constraint over active rows per invoice.
pub fn create_or_reject(
    existing: &[Withholding],
    candidate: Withholding,
) -> Result<Withholding, TaxError> {
    ensure_invoice_free(existing, &candidate.invoice.id)?;
    Ok(candidate)
}

fn ensure_invoice_free(existing: &[Withholding], invoice: &InvoiceId) -> Result<(), TaxError> {
    if existing.iter().any(|w| w.active && &w.invoice.id == invoice) {
        debug!(invoice = %invoice, "invoice already has a withholding");
        return Err(TaxError::DuplicateWithholding(invoice.clone()));
    }
    Ok(())
}
