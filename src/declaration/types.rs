use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{
    ExpenseRef, InvoiceRef, Period, TaxError, TrainerId, ValidationError, add_money,
    check_non_negative, ensure_valid, percent_of, round_money,
};

/// Declaration lifecycle.
///
/// ```text
/// Draft ──file()──▶ Filed ──pay()──▶ Paid
///   │
///   └──compensate()──▶ Compensated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationState {
    Draft,
    Filed,
    Paid,
    Compensated,
}

impl DeclarationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Filed => "filed",
            Self::Paid => "paid",
            Self::Compensated => "compensated",
        }
    }

    /// Only drafts accept changes to line items and totals.
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }
}

impl std::fmt::Display for DeclarationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Income,
    Expense,
}

/// One income or expense entry of a declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub source_type: SourceType,
    /// Set on income lines.
    pub invoice: Option<InvoiceRef>,
    /// Set on expense lines.
    pub expense: Option<ExpenseRef>,
    pub taxable_base: Decimal,
    pub vat_amount: Decimal,
    pub vat_rate: Decimal,
    pub description: String,
}

impl LineItem {
    /// Income line. The rate is implied by `vat_amount / taxable_base`.
    ///
    /// Fails when the implied rate does not fit a [`Decimal`].
    pub fn income(
        invoice: InvoiceRef,
        taxable_base: Decimal,
        vat_amount: Decimal,
    ) -> Result<Self, TaxError> {
        let vat_rate = if taxable_base > Decimal::ZERO {
            vat_amount
                .checked_div(taxable_base)
                .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
                .map(round_money)
                .ok_or_else(|| {
                    TaxError::Validation(format!(
                        "invoice {}: implied VAT rate of {vat_amount} on {taxable_base} is out of range",
                        invoice.number
                    ))
                })?
        } else {
            Decimal::ZERO
        };
        let description = format!("Invoice {}", invoice.number);
        Ok(Self {
            source_type: SourceType::Income,
            invoice: Some(invoice),
            expense: None,
            taxable_base,
            vat_amount,
            vat_rate,
            description,
        })
    }

    /// Expense line with VAT derived from a flat rate.
    pub fn expense(
        expense: ExpenseRef,
        amount: Decimal,
        vat_rate: Decimal,
        description: impl Into<String>,
    ) -> Result<Self, TaxError> {
        Ok(Self {
            source_type: SourceType::Expense,
            invoice: None,
            expense: Some(expense),
            taxable_base: amount,
            vat_amount: percent_of(amount, vat_rate)?,
            vat_rate,
            description: description.into(),
        })
    }

    pub fn is_income(&self) -> bool {
        self.source_type == SourceType::Income
    }

    pub fn validate(&self, path: &str, errors: &mut Vec<ValidationError>) {
        check_non_negative(self.taxable_base, &format!("{path}.taxable_base"), errors);
        check_non_negative(self.vat_amount, &format!("{path}.vat_amount"), errors);
        check_non_negative(self.vat_rate, &format!("{path}.vat_rate"), errors);
    }
}

/// Declaration totals, always derived from the line items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationTotals {
    /// Σ income taxable base.
    pub total_sales: Decimal,
    /// Σ income VAT.
    pub vat_collected: Decimal,
    /// Σ expense VAT.
    pub vat_paid: Decimal,
    /// `vat_collected − vat_paid`. Negative means a refund or carry-forward.
    pub result: Decimal,
    /// Informational; does not change `result`.
    pub total_exemptions: Decimal,
}

impl DeclarationTotals {
    /// Sum the line items. Fails instead of wrapping when a sum leaves the
    /// [`Decimal`] range.
    pub fn from_line_items(
        items: &[LineItem],
        total_exemptions: Decimal,
    ) -> Result<Self, TaxError> {
        let mut totals = Self {
            total_exemptions,
            ..Self::default()
        };
        for item in items {
            match item.source_type {
                SourceType::Income => {
                    add_money(&mut totals.total_sales, item.taxable_base, "total_sales")?;
                    add_money(&mut totals.vat_collected, item.vat_amount, "vat_collected")?;
                }
                SourceType::Expense => {
                    add_money(&mut totals.vat_paid, item.vat_amount, "vat_paid")?;
                }
            }
        }
        // Both sides are non-negative sums, so the difference cannot overflow.
        totals.result = totals.vat_collected - totals.vat_paid;
        Ok(totals)
    }
}

/// A trainer's quarterly VAT return.
///
/// Fields are private: line items and totals change only through the
/// lifecycle methods, which recompute the totals on every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DeclarationRecord")]
pub struct Declaration {
    pub(crate) trainer: TrainerId,
    pub(crate) period: Period,
    pub(crate) model: String,
    pub(crate) state: DeclarationState,
    pub(crate) totals: DeclarationTotals,
    pub(crate) deadline_date: NaiveDate,
    pub(crate) filed_date: Option<DateTime<Utc>>,
    pub(crate) paid_date: Option<DateTime<Utc>>,
    pub(crate) reference_number: Option<String>,
    pub(crate) payment_method: Option<String>,
    pub(crate) notes: Option<String>,
    pub(crate) line_items: Vec<LineItem>,
    pub(crate) active: bool,
}

/// Stored shape of a declaration. Line items are validated and the totals
/// and deadline are derived again on the way in; a stored `deadline_date`
/// is ignored.
#[derive(Deserialize)]
struct DeclarationRecord {
    trainer: TrainerId,
    period: Period,
    model: String,
    state: DeclarationState,
    #[serde(default)]
    totals: DeclarationTotals,
    filed_date: Option<DateTime<Utc>>,
    paid_date: Option<DateTime<Utc>>,
    reference_number: Option<String>,
    payment_method: Option<String>,
    notes: Option<String>,
    #[serde(default)]
    line_items: Vec<LineItem>,
    active: bool,
}

impl TryFrom<DeclarationRecord> for Declaration {
    type Error = TaxError;

    fn try_from(r: DeclarationRecord) -> Result<Self, Self::Error> {
        let mut errors = Vec::new();
        if r.model.trim().is_empty() {
            errors.push(ValidationError::new("model", "model must not be empty"));
        }
        check_non_negative(r.totals.total_exemptions, "totals.total_exemptions", &mut errors);
        for (i, item) in r.line_items.iter().enumerate() {
            item.validate(&format!("line_items.{i}"), &mut errors);
        }
        ensure_valid(errors)?;

        let totals = DeclarationTotals::from_line_items(&r.line_items, r.totals.total_exemptions)?;
        Ok(Self {
            trainer: r.trainer,
            period: r.period,
            model: r.model,
            state: r.state,
            totals,
            deadline_date: r.period.filing_deadline()?,
            filed_date: r.filed_date,
            paid_date: r.paid_date,
            reference_number: r.reference_number,
            payment_method: r.payment_method,
            notes: r.notes,
            line_items: r.line_items,
            active: r.active,
        })
    }
}

impl Declaration {
    /// Empty draft for direct input. Line items are added afterwards.
    pub fn draft(
        trainer: impl Into<TrainerId>,
        period: Period,
        model: impl Into<String>,
    ) -> Result<Self, TaxError> {
        let model = model.into();
        let mut errors = Vec::new();
        if model.trim().is_empty() {
            errors.push(ValidationError::new("model", "model must not be empty"));
        }
        ensure_valid(errors)?;

        Ok(Self {
            trainer: trainer.into(),
            period,
            model,
            state: DeclarationState::Draft,
            totals: DeclarationTotals::default(),
            deadline_date: period.filing_deadline()?,
            filed_date: None,
            paid_date: None,
            reference_number: None,
            payment_method: None,
            notes: None,
            line_items: Vec::new(),
            active: true,
        })
    }

    pub fn trainer(&self) -> &TrainerId {
        &self.trainer
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn year(&self) -> i32 {
        self.period.year()
    }

    pub fn quarter(&self) -> u8 {
        self.period.quarter().number()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn state(&self) -> DeclarationState {
        self.state
    }

    pub fn totals(&self) -> &DeclarationTotals {
        &self.totals
    }

    pub fn deadline_date(&self) -> NaiveDate {
        self.deadline_date
    }

    pub fn filed_date(&self) -> Option<DateTime<Utc>> {
        self.filed_date
    }

    pub fn paid_date(&self) -> Option<DateTime<Utc>> {
        self.paid_date
    }

    pub fn reference_number(&self) -> Option<&str> {
        self.reference_number.as_deref()
    }

    pub fn payment_method(&self) -> Option<&str> {
        self.payment_method.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether this and `other` compete for the same (trainer, period, model) slot.
    pub fn same_slot(&self, other: &Declaration) -> bool {
        self.trainer == other.trainer && self.period == other.period && self.model == other.model
    }

    /// Still a draft after the filing deadline has passed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.active && self.state == DeclarationState::Draft && today > self.deadline_date
    }
}
