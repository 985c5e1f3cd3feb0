use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{
    ClientRecord, ExpenseRecord, InvoiceRecord, TaxError, TrainerId, ValidationError,
    check_percentage, ensure_valid, quarter_of,
};

/// Which tax an exemption reduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExemptionKind {
    /// Reduces VAT.
    Vat,
    /// Reduces the income-tax withholding base.
    IncomeTax,
    CorporateTax,
    /// Applies to any tax.
    General,
}

/// Comparison used by a [`Condition`]. The set is closed: strings coming
/// from outside must parse into one of these or be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Equal,
    NotEqual,
    /// Numeric; false when either side is not a number.
    GreaterThan,
    /// Numeric; false when either side is not a number.
    LessThan,
    /// Substring match.
    Contains,
    StartsWith,
}

impl Operator {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::NotEqual => "notEqual",
            Self::GreaterThan => "greaterThan",
            Self::LessThan => "lessThan",
            Self::Contains => "contains",
            Self::StartsWith => "startsWith",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "equal" => Some(Self::Equal),
            "notEqual" => Some(Self::NotEqual),
            "greaterThan" => Some(Self::GreaterThan),
            "lessThan" => Some(Self::LessThan),
            "contains" => Some(Self::Contains),
            "startsWith" => Some(Self::StartsWith),
            _ => None,
        }
    }
}

impl FromStr for Operator {
    type Err = TaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| TaxError::Validation(format!("unknown operator '{s}'")))
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// One `field operator value` test against an [`EvaluationContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: String,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Build a condition from an operator string, rejecting unknown operators.
    pub fn parse(
        field: impl Into<String>,
        operator: &str,
        value: impl Into<String>,
    ) -> Result<Self, TaxError> {
        Ok(Self::new(field, operator.parse()?, value))
    }
}

/// A rule that discounts part of a taxable base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exemption {
    pub trainer: TrainerId,
    pub name: String,
    pub description: Option<String>,
    pub kind: ExemptionKind,
    /// All must hold for the exemption to apply. Empty means "apply only if `auto_apply`".
    pub conditions: Vec<Condition>,
    /// Share of the amount that is exempt, 0 to 100.
    pub percentage: Decimal,
    pub auto_apply: bool,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
    pub active: bool,
}

impl Exemption {
    /// Check percentage range, name and validity window.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(ValidationError::new("name", "name must not be empty"));
        }
        check_percentage(self.percentage, "percentage", &mut errors);
        if let Some(valid_to) = self.valid_to {
            if valid_to < self.valid_from {
                errors.push(ValidationError::new(
                    "valid_to",
                    format!(
                        "valid_to {valid_to} must not be before valid_from {}",
                        self.valid_from
                    ),
                ));
            }
        }
        for (i, c) in self.conditions.iter().enumerate() {
            if c.field.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("conditions.{i}.field"),
                    "field must not be empty",
                ));
            }
        }
        errors
    }
}

/// Builder for [`Exemption`]; `build()` validates.
pub struct ExemptionBuilder {
    trainer: TrainerId,
    name: String,
    description: Option<String>,
    kind: ExemptionKind,
    conditions: Vec<Condition>,
    percentage: Decimal,
    auto_apply: bool,
    valid_from: NaiveDate,
    valid_to: Option<NaiveDate>,
}

impl ExemptionBuilder {
    pub fn new(
        trainer: impl Into<TrainerId>,
        name: impl Into<String>,
        kind: ExemptionKind,
        percentage: Decimal,
        valid_from: NaiveDate,
    ) -> Self {
        Self {
            trainer: trainer.into(),
            name: name.into(),
            description: None,
            kind,
            conditions: Vec::new(),
            percentage,
            auto_apply: false,
            valid_from,
            valid_to: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn auto_apply(mut self, auto_apply: bool) -> Self {
        self.auto_apply = auto_apply;
        self
    }

    pub fn valid_to(mut self, date: NaiveDate) -> Self {
        self.valid_to = Some(date);
        self
    }

    pub fn build(self) -> Result<Exemption, TaxError> {
        let exemption = Exemption {
            trainer: self.trainer,
            name: self.name,
            description: self.description,
            kind: self.kind,
            conditions: self.conditions,
            percentage: self.percentage,
            auto_apply: self.auto_apply,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            active: true,
        };
        ensure_valid(exemption.validate())?;
        Ok(exemption)
    }
}

/// Field names filled in by the [`EvaluationContext`] constructors.
pub mod field {
    pub const SOURCE: &str = "source";
    pub const NUMBER: &str = "number";
    pub const DATE: &str = "date";
    pub const QUARTER: &str = "quarter";
    pub const SUBTOTAL: &str = "subtotal";
    pub const TAX_AMOUNT: &str = "taxAmount";
    pub const AMOUNT: &str = "amount";
    pub const CONCEPT: &str = "concept";
    pub const CLIENT_ID: &str = "clientId";
    pub const CLIENT_NAME: &str = "clientName";
    pub const CLIENT_TAX_ID: &str = "clientTaxId";
}

/// Field values a condition is tested against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationContext {
    values: BTreeMap<String, String>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl ToString) -> Self {
        self.values.insert(field.into(), value.to_string());
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn for_invoice(invoice: &InvoiceRecord) -> Self {
        Self::new()
            .with(field::SOURCE, "income")
            .with(field::NUMBER, &invoice.number)
            .with(field::DATE, invoice.date)
            .with(field::QUARTER, quarter_of(invoice.date).number())
            .with(field::SUBTOTAL, invoice.subtotal)
            .with(field::TAX_AMOUNT, invoice.tax_amount)
            .with(field::CLIENT_ID, &invoice.client_id)
    }

    pub fn for_expense(expense: &ExpenseRecord) -> Self {
        Self::new()
            .with(field::SOURCE, "expense")
            .with(field::DATE, expense.date)
            .with(field::QUARTER, quarter_of(expense.date).number())
            .with(field::AMOUNT, expense.amount)
            .with(field::CONCEPT, &expense.concept)
    }

    /// Add the client's name and tax id.
    pub fn with_client(mut self, client: &ClientRecord) -> Self {
        self = self.with(field::CLIENT_NAME, &client.name);
        if let Some(tax_id) = &client.tax_id {
            self = self.with(field::CLIENT_TAX_ID, tax_id);
        }
        self
    }
}
