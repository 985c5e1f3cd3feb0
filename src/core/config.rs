use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::{TaxError, ValidationError, ensure_valid};
use super::money::check_percentage;

/// Model identifier of the quarterly VAT return.
pub const DEFAULT_VAT_MODEL: &str = "303";

/// Withholding percentage applied when the caller does not give one.
pub const DEFAULT_WITHHOLDING_PERCENTAGE: Decimal = dec!(15);

/// Flat VAT rate assumed on every expense.
pub const DEFAULT_EXPENSE_VAT_RATE: Decimal = dec!(21);

/// Tunables shared by the aggregator and the withholding calculator.
///
/// Missing fields fall back to the defaults, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Model stamped on declarations built by the aggregator.
    pub default_model: String,
    /// Percentage used by `compute_from_invoice` when none is given.
    pub default_withholding_percentage: Decimal,
    /// VAT rate assumed on expenses.
    pub expense_vat_rate: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_VAT_MODEL.to_string(),
            default_withholding_percentage: DEFAULT_WITHHOLDING_PERCENTAGE,
            expense_vat_rate: DEFAULT_EXPENSE_VAT_RATE,
        }
    }
}

impl EngineConfig {
    /// Check every field, returning all problems found.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.default_model.trim().is_empty() {
            errors.push(ValidationError::new(
                "default_model",
                "model must not be empty",
            ));
        }
        check_percentage(
            self.default_withholding_percentage,
            "default_withholding_percentage",
            &mut errors,
        );
        check_percentage(self.expense_vat_rate, "expense_vat_rate", &mut errors);
        errors
    }

    /// Parse a JSON config and validate it.
    #[cfg(feature = "json")]
    pub fn from_json(json: &str) -> Result<Self, TaxError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| TaxError::Validation(format!("invalid config: {e}")))?;
        config.ensure_valid()?;
        Ok(config)
    }

    pub fn ensure_valid(&self) -> Result<(), TaxError> {
        ensure_valid(self.validate())
    }
}
