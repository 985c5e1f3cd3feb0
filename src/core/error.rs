use thiserror::Error;

use super::period::Period;
use super::types::{InvoiceId, TrainerId};

/// Errors returned by declaration, withholding and exemption operations.
///
/// Every variant is raised before anything is mutated, so a rejected call
/// leaves the value exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TaxError {
    /// Malformed or out-of-range input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An active declaration already exists for the same trainer, period and model.
    #[error("an active declaration already exists for trainer {trainer}, period {period}, model {model}")]
    DuplicatePeriod {
        trainer: TrainerId,
        period: Period,
        model: String,
    },

    /// An active withholding already references the invoice.
    #[error("an active withholding already exists for invoice {0}")]
    DuplicateWithholding(InvoiceId),

    /// Lifecycle transition attempted from a state that does not allow it.
    #[error("cannot {action} from state '{state}'")]
    InvalidState { action: &'static str, state: String },

    /// Line items, totals or amounts changed outside the editable state.
    #[error("cannot modify a record in state '{state}'")]
    ImmutableState { state: String },
}

impl TaxError {
    pub(crate) fn invalid_state(action: &'static str, state: impl ToString) -> Self {
        Self::InvalidState {
            action,
            state: state.to_string(),
        }
    }

    pub(crate) fn immutable(state: impl ToString) -> Self {
        Self::ImmutableState {
            state: state.to_string(),
        }
    }

    /// Collapse a list of field errors into a single `Validation` error.
    pub fn from_validation(errors: &[ValidationError]) -> Self {
        let msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Self::Validation(msg)
    }
}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "line_items.2.vat_amount").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Turn collected field errors into a `Result`.
pub(crate) fn ensure_valid(errors: Vec<ValidationError>) -> Result<(), TaxError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TaxError::from_validation(&errors))
    }
}
