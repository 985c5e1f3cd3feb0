use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::types::{Declaration, DeclarationState, DeclarationTotals, LineItem};
use crate::core::{TaxError, ValidationError, check_non_negative, ensure_valid};

impl Declaration {
    /// Recompute totals from the current line items. Idempotent.
    pub fn recompute_totals(&mut self) -> Result<(), TaxError> {
        self.totals =
            DeclarationTotals::from_line_items(&self.line_items, self.totals.total_exemptions)?;
        debug!(
            trainer = %self.trainer,
            period = %self.period,
            result = %self.totals.result,
            "recomputed declaration totals"
        );
        Ok(())
    }

    /// Swap in new line items and exemptions only once their totals are known.
    fn commit(
        &mut self,
        items: Vec<LineItem>,
        total_exemptions: Decimal,
    ) -> Result<(), TaxError> {
        let totals = DeclarationTotals::from_line_items(&items, total_exemptions)?;
        self.line_items = items;
        self.totals = totals;
        debug!(
            trainer = %self.trainer,
            period = %self.period,
            result = %self.totals.result,
            "recomputed declaration totals"
        );
        Ok(())
    }

    fn ensure_editable(&self) -> Result<(), TaxError> {
        if !self.active {
            return Err(TaxError::immutable("deleted"));
        }
        if !self.state.is_editable() {
            return Err(TaxError::immutable(self.state));
        }
        Ok(())
    }

    fn ensure_transition(
        &self,
        action: &'static str,
        from: DeclarationState,
    ) -> Result<(), TaxError> {
        if !self.active {
            return Err(TaxError::invalid_state(action, "deleted"));
        }
        if self.state != from {
            debug!(trainer = %self.trainer, period = %self.period, state = %self.state, action, "rejected transition");
            return Err(TaxError::invalid_state(action, self.state));
        }
        Ok(())
    }

    pub fn add_line_item(&mut self, item: LineItem) -> Result<(), TaxError> {
        self.ensure_editable()?;
        let mut errors = Vec::new();
        item.validate("line_item", &mut errors);
        ensure_valid(errors)?;

        let mut items = self.line_items.clone();
        items.push(item);
        self.commit(items, self.totals.total_exemptions)
    }

    pub fn remove_line_item(&mut self, index: usize) -> Result<LineItem, TaxError> {
        self.ensure_editable()?;
        if index >= self.line_items.len() {
            return Err(TaxError::from_validation(&[ValidationError::new(
                "line_items",
                format!(
                    "index {index} out of range for {} line items",
                    self.line_items.len()
                ),
            )]));
        }
        let mut items = self.line_items.clone();
        let removed = items.remove(index);
        self.commit(items, self.totals.total_exemptions)?;
        Ok(removed)
    }

    /// Replace every line item at once. Nothing changes if any item is invalid.
    pub fn replace_line_items(&mut self, items: Vec<LineItem>) -> Result<(), TaxError> {
        self.ensure_editable()?;
        let mut errors = Vec::new();
        for (i, item) in items.iter().enumerate() {
            item.validate(&format!("line_items.{i}"), &mut errors);
        }
        ensure_valid(errors)?;

        self.commit(items, self.totals.total_exemptions)
    }

    pub fn set_total_exemptions(&mut self, amount: Decimal) -> Result<(), TaxError> {
        self.ensure_editable()?;
        let mut errors = Vec::new();
        check_non_negative(amount, "total_exemptions", &mut errors);
        ensure_valid(errors)?;

        self.totals = DeclarationTotals::from_line_items(&self.line_items, amount)?;
        Ok(())
    }

    pub fn set_reference_number(&mut self, reference: Option<String>) -> Result<(), TaxError> {
        self.ensure_editable()?;
        self.reference_number = reference;
        Ok(())
    }

    pub fn set_notes(&mut self, notes: Option<String>) -> Result<(), TaxError> {
        self.ensure_editable()?;
        self.notes = notes;
        Ok(())
    }

    /// `draft → filed`. Keeps an existing reference number when none is given.
    pub fn file(
        &mut self,
        reference_number: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TaxError> {
        self.ensure_transition("file", DeclarationState::Draft)?;
        self.state = DeclarationState::Filed;
        self.filed_date = Some(now);
        if reference_number.is_some() {
            self.reference_number = reference_number;
        }
        info!(
            trainer = %self.trainer,
            period = %self.period,
            model = %self.model,
            reference = ?self.reference_number,
            "declaration filed"
        );
        Ok(())
    }

    /// `filed → paid`.
    pub fn pay(&mut self, payment_method: Option<String>, now: DateTime<Utc>) -> Result<(), TaxError> {
        self.ensure_transition("pay", DeclarationState::Filed)?;
        self.state = DeclarationState::Paid;
        self.paid_date = Some(now);
        if payment_method.is_some() {
            self.payment_method = payment_method;
        }
        info!(
            trainer = %self.trainer,
            period = %self.period,
            result = %self.totals.result,
            "declaration paid"
        );
        Ok(())
    }

    /// `draft → compensated`, for a negative result carried into a later period.
    pub fn compensate(&mut self) -> Result<(), TaxError> {
        self.ensure_transition("compensate", DeclarationState::Draft)?;
        self.state = DeclarationState::Compensated;
        info!(
            trainer = %self.trainer,
            period = %self.period,
            result = %self.totals.result,
            "declaration compensated"
        );
        Ok(())
    }

    /// Soft delete. Only drafts can be deleted; the record stays, inactive.
    pub fn delete(&mut self) -> Result<(), TaxError> {
        self.ensure_transition("delete", DeclarationState::Draft)?;
        self.active = false;
        info!(trainer = %self.trainer, period = %self.period, "declaration deleted");
        Ok(())
    }
}
