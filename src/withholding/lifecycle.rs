use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::types::{Withholding, WithholdingState};
use crate::core::{
    Period, TaxError, check_non_negative, check_percentage, ensure_valid, percent_of,
};

impl Withholding {
    /// Recompute `amount` from base and percentage. Idempotent.
    pub fn recompute_amount(&mut self) -> Result<(), TaxError> {
        self.amount = percent_of(self.taxable_base, self.percentage)?;
        Ok(())
    }

    fn ensure_pending_edit(&self) -> Result<(), TaxError> {
        if !self.active {
            return Err(TaxError::immutable("deleted"));
        }
        if self.state != WithholdingState::Pending {
            return Err(TaxError::immutable(self.state));
        }
        Ok(())
    }

    fn ensure_active(&self, action: &'static str) -> Result<(), TaxError> {
        if !self.active {
            return Err(TaxError::invalid_state(action, "deleted"));
        }
        Ok(())
    }

    pub fn set_taxable_base(&mut self, taxable_base: Decimal) -> Result<(), TaxError> {
        self.ensure_pending_edit()?;
        let mut errors = Vec::new();
        check_non_negative(taxable_base, "taxable_base", &mut errors);
        ensure_valid(errors)?;

        self.amount = percent_of(taxable_base, self.percentage)?;
        self.taxable_base = taxable_base;
        Ok(())
    }

    pub fn set_percentage(&mut self, percentage: Decimal) -> Result<(), TaxError> {
        self.ensure_pending_edit()?;
        let mut errors = Vec::new();
        check_percentage(percentage, "percentage", &mut errors);
        ensure_valid(errors)?;

        self.amount = percent_of(self.taxable_base, percentage)?;
        self.percentage = percentage;
        Ok(())
    }

    /// Move the withholding to another period. The label follows automatically.
    pub fn set_period(&mut self, year: i32, quarter: u8) -> Result<(), TaxError> {
        self.ensure_pending_edit()?;
        self.period = Period::new(year, quarter)?;
        Ok(())
    }

    /// Record that the certificate was issued. Allowed in every state of an
    /// active withholding; issuing again refreshes the date and keeps the
    /// previous URL unless a new one is given.
    pub fn emit_certificate(
        &mut self,
        archive_url: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TaxError> {
        self.ensure_active("emit certificate")?;
        self.certificate_issued = true;
        self.certificate_date = Some(now);
        if archive_url.is_some() {
            self.archive_url = archive_url;
        }
        info!(
            trainer = %self.trainer,
            invoice = %self.invoice.id,
            state = %self.state,
            "withholding certificate issued"
        );
        Ok(())
    }

    /// `pending → declared`, optionally linking the external filing.
    pub fn mark_declared(&mut self, filing_ref: Option<String>) -> Result<(), TaxError> {
        self.ensure_active("declare")?;
        if self.state != WithholdingState::Pending {
            debug!(invoice = %self.invoice.id, state = %self.state, "rejected declare");
            return Err(TaxError::invalid_state("declare", self.state));
        }
        self.state = WithholdingState::Declared;
        if filing_ref.is_some() {
            self.filing_ref = filing_ref;
        }
        info!(
            trainer = %self.trainer,
            invoice = %self.invoice.id,
            period = %self.period,
            filing = ?self.filing_ref,
            "withholding declared"
        );
        Ok(())
    }

    /// `declared → paid`.
    pub fn mark_paid(&mut self) -> Result<(), TaxError> {
        self.ensure_active("pay")?;
        if self.state != WithholdingState::Declared {
            return Err(TaxError::invalid_state("pay", self.state));
        }
        self.state = WithholdingState::Paid;
        info!(trainer = %self.trainer, invoice = %self.invoice.id, "withholding paid");
        Ok(())
    }

    /// Soft delete, only from `pending`.
    pub fn delete(&mut self) -> Result<(), TaxError> {
        self.ensure_active("delete")?;
        if self.state != WithholdingState::Pending {
            return Err(TaxError::invalid_state("delete", self.state));
        }
        self.active = false;
        info!(trainer = %self.trainer, invoice = %self.invoice.id, "withholding deleted");
        Ok(())
    }
}
