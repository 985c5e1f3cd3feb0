use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{
    ClientId, ClientRecord, DEFAULT_WITHHOLDING_PERCENTAGE, InvoiceRef, Period, Quarter,
    TaxError, TrainerId, check_non_negative, check_percentage, ensure_valid,
    percent_of, quarter_of,
};

/// Withholding lifecycle: `Pending → Declared → Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithholdingState {
    Pending,
    Declared,
    Paid,
}

impl WithholdingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Declared => "declared",
            Self::Paid => "paid",
        }
    }
}

impl std::fmt::Display for WithholdingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client data frozen when the withholding is created, so later edits to
/// the client do not rewrite issued certificates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSnapshot {
    pub name: String,
    pub tax_id: Option<String>,
    pub address: Option<String>,
}

impl From<&ClientRecord> for ClientSnapshot {
    fn from(client: &ClientRecord) -> Self {
        Self {
            name: client.name.clone(),
            tax_id: client.tax_id.clone(),
            address: client.address.clone(),
        }
    }
}

/// Income tax a client retains from one invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WithholdingRecord")]
pub struct Withholding {
    pub(crate) trainer: TrainerId,
    pub(crate) invoice: InvoiceRef,
    pub(crate) client_id: ClientId,
    pub(crate) client: ClientSnapshot,
    pub(crate) date: NaiveDate,
    pub(crate) taxable_base: Decimal,
    pub(crate) percentage: Decimal,
    pub(crate) amount: Decimal,
    pub(crate) period: Period,
    pub(crate) state: WithholdingState,
    pub(crate) certificate_issued: bool,
    pub(crate) certificate_date: Option<DateTime<Utc>>,
    pub(crate) archive_url: Option<String>,
    pub(crate) filing_ref: Option<String>,
    pub(crate) active: bool,
}

/// Stored shape of a withholding. Base and percentage are validated and
/// the amount is recomputed on the way in.
#[derive(Deserialize)]
struct WithholdingRecord {
    trainer: TrainerId,
    invoice: InvoiceRef,
    client_id: ClientId,
    client: ClientSnapshot,
    date: NaiveDate,
    taxable_base: Decimal,
    percentage: Decimal,
    period: Period,
    state: WithholdingState,
    certificate_issued: bool,
    certificate_date: Option<DateTime<Utc>>,
    archive_url: Option<String>,
    filing_ref: Option<String>,
    active: bool,
}

impl TryFrom<WithholdingRecord> for Withholding {
    type Error = TaxError;

    fn try_from(r: WithholdingRecord) -> Result<Self, Self::Error> {
        let mut errors = Vec::new();
        check_non_negative(r.taxable_base, "taxable_base", &mut errors);
        check_percentage(r.percentage, "percentage", &mut errors);
        ensure_valid(errors)?;

        Ok(Self {
            amount: percent_of(r.taxable_base, r.percentage)?,
            trainer: r.trainer,
            invoice: r.invoice,
            client_id: r.client_id,
            client: r.client,
            date: r.date,
            taxable_base: r.taxable_base,
            percentage: r.percentage,
            period: r.period,
            state: r.state,
            certificate_issued: r.certificate_issued,
            certificate_date: r.certificate_date,
            archive_url: r.archive_url,
            filing_ref: r.filing_ref,
            active: r.active,
        })
    }
}

/// Input for creating a withholding directly rather than from an invoice.
#[derive(Debug, Clone)]
pub struct WithholdingInput {
    pub trainer: TrainerId,
    pub invoice: InvoiceRef,
    pub client: ClientRecord,
    pub taxable_base: Decimal,
    /// Defaults to 15 when absent.
    pub percentage: Option<Decimal>,
    pub date: NaiveDate,
    /// Taken from `date` when absent.
    pub year: Option<i32>,
    /// Taken from `date` when absent.
    pub quarter: Option<u8>,
}

impl Withholding {
    /// Validate the input and build a `pending` withholding.
    pub fn create(input: WithholdingInput) -> Result<Self, TaxError> {
        let percentage = input.percentage.unwrap_or(DEFAULT_WITHHOLDING_PERCENTAGE);
        let mut errors = Vec::new();
        check_non_negative(input.taxable_base, "taxable_base", &mut errors);
        check_percentage(percentage, "percentage", &mut errors);
        ensure_valid(errors)?;

        let year = input.year.unwrap_or_else(|| input.date.year());
        let period = match input.quarter {
            Some(q) => Period::new(year, q)?,
            None => Period::from_parts(year, quarter_of(input.date))?,
        };

        Ok(Self {
            trainer: input.trainer,
            invoice: input.invoice,
            client_id: input.client.id.clone(),
            client: ClientSnapshot::from(&input.client),
            date: input.date,
            taxable_base: input.taxable_base,
            percentage,
            amount: percent_of(input.taxable_base, percentage)?,
            period,
            state: WithholdingState::Pending,
            certificate_issued: false,
            certificate_date: None,
            archive_url: None,
            filing_ref: None,
            active: true,
        })
    }

    pub fn trainer(&self) -> &TrainerId {
        &self.trainer
    }

    pub fn invoice(&self) -> &InvoiceRef {
        &self.invoice
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn client(&self) -> &ClientSnapshot {
        &self.client
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn taxable_base(&self) -> Decimal {
        self.taxable_base
    }

    pub fn percentage(&self) -> Decimal {
        self.percentage
    }

    /// `taxable_base × percentage / 100`, rounded to cents.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn year(&self) -> i32 {
        self.period.year()
    }

    pub fn quarter(&self) -> Quarter {
        self.period.quarter()
    }

    /// `"{year}-Q{quarter}"`, derived from the stored period.
    pub fn period_label(&self) -> String {
        self.period.to_string()
    }

    pub fn state(&self) -> WithholdingState {
        self.state
    }

    pub fn certificate_issued(&self) -> bool {
        self.certificate_issued
    }

    pub fn certificate_date(&self) -> Option<DateTime<Utc>> {
        self.certificate_date
    }

    pub fn archive_url(&self) -> Option<&str> {
        self.archive_url.as_deref()
    }

    pub fn filing_ref(&self) -> Option<&str> {
        self.filing_ref.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
