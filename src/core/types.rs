use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Owner of declarations, withholdings and exemptions.
    TrainerId
);
string_id!(
    /// Identifier of an invoice owned by the surrounding application.
    InvoiceId
);
string_id!(
    /// Identifier of an expense owned by the surrounding application.
    ExpenseId
);
string_id!(
    /// Identifier of a client owned by the surrounding application.
    ClientId
);

/// Invoice lifecycle as seen by the engine. Only `Voided` matters here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceState {
    Draft,
    Pending,
    Paid,
    Overdue,
    Voided,
}

/// An invoice handed in by the caller. The engine reads it, never stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: InvoiceId,
    /// Human-facing invoice number, e.g. "F-2025-001".
    pub number: String,
    /// Issue date; decides the quarter the invoice belongs to.
    pub date: NaiveDate,
    /// Net amount before VAT.
    pub subtotal: Decimal,
    /// VAT charged on the invoice.
    pub tax_amount: Decimal,
    pub client_id: ClientId,
    pub state: InvoiceState,
    /// Soft-delete flag of the owning application.
    pub deleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseState {
    Pending,
    Paid,
    Cancelled,
}

/// An expense handed in by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: ExpenseId,
    pub date: NaiveDate,
    /// Amount the VAT paid is derived from.
    pub amount: Decimal,
    /// Free-text concept, carried into the line item description.
    pub concept: String,
    pub state: ExpenseState,
    pub active: bool,
}

/// A client, consulted only to snapshot its data into a withholding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: ClientId,
    pub name: String,
    pub tax_id: Option<String>,
    pub address: Option<String>,
}

/// Weak back-reference to an invoice: identifier plus the fields copied at the time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRef {
    pub id: InvoiceId,
    pub number: String,
    pub date: NaiveDate,
}

impl From<&InvoiceRecord> for InvoiceRef {
    fn from(invoice: &InvoiceRecord) -> Self {
        Self {
            id: invoice.id.clone(),
            number: invoice.number.clone(),
            date: invoice.date,
        }
    }
}

/// Weak back-reference to an expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRef {
    pub id: ExpenseId,
    pub date: NaiveDate,
}

impl From<&ExpenseRecord> for ExpenseRef {
    fn from(expense: &ExpenseRecord) -> Self {
        Self {
            id: expense.id.clone(),
            date: expense.date,
        }
    }
}
