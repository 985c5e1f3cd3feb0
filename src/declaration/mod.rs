//! Quarterly VAT declarations: aggregation and lifecycle.
//!
//! A declaration is built in `draft` from a quarter's invoices and
//! expenses, then filed and paid. Totals are always recomputed from the
//! line items, and only drafts accept changes.
//!
//! # Example
//!
//! ```ignore
//! use declara::declaration::*;
//!
//! let mut declaration = create_or_reject(&stored, build_from_period("trainer-1", 2025, 1, &invoices, &expenses)?)?;
//! declaration.file(Some("2025Q1-123456789".into()), now)?;
//! declaration.pay(Some("direct_debit".into()), later)?;
//! ```

mod aggregate;
mod lifecycle;
mod types;

pub use aggregate::*;
pub use types::*;
