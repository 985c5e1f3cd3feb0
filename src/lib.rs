//! # declara
//!
//! Periodic tax engine for self-employed trainers: quarterly VAT
//! declarations built from invoices and expenses, per-invoice income-tax
//! withholdings, rule-based exemptions and read-only annual summaries.
//!
//! All monetary values use [`rust_decimal::Decimal`], rounded to cents
//! half away from zero. Nothing here touches storage or the clock: callers
//! load the records, pass `now` into state transitions and persist what
//! comes back.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use declara::core::*;
//! use declara::declaration::Aggregator;
//! use rust_decimal_macros::dec;
//!
//! let invoices = vec![InvoiceRecord {
//!     id: "inv-1".into(),
//!     number: "F-2025-001".into(),
//!     date: NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
//!     subtotal: dec!(5000),
//!     tax_amount: dec!(1050),
//!     client_id: "client-1".into(),
//!     state: InvoiceState::Paid,
//!     deleted: false,
//! }];
//! let expenses = vec![ExpenseRecord {
//!     id: "exp-1".into(),
//!     date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
//!     amount: dec!(1200),
//!     concept: "Equipment".into(),
//!     state: ExpenseState::Paid,
//!     active: true,
//! }];
//!
//! let period = Period::new(2025, 1).unwrap();
//! let declaration = Aggregator::new()
//!     .build_from_period(
//!         "trainer-1",
//!         2025,
//!         1,
//!         &select_invoices(&invoices, &period),
//!         &select_expenses(&expenses, &period),
//!     )
//!     .unwrap();
//!
//! assert_eq!(declaration.totals().vat_paid, dec!(252));
//! assert_eq!(declaration.totals().result, dec!(798));
//! assert_eq!(declaration.deadline_date(), NaiveDate::from_ymd_opt(2025, 4, 20).unwrap());
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` | Records, periods, deadlines, money helpers, configuration, errors |
//! | `exemption` (default) | Exemption rules and condition evaluation |
//! | `declaration` (default) | Quarterly VAT declarations and their lifecycle |
//! | `withholding` (default) | Income-tax withholdings and certificates |
//! | `summary` (default) | Annual and quarterly rollups, lookup queries |
//! | `json` | Load [`EngineConfig`] from JSON |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "exemption")]
pub mod exemption;

#[cfg(feature = "declaration")]
pub mod declaration;

#[cfg(feature = "withholding")]
pub mod withholding;

#[cfg(feature = "summary")]
pub mod summary;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
