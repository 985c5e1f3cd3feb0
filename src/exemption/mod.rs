//! Exemption rules and their evaluation.
//!
//! An exemption discounts a percentage of a taxable amount when all of its
//! conditions hold and the evaluation date falls inside its validity
//! window. Conditions use a closed operator set, so evaluation is total:
//! unknown fields and non-numeric operands simply do not match.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use declara::exemption::*;
//! use rust_decimal_macros::dec;
//!
//! let from = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
//! let exemption = ExemptionBuilder::new("trainer-1", "Small clients", ExemptionKind::Vat, dec!(50), from)
//!     .condition(Condition::parse("subtotal", "lessThan", "500").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let ctx = EvaluationContext::new().with("subtotal", "300");
//! assert!(applies_to(&exemption, &ctx));
//! assert_eq!(compute_exempt_amount(&exemption, dec!(63)).unwrap(), dec!(31.50));
//! ```

mod evaluate;
mod types;

pub use evaluate::*;
pub use types::*;
