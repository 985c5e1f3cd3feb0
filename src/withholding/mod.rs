//! Income-tax withholdings, one per invoice.
//!
//! A withholding is computed from an invoice (base = subtotal, 15% by
//! default), starts `pending`, and moves to `declared` and then `paid`.
//! Certificates can be recorded at any point while the withholding is
//! active. Base, percentage and period can only change while `pending`.

mod calculate;
mod lifecycle;
mod types;

pub use calculate::*;
pub use types::*;
