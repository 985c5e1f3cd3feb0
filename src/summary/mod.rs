//! Read-only rollups over stored declarations and withholdings.
//!
//! Every figure comes from the stored records' own totals and amounts.
//! Raw invoices and expenses are never re-aggregated here, so a summary
//! always agrees with what was filed. Inactive (deleted) records are
//! ignored.

mod declarations;
mod withholdings;

pub use declarations::*;
pub use withholdings::*;
