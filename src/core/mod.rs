//! Shared types: collaborator records, periods, money helpers, configuration
//! and the crate error.
//!
//! Nothing here depends on a subsystem; the declaration, withholding,
//! exemption and summary modules all build on it.

mod config;
mod error;
mod money;
pub mod period;
mod selection;
mod types;

pub use config::*;
pub use error::*;
pub use money::{percent_of, round_money};
pub use period::{Period, Quarter, date_range_of_quarter, filing_deadline, quarter_of};
pub use selection::*;
pub use types::*;

pub(crate) use error::ensure_valid;
pub(crate) use money::{add_money, check_non_negative, check_percentage};
