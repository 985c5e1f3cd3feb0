//! Quarter arithmetic and filing deadlines.
//!
//! Quarterly returns are due on the 20th of the month after the quarter
//! ends, except Q4 which is due on 30 January of the following year:
//!
//! | Quarter | Months  | Deadline            |
//! |---------|---------|---------------------|
//! | Q1      | Jan–Mar | 20 April            |
//! | Q2      | Apr–Jun | 20 July             |
//! | Q3      | Jul–Sep | 20 October          |
//! | Q4      | Oct–Dec | 30 January (year+1) |

use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::error::{TaxError, ValidationError, ensure_valid};

/// Earliest year a period may refer to.
pub const MIN_YEAR: i32 = 2000;

/// Latest year a period may refer to.
pub const MAX_YEAR: i32 = 2100;

/// One of the four calendar quarters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    /// Quarter number, 1 to 4.
    pub fn number(&self) -> u8 {
        match self {
            Self::Q1 => 1,
            Self::Q2 => 2,
            Self::Q3 => 3,
            Self::Q4 => 4,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Q1),
            2 => Some(Self::Q2),
            3 => Some(Self::Q3),
            4 => Some(Self::Q4),
            _ => None,
        }
    }

    /// Quarter containing a calendar month (1-12).
    pub fn from_month(month: u32) -> Option<Self> {
        match month {
            1..=3 => Some(Self::Q1),
            4..=6 => Some(Self::Q2),
            7..=9 => Some(Self::Q3),
            10..=12 => Some(Self::Q4),
            _ => None,
        }
    }

    pub fn first_month(&self) -> u32 {
        (self.number() as u32 - 1) * 3 + 1
    }

    pub fn last_month(&self) -> u32 {
        self.first_month() + 2
    }

    fn last_day_of_last_month(&self) -> u32 {
        match self {
            Self::Q1 | Self::Q4 => 31,
            Self::Q2 | Self::Q3 => 30,
        }
    }
}

impl From<Quarter> for u8 {
    fn from(q: Quarter) -> u8 {
        q.number()
    }
}

impl TryFrom<u8> for Quarter {
    type Error = TaxError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::from_number(n)
            .ok_or_else(|| TaxError::Validation(format!("quarter {n} must be between 1 and 4")))
    }
}

impl std::fmt::Display for Quarter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Q{}", self.number())
    }
}

/// Quarter of a calendar date.
pub fn quarter_of(date: NaiveDate) -> Quarter {
    match date.month() {
        1..=3 => Quarter::Q1,
        4..=6 => Quarter::Q2,
        7..=9 => Quarter::Q3,
        _ => Quarter::Q4,
    }
}

/// First and last instant of a quarter. The end is 23:59:59.999999999 on
/// the quarter's last day.
pub fn date_range_of_quarter(
    year: i32,
    quarter: u8,
) -> Result<(NaiveDateTime, NaiveDateTime), TaxError> {
    Period::new(year, quarter)?.date_range()
}

/// Filing deadline of a quarterly return.
pub fn filing_deadline(year: i32, quarter: u8) -> Result<NaiveDate, TaxError> {
    Period::new(year, quarter)?.filing_deadline()
}

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate, TaxError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| TaxError::Validation(format!("{year}-{month:02}-{day:02} is not a date")))
}

/// A (year, quarter) pair. Displays and parses as `"2025-Q1"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "PeriodRepr", into = "PeriodRepr")]
pub struct Period {
    year: i32,
    quarter: Quarter,
}

#[derive(Serialize, Deserialize)]
struct PeriodRepr {
    year: i32,
    quarter: Quarter,
}

impl TryFrom<PeriodRepr> for Period {
    type Error = TaxError;

    fn try_from(repr: PeriodRepr) -> Result<Self, Self::Error> {
        Period::from_parts(repr.year, repr.quarter)
    }
}

impl From<Period> for PeriodRepr {
    fn from(p: Period) -> Self {
        Self {
            year: p.year,
            quarter: p.quarter,
        }
    }
}

impl Period {
    /// Validate a raw year and quarter number.
    pub fn new(year: i32, quarter: u8) -> Result<Self, TaxError> {
        let mut errors = Vec::new();
        check_year(year, &mut errors);
        let quarter = Quarter::from_number(quarter);
        if quarter.is_none() {
            errors.push(ValidationError::new(
                "quarter",
                "quarter must be between 1 and 4",
            ));
        }
        ensure_valid(errors)?;
        quarter
            .map(|quarter| Self { year, quarter })
            .ok_or_else(|| TaxError::Validation("quarter must be between 1 and 4".into()))
    }

    pub fn from_parts(year: i32, quarter: Quarter) -> Result<Self, TaxError> {
        let mut errors = Vec::new();
        check_year(year, &mut errors);
        ensure_valid(errors)?;
        Ok(Self { year, quarter })
    }

    /// Period a calendar date falls in.
    pub fn containing(date: NaiveDate) -> Result<Self, TaxError> {
        Self::from_parts(date.year(), quarter_of(date))
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn quarter(&self) -> Quarter {
        self.quarter
    }

    pub fn first_day(&self) -> Result<NaiveDate, TaxError> {
        date(self.year, self.quarter.first_month(), 1)
    }

    pub fn last_day(&self) -> Result<NaiveDate, TaxError> {
        date(
            self.year,
            self.quarter.last_month(),
            self.quarter.last_day_of_last_month(),
        )
    }

    pub fn date_range(&self) -> Result<(NaiveDateTime, NaiveDateTime), TaxError> {
        let start = self.first_day()?.and_time(chrono::NaiveTime::MIN);
        let end = self
            .last_day()?
            .and_hms_nano_opt(23, 59, 59, 999_999_999)
            .ok_or_else(|| TaxError::Validation(format!("no end instant for {self}")))?;
        Ok((start, end))
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day.year() == self.year && quarter_of(day) == self.quarter
    }

    pub fn filing_deadline(&self) -> Result<NaiveDate, TaxError> {
        match self.quarter {
            Quarter::Q1 => date(self.year, 4, 20),
            Quarter::Q2 => date(self.year, 7, 20),
            Quarter::Q3 => date(self.year, 10, 20),
            Quarter::Q4 => date(self.year + 1, 1, 30),
        }
    }

    /// The following quarter, if it is still within the supported years.
    pub fn next(&self) -> Option<Self> {
        match self.quarter {
            Quarter::Q4 => Self::from_parts(self.year + 1, Quarter::Q1).ok(),
            q => Quarter::from_number(q.number() + 1).map(|quarter| Self {
                year: self.year,
                quarter,
            }),
        }
    }

    /// The preceding quarter, if it is still within the supported years.
    pub fn previous(&self) -> Option<Self> {
        match self.quarter {
            Quarter::Q1 => Self::from_parts(self.year - 1, Quarter::Q4).ok(),
            q => Quarter::from_number(q.number() - 1).map(|quarter| Self {
                year: self.year,
                quarter,
            }),
        }
    }
}

fn check_year(year: i32, errors: &mut Vec<ValidationError>) {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        errors.push(ValidationError::new(
            "year",
            format!("year {year} must be between {MIN_YEAR} and {MAX_YEAR}"),
        ));
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.year, self.quarter)
    }
}

impl FromStr for Period {
    type Err = TaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || TaxError::Validation(format!("'{s}' is not a period like 2025-Q1"));
        let (year, quarter) = s.trim().split_once("-Q").ok_or_else(malformed)?;
        let year: i32 = year.parse().map_err(|_| malformed())?;
        let quarter: u8 = quarter.parse().map_err(|_| malformed())?;
        Self::new(year, quarter)
    }
}
