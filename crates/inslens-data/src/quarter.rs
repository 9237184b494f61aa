//! Calendar quarters.
//!
//! A [`YearQuarter`] identifies one calendar quarter. Quarters map onto a dense
//! integer index (`year * 4 + quarter - 1`) so that period arithmetic is plain
//! integer arithmetic and frames can store quarters as `Int32`.

use crate::{DataError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar quarter such as `2024Q1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearQuarter {
    year: i32,
    quarter: u8,
}

impl YearQuarter {
    /// Create a quarter, validating that `quarter` is in `1..=4`.
    pub fn new(year: i32, quarter: u8) -> Result<Self> {
        if !(1..=4).contains(&quarter) {
            return Err(DataError::InvalidQuarter(format!("{year}Q{quarter}")));
        }
        Ok(Self { year, quarter })
    }

    /// Calendar year.
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Quarter of the year, `1..=4`.
    pub const fn quarter(&self) -> u8 {
        self.quarter
    }

    /// Dense integer index: `year * 4 + quarter - 1`.
    pub const fn index(&self) -> i32 {
        self.year * 4 + self.quarter as i32 - 1
    }

    /// Inverse of [`YearQuarter::index`].
    pub const fn from_index(index: i32) -> Self {
        Self {
            year: index.div_euclid(4),
            quarter: (index.rem_euclid(4) + 1) as u8,
        }
    }

    /// Quarter `n` steps away (negative steps go back in time).
    pub const fn offset(&self, n: i32) -> Self {
        Self::from_index(self.index() + n)
    }

    /// First quarter of the same year.
    pub const fn first_of_year(&self) -> Self {
        Self {
            year: self.year,
            quarter: 1,
        }
    }

    /// First day of the quarter.
    pub fn start_date(&self) -> NaiveDate {
        let month = u32::from(self.quarter - 1) * 3 + 1;
        NaiveDate::from_ymd_opt(self.year, month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the quarter.
    pub fn end_date(&self) -> NaiveDate {
        self.offset(1)
            .start_date()
            .pred_opt()
            .unwrap_or(NaiveDate::MAX)
    }

    /// Quarter containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: (date.month0() / 3 + 1) as u8,
        }
    }
}

impl fmt::Display for YearQuarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

impl FromStr for YearQuarter {
    type Err = DataError;

    /// Accepts `2024Q1`, `2024q1` or an ISO date such as `2024-01-01`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some((year, quarter)) = s.split_once(['Q', 'q']) {
            let year = year
                .parse::<i32>()
                .map_err(|_| DataError::InvalidQuarter(s.to_string()))?;
            let quarter = quarter
                .parse::<u8>()
                .map_err(|_| DataError::InvalidQuarter(s.to_string()))?;
            return Self::new(year, quarter);
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self::from_date)
            .map_err(|_| DataError::InvalidQuarter(s.to_string()))
    }
}

impl TryFrom<String> for YearQuarter {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<YearQuarter> for String {
    fn from(value: YearQuarter) -> Self {
        value.to_string()
    }
}
