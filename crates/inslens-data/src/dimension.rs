//! Typed dimension values.
//!
//! Frames store every dimension as a string column. The enums here are the
//! typed view used by the pipeline, and lower to the same strings at the I/O
//! boundary.

use crate::{DataError, Result};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Code of the pre-aggregated market total row.
pub const TOTAL_INSURER: &str = "total";

/// Selection code meaning "every real insurer".
pub const ALL_INSURERS: &str = "all_insurers";

/// Prefix of synthesized top-N insurer codes.
pub const TOP_PREFIX: &str = "top-";

/// An insurer code, with the synthetic market rows as their own variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Insurer {
    /// A reporting insurer
    Real(String),
    /// Sum of the N largest real insurers in a group
    TopN(u32),
    /// Market total as reported in the input
    Total,
}

impl Insurer {
    /// Parse an insurer code. Never fails: unknown codes are real insurers.
    pub fn parse(code: &str) -> Self {
        if code == TOTAL_INSURER {
            return Self::Total;
        }
        code.strip_prefix(TOP_PREFIX)
            .and_then(|n| n.parse::<u32>().ok())
            .map_or_else(|| Self::Real(code.to_string()), Self::TopN)
    }

    /// Whether this code is injected by the pipeline rather than reported.
    pub const fn is_synthetic(&self) -> bool {
        !matches!(self, Self::Real(_))
    }

    /// Whether a raw code string names a synthetic insurer.
    pub fn is_synthetic_code(code: &str) -> bool {
        Self::parse(code).is_synthetic()
    }

    /// Code for the top-N row.
    pub fn top_n_code(n: u32) -> String {
        format!("{TOP_PREFIX}{n}")
    }
}

impl fmt::Display for Insurer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real(code) => f.write_str(code),
            Self::TopN(n) => write!(f, "{TOP_PREFIX}{n}"),
            Self::Total => f.write_str(TOTAL_INSURER),
        }
    }
}

/// Semantic role of a row's value.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Raw or derived metric value
    #[display("base")]
    Base,
    /// Relative change of the base value
    #[display("base_change")]
    BaseChange,
    /// Share of the market total
    #[display("market_share")]
    MarketShare,
    /// Change of market share, in percentage points
    #[display("market_share_change")]
    MarketShareChange,
    /// Position among real insurers
    #[display("rank")]
    Rank,
    /// Improvement in rank since the previous period
    #[display("rank_change")]
    RankChange,
}

impl ValueType {
    /// All value types in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Base,
        Self::BaseChange,
        Self::MarketShare,
        Self::MarketShareChange,
        Self::Rank,
        Self::RankChange,
    ];

    /// String code used in frames.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::BaseChange => "base_change",
            Self::MarketShare => "market_share",
            Self::MarketShareChange => "market_share_change",
            Self::Rank => "rank",
            Self::RankChange => "rank_change",
        }
    }

    /// Whether the value is a change between periods.
    pub const fn is_change(&self) -> bool {
        matches!(
            self,
            Self::BaseChange | Self::MarketShareChange | Self::RankChange
        )
    }

    /// Whether the value is displayed as a percentage.
    pub const fn is_percentage(&self) -> bool {
        matches!(
            self,
            Self::BaseChange | Self::MarketShare | Self::MarketShareChange
        )
    }
}

impl FromStr for ValueType {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| DataError::UnknownValueType(s.to_string()))
    }
}

/// Regulator form whose schema a fact table follows.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum ReportingForm {
    /// Form 0420158: reinsurance-oriented, six core metrics
    #[display("0420158")]
    Form158,
    /// Form 0420162: full set of base metrics
    #[display("0420162")]
    Form162,
}

impl ReportingForm {
    /// Both forms.
    pub const ALL: [Self; 2] = [Self::Form158, Self::Form162];

    /// Form identifier.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Form158 => "0420158",
            Self::Form162 => "0420162",
        }
    }
}

impl FromStr for ReportingForm {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "0420158" | "158" => Ok(Self::Form158),
            "0420162" | "162" => Ok(Self::Form162),
            other => Err(DataError::UnknownForm(other.to_string())),
        }
    }
}

impl TryFrom<String> for ReportingForm {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ReportingForm> for String {
    fn from(value: ReportingForm) -> Self {
        value.code().to_string()
    }
}

/// Comparison period type.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum PeriodType {
    /// Consecutive quarters
    #[display("qoq")]
    Qoq,
    /// Year-to-date cumulative values
    #[display("ytd")]
    Ytd,
    /// Same quarter across years
    #[display("yoy-q")]
    YoyQ,
    /// Trailing four quarters, compared year over year
    #[display("yoy-y")]
    YoyY,
    /// Moving annual total
    #[display("mat")]
    Mat,
    /// Running sum over the whole history
    #[display("cumulative_sum")]
    CumulativeSum,
}

impl PeriodType {
    /// String code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Qoq => "qoq",
            Self::Ytd => "ytd",
            Self::YoyQ => "yoy-q",
            Self::YoyY => "yoy-y",
            Self::Mat => "mat",
            Self::CumulativeSum => "cumulative_sum",
        }
    }

    /// Whether values are trailing four-quarter sums.
    pub const fn is_rolling(&self) -> bool {
        matches!(self, Self::YoyY | Self::Mat)
    }
}

impl FromStr for PeriodType {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().replace('_', "-").as_str() {
            "qoq" => Ok(Self::Qoq),
            "ytd" => Ok(Self::Ytd),
            "yoy-q" => Ok(Self::YoyQ),
            "yoy-y" => Ok(Self::YoyY),
            "mat" => Ok(Self::Mat),
            "cumulative-sum" => Ok(Self::CumulativeSum),
            _ => Err(DataError::UnknownPeriodType(s.to_string())),
        }
    }
}

impl TryFrom<String> for PeriodType {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PeriodType> for String {
    fn from(value: PeriodType) -> Self {
        value.as_str().to_string()
    }
}

/// A dimension of the enriched fact table.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Insurance line
    #[display("line")]
    Line,
    /// Metric code
    #[display("metric")]
    Metric,
    /// Insurer code
    #[display("insurer")]
    Insurer,
    /// Value type
    #[display("value_type")]
    ValueType,
    /// Quarter
    #[display("year_quarter")]
    YearQuarter,
}

impl Dimension {
    /// All dimensions in canonical order.
    pub const ALL: [Self; 5] = [
        Self::Line,
        Self::Metric,
        Self::Insurer,
        Self::ValueType,
        Self::YearQuarter,
    ];

    /// Dimensions a user may place on index, pivot or split.
    pub const SELECTABLE: [Self; 3] = [Self::Line, Self::Metric, Self::Insurer];

    /// Frame column holding this dimension.
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Line => crate::columns::LINE,
            Self::Metric => crate::columns::METRIC,
            Self::Insurer => crate::columns::INSURER,
            Self::ValueType => crate::columns::VALUE_TYPE,
            Self::YearQuarter => crate::columns::YEAR_QUARTER,
        }
    }
}

impl FromStr for Dimension {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.column() == s)
            .ok_or_else(|| DataError::UnknownDimension(s.to_string()))
    }
}
