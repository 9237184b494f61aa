//! Polars-backed long-format frame.
//!
//! Every frame carries the same seven columns in the same order, so stages can
//! concatenate their outputs without reconciling schemas. Quarters are stored
//! as their dense `Int32` index.

use crate::{DataError, Record, Result, ValueType, YearQuarter};
use polars::prelude::*;
use std::collections::{BTreeSet, HashSet};

/// Column names.
pub mod columns {
    /// Quarter index (`Int32`)
    pub const YEAR_QUARTER: &str = "year_quarter";
    /// Insurance line code (`String`)
    pub const LINE: &str = "line";
    /// Insurer code (`String`)
    pub const INSURER: &str = "insurer";
    /// Metric code (`String`)
    pub const METRIC: &str = "metric";
    /// Value type (`String`)
    pub const VALUE_TYPE: &str = "value_type";
    /// Value (`Float64`, nullable)
    pub const VALUE: &str = "value";
    /// Display label (`String`, nullable)
    pub const LABEL: &str = "label";

    /// All columns in frame order.
    pub const ALL: [&str; 7] = [YEAR_QUARTER, LINE, INSURER, METRIC, VALUE_TYPE, VALUE, LABEL];

    /// Columns identifying a row.
    pub const KEYS: [&str; 5] = [YEAR_QUARTER, LINE, INSURER, METRIC, VALUE_TYPE];

    /// Deterministic row order: series keys first, then time.
    pub const SORT_ORDER: [&str; 5] = [LINE, METRIC, INSURER, VALUE_TYPE, YEAR_QUARTER];
}

use columns::*;

/// A long-format fact table.
#[derive(Debug, Clone)]
pub struct Frame {
    df: DataFrame,
}

impl Default for Frame {
    fn default() -> Self {
        Self::empty()
    }
}

impl Frame {
    /// Frame schema.
    pub fn schema() -> Schema {
        Schema::from_iter([
            Field::new(YEAR_QUARTER.into(), DataType::Int32),
            Field::new(LINE.into(), DataType::String),
            Field::new(INSURER.into(), DataType::String),
            Field::new(METRIC.into(), DataType::String),
            Field::new(VALUE_TYPE.into(), DataType::String),
            Field::new(VALUE.into(), DataType::Float64),
            Field::new(LABEL.into(), DataType::String),
        ])
    }

    /// A frame with no rows.
    pub fn empty() -> Self {
        Self {
            df: DataFrame::empty_with_schema(&Self::schema()),
        }
    }

    /// Build a frame from records.
    pub fn from_records(records: &[Record]) -> Result<Self> {
        let df = DataFrame::new(vec![
            Series::new(
                YEAR_QUARTER.into(),
                records
                    .iter()
                    .map(|r| r.year_quarter.index())
                    .collect::<Vec<i32>>(),
            )
            .into(),
            Series::new(
                LINE.into(),
                records.iter().map(|r| r.line.as_str()).collect::<Vec<_>>(),
            )
            .into(),
            Series::new(
                INSURER.into(),
                records.iter().map(|r| r.insurer.as_str()).collect::<Vec<_>>(),
            )
            .into(),
            Series::new(
                METRIC.into(),
                records.iter().map(|r| r.metric.as_str()).collect::<Vec<_>>(),
            )
            .into(),
            Series::new(
                VALUE_TYPE.into(),
                records
                    .iter()
                    .map(|r| r.value_type.as_str())
                    .collect::<Vec<_>>(),
            )
            .into(),
            Series::new(
                VALUE.into(),
                records.iter().map(|r| r.value).collect::<Vec<Option<f64>>>(),
            )
            .into(),
            Series::new(
                LABEL.into(),
                records
                    .iter()
                    .map(|r| r.label.as_deref())
                    .collect::<Vec<Option<&str>>>(),
            )
            .into(),
        ])?;
        Ok(Self { df })
    }

    /// Wrap a `DataFrame`, checking columns and normalizing their order and types.
    pub fn from_dataframe(df: DataFrame) -> Result<Self> {
        let present: HashSet<&str> = df.get_column_names().iter().map(|c| c.as_str()).collect();
        let missing: Vec<String> = ALL
            .iter()
            .filter(|c| !present.contains(**c))
            .map(|c| (*c).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DataError::MissingColumns {
                source_name: "frame".to_string(),
                columns: missing,
            });
        }

        let df = df
            .lazy()
            .select([
                col(YEAR_QUARTER).cast(DataType::Int32),
                col(LINE).cast(DataType::String),
                col(INSURER).cast(DataType::String),
                col(METRIC).cast(DataType::String),
                col(VALUE_TYPE).cast(DataType::String),
                col(VALUE).cast(DataType::Float64),
                col(LABEL).cast(DataType::String),
            ])
            .collect()?;
        Ok(Self { df })
    }

    /// Collect a lazy query into a frame.
    pub fn from_lazy(lf: LazyFrame) -> Result<Self> {
        Self::from_dataframe(lf.collect()?)
    }

    /// Underlying `DataFrame`.
    pub const fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Lazy view for expression-based stages.
    pub fn lazy(&self) -> LazyFrame {
        self.df.clone().lazy()
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Whether the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Materialize rows as records.
    pub fn records(&self) -> Result<Vec<Record>> {
        let quarters = self.df.column(YEAR_QUARTER)?.i32()?;
        let lines = self.df.column(LINE)?.str()?;
        let insurers = self.df.column(INSURER)?.str()?;
        let metrics = self.df.column(METRIC)?.str()?;
        let value_types = self.df.column(VALUE_TYPE)?.str()?;
        let values = self.df.column(VALUE)?.f64()?;
        let labels = self.df.column(LABEL)?.str()?;

        let text = |ca: &StringChunked, column: &'static str, row: usize| {
            ca.get(row)
                .map(str::to_string)
                .ok_or(DataError::MissingValue { column, row })
        };

        (0..self.df.height())
            .map(|row| {
                let index = quarters.get(row).ok_or(DataError::MissingValue {
                    column: YEAR_QUARTER,
                    row,
                })?;
                let value_type: ValueType = text(value_types, VALUE_TYPE, row)?.parse()?;
                Ok(Record {
                    year_quarter: YearQuarter::from_index(index),
                    line: text(lines, LINE, row)?,
                    insurer: text(insurers, INSURER, row)?,
                    metric: text(metrics, METRIC, row)?,
                    value_type,
                    value: values.get(row),
                    label: labels.get(row).map(str::to_string),
                })
            })
            .collect()
    }

    /// Distinct quarters, most recent first.
    pub fn quarters(&self) -> Result<Vec<YearQuarter>> {
        let quarters = self.df.column(YEAR_QUARTER)?.i32()?;
        let distinct: BTreeSet<i32> = quarters.into_iter().flatten().collect();
        Ok(distinct
            .into_iter()
            .rev()
            .map(YearQuarter::from_index)
            .collect())
    }

    /// Distinct values of a string column in first-occurrence order.
    pub fn unique_values(&self, column: &str) -> Result<Vec<String>> {
        let values = self.df.column(column)?.str()?;
        let mut seen = HashSet::new();
        Ok(values
            .into_iter()
            .flatten()
            .filter(|v| seen.insert(*v))
            .map(str::to_string)
            .collect())
    }

    /// Stack frames vertically.
    pub fn concat(frames: impl IntoIterator<Item = Self>) -> Result<Self> {
        let mut out = Self::empty();
        for frame in frames {
            out.df.vstack_mut(&frame.df)?;
        }
        out.df.align_chunks();
        Ok(out)
    }

    /// Rows ordered by series keys then quarter, ties in input order.
    pub fn sorted(&self) -> Result<Self> {
        Self::from_lazy(self.lazy().sort(
            SORT_ORDER,
            SortMultipleOptions::default().with_maintain_order(true),
        ))
    }
}
