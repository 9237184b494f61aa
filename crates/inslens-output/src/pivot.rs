//! Pivot projection of segments.
//!
//! A [`PivotTable`] has one row per combination of index values and one
//! column per combination of pivot values. Column keys join the pivot values
//! with the configured separator, outermost dimension first. Rows and columns
//! follow the segment's dimension orders, so equal inputs always give equal
//! tables.

use crate::{OutputError, Result};
use inslens_data::{Dimension, Record, ValueType, YearQuarter};
use inslens_pipeline::{DimensionOrders, Layout, Segment};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Placeholder for empty and zero cells.
pub const EMPTY_CELL: &str = "-";

/// One value of the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    /// Numeric value
    pub value: Option<f64>,
    /// Formatted label, shown instead of the value
    pub label: Option<String>,
}

impl Cell {
    fn from_record(record: &Record) -> Self {
        Self {
            value: record.value,
            label: record.label.clone(),
        }
    }

    /// The number to plot or format, when the cell is not a label.
    pub fn numeric(&self) -> Option<f64> {
        if self.label.is_some() {
            return None;
        }
        self.value.filter(|v| v.is_finite())
    }

    /// Display string: the label, else the number, with `-` for empty and zero.
    pub fn display(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        match self.numeric() {
            Some(v) if v != 0.0 => v.to_string(),
            _ => EMPTY_CELL.to_string(),
        }
    }
}

/// A table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    /// Index values, one per index dimension
    pub index: Vec<String>,
    /// Cells, one per column; `None` when the segment has no record there
    pub cells: Vec<Option<Cell>>,
}

/// Two-axis view of a segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    /// Row dimensions
    pub index: Vec<Dimension>,
    /// Column dimensions, outermost first
    pub pivot: Vec<Dimension>,
    /// Column keys
    pub columns: Vec<String>,
    /// Rows in display order
    pub rows: Vec<PivotRow>,
    /// Separator of column key parts
    pub separator: String,
}

impl PivotTable {
    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Pivot values of a column key.
    pub fn column_parts<'a>(&self, key: &'a str) -> Result<Vec<&'a str>> {
        let parts: Vec<&str> = key.split(self.separator.as_str()).collect();
        if parts.len() != self.pivot.len() {
            return Err(OutputError::MalformedKey {
                key: key.to_string(),
                expected: self.pivot.len(),
            });
        }
        Ok(parts)
    }

    /// Value of a pivot dimension in a column key.
    pub fn column_value<'a>(&self, key: &'a str, dimension: Dimension) -> Option<&'a str> {
        let position = self.pivot.iter().position(|d| *d == dimension)?;
        key.split(self.separator.as_str()).nth(position)
    }

    /// Cell at a row and column key.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.cells.get(col)?.as_ref()
    }
}

/// Builds pivot tables from segments and restores records from them.
#[derive(Debug, Clone)]
pub struct PivotProjector {
    separator: String,
}

impl Default for PivotProjector {
    fn default() -> Self {
        Self::new("&")
    }
}

impl PivotProjector {
    /// Create a projector joining column key parts with `separator`.
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    /// Sort key of a tuple of dimension values.
    fn positions(orders: &DimensionOrders, dims: &[Dimension], values: &[String]) -> Vec<usize> {
        dims.iter()
            .zip(values)
            .map(|(d, v)| orders.position(*d, v).unwrap_or(usize::MAX))
            .collect()
    }

    /// Distinct value tuples of `dims` in order of the segment's orders,
    /// ties in order of first occurrence.
    fn axis(records: &[Record], orders: &DimensionOrders, dims: &[Dimension]) -> Vec<Vec<String>> {
        let mut seen = HashSet::new();
        let mut tuples: Vec<Vec<String>> = records
            .iter()
            .map(|r| dims.iter().map(|d| r.dimension(*d)).collect::<Vec<String>>())
            .filter(|t| seen.insert(t.clone()))
            .collect();
        tuples.sort_by_cached_key(|t| Self::positions(orders, dims, t));
        tuples
    }

    /// Pivot a segment.
    pub fn project(&self, segment: &Segment, layout: &Layout) -> PivotTable {
        let rows_axis = Self::axis(&segment.records, &segment.orders, &layout.index);
        let cols_axis = Self::axis(&segment.records, &segment.orders, &layout.pivot);
        let columns: Vec<String> = cols_axis.iter().map(|t| t.join(&self.separator)).collect();

        let row_of: HashMap<&Vec<String>, usize> =
            rows_axis.iter().enumerate().map(|(i, t)| (t, i)).collect();
        let col_of: HashMap<&String, usize> =
            columns.iter().enumerate().map(|(i, c)| (c, i)).collect();

        let mut rows: Vec<PivotRow> = rows_axis
            .iter()
            .map(|index| PivotRow {
                index: index.clone(),
                cells: vec![None; columns.len()],
            })
            .collect();
        for record in &segment.records {
            let index: Vec<String> = layout.index.iter().map(|d| record.dimension(*d)).collect();
            let key = layout
                .pivot
                .iter()
                .map(|d| record.dimension(*d))
                .collect::<Vec<String>>()
                .join(&self.separator);
            let (Some(&r), Some(&c)) = (row_of.get(&index), col_of.get(&key)) else {
                continue;
            };
            let cell = &mut rows[r].cells[c];
            if cell.is_none() {
                *cell = Some(Cell::from_record(record));
            }
        }

        PivotTable {
            index: layout.index.clone(),
            pivot: layout.pivot.clone(),
            columns,
            rows,
            separator: self.separator.clone(),
        }
    }

    /// Long-format records of a table.
    ///
    /// `split_cols` and `split_values` supply the dimensions the table does
    /// not carry. Empty cells produce no record.
    pub fn unpivot(
        &self,
        table: &PivotTable,
        split_cols: &[Dimension],
        split_values: &[String],
    ) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        for (c, key) in table.columns.iter().enumerate() {
            let parts = table.column_parts(key)?;
            for row in &table.rows {
                let Some(cell) = row.cells.get(c).and_then(Option::as_ref) else {
                    continue;
                };
                let mut values: HashMap<Dimension, &str> = HashMap::new();
                values.extend(split_cols.iter().copied().zip(split_values.iter().map(String::as_str)));
                values.extend(table.index.iter().copied().zip(row.index.iter().map(String::as_str)));
                values.extend(table.pivot.iter().copied().zip(parts.iter().copied()));

                let get = |d: Dimension| {
                    values
                        .get(&d)
                        .copied()
                        .ok_or_else(|| OutputError::MalformedKey {
                            key: key.clone(),
                            expected: table.pivot.len(),
                        })
                };
                let year_quarter: YearQuarter = get(Dimension::YearQuarter)?.parse()?;
                let value_type: ValueType = get(Dimension::ValueType)?.parse()?;
                records.push(Record {
                    year_quarter,
                    line: get(Dimension::Line)?.to_string(),
                    insurer: get(Dimension::Insurer)?.to_string(),
                    metric: get(Dimension::Metric)?.to_string(),
                    value_type,
                    value: cell.value,
                    label: cell.label.clone(),
                });
            }
        }
        Ok(records)
    }
}
