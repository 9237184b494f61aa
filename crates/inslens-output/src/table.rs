//! Serializable table description.

use crate::labels::LabelMapper;
use crate::pivot::{Cell, EMPTY_CELL, PivotTable};
use inslens_data::{Dimension, ValueType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Kind of column content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Labels and formatted strings
    Text,
    /// Numbers
    Numeric,
}

/// Number format of a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFormat {
    /// Decimal places
    pub precision: u8,
    /// Show `+` on positive values
    pub sign: bool,
    /// Values are fractions shown as percentages
    pub percent: bool,
}

impl ColumnFormat {
    /// Format of a value type: two decimals for percentages, three otherwise,
    /// explicit sign on changes.
    pub const fn for_value_type(value_type: ValueType) -> Self {
        Self {
            precision: if value_type.is_percentage() { 2 } else { 3 },
            sign: value_type.is_change(),
            percent: matches!(value_type, ValueType::BaseChange | ValueType::MarketShare),
        }
    }

    /// Render a number.
    pub fn apply(&self, value: f64) -> String {
        let scaled = if self.percent { value * 100.0 } else { value };
        let precision = usize::from(self.precision);
        if self.sign {
            format!("{scaled:+.precision$}")
        } else {
            format!("{scaled:.precision$}")
        }
    }
}

/// One column of the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column key
    pub id: String,
    /// Header levels, outermost first
    pub name: Vec<String>,
    /// Content kind
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Number format of numeric columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ColumnFormat>,
}

/// Table ready for a front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Columns in display order, index columns first
    pub columns: Vec<ColumnSpec>,
    /// Rows keyed by column id
    pub data: Vec<BTreeMap<String, Value>>,
    /// Ids of columns not shown by default
    pub hidden_columns: Vec<String>,
}

fn dimension_title(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Line => "Line",
        Dimension::Metric => "Metric",
        Dimension::Insurer => "Insurer",
        Dimension::ValueType => "Value",
        Dimension::YearQuarter => "Period",
    }
}

fn cell_value(cell: Option<&Cell>) -> Value {
    let Some(cell) = cell else {
        return Value::from(EMPTY_CELL);
    };
    if let Some(label) = &cell.label {
        return Value::from(label.as_str());
    }
    match cell.numeric() {
        Some(v) if v != 0.0 => Value::from(v),
        _ => Value::from(EMPTY_CELL),
    }
}

impl TableSpec {
    /// Describe a pivot table.
    ///
    /// Columns of value types outside `shown` are listed as hidden.
    pub fn from_pivot(table: &PivotTable, labels: &LabelMapper, shown: &[ValueType]) -> Self {
        let levels = table.pivot.len().max(1);
        let mut columns: Vec<ColumnSpec> = table
            .index
            .iter()
            .map(|dim| ColumnSpec {
                id: dim.column().to_string(),
                name: vec![dimension_title(*dim).to_string(); levels],
                column_type: ColumnType::Text,
                format: None,
            })
            .collect();

        let mut hidden_columns = Vec::new();
        for key in &table.columns {
            let parts: Vec<&str> = key.split(table.separator.as_str()).collect();
            let value_type = table
                .column_value(key, Dimension::ValueType)
                .and_then(|v| v.parse::<ValueType>().ok());
            let (column_type, format) = match value_type {
                Some(ValueType::Rank) | None => (ColumnType::Text, None),
                Some(vt) => (ColumnType::Numeric, Some(ColumnFormat::for_value_type(vt))),
            };
            if value_type.is_some_and(|vt| !shown.contains(&vt)) {
                hidden_columns.push(key.clone());
            }
            columns.push(ColumnSpec {
                id: key.clone(),
                name: labels.column_levels(&table.pivot, &parts),
                column_type,
                format,
            });
        }

        let data = table
            .rows
            .iter()
            .map(|row| {
                let mut entry: BTreeMap<String, Value> = table
                    .index
                    .iter()
                    .zip(&row.index)
                    .map(|(dim, value)| {
                        (
                            dim.column().to_string(),
                            Value::from(labels.dimension_value(*dim, value)),
                        )
                    })
                    .collect();
                for (key, cell) in table.columns.iter().zip(&row.cells) {
                    entry.insert(key.clone(), cell_value(cell.as_ref()));
                }
                entry
            })
            .collect();

        Self {
            columns,
            data,
            hidden_columns,
        }
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Visible columns in display order.
    pub fn visible_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns
            .iter()
            .filter(|c| !self.hidden_columns.contains(&c.id))
    }

    /// Display string of a cell.
    pub fn display(&self, row: usize, column: &ColumnSpec) -> String {
        match self.data.get(row).and_then(|r| r.get(&column.id)) {
            Some(Value::Number(n)) => match (n.as_f64(), column.format) {
                (Some(v), Some(format)) => format.apply(v),
                (Some(v), None) => v.to_string(),
                (None, _) => n.to_string(),
            },
            Some(Value::String(s)) => s.clone(),
            _ => EMPTY_CELL.to_string(),
        }
    }

    fn header(column: &ColumnSpec) -> String {
        let mut levels: Vec<&str> = Vec::new();
        for level in &column.name {
            if levels.last() != Some(&level.as_str()) {
                levels.push(level);
            }
        }
        levels.join(" / ")
    }

    /// Render as a fixed-width text table.
    pub fn to_ascii_table(&self, title: &str) -> String {
        let columns: Vec<&ColumnSpec> = self.visible_columns().collect();
        let headers: Vec<String> = columns.iter().map(|c| Self::header(c)).collect();
        let cells: Vec<Vec<String>> = (0..self.data.len())
            .map(|row| columns.iter().map(|c| self.display(row, c)).collect())
            .collect();
        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                cells
                    .iter()
                    .map(|r| r[i].chars().count())
                    .chain([h.chars().count()])
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        let total_width: usize = widths.iter().sum::<usize>() + 3 * widths.len().saturating_sub(1);

        let mut output = String::new();
        output.push_str(&format!("\n{title}\n"));
        output.push_str(&"=".repeat(total_width.max(title.chars().count())));
        output.push('\n');
        let line = |values: &[String]| {
            values
                .iter()
                .zip(&widths)
                .map(|(v, w)| format!("{v:>w$}", w = *w))
                .collect::<Vec<String>>()
                .join(" | ")
        };
        output.push_str(&line(headers.as_slice()));
        output.push('\n');
        output.push_str(&"-".repeat(total_width));
        output.push('\n');
        for row in &cells {
            output.push_str(&line(row.as_slice()));
            output.push('\n');
        }
        if cells.is_empty() {
            output.push_str("(no data)\n");
        }
        output
    }

    /// Render as a Markdown table.
    pub fn to_markdown(&self, title: &str) -> String {
        let columns: Vec<&ColumnSpec> = self.visible_columns().collect();
        let mut output = format!("## {title}\n\n");
        if self.data.is_empty() {
            output.push_str("_No data._\n");
            return output;
        }
        let headers: Vec<String> = columns.iter().map(|c| Self::header(c)).collect();
        output.push_str(&format!("| {} |\n", headers.join(" | ")));
        output.push_str(&format!(
            "|{}|\n",
            columns
                .iter()
                .map(|c| match c.column_type {
                    ColumnType::Numeric => "---:",
                    ColumnType::Text => "---",
                })
                .collect::<Vec<&str>>()
                .join("|")
        ));
        for row in 0..self.data.len() {
            let values: Vec<String> = columns.iter().map(|c| self.display(row, c)).collect();
            output.push_str(&format!("| {} |\n", values.join(" | ")));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pivot::PivotRow;
    use inslens_metrics::MetricRegistry;
    use inslens_data::PeriodType;
    use rstest::rstest;
    use std::sync::Arc;

    fn cell(value: Option<f64>, label: Option<&str>) -> Option<Cell> {
        Some(Cell {
            value,
            label: label.map(str::to_string),
        })
    }

    fn table() -> PivotTable {
        PivotTable {
            index: vec![Dimension::Insurer],
            pivot: vec![Dimension::ValueType, Dimension::YearQuarter],
            columns: vec![
                "rank&2024Q2".to_string(),
                "base&2024Q2".to_string(),
                "base_change&2024Q2".to_string(),
                "market_share&2024Q2".to_string(),
            ],
            rows: vec![
                PivotRow {
                    index: vec!["ins_a".to_string()],
                    cells: vec![
                        cell(Some(1.0), Some("1 (+1)")),
                        cell(Some(1234.5), None),
                        cell(Some(0.25), None),
                        cell(Some(0.0), None),
                    ],
                },
                PivotRow {
                    index: vec!["total".to_string()],
                    cells: vec![None, cell(Some(2000.0), None), cell(Some(12.0), Some("∞")), None],
                },
            ],
            separator: "&".to_string(),
        }
    }

    fn spec() -> TableSpec {
        let labels = LabelMapper::new(Arc::new(MetricRegistry::standard()), PeriodType::Qoq);
        TableSpec::from_pivot(
            &table(),
            &labels,
            &[ValueType::Rank, ValueType::Base, ValueType::BaseChange],
        )
    }

    #[rstest]
    #[case(ValueType::Base, 1234.5678, "1234.568")]
    #[case(ValueType::BaseChange, 0.1234, "+12.34")]
    #[case(ValueType::MarketShare, 0.5, "50.00")]
    #[case(ValueType::MarketShareChange, -1.5, "-1.50")]
    fn test_column_format(#[case] vt: ValueType, #[case] value: f64, #[case] expected: &str) {
        assert_eq!(ColumnFormat::for_value_type(vt).apply(value), expected);
    }

    #[test]
    fn test_columns_and_hidden() {
        let spec = spec();
        assert_eq!(spec.columns.len(), 5);
        assert_eq!(spec.columns[0].id, "insurer");
        assert_eq!(spec.columns[1].column_type, ColumnType::Text);
        assert_eq!(spec.columns[2].name, vec!["Value", "Q2 2024"]);
        assert_eq!(spec.columns[3].name, vec!["%Δ", "Q2 vs Q1"]);
        assert_eq!(spec.hidden_columns, vec!["market_share&2024Q2"]);
        assert_eq!(spec.visible_columns().count(), 4);
    }

    #[test]
    fn test_data_cells() {
        let spec = spec();
        assert_eq!(spec.data[0]["insurer"], Value::from("ins_a"));
        assert_eq!(spec.data[0]["rank&2024Q2"], Value::from("1 (+1)"));
        assert_eq!(spec.data[0]["base&2024Q2"], Value::from(1234.5));
        assert_eq!(spec.data[0]["market_share&2024Q2"], Value::from("-"));
        assert_eq!(spec.data[1]["insurer"], Value::from("Market total"));
        assert_eq!(spec.data[1]["rank&2024Q2"], Value::from("-"));
        assert_eq!(spec.data[1]["base_change&2024Q2"], Value::from("∞"));
    }

    #[test]
    fn test_renderers() {
        let spec = spec();
        let ascii = spec.to_ascii_table("auto");
        assert!(ascii.contains("auto"));
        assert!(ascii.contains("+25.00"));
        assert!(ascii.contains("Market total"));
        assert!(!ascii.contains("Market share"));
        let markdown = spec.to_markdown("auto");
        assert!(markdown.starts_with("## auto"));
        assert!(markdown.contains("| ins_a | 1 (+1) | 1234.500 | +25.00 |"));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(spec()).unwrap();
        assert_eq!(json["columns"][2]["type"], "numeric");
        assert_eq!(json["columns"][2]["format"]["precision"], 3);
        assert!(json["columns"][0].get("format").is_none());
        assert_eq!(json["hidden_columns"][0], "market_share&2024Q2");
    }
}
