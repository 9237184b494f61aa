//! CSV and JSON export of processed records, tables and reports.

use crate::report::SegmentReport;
use crate::table::TableSpec;
use crate::{OutputError, Result};
use inslens_data::Record;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values
    Csv,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    PrettyJson,
}

impl ExportFormat {
    /// File extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" => Ok(Self::PrettyJson),
            other => Err(OutputError::InvalidFormat(other.to_string())),
        }
    }
}

/// Flat processed row for CSV export.
///
/// Every field is always written so all rows share one header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    /// Quarter as `YYYYQN`
    pub year_quarter: String,
    /// Line code
    pub line: String,
    /// Insurer code
    pub insurer: String,
    /// Metric code
    pub metric: String,
    /// Value type code
    pub value_type: String,
    /// Numeric value, empty when missing
    pub value: Option<f64>,
    /// Display label, empty when unset
    pub label: Option<String>,
}

impl From<&Record> for ExportRow {
    fn from(record: &Record) -> Self {
        Self {
            year_quarter: record.year_quarter.to_string(),
            line: record.line.clone(),
            insurer: record.insurer.clone(),
            metric: record.metric.clone(),
            value_type: record.value_type.to_string(),
            value: record.value.filter(|v| v.is_finite()),
            label: record.label.clone(),
        }
    }
}

fn csv_string<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| OutputError::InvalidFormat(e.to_string()))
}

fn json_string<T: Serialize + ?Sized>(value: &T, format: ExportFormat) -> Result<String> {
    Ok(match format {
        ExportFormat::PrettyJson => serde_json::to_string_pretty(value)?,
        _ => serde_json::to_string(value)?,
    })
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the format does not apply.
    fn export_to_string(&self, format: ExportFormat) -> Result<String>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<()> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl Exporter for [Record] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Csv => csv_string(self.iter().map(ExportRow::from)),
            _ => json_string(self, format),
        }
    }
}

impl Exporter for Vec<Record> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        self.as_slice().export_to_string(format)
    }
}

impl Exporter for TableSpec {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                let columns: Vec<_> = self.visible_columns().collect();
                wtr.write_record(columns.iter().map(|c| c.id.as_str()))?;
                for row in 0..self.data.len() {
                    wtr.write_record(columns.iter().map(|c| self.display(row, c)))?;
                }
                let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
                String::from_utf8(bytes).map_err(|e| OutputError::InvalidFormat(e.to_string()))
            }
            _ => json_string(self, format),
        }
    }
}

impl Exporter for [SegmentReport] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Csv => Err(OutputError::InvalidFormat(
                "segment reports export as JSON only".to_string(),
            )),
            _ => json_string(self, format),
        }
    }
}

impl Exporter for Vec<SegmentReport> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        self.as_slice().export_to_string(format)
    }
}
