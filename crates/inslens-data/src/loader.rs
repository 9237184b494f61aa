//! CSV loading for reporting-form fact tables.

use crate::{DataError, Frame, Record, ReportingForm, Result, ValueType, YearQuarter};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

const REQUIRED_COLUMNS: [&str; 5] = ["year_quarter", "insurer", "line", "metric", "value"];

/// One CSV row. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct CsvRow {
    year_quarter: String,
    insurer: String,
    line: String,
    metric: String,
    value: Option<f64>,
    #[serde(default)]
    reporting_form: Option<String>,
}

/// Load a fact table from a CSV file.
pub fn load_csv(path: impl AsRef<Path>, form: ReportingForm) -> Result<Frame> {
    let path = path.as_ref();
    let frame = read_csv(File::open(path)?, form, &path.display().to_string())?;
    info!(path = %path.display(), form = %form, rows = frame.height(), "loaded fact table");
    Ok(frame)
}

/// Read a fact table from any CSV source.
///
/// Rows whose optional `reporting_form` column names a different form are
/// skipped. When `(year_quarter, line, insurer, metric)` repeats, the last row
/// wins.
pub fn read_csv<R: Read>(reader: R, form: ReportingForm, source_name: &str) -> Result<Frame> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = reader.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !headers.iter().any(|h| h == **c))
        .map(|c| (*c).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DataError::MissingColumns {
            source_name: source_name.to_string(),
            columns: missing,
        });
    }

    let mut records: Vec<Record> = Vec::new();
    let mut positions: HashMap<(YearQuarter, String, String, String), usize> = HashMap::new();
    let mut skipped = 0usize;

    for row in reader.deserialize::<CsvRow>() {
        let row = row?;
        if let Some(code) = row.reporting_form.as_deref().filter(|c| !c.is_empty())
            && code.parse::<ReportingForm>()? != form
        {
            skipped += 1;
            continue;
        }

        let record = Record {
            year_quarter: row.year_quarter.parse()?,
            line: row.line,
            insurer: row.insurer,
            metric: row.metric,
            value_type: ValueType::Base,
            value: row.value,
            label: None,
        };
        let key = (
            record.year_quarter,
            record.line.clone(),
            record.insurer.clone(),
            record.metric.clone(),
        );
        if let Some(&pos) = positions.get(&key) {
            warn!(
                quarter = %record.year_quarter,
                line = %record.line,
                insurer = %record.insurer,
                metric = %record.metric,
                "duplicate fact row, keeping the last one"
            );
            records[pos] = record;
        } else {
            positions.insert(key, records.len());
            records.push(record);
        }
    }

    if skipped > 0 {
        debug!(skipped, form = %form, "skipped rows of other reporting forms");
    }
    Frame::from_records(&records)
}
