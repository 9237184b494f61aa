//! Reports built from an orchestrator run.

use approx::assert_relative_eq;
use inslens_data::{Frame, PeriodType, Record, ReportingForm, TOTAL_INSURER, ValueType, YearQuarter};
use inslens_metrics::MetricRegistry;
use inslens_output::{
    ExportFormat, Exporter, LabelMapper, PivotProjector, SegmentReport, build_reports,
};
use inslens_pipeline::{InputFrames, InsurerSelection, Orchestrator, ProcessingContext, QueryParams};
use serde_json::Value;
use std::sync::Arc;

fn yq(s: &str) -> YearQuarter {
    s.parse().unwrap()
}

fn context() -> ProcessingContext {
    let mut records = Vec::new();
    for (q, a, b) in [("2023Q4", 100.0, 100.0), ("2024Q1", 100.0, 200.0)] {
        records.push(Record::base(yq(q), "auto", "ins_a", "direct_premiums", a));
        records.push(Record::base(yq(q), "auto", "ins_b", "direct_premiums", b));
        records.push(Record::base(yq(q), "auto", TOTAL_INSURER, "direct_premiums", a + b));
    }
    let params = QueryParams {
        reporting_form: ReportingForm::Form162,
        end_quarter: yq("2024Q1"),
        period_type: PeriodType::Qoq,
        num_periods: 2,
        lines: vec!["auto".to_string()],
        metrics: vec!["direct_premiums".to_string()],
        insurers: InsurerSelection::Total,
        value_types: vec![ValueType::Base, ValueType::BaseChange, ValueType::Rank],
        ..QueryParams::default()
    };
    let inputs = InputFrames::new().with(
        ReportingForm::Form162,
        Frame::from_records(&records).unwrap(),
    );
    let mut ctx = ProcessingContext::new(Arc::new(inputs), params);
    Orchestrator::standard().run(&mut ctx).unwrap();
    ctx
}

fn reports() -> Vec<SegmentReport> {
    let labels = LabelMapper::new(Arc::new(MetricRegistry::standard()), PeriodType::Qoq);
    build_reports(&context(), &labels, &PivotProjector::default())
}

#[test]
fn test_one_report_per_line() {
    let reports = reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].title, "auto");
    assert_eq!(reports[0].split_values, vec!["auto"]);
    assert!(reports[0].table.hidden_columns.is_empty());
}

#[test]
fn test_table_rows_and_cells() {
    let reports = reports();
    let data = &reports[0].table.data;
    let insurers: Vec<&Value> = data.iter().map(|row| &row["insurer"]).collect();
    assert_eq!(insurers, vec!["ins_b", "ins_a", "Market total"]);

    assert_eq!(data[0]["direct_premiums&base&2024Q1"], Value::from(200.0));
    assert_eq!(data[0]["direct_premiums&rank&2024Q1"], Value::from("1 (-)"));
    assert_eq!(data[1]["direct_premiums&rank&2024Q1"], Value::from("2 (-1)"));
    assert_eq!(data[2]["direct_premiums&rank&2024Q1"], Value::from("-"));

    let growth_b = data[0]["direct_premiums&base_change&2024Q1"].as_f64().unwrap();
    assert_relative_eq!(growth_b, 1.0, epsilon = 1e-12);
    assert_eq!(data[1]["direct_premiums&base_change&2024Q1"], Value::from("-"));
}

#[test]
fn test_chart_uses_latest_values() {
    let reports = reports();
    let chart = &reports[0].chart;
    assert_eq!(chart.series.len(), 1);
    assert_eq!(chart.series[0].name, "Direct premiums, ths");
    assert_eq!(chart.series[0].y, vec![200.0, 100.0, 300.0]);
    assert_relative_eq!(chart.layout.range[1], 330.0, epsilon = 1e-9);
    assert_eq!(chart.layout.title, "auto");
}

#[test]
fn test_exports() {
    let reports = reports();
    let json = reports.export_to_string(ExportFormat::Json).unwrap();
    let parsed: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed[0]["title"], "auto");
    assert_eq!(parsed[0]["table"]["columns"][0]["id"], "insurer");

    let csv = reports[0].table.export_to_string(ExportFormat::Csv).unwrap();
    let header = csv.lines().next().unwrap();
    assert!(header.starts_with("insurer,direct_premiums&rank&2024Q1"));
    assert!(csv.contains("Market total"));

    let processed = context().processed().records().unwrap();
    let csv = processed.export_to_string(ExportFormat::Csv).unwrap();
    assert_eq!(csv.lines().count(), processed.len() + 1);
}
