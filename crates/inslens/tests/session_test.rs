//! Session runs over in-memory tables.

use approx::assert_relative_eq;
use inslens::Session;
use inslens::data::{
    Frame, InsurerDirectory, LineHierarchy, PeriodType, Record, ReportingForm, TOTAL_INSURER,
    ValueType, YearQuarter,
};
use inslens::pipeline::{InputFrames, InsurerSelection, PipelineError, QueryParams};
use inslens::InslensError;

const LINES: &str = r#"{
    "non_life": {"label": "Non-life", "children": ["auto", "property"]},
    "auto": {"label": "Motor"},
    "property": {"label": "Property"}
}"#;

fn yq(s: &str) -> YearQuarter {
    s.parse().unwrap()
}

fn inputs() -> InputFrames {
    let mut records = Vec::new();
    for (line, a, b) in [("auto", 100.0, 300.0), ("property", 50.0, 25.0)] {
        records.push(Record::base(yq("2024Q1"), line, "ins_a", "direct_premiums", a));
        records.push(Record::base(yq("2024Q1"), line, "ins_b", "direct_premiums", b));
        records.push(Record::base(yq("2024Q1"), line, TOTAL_INSURER, "direct_premiums", a + b));
    }
    InputFrames::new().with(ReportingForm::Form162, Frame::from_records(&records).unwrap())
}

fn params() -> QueryParams {
    QueryParams {
        reporting_form: ReportingForm::Form162,
        end_quarter: yq("2024Q1"),
        period_type: PeriodType::Qoq,
        num_periods: 1,
        lines: vec!["auto".to_string(), "property".to_string()],
        metrics: vec!["direct_premiums".to_string()],
        insurers: InsurerSelection::Total,
        value_types: vec![ValueType::Base, ValueType::MarketShare],
        ..QueryParams::default()
    }
}

fn session() -> Session {
    Session::new(inputs(), params())
        .with_lines(LineHierarchy::from_json(LINES).unwrap())
        .with_insurers(InsurerDirectory::from_json(r#"{"ins_a": "Alpha", "ins_b": "Beta"}"#).unwrap())
}

#[test]
fn test_run_builds_one_report_per_line() {
    let mut session = session();
    let reports = session.run().unwrap();
    let mut titles: Vec<&str> = reports.iter().map(|r| r.title.as_str()).collect();
    titles.sort_unstable();
    assert_eq!(titles, vec!["Motor", "Property"]);

    let motor = reports.iter().find(|r| r.title == "Motor").unwrap();
    assert_eq!(motor.table.data[0]["insurer"], "Beta");
    let share = motor.table.data[0]["direct_premiums&market_share&2024Q1"]
        .as_f64()
        .unwrap();
    assert_relative_eq!(share, 0.75, epsilon = 1e-12);
}

#[test]
fn test_update_clears_results() {
    let mut session = session();
    session.run().unwrap();
    assert!(!session.context().segments().is_empty());

    session.update(QueryParams {
        period_type: PeriodType::Ytd,
        ..params()
    });
    assert!(session.context().segments().is_empty());
    assert_eq!(session.labels().period(yq("2024Q2")), "6M 2024");
}

#[test]
fn test_select_lines_uses_hierarchy() {
    let mut session = session();
    session.select_lines(&["non_life".to_string()], false);
    assert_eq!(session.params().lines, vec!["non_life"]);

    session.select_lines(&[], true);
    assert_eq!(session.params().lines, vec!["auto", "property"]);
}

#[test]
fn test_invalid_params_surface() {
    let mut session = Session::new(
        inputs(),
        QueryParams {
            num_periods: 0,
            ..params()
        },
    );
    let err = session.run().unwrap_err();
    assert!(matches!(
        err,
        InslensError::Pipeline(PipelineError::InputValidation(_))
    ));
}
