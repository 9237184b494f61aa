//! Derived metric computation.

use crate::{Result, Stage};
use inslens_data::{Frame, Record, ValueType, YearQuarter};
use inslens_metrics::MetricRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

type GroupKey = (YearQuarter, String, String, ValueType);

/// Metric values of one `(year_quarter, line, insurer, value_type)` group.
#[derive(Debug, Default)]
struct Group {
    values: HashMap<String, f64>,
    nulls: Vec<String>,
}

impl Group {
    fn insert(&mut self, metric: &str, value: Option<f64>) {
        match value {
            Some(v) => {
                self.nulls.retain(|m| m != metric);
                self.values.insert(metric.to_string(), v);
            }
            None => {
                self.values.remove(metric);
                if !self.nulls.iter().any(|m| m == metric) {
                    self.nulls.push(metric.to_string());
                }
            }
        }
    }

    fn has(&self, metric: &str) -> bool {
        self.values.contains_key(metric) || self.nulls.iter().any(|m| m == metric)
    }
}

/// Evaluates the resolved metric list per group and keeps the selected metrics.
#[derive(Debug, Clone)]
pub struct MetricComputation {
    registry: Arc<MetricRegistry>,
    selected: Vec<String>,
    required: Vec<String>,
}

impl MetricComputation {
    /// Create the stage. `required` is the resolver output for `selected`.
    pub const fn new(
        registry: Arc<MetricRegistry>,
        selected: Vec<String>,
        required: Vec<String>,
    ) -> Self {
        Self {
            registry,
            selected,
            required,
        }
    }

    fn fill(&self, key: &GroupKey, group: &mut Group) {
        for code in &self.required {
            if group.has(code) {
                continue;
            }
            let derivable = self.registry.get(code).is_some_and(|def| !def.is_base());
            if !derivable {
                continue;
            }
            match self.registry.evaluate(code, &group.values) {
                Ok(value) => group.insert(code, Some(value)),
                Err(e) => debug!(
                    error = %e,
                    quarter = %key.0,
                    line = %key.1,
                    insurer = %key.2,
                    "metric skipped"
                ),
            }
        }
    }
}

impl Stage for MetricComputation {
    fn name(&self) -> &str {
        "compute_metrics"
    }

    fn apply(&self, frame: Frame) -> Result<Frame> {
        let mut order: Vec<GroupKey> = Vec::new();
        let mut groups: HashMap<GroupKey, Group> = HashMap::new();
        for record in frame.records()? {
            let key = (
                record.year_quarter,
                record.line,
                record.insurer,
                record.value_type,
            );
            let group = groups.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                Group::default()
            });
            group.insert(&record.metric, record.value);
        }

        let mut out = Vec::new();
        for key in order {
            let Some(mut group) = groups.remove(&key) else {
                continue;
            };
            self.fill(&key, &mut group);
            let (year_quarter, line, insurer, value_type) = key;
            for metric in &self.selected {
                if !group.has(metric) {
                    continue;
                }
                out.push(Record {
                    year_quarter,
                    line: line.clone(),
                    insurer: insurer.clone(),
                    metric: metric.clone(),
                    value_type,
                    value: group.values.get(metric).copied(),
                    label: None,
                });
            }
        }
        Ok(Frame::from_records(&out)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::test_support::*;
    use approx::assert_relative_eq;
    use std::collections::HashSet;

    fn stage(selected: &[&str], input: &Frame) -> MetricComputation {
        let registry = Arc::new(MetricRegistry::standard());
        let selected: Vec<String> = selected.iter().map(|s| s.to_string()).collect();
        let available: HashSet<String> = input
            .unique_values(inslens_data::columns::METRIC)
            .unwrap()
            .into_iter()
            .collect();
        let required = registry.required_metrics(&selected, &available).unwrap();
        MetricComputation::new(registry, selected, required)
    }

    #[test]
    fn test_derives_total_premiums() {
        let input = frame(&[
            base("2024Q1", "auto", "ins_a", "direct_premiums", 100.0),
            base("2024Q1", "auto", "ins_a", "inward_premiums", 10.0),
            base("2024Q1", "auto", "ins_b", "direct_premiums", 200.0),
        ]);
        let out = stage(&["total_premiums"], &input).apply(input).unwrap();
        let records = out.records().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.metric == "total_premiums"));
        assert_relative_eq!(
            value_of(&records, "2024Q1", "ins_a", "total_premiums", ValueType::Base).unwrap(),
            110.0
        );
        assert_relative_eq!(
            value_of(&records, "2024Q1", "ins_b", "total_premiums", ValueType::Base).unwrap(),
            200.0
        );
    }

    #[test]
    fn test_zero_denominator_reads_as_one() {
        let input = frame(&[
            base("2024Q1", "auto", "ins_a", "direct_premiums", 50.0),
            base("2024Q1", "auto", "ins_a", "ceded_premiums", 0.0),
        ]);
        let out = stage(&["ceded_premiums_ratio"], &input).apply(input).unwrap();
        let records = out.records().unwrap();
        assert_eq!(
            value_of(&records, "2024Q1", "ins_a", "ceded_premiums_ratio", ValueType::Base),
            Some(0.0)
        );
    }

    #[test]
    fn test_selected_base_metric_passes_through() {
        let input = frame(&[
            base("2024Q1", "auto", "ins_a", "direct_premiums", 50.0),
            base("2024Q1", "auto", "ins_a", "direct_losses", 20.0),
        ]);
        let out = stage(&["direct_premiums", "direct_loss_ratio"], &input)
            .apply(input)
            .unwrap();
        let records = out.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].metric, "direct_premiums");
        assert_relative_eq!(records[1].value.unwrap(), 0.4);
    }

    #[test]
    fn test_missing_base_metric_emits_no_row() {
        let input = frame(&[base("2024Q1", "auto", "ins_a", "direct_premiums", 50.0)]);
        let out = stage(&["direct_premiums", "ceded_premiums"], &input)
            .apply(input)
            .unwrap();
        assert_eq!(out.height(), 1);
    }

    #[test]
    fn test_non_finite_input_skips_metric() {
        let input = frame(&[
            base("2024Q1", "auto", "ins_a", "direct_premiums", f64::INFINITY),
            base("2024Q1", "auto", "ins_a", "inward_premiums", 1.0),
            base("2024Q1", "auto", "ins_b", "direct_premiums", 2.0),
        ]);
        let out = stage(&["total_premiums"], &input).apply(input).unwrap();
        let records = out.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].insurer, "ins_b");
    }
}
