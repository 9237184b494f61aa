//! Partitioning of the processed frame into display segments.

use crate::{InsurerSelection, Layout, QueryParams, Result};
use inslens_data::{Dimension, Frame, Insurer, Record, TOTAL_INSURER, ValueType};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Explicit value order of every dimension.
///
/// Rows whose value is not listed for a configured dimension are dropped
/// from segments; the position in the list drives sorting and pivoting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DimensionOrders {
    values: BTreeMap<Dimension, Vec<String>>,
}

impl DimensionOrders {
    /// Values of a dimension in display order.
    pub fn get(&self, dimension: Dimension) -> &[String] {
        self.values.get(&dimension).map_or(&[], Vec::as_slice)
    }

    /// Set the order of a dimension.
    pub fn set(&mut self, dimension: Dimension, values: Vec<String>) {
        self.values.insert(dimension, values);
    }

    /// Position of `value` in the order of `dimension`.
    pub fn position(&self, dimension: Dimension, value: &str) -> Option<usize> {
        self.get(dimension).iter().position(|v| v == value)
    }

    /// Whether a record carries configured values only.
    fn admits(&self, record: &Record) -> bool {
        self.values
            .iter()
            .all(|(dim, values)| values.contains(&record.dimension(*dim)))
    }
}

/// One display unit: the records of a combination of split values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    /// Records of the segment, sorted by dimension order
    pub records: Vec<Record>,
    /// Split dimensions
    pub split_cols: Vec<Dimension>,
    /// Value of each split dimension
    pub split_values: Vec<String>,
    /// Orders used to sort and pivot the records
    pub orders: DimensionOrders,
}

impl Segment {
    /// Whether the segment has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Insurer order for a set of records.
///
/// Real insurers are ranked by their summed `base` value of `metric` in the
/// latest quarter that has it; insurers missing there follow in order of
/// appearance.
pub fn ordered_insurers(
    records: &[Record],
    metric: Option<&str>,
    selection: &InsurerSelection,
) -> Vec<String> {
    let mut appearance: Vec<&str> = Vec::new();
    let mut seen = HashSet::new();
    for record in records {
        if !Insurer::is_synthetic_code(&record.insurer) && seen.insert(record.insurer.as_str()) {
            appearance.push(&record.insurer);
        }
    }

    let is_ranking_row = |r: &&Record| {
        r.value_type == ValueType::Base && metric.is_none_or(|m| r.metric == m)
    };
    let latest = records
        .iter()
        .filter(is_ranking_row)
        .map(|r| r.year_quarter)
        .max();
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for record in records
        .iter()
        .filter(is_ranking_row)
        .filter(|r| Some(r.year_quarter) == latest)
    {
        *totals.entry(record.insurer.as_str()).or_default() += record.value.unwrap_or(0.0);
    }

    let mut ranked = appearance;
    ranked.sort_by(|a, b| match (totals.get(a), totals.get(b)) {
        (Some(x), Some(y)) => y.partial_cmp(x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    let ranked: Vec<String> = ranked.into_iter().map(str::to_string).collect();

    match selection {
        InsurerSelection::Total => {
            let mut order = ranked;
            order.push(TOTAL_INSURER.to_string());
            order
        }
        InsurerSelection::TopN(n) => {
            let mut order: Vec<String> = ranked.into_iter().take(*n as usize).collect();
            order.push(Insurer::top_n_code(*n));
            order
        }
        InsurerSelection::All => ranked,
        InsurerSelection::Specific(codes) => {
            let mut order: Vec<String> = ranked.into_iter().filter(|c| codes.contains(c)).collect();
            for code in codes {
                if !order.contains(code) {
                    order.push(code.clone());
                }
            }
            order
        }
    }
}

/// Splits processed records into at most `max_segments` segments.
#[derive(Debug, Clone)]
pub struct DimensionalSplitter {
    max_segments: usize,
}

impl DimensionalSplitter {
    /// Create a splitter.
    pub const fn new(max_segments: usize) -> Self {
        Self { max_segments }
    }

    /// Global orders of a query over its processed records.
    ///
    /// Value types start with the selected ones, `rank` first; types the
    /// pipeline kept as inputs of a selected type follow.
    pub fn orders(records: &[Record], params: &QueryParams) -> DimensionOrders {
        let mut orders = DimensionOrders::default();
        orders.set(Dimension::Line, params.lines.clone());
        orders.set(Dimension::Metric, params.metrics.clone());
        orders.set(
            Dimension::Insurer,
            ordered_insurers(
                records,
                params.metrics.first().map(String::as_str),
                &params.insurers,
            ),
        );

        let mut value_types: Vec<String> = Vec::new();
        if params.wants(ValueType::Rank) {
            value_types.push(ValueType::Rank.to_string());
        }
        value_types.extend(
            params
                .value_types
                .iter()
                .filter(|vt| **vt != ValueType::Rank)
                .map(ToString::to_string),
        );
        for record in records {
            let vt = record.value_type.to_string();
            if !value_types.contains(&vt) {
                value_types.push(vt);
            }
        }
        orders.set(Dimension::ValueType, value_types);

        let mut quarters: Vec<_> = records.iter().map(|r| r.year_quarter).collect();
        quarters.sort_unstable_by(|a, b| b.cmp(a));
        quarters.dedup();
        orders.set(
            Dimension::YearQuarter,
            quarters.iter().map(ToString::to_string).collect(),
        );
        orders
    }

    /// Split a processed frame along `layout.split`.
    pub fn split(
        &self,
        frame: &Frame,
        params: &QueryParams,
        layout: &Layout,
    ) -> Result<Vec<Segment>> {
        let records = frame.records()?;
        let orders = Self::orders(&records, params);
        let split_cols = layout.split.clone();

        let present: HashSet<Vec<String>> = records
            .iter()
            .map(|r| split_cols.iter().map(|d| r.dimension(*d)).collect())
            .collect();
        let mut combinations: Vec<Vec<String>> = vec![Vec::new()];
        for dim in &split_cols {
            combinations = combinations
                .into_iter()
                .flat_map(|prefix| {
                    orders.get(*dim).iter().map(move |value| {
                        let mut combination = prefix.clone();
                        combination.push(value.clone());
                        combination
                    })
                })
                .collect();
        }
        let total = combinations.len();
        let combinations: Vec<Vec<String>> = combinations
            .into_iter()
            .filter(|c| split_cols.is_empty() || present.contains(c))
            .take(self.max_segments)
            .collect();
        debug!(
            candidates = total,
            segments = combinations.len(),
            split = ?split_cols,
            "split processed frame"
        );

        let sort_dims: Vec<Dimension> = layout.index.iter().chain(&layout.pivot).copied().collect();
        let segments = combinations
            .into_iter()
            .map(|split_values| {
                let mut segment_orders = orders.clone();
                for (dim, value) in split_cols.iter().zip(&split_values) {
                    segment_orders.set(*dim, vec![value.clone()]);
                }
                let in_segment: Vec<Record> = records
                    .iter()
                    .filter(|r| {
                        split_cols
                            .iter()
                            .zip(&split_values)
                            .all(|(d, v)| r.dimension(*d) == *v)
                    })
                    .cloned()
                    .collect();
                if params.insurers.is_top_n() && !split_cols.contains(&Dimension::Insurer) {
                    let metric = segment_orders.get(Dimension::Metric).first().cloned();
                    segment_orders.set(
                        Dimension::Insurer,
                        ordered_insurers(&in_segment, metric.as_deref(), &params.insurers),
                    );
                }

                let mut segment_records: Vec<Record> = in_segment
                    .into_iter()
                    .filter(|r| segment_orders.admits(r))
                    .collect();
                segment_records.sort_by_key(|r| {
                    sort_dims
                        .iter()
                        .map(|d| segment_orders.position(*d, &r.dimension(*d)).unwrap_or(usize::MAX))
                        .collect::<Vec<usize>>()
                });
                Segment {
                    records: segment_records,
                    split_cols: split_cols.clone(),
                    split_values,
                    orders: segment_orders,
                }
            })
            .collect();
        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inslens_data::YearQuarter;

    fn yq(s: &str) -> YearQuarter {
        s.parse().unwrap()
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn records() -> Vec<Record> {
        let mut out = Vec::new();
        let lines = [
            ("auto", [("ins_a", 100.0), ("ins_b", 300.0), ("ins_c", 200.0)]),
            ("property", [("ins_a", 150.0), ("ins_b", 120.0), ("ins_c", 400.0)]),
        ];
        for (line, values) in lines {
            for (insurer, value) in values {
                out.push(Record::base(yq("2024Q1"), line, insurer, "direct_premiums", value));
                out.push(Record::base(yq("2023Q4"), line, insurer, "direct_premiums", 1.0));
            }
            out.push(Record::base(yq("2024Q1"), line, "total", "direct_premiums", 2000.0));
            out.push(Record::base(yq("2024Q1"), line, "top-2", "direct_premiums", 1.0));
        }
        out
    }

    fn params(insurers: InsurerSelection) -> QueryParams {
        QueryParams {
            lines: strings(&["auto", "property"]),
            metrics: strings(&["direct_premiums"]),
            insurers,
            ..QueryParams::default()
        }
    }

    #[test]
    fn test_insurer_orders() {
        let recs = records();
        let metric = Some("direct_premiums");
        assert_eq!(
            ordered_insurers(&recs[..8], metric, &InsurerSelection::Total),
            strings(&["ins_b", "ins_c", "ins_a", "total"])
        );
        assert_eq!(
            ordered_insurers(&recs[..8], metric, &InsurerSelection::TopN(2)),
            strings(&["ins_b", "ins_c", "top-2"])
        );
        assert_eq!(
            ordered_insurers(&recs[..8], metric, &InsurerSelection::All),
            strings(&["ins_b", "ins_c", "ins_a"])
        );
        assert_eq!(
            ordered_insurers(
                &recs[..8],
                metric,
                &InsurerSelection::Specific(strings(&["ins_x", "ins_a", "ins_b"]))
            ),
            strings(&["ins_b", "ins_a", "ins_x"])
        );
    }

    #[test]
    fn test_split_by_line() {
        let frame = Frame::from_records(&records()).unwrap();
        let params = params(InsurerSelection::Total);
        let layout = Layout::for_params(&params);
        let segments = DimensionalSplitter::new(5).split(&frame, &params, &layout).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].split_values, strings(&["auto"]));
        assert_eq!(segments[1].split_values, strings(&["property"]));
        assert_eq!(segments[0].orders.get(Dimension::Line), &strings(&["auto"])[..]);
        assert!(segments[0].records.iter().all(|r| r.line == "auto"));
        assert!(segments[0].records.iter().all(|r| r.insurer != "top-2"));
        assert_eq!(
            segments[0].orders.get(Dimension::Insurer),
            &strings(&["ins_c", "ins_b", "ins_a", "total"])[..]
        );
        assert_eq!(segments[0].records[0].insurer, "ins_c");
        assert_eq!(segments[0].records[0].year_quarter, yq("2024Q1"));
    }

    #[test]
    fn test_top_n_order_is_per_segment() {
        let frame = Frame::from_records(&records()).unwrap();
        let params = params(InsurerSelection::TopN(2));
        let layout = Layout::for_params(&params);
        let segments = DimensionalSplitter::new(5).split(&frame, &params, &layout).unwrap();
        assert_eq!(
            segments[0].orders.get(Dimension::Insurer),
            &strings(&["ins_b", "ins_c", "top-2"])[..]
        );
        assert_eq!(
            segments[1].orders.get(Dimension::Insurer),
            &strings(&["ins_c", "ins_a", "top-2"])[..]
        );
        assert!(segments[1].records.iter().all(|r| r.insurer != "ins_b"));
    }

    #[test]
    fn test_segment_cap() {
        let frame = Frame::from_records(&records()).unwrap();
        let params = params(InsurerSelection::Total);
        let layout = Layout::for_params(&params);
        let segments = DimensionalSplitter::new(1).split(&frame, &params, &layout).unwrap();
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_absent_combinations_are_skipped() {
        let frame = Frame::from_records(&records()[..8]).unwrap();
        let params = params(InsurerSelection::Total);
        let layout = Layout::for_params(&params);
        let segments = DimensionalSplitter::new(5).split(&frame, &params, &layout).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].split_values, strings(&["auto"]));
    }
}
