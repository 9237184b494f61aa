//! Pivot then unpivot restores the segment records.

use inslens_data::{Dimension, Record, ValueType, YearQuarter};
use inslens_output::PivotProjector;
use inslens_pipeline::{DimensionOrders, Layout, Segment};
use proptest::prelude::*;
use std::collections::BTreeMap;

const VALUE_TYPES: [ValueType; 3] = [ValueType::Base, ValueType::MarketShare, ValueType::Rank];

fn segment(cells: &BTreeMap<(usize, i32, usize), (Option<f64>, bool)>) -> Segment {
    let records = cells
        .iter()
        .map(|(&(insurer, quarter, vt), &(value, labelled))| Record {
            year_quarter: YearQuarter::from_index(2020 * 4 + quarter),
            line: "auto".to_string(),
            insurer: format!("ins_{insurer}"),
            metric: "direct_premiums".to_string(),
            value_type: VALUE_TYPES[vt],
            value,
            label: labelled.then(|| "1 (+1)".to_string()),
        })
        .collect();
    Segment {
        records,
        split_cols: vec![Dimension::Line],
        split_values: vec!["auto".to_string()],
        orders: DimensionOrders::default(),
    }
}

fn layout() -> Layout {
    Layout {
        index: vec![Dimension::Insurer],
        pivot: vec![Dimension::Metric, Dimension::ValueType, Dimension::YearQuarter],
        split: vec![Dimension::Line],
    }
}

proptest! {
    #[test]
    fn pivot_round_trip(
        cells in prop::collection::btree_map(
            (0usize..6, 0i32..8, 0usize..3),
            (prop::option::of(-1e6f64..1e6), any::<bool>()),
            1..40,
        )
    ) {
        let segment = segment(&cells);
        let projector = PivotProjector::default();
        let table = projector.project(&segment, &layout());
        let restored = projector
            .unpivot(&table, &segment.split_cols, &segment.split_values)
            .unwrap();

        prop_assert_eq!(restored.len(), segment.records.len());
        for record in &restored {
            prop_assert!(segment.records.contains(record));
        }
    }
}
