//! Index, pivot and split roles of the dimensions.

use crate::QueryParams;
use inslens_data::Dimension;
use serde::{Deserialize, Serialize};

/// Resolved table layout.
///
/// `value_type` and `year_quarter` always close the pivot, in that order.
/// Selectable dimensions used neither as index nor as pivot are split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// Row dimensions
    pub index: Vec<Dimension>,
    /// Column dimensions, outermost first
    pub pivot: Vec<Dimension>,
    /// Segment dimensions
    pub split: Vec<Dimension>,
}

impl Layout {
    /// Resolve the user's choice of index and pivot dimensions.
    ///
    /// A top-N view ranks insurers against each other, so only the first
    /// index dimension stays on the rows; the others move to the front of
    /// the pivot.
    pub fn resolve(
        index_cols: &[Dimension],
        pivot_cols: &[Dimension],
        split_cols: &[Dimension],
        top_n: bool,
    ) -> Self {
        let selectable = |d: &&Dimension| Dimension::SELECTABLE.contains(*d);

        let mut index: Vec<Dimension> = Vec::new();
        for dim in index_cols.iter().filter(selectable) {
            if !index.contains(dim) {
                index.push(*dim);
            }
        }
        if index.is_empty() {
            index.push(Dimension::Insurer);
        }

        let mut pivot: Vec<Dimension> = Vec::new();
        if top_n && index.len() > 1 {
            pivot.extend(index.drain(1..));
        }
        for dim in pivot_cols.iter().filter(selectable) {
            if !index.contains(dim) && !pivot.contains(dim) {
                pivot.push(*dim);
            }
        }
        pivot.extend([Dimension::ValueType, Dimension::YearQuarter]);

        let mut split: Vec<Dimension> = Vec::new();
        for dim in split_cols.iter().chain(&Dimension::SELECTABLE) {
            if Dimension::SELECTABLE.contains(dim)
                && !index.contains(dim)
                && !pivot.contains(dim)
                && !split.contains(dim)
            {
                split.push(*dim);
            }
        }

        Self {
            index,
            pivot,
            split,
        }
    }

    /// Layout of a query.
    pub fn for_params(params: &QueryParams) -> Self {
        Self::resolve(
            &params.index_cols,
            &params.pivot_cols,
            &params.split_cols,
            params.insurers.is_top_n(),
        )
    }
}
