//! Period resolution.
//!
//! Maps `(end_quarter, period_type, num_periods)` onto the first quarter a
//! query needs, given the quarters the reporting form actually has.

use inslens_data::{PeriodType, YearQuarter};
use std::collections::BTreeSet;

/// First quarter needed to show `num_periods` periods of `period_type` ending
/// at `end`.
///
/// Falls back to the earliest available quarter when the requested history is
/// not available, leaving it to the period transform to decide which rows are
/// usable.
pub fn start_quarter(
    available: &[YearQuarter],
    end: YearQuarter,
    period_type: PeriodType,
    num_periods: usize,
) -> YearQuarter {
    let indices: BTreeSet<i32> = available.iter().map(YearQuarter::index).collect();
    let earliest = indices.first().copied().map_or(end, YearQuarter::from_index);
    let n = i32::try_from(num_periods).unwrap_or(i32::MAX / 8);
    let end_idx = end.index();
    let end_q = i32::from(end.quarter());
    let has = |year: i32, quarter: i32| indices.contains(&(year * 4 + quarter - 1));

    let resolved = match period_type {
        PeriodType::Qoq => {
            let target = end_idx - n;
            (target..=end_idx)
                .all(|i| indices.contains(&i))
                .then(|| YearQuarter::from_index(target))
        }
        PeriodType::Ytd => {
            let start_year = end.year() - n;
            (start_year..=end.year())
                .any(|year| (1..=end_q).all(|q| has(year, q)))
                .then(|| YearQuarter::from_index(start_year * 4))
        }
        PeriodType::YoyQ => {
            let same: Vec<i32> = indices
                .iter()
                .copied()
                .filter(|i| i.rem_euclid(4) == end_idx.rem_euclid(4))
                .collect();
            let take = same.len().min(num_periods + 1);
            (take > 0).then(|| YearQuarter::from_index(same[same.len() - take]))
        }
        PeriodType::YoyY | PeriodType::Mat => indices
            .iter()
            .rev()
            .copied()
            .filter(|i| *i <= end_idx - n * 4)
            .find(|i| {
                let year = YearQuarter::from_index(*i).year();
                (year..=end.year()).all(|y| has(y, end_q))
            })
            .map(YearQuarter::from_index),
        PeriodType::CumulativeSum => None,
    };

    resolved.unwrap_or(earliest)
}

/// First quarter to load for a resolved start.
///
/// Rolling-year periods need the three quarters before `start` so its own
/// four-quarter window is complete.
pub const fn load_start_quarter(start: YearQuarter, period_type: PeriodType) -> YearQuarter {
    if period_type.is_rolling() {
        start.offset(-3)
    } else {
        start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn yq(s: &str) -> YearQuarter {
        s.parse().unwrap()
    }

    fn range(from: &str, to: &str) -> Vec<YearQuarter> {
        (yq(from).index()..=yq(to).index())
            .map(YearQuarter::from_index)
            .collect()
    }

    #[rstest]
    #[case(PeriodType::Qoq, 2, "2024Q1")]
    #[case(PeriodType::Qoq, 1, "2024Q2")]
    #[case(PeriodType::Ytd, 1, "2023Q1")]
    #[case(PeriodType::YoyQ, 2, "2022Q3")]
    #[case(PeriodType::YoyY, 1, "2023Q3")]
    #[case(PeriodType::Mat, 2, "2022Q3")]
    #[case(PeriodType::CumulativeSum, 3, "2021Q1")]
    fn test_full_history(#[case] period: PeriodType, #[case] n: usize, #[case] expected: &str) {
        let available = range("2021Q1", "2024Q3");
        assert_eq!(start_quarter(&available, yq("2024Q3"), period, n), yq(expected));
    }

    #[test]
    fn test_qoq_gap_falls_back_to_earliest() {
        let mut available = range("2023Q1", "2024Q2");
        available.retain(|q| *q != yq("2023Q4"));
        assert_eq!(
            start_quarter(&available, yq("2024Q2"), PeriodType::Qoq, 3),
            yq("2023Q1")
        );
    }

    #[test]
    fn test_ytd_needs_one_complete_year_in_range() {
        // 2023 has only Q3 and Q4, 2024 has Q1 and Q2.
        let available = range("2023Q3", "2024Q2");
        assert_eq!(
            start_quarter(&available, yq("2024Q2"), PeriodType::Ytd, 1),
            yq("2023Q1")
        );

        // Neither year covers Q1..=Q2.
        let mut available = range("2023Q3", "2024Q2");
        available.retain(|q| *q != yq("2024Q1"));
        assert_eq!(
            start_quarter(&available, yq("2024Q2"), PeriodType::Ytd, 1),
            yq("2023Q3")
        );
    }

    #[test]
    fn test_yoy_q_with_short_history() {
        let available = range("2023Q1", "2024Q2");
        assert_eq!(
            start_quarter(&available, yq("2024Q2"), PeriodType::YoyQ, 5),
            yq("2023Q2")
        );
    }

    #[test]
    fn test_empty_available_returns_end() {
        assert_eq!(
            start_quarter(&[], yq("2024Q1"), PeriodType::Ytd, 1),
            yq("2024Q1")
        );
    }

    #[test]
    fn test_load_start_for_rolling() {
        assert_eq!(load_start_quarter(yq("2023Q4"), PeriodType::Mat), yq("2023Q1"));
        assert_eq!(load_start_quarter(yq("2023Q4"), PeriodType::Qoq), yq("2023Q4"));
    }
}
