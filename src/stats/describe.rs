//! Descriptive Statistics Module
//! Per-group summaries shown beneath distribution charts.

use crate::stats::GroupedValues;
use rayon::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Descriptive statistics for a single group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group_name: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub q3: f64,
    pub max: f64,
}

impl Default for GroupSummary {
    fn default() -> Self {
        Self {
            group_name: String::new(),
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q1: f64::NAN,
            q3: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// Compute descriptive statistics for an array of values.
pub fn describe(values: &[f64]) -> GroupSummary {
    let n = values.len();
    if n == 0 {
        return GroupSummary::default();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mean = values.iter().sum::<f64>() / n as f64;
    // Sample standard deviation; a single value has no spread.
    let std = if n > 1 { values.iter().std_dev() } else { 0.0 };

    GroupSummary {
        group_name: String::new(),
        count: n,
        mean,
        median: percentile(&sorted, 50.0),
        std,
        min: sorted[0],
        q1: percentile(&sorted, 25.0),
        q3: percentile(&sorted, 75.0),
        max: sorted[n - 1],
    }
}

/// Summaries for every group, in group order.
pub fn describe_groups(grouped: &GroupedValues) -> Vec<GroupSummary> {
    grouped
        .groups
        .par_iter()
        .map(|g| GroupSummary {
            group_name: g.category.clone(),
            ..describe(&g.values)
        })
        .collect()
}

/// Calculate percentile using linear interpolation (NumPy compatible).
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    let n = sorted_values.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return sorted_values[0];
    }

    let rank = (p / 100.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = (rank.ceil() as usize).min(n - 1);
    let frac = rank - lower as f64;

    if lower == upper {
        sorted_values[lower]
    } else {
        sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::GroupValues;

    #[test]
    fn empty_values_are_nan() {
        let summary = describe(&[]);
        assert_eq!(summary.count, 0);
        assert!(summary.mean.is_nan());
        assert!(summary.q1.is_nan());
    }

    #[test]
    fn quartiles_interpolate() {
        let summary = describe(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(summary.count, 4);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 4.0);
        assert!((summary.median - 2.5).abs() < 1e-12);
        assert!((summary.q1 - 1.75).abs() < 1e-12);
        assert!((summary.q3 - 3.25).abs() < 1e-12);
        assert!((summary.mean - 2.5).abs() < 1e-12);
        assert!((summary.std - 1.2909944487358056).abs() < 1e-9);
    }

    #[test]
    fn single_value_has_zero_spread() {
        let summary = describe(&[7.0]);
        assert_eq!(summary.std, 0.0);
        assert_eq!(summary.median, 7.0);
    }

    #[test]
    fn groups_keep_their_names() {
        let grouped = GroupedValues {
            group_column: "sex".to_string(),
            value_column: "final_grade".to_string(),
            groups: vec![
                GroupValues {
                    category: "F".to_string(),
                    values: vec![10.0, 12.0],
                },
                GroupValues {
                    category: "M".to_string(),
                    values: vec![],
                },
            ],
            excluded: 0,
        };
        let summaries = describe_groups(&grouped);
        assert_eq!(summaries[0].group_name, "F");
        assert_eq!(summaries[0].mean, 11.0);
        assert_eq!(summaries[1].group_name, "M");
        assert_eq!(summaries[1].count, 0);
    }
}
