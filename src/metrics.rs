//! Summary statistics and trailing rolling averages over normalized series.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::normalize::types::NormalizedSeries;

/// Per-column summary statistics.
///
/// `std` is the sample standard deviation (n-1 denominator) and is `None`
/// for fewer than two values, which serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub median: f64,
    pub std: Option<f64>,
    pub count: usize,
    pub min: f64,
    pub max: f64,
}

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median with midpoint averaging for even counts. Returns 0.0 for empty input.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation given a pre-computed mean.
/// Undefined for fewer than two values.
pub fn sample_stddev(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Summary statistics for each named column present in the series.
///
/// Columns the series does not carry (or that hold no numeric values) are
/// silently omitted, never zero-filled.
pub fn compute_metrics(
    series: &NormalizedSeries,
    columns: &[&str],
) -> BTreeMap<String, MetricSummary> {
    let mut metrics = BTreeMap::new();
    for column in columns {
        let values: Vec<f64> = series
            .numeric_column(column)
            .into_iter()
            .flatten()
            .collect();
        if values.is_empty() {
            continue;
        }

        let col_mean = mean(&values);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        metrics.insert(
            column.to_string(),
            MetricSummary {
                mean: col_mean,
                median: median(&values),
                std: sample_stddev(&values, col_mean),
                count: values.len(),
                min,
                max,
            },
        );
    }
    metrics
}

/// Appends trailing rolling-average columns to a copy of the series.
///
/// For each column and window size, row i gains `{column}_ma{window}` = mean
/// of that column over rows [max(0, i-window+1) ..= i]. Minimum period is 1,
/// so the first row's rolling value equals its own value. The series is
/// re-sorted by timestamp defensively before windows are taken.
pub fn compute_rolling_average(
    series: &NormalizedSeries,
    columns: &[&str],
    windows: &[usize],
) -> NormalizedSeries {
    let mut result = series.clone();
    result.sort_by_date();

    for column in columns {
        let values = result.numeric_column(column);
        for &window in windows {
            if window == 0 {
                continue;
            }
            let name = format!("{column}_ma{window}");
            for i in 0..result.rows.len() {
                let start = i.saturating_sub(window - 1);
                let tail: Vec<f64> = values[start..=i].iter().flatten().copied().collect();
                if tail.is_empty() {
                    continue;
                }
                result.rows[i].set_number(&name, mean(&tail));
            }
        }
    }
    result
}
