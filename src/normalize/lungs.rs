//! Lung function normalizer: spirometry ratios, no time dimension.

use crate::loader::RawData;
use crate::normalize::types::{NormalizedSeries, Row};
use crate::normalize::vitals::expect_table;
use crate::normalize::NormalizeError;

/// Lung function CSV: keeps `FEV1` and `FEV1/FVC` under canonical short
/// names. Rows carry no timestamp; only metrics are exposed downstream.
pub fn normalize_lung_function(raw: &RawData) -> Result<NormalizedSeries, NormalizeError> {
    let table = expect_table(raw)?;
    for required in ["FEV1", "FEV1/FVC"] {
        if !table.has_column(required) {
            return Err(NormalizeError::MissingColumn(required.to_string()));
        }
    }

    let mut series = NormalizedSeries::default();
    for source in &table.rows {
        let mut row = Row::default();
        if let Some(fev1) = source.get("FEV1").and_then(|v| v.as_f64()) {
            row.set_number("fev1", fev1);
        }
        if let Some(ratio) = source.get("FEV1/FVC").and_then(|v| v.as_f64()) {
            row.set_number("fev1_fvc", ratio);
        }
        series.push(row);
    }
    Ok(series)
}
