//! Meals normalizer and the per-day dish grouping.

use std::collections::BTreeMap;

use crate::loader::RawData;
use crate::normalize::timestamp;
use crate::normalize::types::{NormalizedSeries, Row, Value};
use crate::normalize::vitals::expect_table;
use crate::normalize::NormalizeError;

/// Meals CSV: timestamp from `time` (epoch when numeric, otherwise a
/// best-effort date parse), keeps the free-text `dish` field.
pub fn normalize_meals(raw: &RawData) -> Result<NormalizedSeries, NormalizeError> {
    let table = expect_table(raw)?;
    if !table.has_column("time") {
        return Err(NormalizeError::MissingTimestamp);
    }

    let mut series = NormalizedSeries::default();
    for source in &table.rows {
        let Some(date) = source.get("time").and_then(timestamp::decode_flexible) else {
            continue;
        };
        let mut row = Row::at(date);
        if let Some(dish) = source.get("dish") {
            let text = match dish {
                Value::Text(s) => s.clone(),
                Value::Number(n) => n.to_string(),
            };
            row.set_text("dish", text);
        }
        series.push(row);
    }
    series.sort_by_date();
    Ok(series)
}

/// Groups a normalized meals series into `YYYY-MM-DD` → dishes in
/// chronological order. Assumes the series is already date-sorted.
pub fn group_by_date(series: &NormalizedSeries) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for row in &series.rows {
        let (Some(date), Some(dish)) = (row.date, row.values.get("dish")) else {
            continue;
        };
        let Some(dish) = dish.as_str() else {
            continue;
        };
        grouped
            .entry(date.format("%Y-%m-%d").to_string())
            .or_default()
            .push(dish.to_string());
    }
    grouped
}
