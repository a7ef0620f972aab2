//! Canonical row/series shapes shared by all category normalizers.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// A single typed cell: either numeric or free text.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Number(_) => None,
            Value::Text(s) => Some(s.as_str()),
        }
    }
}

/// One normalized observation: an optional timestamp plus named values.
///
/// Lung-function rows carry no timestamp; every other category fills it in.
/// Missing measurements are simply absent keys, never zero-filled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub date: Option<DateTime<Utc>>,
    pub values: BTreeMap<String, Value>,
}

impl Row {
    pub fn at(date: DateTime<Utc>) -> Self {
        Row {
            date: Some(date),
            values: BTreeMap::new(),
        }
    }

    pub fn set_number(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), Value::Number(value));
    }

    pub fn set_text(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), Value::Text(value.into()));
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(Value::as_f64)
    }
}

// Rows serialize flat: {"date": "...", "systolic": 120.0, ...}. The date is
// RFC 3339 so artifacts are unambiguous across consumers.
impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.values.len() + usize::from(self.date.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(date) = &self.date {
            map.serialize_entry("date", &date.to_rfc3339_opts(SecondsFormat::Secs, true))?;
        }
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// An ordered sequence of normalized rows for one category.
///
/// Invariant after normalization: rows are sorted ascending by timestamp.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct NormalizedSeries {
    pub rows: Vec<Row>,
}

impl NormalizedSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Stable ascending sort by timestamp. Rows without one sort first.
    pub fn sort_by_date(&mut self) {
        self.rows.sort_by_key(|r| r.date);
    }

    /// Per-row numeric values for `column`, `None` where the row lacks it.
    pub fn numeric_column(&self, column: &str) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.number(column)).collect()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.rows.iter().any(|r| r.values.contains_key(column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_row_serializes_flat_with_rfc3339_date() {
        let mut row = Row::at(Utc.timestamp_opt(1_700_000_000, 0).unwrap());
        row.set_number("steps", 4200.0);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["date"], "2023-11-14T22:13:20Z");
        assert_eq!(json["steps"], 4200.0);
    }

    #[test]
    fn test_sort_by_date_is_ascending() {
        let mut series = NormalizedSeries::default();
        for ts in [3, 1, 2] {
            series.push(Row::at(Utc.timestamp_opt(ts, 0).unwrap()));
        }
        series.sort_by_date();
        let secs: Vec<i64> = series
            .rows
            .iter()
            .map(|r| r.date.unwrap().timestamp())
            .collect();
        assert_eq!(secs, vec![1, 2, 3]);
    }

    #[test]
    fn test_numeric_column_skips_text_and_missing() {
        let mut series = NormalizedSeries::default();
        let mut a = Row::at(Utc.timestamp_opt(1, 0).unwrap());
        a.set_number("spo2", 97.0);
        let mut b = Row::at(Utc.timestamp_opt(2, 0).unwrap());
        b.set_text("spo2", "n/a");
        let c = Row::at(Utc.timestamp_opt(3, 0).unwrap());
        series.push(a);
        series.push(b);
        series.push(c);

        assert_eq!(series.numeric_column("spo2"), vec![Some(97.0), None, None]);
        assert!(series.has_column("spo2"));
        assert!(!series.has_column("pulse"));
    }
}
