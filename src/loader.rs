//! File loaders: delimited text into typed tables, JSON into record lists.

use anyhow::{Context, Result};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use crate::normalize::types::Value;

pub type JsonRecord = serde_json::Map<String, JsonValue>;

/// A CSV file parsed into rows of typed cells.
///
/// `columns` preserves header order, which the blood-pressure normalizer
/// needs for its "first column that looks like a timestamp" fallback.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<BTreeMap<String, Value>>,
}

impl Table {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

/// Raw per-category input, matching the source file's format.
#[derive(Debug, Clone)]
pub enum RawData {
    Table(Table),
    Records(Vec<JsonRecord>),
}

/// How a category's file should be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
}

/// Loads one category file according to its registered format.
pub fn load_file(path: &Path, format: FileFormat) -> Result<RawData> {
    match format {
        FileFormat::Csv => Ok(RawData::Table(load_csv(path)?)),
        FileFormat::Json => Ok(RawData::Records(load_json_records(path)?)),
    }
}

/// Parses a CSV file into a [`Table`], typing each cell on the way in:
/// cells that parse as numbers become [`Value::Number`], everything else
/// stays text, and empty cells are left out of the row entirely.
pub fn load_csv(path: &Path) -> Result<Table> {
    let file =
        File::open(path).with_context(|| format!("opening csv file {}", path.display()))?;
    let mut reader = csv::Reader::from_reader(file);

    let columns: Vec<String> = reader
        .headers()
        .with_context(|| format!("reading csv headers from {}", path.display()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.with_context(|| format!("reading csv row from {}", path.display()))?;
        let mut row = BTreeMap::new();
        for (column, cell) in columns.iter().zip(record.iter()) {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            let value = match cell.parse::<f64>() {
                Ok(number) => Value::Number(number),
                Err(_) => Value::Text(cell.to_string()),
            };
            row.insert(column.clone(), value);
        }
        rows.push(row);
    }

    Ok(Table { columns, rows })
}

/// Parses a JSON file whose top level is an array of objects.
pub fn load_json_records(path: &Path) -> Result<Vec<JsonRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading json file {}", path.display()))?;
    let parsed: Vec<JsonValue> = serde_json::from_str(&content)
        .with_context(|| format!("parsing json array from {}", path.display()))?;

    Ok(parsed
        .into_iter()
        .filter_map(|entry| match entry {
            JsonValue::Object(map) => Some(map),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = env::temp_dir().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_csv_types_cells() {
        let path = temp_file(
            "health_hub_loader_typed.csv",
            "logDate,steps,note\n1700000000,4200,walked home\n1700086400,,\n",
        );

        let table = load_csv(&path).unwrap();
        assert_eq!(table.columns, vec!["logDate", "steps", "note"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0]["steps"], Value::Number(4200.0));
        assert_eq!(table.rows[0]["note"], Value::Text("walked home".into()));
        // empty cells are missing, not empty strings
        assert!(!table.rows[1].contains_key("steps"));
        assert!(!table.rows[1].contains_key("note"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_json_records_keeps_objects_only() {
        let path = temp_file(
            "health_hub_loader_records.json",
            r#"[{"logDate": 1700000000, "spo2Value": 97}, 42, {"logDate": 1700086400}]"#,
        );

        let records = load_json_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["spo2Value"], serde_json::json!(97));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_json_rejects_non_array() {
        let path = temp_file("health_hub_loader_bad.json", r#"{"not": "an array"}"#);
        assert!(load_json_records(&path).is_err());
        fs::remove_file(&path).unwrap();
    }
}
