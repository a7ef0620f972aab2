//! Anthropometry normalizer: embedded JSON per row, triple-reading
//! averaging, and BMI derivation.

use serde_json::Value as JsonValue;

use crate::loader::RawData;
use crate::normalize::timestamp;
use crate::normalize::types::{NormalizedSeries, Row, Value};
use crate::normalize::vitals::expect_table;
use crate::normalize::NormalizeError;

/// Source field names paired with their canonical output columns.
const TRIPLE_FIELDS: [(&str, &str); 9] = [
    ("height", "height_cm"),
    ("weight", "weight_kg"),
    ("midArmCircumference", "mid_arm_circumference_cm"),
    ("waistCircumference", "waist_circumference_cm"),
    ("hipCircumference", "hip_circumference_cm"),
    ("skinFoldBiceps", "skinfold_biceps_mm"),
    ("skinFoldSubscapular", "skinfold_subscapular_mm"),
    ("gripStrengthLeft", "grip_strength_left_kg"),
    ("gripStrengthRight", "grip_strength_right_kg"),
];

/// Anthropometry CSV: each row's `data` cell is a JSON object of repeated
/// measurements. Rows with undecodable JSON or no `createdAt` are skipped;
/// decode failures are per-row, never fatal to the file.
pub fn normalize_anthro(raw: &RawData) -> Result<NormalizedSeries, NormalizeError> {
    let table = expect_table(raw)?;

    let mut series = NormalizedSeries::default();
    for source in &table.rows {
        let Some(embedded) = source.get("data").and_then(Value::as_str) else {
            continue;
        };
        let Ok(JsonValue::Object(measurements)) = serde_json::from_str::<JsonValue>(embedded)
        else {
            continue;
        };
        let Some(date) = source.get("createdAt").and_then(timestamp::decode_value) else {
            continue;
        };

        let mut row = Row::at(date);
        for (field, column) in TRIPLE_FIELDS {
            if let Some(value) = measurements.get(field).and_then(average_readings) {
                row.set_number(column, value);
            }
        }
        if let Some(text) = source.get("filledBy").and_then(Value::as_str) {
            row.set_text("filledBy", text);
        }
        if let Some(bmi) = derive_bmi(row.number("height_cm"), row.number("weight_kg")) {
            row.set_number("bmi", bmi);
        }
        series.push(row);
    }
    series.sort_by_date();
    Ok(series)
}

/// Mean of the non-null readings in a {first, second, third} triple; a bare
/// number passes through. All-null triples yield no value, never zero.
fn average_readings(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Object(triple) => {
            let readings: Vec<f64> = ["first", "second", "third"]
                .iter()
                .filter_map(|key| triple.get(*key).and_then(JsonValue::as_f64))
                .collect();
            if readings.is_empty() {
                None
            } else {
                Some(readings.iter().sum::<f64>() / readings.len() as f64)
            }
        }
        _ => value.as_f64(),
    }
}

/// BMI = weight(kg) / (height(cm)/100)^2, only when height > 0 and weight
/// is present.
fn derive_bmi(height_cm: Option<f64>, weight_kg: Option<f64>) -> Option<f64> {
    let (height_cm, weight_kg) = (height_cm?, weight_kg?);
    if height_cm <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    Some(weight_kg / (height_m * height_m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Table;
    use std::collections::BTreeMap;

    fn anthro_table(rows: Vec<(&str, f64)>) -> RawData {
        RawData::Table(Table {
            columns: vec!["createdAt".into(), "filledBy".into(), "data".into()],
            rows: rows
                .into_iter()
                .map(|(data, created_at)| {
                    BTreeMap::from([
                        ("createdAt".to_string(), Value::Number(created_at)),
                        ("filledBy".to_string(), Value::Text("nurse".into())),
                        ("data".to_string(), Value::Text(data.to_string())),
                    ])
                })
                .collect(),
        })
    }

    #[test]
    fn test_triple_averaging_skips_nulls() {
        let raw = anthro_table(vec![(
            r#"{"waistCircumference": {"first": 10, "second": null, "third": 12}}"#,
            1_700_000_000_000.0,
        )]);
        let series = normalize_anthro(&raw).unwrap();
        assert_eq!(series.rows[0].number("waist_circumference_cm"), Some(11.0));
    }

    #[test]
    fn test_all_null_triple_yields_no_value() {
        let raw = anthro_table(vec![(
            r#"{"hipCircumference": {"first": null, "second": null, "third": null}}"#,
            1_700_000_000_000.0,
        )]);
        let series = normalize_anthro(&raw).unwrap();
        assert_eq!(series.rows[0].number("hip_circumference_cm"), None);
    }

    #[test]
    fn test_bmi_derivation() {
        let raw = anthro_table(vec![(
            r#"{"height": {"first": 170, "second": 170, "third": 170},
                "weight": {"first": 70, "second": 70, "third": 70}}"#,
            1_700_000_000_000.0,
        )]);
        let series = normalize_anthro(&raw).unwrap();
        let bmi = series.rows[0].number("bmi").unwrap();
        assert!((bmi - 24.221).abs() < 0.01);
    }

    #[test]
    fn test_bmi_absent_for_zero_height() {
        let raw = anthro_table(vec![(
            r#"{"height": {"first": 0, "second": 0, "third": 0},
                "weight": {"first": 70, "second": null, "third": null}}"#,
            1_700_000_000_000.0,
        )]);
        let series = normalize_anthro(&raw).unwrap();
        assert_eq!(series.rows[0].number("bmi"), None);
    }

    #[test]
    fn test_bad_embedded_json_skips_row_only() {
        let raw = anthro_table(vec![
            ("{not json", 1_700_000_000_000.0),
            (r#"{"weight": {"first": 70, "second": 71, "third": 72}}"#, 1_700_086_400_000.0),
        ]);
        let series = normalize_anthro(&raw).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.rows[0].number("weight_kg"), Some(71.0));
    }

    #[test]
    fn test_keeps_filled_by_and_millisecond_created_at() {
        let raw = anthro_table(vec![(r#"{}"#, 1_700_000_000_000.0)]);
        let series = normalize_anthro(&raw).unwrap();
        let row = &series.rows[0];
        assert_eq!(row.values["filledBy"], Value::Text("nurse".into()));
        assert_eq!(row.date.unwrap().timestamp(), 1_700_000_000);
    }
}
