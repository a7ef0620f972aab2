//! Normalizers for the physio categories: blood pressure, heart rate
//! sessions, sleep stages, SpO2, steps, and skin temperature.

use crate::loader::{JsonRecord, RawData, Table};
use crate::normalize::timestamp;
use crate::normalize::types::{NormalizedSeries, Row};
use crate::normalize::NormalizeError;

const SLEEP_STAGES: [&str; 4] = ["lightSleep", "deepSleep", "remSleep", "almostAwake"];

/// Blood pressure CSV: timestamp from `logDate`, else `createdTime`, else the
/// first column whose name mentions time or date. Keeps systolic, diastolic,
/// and heartRate where present.
pub fn normalize_blood_pressure(raw: &RawData) -> Result<NormalizedSeries, NormalizeError> {
    let table = expect_table(raw)?;
    let ts_column = pick_timestamp_column(table)?;

    let mut series = NormalizedSeries::default();
    for source in &table.rows {
        let Some(date) = source.get(&ts_column).and_then(timestamp::decode_value) else {
            continue;
        };
        let mut row = Row::at(date);
        for field in ["systolic", "diastolic", "heartRate"] {
            if let Some(value) = source.get(field).and_then(|v| v.as_f64()) {
                row.set_number(field, value);
            }
        }
        series.push(row);
    }
    series.sort_by_date();
    Ok(series)
}

/// Heart rate sessions JSON: one row per session, timestamped by the
/// session's `group` field, with the session average/min/max rates.
pub fn normalize_heart_rate(raw: &RawData) -> Result<NormalizedSeries, NormalizeError> {
    let records = expect_records(raw)?;

    let mut series = NormalizedSeries::default();
    for session in records {
        let Some(date) = session.get("group").and_then(timestamp::decode_json) else {
            continue;
        };
        let mut row = Row::at(date);
        set_from_json(&mut row, session, "averageSessionHeartRate", "averageHeartRate");
        set_from_json(&mut row, session, "maxRate", "maxHeartRate");
        set_from_json(&mut row, session, "minRate", "minHeartRate");
        series.push(row);
    }
    series.sort_by_date();
    Ok(series)
}

/// Sleep CSV: keeps the four stage durations and derives `totalSleep` as
/// their sum when all four are present.
pub fn normalize_sleep(raw: &RawData) -> Result<NormalizedSeries, NormalizeError> {
    let table = expect_table(raw)?;
    require_column(table, "logDate")?;

    let mut series = NormalizedSeries::default();
    for source in &table.rows {
        let Some(date) = source.get("logDate").and_then(timestamp::decode_value) else {
            continue;
        };
        let mut row = Row::at(date);
        let mut total = 0.0;
        let mut stages_present = 0;
        for stage in SLEEP_STAGES {
            if let Some(value) = source.get(stage).and_then(|v| v.as_f64()) {
                row.set_number(stage, value);
                total += value;
                stages_present += 1;
            }
        }
        if stages_present == SLEEP_STAGES.len() {
            row.set_number("totalSleep", total);
        }
        series.push(row);
    }
    series.sort_by_date();
    Ok(series)
}

/// SpO2 JSON: one row per record, `spo2Value` renamed to `spo2`.
pub fn normalize_spo2(raw: &RawData) -> Result<NormalizedSeries, NormalizeError> {
    single_value_records(raw, "spo2Value", "spo2")
}

/// Temperature JSON: one row per record, single `temperature` value.
pub fn normalize_temperature(raw: &RawData) -> Result<NormalizedSeries, NormalizeError> {
    single_value_records(raw, "temperature", "temperature")
}

/// Steps CSV: timestamp from `logDate`, single `steps` value.
pub fn normalize_steps(raw: &RawData) -> Result<NormalizedSeries, NormalizeError> {
    let table = expect_table(raw)?;
    require_column(table, "logDate")?;

    let mut series = NormalizedSeries::default();
    for source in &table.rows {
        let Some(date) = source.get("logDate").and_then(timestamp::decode_value) else {
            continue;
        };
        let mut row = Row::at(date);
        if let Some(steps) = source.get("steps").and_then(|v| v.as_f64()) {
            row.set_number("steps", steps);
        }
        series.push(row);
    }
    series.sort_by_date();
    Ok(series)
}

fn single_value_records(
    raw: &RawData,
    source_field: &str,
    column: &str,
) -> Result<NormalizedSeries, NormalizeError> {
    let records = expect_records(raw)?;

    let mut series = NormalizedSeries::default();
    for record in records {
        let Some(date) = record.get("logDate").and_then(timestamp::decode_json) else {
            continue;
        };
        let mut row = Row::at(date);
        set_from_json(&mut row, record, source_field, column);
        series.push(row);
    }
    series.sort_by_date();
    Ok(series)
}

fn set_from_json(row: &mut Row, record: &JsonRecord, source_field: &str, column: &str) {
    if let Some(value) = record.get(source_field).and_then(|v| v.as_f64()) {
        row.set_number(column, value);
    }
}

fn pick_timestamp_column(table: &Table) -> Result<String, NormalizeError> {
    for preferred in ["logDate", "createdTime"] {
        if table.has_column(preferred) {
            return Ok(preferred.to_string());
        }
    }
    table
        .columns
        .iter()
        .find(|c| {
            let lower = c.to_lowercase();
            lower.contains("time") || lower.contains("date")
        })
        .cloned()
        .ok_or(NormalizeError::MissingTimestamp)
}

fn require_column(table: &Table, name: &str) -> Result<(), NormalizeError> {
    if table.has_column(name) {
        Ok(())
    } else {
        Err(NormalizeError::MissingTimestamp)
    }
}

pub(crate) fn expect_table(raw: &RawData) -> Result<&Table, NormalizeError> {
    match raw {
        RawData::Table(table) => Ok(table),
        RawData::Records(_) => Err(NormalizeError::UnexpectedFormat("tabular")),
    }
}

pub(crate) fn expect_records(raw: &RawData) -> Result<&[JsonRecord], NormalizeError> {
    match raw {
        RawData::Records(records) => Ok(records),
        RawData::Table(_) => Err(NormalizeError::UnexpectedFormat("record-list")),
    }
}
