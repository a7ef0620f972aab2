//! Unix timestamp decoding shared by the category normalizers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::normalize::types::Value;

/// Epoch values above this are treated as milliseconds, otherwise seconds.
///
/// This is a magnitude heuristic, not a format marker: 10_000_000_000 seconds
/// is ~year 2286, so any plausible second-resolution timestamp falls below it
/// while any millisecond-resolution one lands above. Changing the threshold
/// silently shifts historical timestamps by 1000x, so it must stay as-is.
pub const MILLIS_THRESHOLD: i64 = 10_000_000_000;

/// Decodes a raw Unix epoch value using the seconds/milliseconds heuristic.
pub fn from_epoch(raw: i64) -> Option<DateTime<Utc>> {
    if raw > MILLIS_THRESHOLD {
        Utc.timestamp_millis_opt(raw).single()
    } else {
        Utc.timestamp_opt(raw, 0).single()
    }
}

/// Decodes an epoch timestamp out of a table cell.
pub fn decode_value(value: &Value) -> Option<DateTime<Utc>> {
    from_epoch(value.as_f64()? as i64)
}

/// Decodes an epoch timestamp out of a JSON field.
pub fn decode_json(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    let raw = value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))?;
    from_epoch(raw)
}

/// Best-effort decode for fields that may be an epoch or a textual date.
///
/// Numeric cells go through the epoch heuristic; text cells are tried against
/// the date formats seen in meal logs.
pub fn decode_flexible(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(_) => decode_value(value),
        Value::Text(text) => parse_text_date(text),
    }
}

fn parse_text_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(day.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_and_millis_decode_to_same_instant() {
        let seconds = from_epoch(1_700_000_000).unwrap();
        let millis = from_epoch(1_700_000_000_000).unwrap();
        assert_eq!(seconds, millis);
        assert_eq!(seconds.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_threshold_boundary_is_seconds() {
        let at_threshold = from_epoch(MILLIS_THRESHOLD).unwrap();
        assert_eq!(at_threshold.timestamp(), MILLIS_THRESHOLD);
    }

    #[test]
    fn test_flexible_parses_common_text_formats() {
        for text in [
            "2024-03-05 08:30:00",
            "2024-03-05T08:30:00",
            "2024-03-05T08:30:00Z",
        ] {
            let parsed = decode_flexible(&Value::Text(text.to_string())).unwrap();
            assert_eq!(parsed.timestamp(), 1_709_627_400);
        }
    }

    #[test]
    fn test_flexible_date_only_is_midnight() {
        let parsed = decode_flexible(&Value::Text("2024-03-05".to_string())).unwrap();
        assert_eq!(parsed.format("%H:%M:%S").to_string(), "00:00:00");
    }

    #[test]
    fn test_flexible_rejects_garbage() {
        assert!(decode_flexible(&Value::Text("yesterday".to_string())).is_none());
    }
}
