//! Cell value rendering for typed target properties

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::api::PropertyType;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Render a raw cell value into the string form the target property expects.
///
/// Temporal values go through a generic parse first and then fall back to
/// spreadsheet serial date numbers; a value that is neither is an error.
/// Decimals are re-rendered without scientific notation, falling back to
/// the raw string. Every other type passes through unchanged, as does an
/// empty input regardless of type.
pub fn render_value(property_type: PropertyType, raw: &str) -> Result<String, String> {
    if raw.is_empty() {
        return Ok(String::new());
    }

    match property_type {
        PropertyType::Date => Ok(parse_temporal(raw)?.format(DATE_FORMAT).to_string()),
        PropertyType::DateTime => Ok(parse_temporal(raw)?.format(DATETIME_FORMAT).to_string()),
        PropertyType::Time => Ok(parse_temporal(raw)?.format(TIME_FORMAT).to_string()),
        PropertyType::Decimal => Ok(render_decimal(raw)),
        _ => Ok(raw.to_string()),
    }
}

fn parse_temporal(raw: &str) -> Result<NaiveDateTime, String> {
    let value = raw.trim();

    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(datetime);
        }
    }

    if let Ok(datetime) = chrono::DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.naive_local());
    }

    for format in [DATE_FORMAT, "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(date.and_time(NaiveTime::MIN));
        }
    }

    for format in [TIME_FORMAT, "%H:%M"] {
        if let Ok(time) = NaiveTime::parse_from_str(value, format) {
            if let Some(epoch) = serial_epoch() {
                return Ok(NaiveDateTime::new(epoch.date(), time));
            }
        }
    }

    // Not a recognizable date string; spreadsheet cells frequently hold
    // the serial number instead.
    value
        .parse::<f64>()
        .ok()
        .and_then(from_serial_number)
        .ok_or_else(|| {
            format!(
                "'{}' is not a date, time or spreadsheet serial number",
                raw
            )
        })
}

/// Serial date numbers count days since 1899-12-30, fractions of a day
/// being the time of day.
fn from_serial_number(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let seconds = (serial * 86_400.0).round() as i64;
    serial_epoch()?.checked_add_signed(Duration::try_seconds(seconds)?)
}

fn serial_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)
}

fn render_decimal(raw: &str) -> String {
    match raw.trim().parse::<f64>() {
        // Display for f64 is plain decimal, never scientific
        Ok(value) => value.to_string(),
        Err(_) => raw.to_string(),
    }
}
