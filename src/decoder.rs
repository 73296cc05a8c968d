//! Raw log decoding.
//!
//! A log line carries one observation: `identifier category timestamp x y`.
//! Fields are separated by commas when the line contains one, otherwise by
//! whitespace. Blank lines and lines starting with `#` are skipped.

use std::io::BufRead;

use chrono::{DateTime, NaiveDateTime};

use crate::{PointRecord, Result, TrajectoryError};

/// How the timestamp column is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampFormat {
    /// Numeric values are epoch seconds, anything else is parsed as a date-time.
    #[default]
    Auto,
    /// Seconds since the Unix epoch, fractional part allowed.
    EpochSeconds,
    /// ISO-8601 date-time (`2024-05-01T08:00:00[.fff]`, or with a space separator).
    DateTime,
}

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Decode one line. Returns `Ok(None)` for blank and comment lines.
pub fn decode_line(
    line: &str,
    line_number: usize,
    format: TimestampFormat,
) -> Result<Option<PointRecord>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let fields: Vec<&str> = if line.contains(',') {
        line.split(',').map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    };
    let fail = |reason: String| TrajectoryError::Decode {
        line: line_number,
        reason,
    };

    let &[identifier, category, timestamp, x, y] = fields.as_slice() else {
        return Err(fail(format!("expected 5 fields, got {}", fields.len())));
    };
    if identifier.is_empty() {
        return Err(fail("empty identifier".to_string()));
    }
    let category: i64 = category
        .parse()
        .map_err(|_| fail(format!("invalid category '{category}'")))?;
    let timestamp = parse_timestamp(timestamp, format).map_err(fail)?;
    let x: f64 = x
        .parse()
        .map_err(|_| fail(format!("invalid x coordinate '{x}'")))?;
    let y: f64 = y
        .parse()
        .map_err(|_| fail(format!("invalid y coordinate '{y}'")))?;
    if !x.is_finite() || !y.is_finite() {
        return Err(fail("coordinates must be finite".to_string()));
    }

    Ok(Some(PointRecord::new(identifier, category, timestamp, x, y)))
}

/// Decode a whole log held in memory.
pub fn decode_str(text: &str, format: TimestampFormat) -> Result<Vec<PointRecord>> {
    let mut records = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if let Some(record) = decode_line(line, index + 1, format)? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Decode a log from any buffered reader.
pub fn decode_reader<R: BufRead>(reader: R, format: TimestampFormat) -> Result<Vec<PointRecord>> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        if let Some(record) = decode_line(&line?, index + 1, format)? {
            records.push(record);
        }
    }
    Ok(records)
}

fn parse_timestamp(
    text: &str,
    format: TimestampFormat,
) -> std::result::Result<NaiveDateTime, String> {
    match format {
        TimestampFormat::EpochSeconds => parse_epoch(text),
        TimestampFormat::DateTime => parse_datetime(text),
        TimestampFormat::Auto => match text.parse::<f64>() {
            Ok(_) => parse_epoch(text),
            Err(_) => parse_datetime(text),
        },
    }
}

fn parse_epoch(text: &str) -> std::result::Result<NaiveDateTime, String> {
    let seconds: f64 = text
        .parse()
        .map_err(|_| format!("invalid epoch timestamp '{text}'"))?;
    if !seconds.is_finite() {
        return Err(format!("invalid epoch timestamp '{text}'"));
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| format!("epoch timestamp '{text}' out of range"))
}

fn parse_datetime(text: &str) -> std::result::Result<NaiveDateTime, String> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .ok_or_else(|| format!("invalid date-time '{text}'"))
}
