use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde_json::Value;
use std::path::Path;

use crate::core::domain::{NightClass, ObservingWindow};
use crate::error::SchedulerError;
use crate::time::{parse_utc, ModifiedJulianDate};

/// Candidate keys that may contain the list of windows in a JSON payload
const WINDOW_KEYS: &[&str] = &[
    "windows",
    "nights",
    "observing_windows",
    "observingWindows",
    "periods",
];

/// Candidate keys for start timestamps inside each window
const START_KEYS: &[&str] = &["start", "start_time", "startTime", "begin", "start_utc", "startUtc"];

/// Candidate keys for end timestamps inside each window
const END_KEYS: &[&str] = &[
    "end",
    "stop",
    "end_time",
    "endTime",
    "stop_time",
    "stopTime",
    "end_utc",
    "endUtc",
];

/// Candidate keys for the night classification
const CLASS_KEYS: &[&str] = &["classification", "class", "mode", "half", "type"];

/// Parse observing windows from a CSV file with `start`, `end` and an
/// optional `classification` column.
pub fn parse_windows_csv(csv_path: &Path) -> Result<Vec<ObservingWindow>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(csv_path.into()))?
        .finish()
        .with_context(|| format!("Failed to parse windows CSV {}", csv_path.display()))?;

    dataframe_to_windows(&df)
}

fn find_column(df: &DataFrame, candidates: &[&str]) -> Option<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.as_str())
        .find(|name| {
            candidates
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(name.trim()))
        })
        .map(|name| name.to_string())
}

fn text_column(df: &DataFrame, name: &str) -> Result<StringChunked> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column.str()?.clone())
}

/// Convert a windows DataFrame to validated windows.
pub fn dataframe_to_windows(df: &DataFrame) -> Result<Vec<ObservingWindow>> {
    let start_name = find_column(df, START_KEYS)
        .ok_or_else(|| SchedulerError::validation("windows table has no start column"))?;
    let end_name = find_column(df, END_KEYS)
        .ok_or_else(|| SchedulerError::validation("windows table has no end column"))?;

    let starts = text_column(df, &start_name)?;
    let ends = text_column(df, &end_name)?;
    let classes = find_column(df, CLASS_KEYS)
        .map(|name| text_column(df, &name))
        .transpose()?;

    let mut windows = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let start = starts
            .get(row)
            .ok_or_else(|| SchedulerError::validation(format!("missing start at row {}", row)))?;
        let end = ends
            .get(row)
            .ok_or_else(|| SchedulerError::validation(format!("missing end at row {}", row)))?;
        let classification = match classes.as_ref().and_then(|column| column.get(row)) {
            Some(text) => text.parse()?,
            None => NightClass::Full,
        };

        let window = ObservingWindow::new(
            parse_utc(start).with_context(|| format!("Invalid start at row {}", row))?,
            parse_utc(end).with_context(|| format!("Invalid end at row {}", row))?,
            classification,
        )
        .with_context(|| format!("Invalid window at row {}", row))?;
        windows.push(window);
    }

    Ok(windows)
}

/// Parse observing windows from a JSON file
pub fn parse_windows_json(path: &Path) -> Result<Vec<ObservingWindow>> {
    let json_content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read windows file: {}", path.display()))?;

    parse_windows_str(&json_content)
}

/// Parse observing windows from a JSON string
///
/// Accepts a bare array or an object holding the array under one of the
/// usual keys. Each window is an object with start/end keys or a
/// `[start, end]` / `[start, end, classification]` array.
pub fn parse_windows_str(json_str: &str) -> Result<Vec<ObservingWindow>> {
    let value: Value = serde_json::from_str(json_str).context("Failed to parse windows JSON")?;

    let raw_windows = find_windows_array(&value)
        .ok_or_else(|| SchedulerError::validation("could not find a windows array in JSON"))?;

    raw_windows
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            parse_window(raw).with_context(|| format!("Invalid window at index {}", index))
        })
        .collect()
}

/// Find the array of windows in the JSON payload
fn find_windows_array(payload: &Value) -> Option<&Vec<Value>> {
    if let Some(arr) = payload.as_array() {
        return Some(arr);
    }

    let obj = payload.as_object()?;
    for key in WINDOW_KEYS {
        if let Some(arr) = obj.get(*key).and_then(Value::as_array) {
            return Some(arr);
        }
    }

    // Fallback: first array value in the object
    obj.values().find_map(Value::as_array)
}

fn find_value_by_keys<'a>(
    obj: &'a serde_json::Map<String, Value>,
    keys: &[&str],
) -> Option<&'a Value> {
    keys.iter().find_map(|key| obj.get(*key))
}

fn parse_window(window: &Value) -> Result<ObservingWindow> {
    let (start, end, class) = if let Some(obj) = window.as_object() {
        let start = find_value_by_keys(obj, START_KEYS)
            .ok_or_else(|| SchedulerError::validation("window has no start"))?;
        let end = find_value_by_keys(obj, END_KEYS)
            .ok_or_else(|| SchedulerError::validation("window has no end"))?;
        (start, end, find_value_by_keys(obj, CLASS_KEYS))
    } else if let Some(arr) = window.as_array() {
        if arr.len() < 2 {
            return Err(SchedulerError::validation("window array needs [start, end]").into());
        }
        (&arr[0], &arr[1], arr.get(2))
    } else {
        return Err(SchedulerError::validation("window must be an object or an array").into());
    };

    let classification = match class.and_then(Value::as_str) {
        Some(text) => text.parse()?,
        None => NightClass::Full,
    };

    Ok(ObservingWindow::new(
        parse_time_value(start)?,
        parse_time_value(end)?,
        classification,
    )?)
}

/// Parse a time value: a timestamp string, a bare MJD number, or an
/// object wrapping either (`{"value": ...}` / `{"mjd": ...}`).
fn parse_time_value(value: &Value) -> Result<DateTime<Utc>> {
    if let Some(obj) = value.as_object() {
        let inner = ["value", "mjd", "MJD", "utc"]
            .iter()
            .find_map(|key| obj.get(*key))
            .ok_or_else(|| SchedulerError::validation("time object has no value"))?;
        return parse_time_value(inner);
    }

    if let Some(mjd) = value.as_f64() {
        let time = ModifiedJulianDate::new(mjd)
            .try_to_datetime()
            .ok_or_else(|| SchedulerError::validation(format!("MJD {} is out of range", mjd)))?;
        return Ok(time);
    }

    if let Some(text) = value.as_str() {
        return Ok(parse_utc(text)?);
    }

    Err(SchedulerError::Parse(format!("unsupported time value {}", value)).into())
}
