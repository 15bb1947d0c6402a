// src/payload.rs
//! Decoding of gviz query responses into records.
//!
//! The endpoint answers with a JavaScript snippet rather than plain JSON:
//!
//! ```text
//! /*O_o*/
//! google.visualization.Query.setResponse({"version":"0.6","table":{...}});
//! ```
//!
//! The object literal is pulled out of the call, decoded, and each table row is
//! mapped onto a header taken from the column labels or, when no column is
//! labelled, from the first row.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, error, trace};

use crate::data_types::{Header, RawCell, RawResponse, RawRow, RawTable, Record};
use crate::error::PayloadError;
use crate::options::SpreadsheetOptions;

static PAYLOAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"google\.visualization\.Query\.setResponse\((\{.*\})\);").unwrap());

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Date\((\d+),(\d+),(\d+)\)").unwrap());

static DATE_LITERAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Date\((\d+),(\d+),(\d+)(?:,(\d+),(\d+),(\d+))?\)$").unwrap()
});

/// Parse a full response body into records.
///
/// Never fails: a body that cannot be decoded is logged and yields no records.
pub fn parse_response(text: &str, options: &SpreadsheetOptions) -> Vec<Record> {
    let table = match extract_table(text) {
        Ok(table) => table,
        Err(err) => {
            error!(error = %err, "Error parsing spreadsheet data");
            return Vec::new();
        }
    };

    let (header, rows) = derive_header(&table);
    let records = apply_header(&header, rows, options);
    debug!(columns = header.len(), records = records.len(), "parsed spreadsheet data");
    records
}

/// Locate the `setResponse(...)` payload and decode its table.
pub fn extract_table(text: &str) -> Result<RawTable, PayloadError> {
    let payload = PAYLOAD_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .ok_or(PayloadError::MissingWrapper)?;

    let response: RawResponse = serde_json::from_str(payload.as_str())?;

    if response.status.as_deref() == Some("error") {
        let message = response
            .errors
            .iter()
            .map(|e| e.describe())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(PayloadError::Query(message));
    }

    // "ok" and "warning" responses both carry a table; a missing one is an empty sheet
    Ok(response.table.unwrap_or_default())
}

/// Work out the header and which rows hold data.
///
/// If any column carries a non-empty label, every label is used (unlabelled
/// columns keep an empty name) and all rows are data. Otherwise the first row
/// supplies the names and is skipped.
pub fn derive_header(table: &RawTable) -> (Header, &[RawRow]) {
    let labelled = table
        .cols
        .iter()
        .any(|col| col.label.as_deref().is_some_and(|l| !l.is_empty()));

    if labelled {
        let header = table
            .cols
            .iter()
            .map(|col| Some(col.label.clone().unwrap_or_default()))
            .collect();
        return (header, &table.rows);
    }

    match table.rows.split_first() {
        Some((first, rest)) => {
            let header = normalize_row(&first.c)
                .iter()
                .map(|cell| cell.v.as_ref().map(header_key))
                .collect();
            (header, rest)
        }
        None => (Vec::new(), &table.rows),
    }
}

/// Replace missing cells and cells without a value by empty cells, keeping positions.
pub fn normalize_row(cells: &[Option<RawCell>]) -> Vec<RawCell> {
    cells
        .iter()
        .map(|cell| match cell {
            Some(cell) if cell.v.as_ref().is_some_and(|v| !v.is_null()) => cell.clone(),
            _ => RawCell::empty(),
        })
        .collect()
}

/// Map each row onto `header`, in row order.
pub fn apply_header(header: &Header, rows: &[RawRow], options: &SpreadsheetOptions) -> Vec<Record> {
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let mut record = Record::new();

        for (i, cell) in normalize_row(&row.c).iter().enumerate() {
            let Some(raw) = cell.v.as_ref() else {
                continue;
            };

            // cells past the header, or under a column without a name, have no key
            let Some(key) = header.get(i).and_then(|name| name.as_ref()) else {
                trace!(column = i, "dropping cell without a header name");
                continue;
            };

            record.insert(key.clone(), select_value(cell, raw, options));
        }

        records.push(record);
    }

    records
}

fn select_value(cell: &RawCell, raw: &Value, options: &SpreadsheetOptions) -> Value {
    let prefer_formatted =
        options.use_format || (options.use_formatted_date && is_date_literal(raw));

    match cell.formatted() {
        Some(formatted) if prefer_formatted => Value::String(formatted.to_string()),
        _ => raw.clone(),
    }
}

/// Whether `value` is a string containing Google's `Date(y,m,d)` form.
pub fn is_date_literal(value: &Value) -> bool {
    value.as_str().is_some_and(|s| DATE_RE.is_match(s))
}

/// Decode `Date(y,m,d)` or `Date(y,m,d,h,mi,s)`. Months are zero based.
pub fn parse_date_literal(literal: &str) -> Option<NaiveDateTime> {
    let caps = DATE_LITERAL_RE.captures(literal.trim())?;
    let num = |i: usize| -> Option<u32> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };

    let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
    let date = NaiveDate::from_ymd_opt(year, num(2)?.checked_add(1)?, num(3)?)?;
    date.and_hms_opt(num(4)?, num(5)?, num(6)?)
}

/// Render a first-row value as a header name.
fn header_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => {
                format!("{f:.0}")
            }
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
