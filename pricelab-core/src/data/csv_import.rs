//! CSV bar ingestion.
//!
//! Reads a headered OHLC(V) export into `RawBar`s. Column names are matched
//! case-insensitively; empty, `NaN` and `null` cells become missing fields
//! and are left for the normalizer to reject.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::io::Read;
use thiserror::Error;

use super::source::RawBar;

const TIMESTAMP_ALIASES: [&str; 4] = ["date", "datetime", "timestamp", "time"];

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("CSV read error: {0}")]
    Read(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}: cannot parse {column} value '{value}'")]
    Parse {
        row: usize,
        column: &'static str,
        value: String,
    },
}

/// Column positions resolved from the header row.
struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, CsvError> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| h.trim().to_ascii_lowercase())
            .collect();
        let find = |name: &str| names.iter().position(|n| n == name);
        let require = |name: &'static str| find(name).ok_or(CsvError::MissingColumn(name));

        let timestamp = TIMESTAMP_ALIASES
            .iter()
            .find_map(|&alias| find(alias))
            .ok_or(CsvError::MissingColumn("date"))?;

        Ok(Self {
            timestamp,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find("volume"),
        })
    }
}

/// Read raw bars from a headered CSV.
///
/// Row numbers in errors are 1-based data rows (the header is row 0).
pub fn read_raw_bars<R: Read>(reader: R) -> Result<Vec<RawBar>, CsvError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::resolve(rdr.headers()?)?;
    let mut bars = Vec::new();

    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        bars.push(RawBar {
            timestamp: parse_timestamp_cell(cell(columns.timestamp), row)?,
            open: parse_number(cell(columns.open), row, "open")?,
            high: parse_number(cell(columns.high), row, "high")?,
            low: parse_number(cell(columns.low), row, "low")?,
            close: parse_number(cell(columns.close), row, "close")?,
            volume: match columns.volume {
                Some(idx) => parse_number(cell(idx), row, "volume")?,
                None => None,
            },
        });
    }

    Ok(bars)
}

/// Parse a date or date-time in one of the accepted layouts.
///
/// Accepts `YYYY-MM-DD` (midnight), `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS`, and offset-qualified forms (RFC 3339 or
/// `YYYY-MM-DD HH:MM:SS+HH:MM`), which keep their local wall-clock time.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%:z"))
                .ok()
                .map(|dt| dt.naive_local())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn is_missing(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("nan") || value.eq_ignore_ascii_case("null")
}

fn parse_timestamp_cell(value: &str, row: usize) -> Result<Option<NaiveDateTime>, CsvError> {
    if is_missing(value) {
        return Ok(None);
    }
    parse_timestamp(value).map(Some).ok_or_else(|| CsvError::Parse {
        row,
        column: "timestamp",
        value: value.to_string(),
    })
}

fn parse_number(value: &str, row: usize, column: &'static str) -> Result<Option<f64>, CsvError> {
    if is_missing(value) {
        return Ok(None);
    }
    value.parse::<f64>().map(Some).map_err(|_| CsvError::Parse {
        row,
        column,
        value: value.to_string(),
    })
}
