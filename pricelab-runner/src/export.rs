//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! Provides three export formats for analysis results:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: per-bar indicator records and correlation matrices
//! - **Markdown**: correlation tables and single-symbol summaries
//!
//! Undefined indicator values are empty CSV cells, `null` in JSON and `n/a`
//! in Markdown.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDateTime, NaiveTime};

use pricelab_core::correlation::CorrelationMatrix;
use pricelab_core::dispatch::AugmentedSeries;

use crate::analysis::{SymbolAnalysis, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `SymbolAnalysis` to pretty JSON.
pub fn export_json(analysis: &SymbolAnalysis) -> Result<String> {
    serde_json::to_string_pretty(analysis).context("failed to serialize SymbolAnalysis to JSON")
}

/// Deserialize a `SymbolAnalysis` from JSON, rejecting unknown schema versions
/// and indicator columns that do not line up with the bars.
pub fn import_json(json: &str) -> Result<SymbolAnalysis> {
    let analysis: SymbolAnalysis =
        serde_json::from_str(json).context("failed to deserialize SymbolAnalysis from JSON")?;
    if analysis.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            analysis.schema_version,
            SCHEMA_VERSION
        );
    }
    if let Some((name, len)) = analysis.augmented.misaligned_field() {
        bail!(
            "indicator {name} has {len} values for {} bars",
            analysis.bar_count()
        );
    }
    Ok(analysis)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export bars with their indicator values as CSV.
///
/// Columns: timestamp, open, high, low, close, volume, then one column per
/// indicator in name order.
pub fn export_records_csv(augmented: &AugmentedSeries) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let names = augmented.field_names();

    let mut header = vec!["timestamp", "open", "high", "low", "close", "volume"];
    header.extend(names.iter().copied());
    wtr.write_record(&header)?;

    for (i, bar) in augmented.series.bars().iter().enumerate() {
        let mut row = vec![
            format_timestamp(bar.timestamp),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.map(|v| v.to_string()).unwrap_or_default(),
        ];
        row.extend(
            names
                .iter()
                .map(|name| cell(augmented.indicators.value(name, i))),
        );
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export a correlation matrix as CSV: an `instrument` column followed by
/// one column per instrument.
pub fn export_correlation_csv(matrix: &CorrelationMatrix) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["instrument"];
    header.extend(matrix.instruments.iter().map(String::as_str));
    wtr.write_record(&header)?;

    for (symbol, row) in matrix.instruments.iter().zip(&matrix.values) {
        let mut record = vec![symbol.clone()];
        record.extend(row.iter().map(|v| cell(*v)));
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Daily bars print as a bare date; intraday bars keep their time.
fn format_timestamp(ts: NaiveDateTime) -> String {
    if ts.time() == NaiveTime::MIN {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

// ─── Markdown reports ───────────────────────────────────────────────

/// Render a correlation matrix as a Markdown table, rounded to 2 decimals.
pub fn format_correlation_table(matrix: &CorrelationMatrix) -> String {
    let mut md = String::with_capacity(64 * (matrix.len() + 2));

    md.push_str("| |");
    for symbol in &matrix.instruments {
        md.push_str(&format!(" {symbol} |"));
    }
    md.push('\n');
    md.push_str("| --- |");
    for _ in &matrix.instruments {
        md.push_str(" ---: |");
    }
    md.push('\n');

    for (symbol, row) in matrix.instruments.iter().zip(&matrix.values) {
        md.push_str(&format!("| {symbol} |"));
        for value in row {
            md.push_str(&format!(" {} |", f2(*value)));
        }
        md.push('\n');
    }

    md
}

/// Generate a Markdown summary for one analyzed symbol: settings plus the
/// latest value of every indicator.
pub fn generate_report(analysis: &SymbolAnalysis) -> String {
    let mut md = String::with_capacity(1024);
    let series = &analysis.augmented.series;

    md.push_str(&format!("# Indicator Report: {}\n\n", analysis.symbol));

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Period | {} |\n", analysis.period));
    md.push_str(&format!("| Interval | {} |\n", analysis.interval));
    md.push_str(&format!("| Bars | {} |\n", series.len()));
    if let (Some(first), Some(last)) = (series.first_timestamp(), series.last_timestamp()) {
        md.push_str(&format!(
            "| Range | {} to {} |\n",
            format_timestamp(first),
            format_timestamp(last)
        ));
    }
    if analysis.insane_bars > 0 {
        md.push_str(&format!("| Inconsistent OHLC bars | {} |\n", analysis.insane_bars));
    }
    md.push('\n');

    md.push_str("## Latest Values\n\n");
    md.push_str("| Indicator | Value |\n");
    md.push_str("| --- | ---: |\n");
    if let Some(close) = series.bars().last().map(|b| b.close) {
        md.push_str(&format!("| Close | {close:.2} |\n"));
    }
    let last = series.len().saturating_sub(1);
    for name in analysis.augmented.field_names() {
        md.push_str(&format!(
            "| {name} | {} |\n",
            f2(analysis.augmented.indicators.value(name, last))
        ));
    }

    md
}

fn f2(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "n/a".to_string(),
    }
}
