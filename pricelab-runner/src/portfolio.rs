//! Portfolio ticker lists.
//!
//! A portfolio file is a headered CSV whose first column holds tickers.
//! Any other columns (weights, notes) are ignored.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

/// Read tickers from a portfolio CSV file.
pub fn load_portfolio(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("cannot open portfolio file {}", path.display()))?;
    parse_portfolio(file).with_context(|| format!("invalid portfolio file {}", path.display()))
}

/// Parse tickers from headered CSV text.
///
/// Values are trimmed and upper-cased; empty cells are dropped and repeats
/// keep their first position.
pub fn parse_portfolio<R: Read>(reader: R) -> Result<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut seen = HashSet::new();
    let mut tickers = Vec::new();
    for record in rdr.records() {
        let record = record.context("malformed portfolio row")?;
        let Some(cell) = record.get(0) else {
            continue;
        };
        let ticker = cell.to_ascii_uppercase();
        if ticker.is_empty() || !seen.insert(ticker.clone()) {
            continue;
        }
        tickers.push(ticker);
    }
    Ok(tickers)
}
