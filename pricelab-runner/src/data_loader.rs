//! Bar loading for the runner.
//!
//! Bars come from a `BarSource`. The runner ships `CsvDirectorySource`,
//! which reads `<dir>/<SYMBOL>.csv` files such as those exported from a
//! vendor download. Loaded records go through the normalizer before any
//! indicator sees them.

use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use pricelab_core::data::{normalize, read_raw_bars, BarSource, DuplicatePolicy, NormalizeError};
use pricelab_core::data::{RawBar, SourceError};
use pricelab_core::domain::Series;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// Reads one headered CSV per symbol from a directory.
///
/// Lookup tries `<SYMBOL>.csv` as given, then upper- and lower-case.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `symbol`, if one exists.
    pub fn path_for(&self, symbol: &str) -> Option<PathBuf> {
        [
            symbol.to_string(),
            symbol.to_ascii_uppercase(),
            symbol.to_ascii_lowercase(),
        ]
        .into_iter()
        .map(|name| self.dir.join(format!("{name}.csv")))
        .find(|path| path.is_file())
    }
}

impl BarSource for CsvDirectorySource {
    fn name(&self) -> &str {
        "csv-directory"
    }

    fn load(&self, symbol: &str) -> Result<Vec<RawBar>, SourceError> {
        let path = self.path_for(symbol).ok_or_else(|| SourceError::SymbolNotFound {
            symbol: symbol.to_string(),
        })?;
        debug!(symbol, path = %path.display(), "reading bars");

        let file = File::open(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SourceError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            _ => SourceError::Io {
                symbol: symbol.to_string(),
                reason: format!("{}: {e}", path.display()),
            },
        })?;

        read_raw_bars(BufReader::new(file)).map_err(|source| SourceError::Malformed {
            symbol: symbol.to_string(),
            source,
        })
    }
}

/// Load and normalize one symbol.
pub fn load_series(
    source: &dyn BarSource,
    symbol: &str,
    policy: DuplicatePolicy,
) -> Result<Series, LoadError> {
    let raw = source.load(symbol)?;
    Ok(normalize(symbol, raw, policy)?)
}
