//! Serializable analysis configuration.
//!
//! Stored as TOML. Every field has a default, so a partial file (or an empty
//! one) is a valid configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use std::path::Path;
use thiserror::Error;

use pricelab_core::data::DuplicatePolicy;
use pricelab_core::dispatch::{parse_indicator_names, IndicatorKind, IndicatorParams};
use pricelab_core::domain::{Interval, Period};

/// Accepted range for the SMA window.
pub const SMA_WINDOW_RANGE: RangeInclusive<usize> = 5..=100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Everything needed to reproduce one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Instrument analyzed by default.
    pub ticker: String,

    /// How far back from the last bar to keep.
    pub period: Period,

    /// Bar interval after resampling.
    pub interval: Interval,

    /// Indicator names; unknown names are ignored at dispatch.
    pub indicators: Vec<String>,

    /// Policy for records sharing a timestamp.
    pub duplicates: DuplicatePolicy,

    /// Lookback used for portfolio correlation.
    pub correlation_period: Period,

    /// Serialized last: TOML tables must follow plain values.
    pub params: IndicatorParams,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ticker: "AAPL".to_string(),
            period: Period::OneYear,
            interval: Interval::Daily,
            indicators: vec![
                IndicatorKind::Sma.to_string(),
                IndicatorKind::Rsi.to_string(),
                IndicatorKind::BollingerBands.to_string(),
            ],
            duplicates: DuplicatePolicy::Reject,
            correlation_period: Period::SixMonths,
            params: IndicatorParams::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Read and validate a config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as TOML, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Reject parameters the indicator engine would only answer with
    /// all-undefined output.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.params;
        if !SMA_WINDOW_RANGE.contains(&p.sma_window) {
            return Err(invalid(
                "params.sma_window",
                format!(
                    "{} is outside {}..={}",
                    p.sma_window,
                    SMA_WINDOW_RANGE.start(),
                    SMA_WINDOW_RANGE.end()
                ),
            ));
        }
        for (field, value) in [
            ("params.ema_span", p.ema_span),
            ("params.rsi_window", p.rsi_window),
            ("params.bollinger_window", p.bollinger_window),
        ] {
            if value == 0 {
                return Err(invalid(field, "must be at least 1".to_string()));
            }
        }
        if !p.bollinger_k.is_finite() || p.bollinger_k <= 0.0 {
            return Err(invalid(
                "params.bollinger_k",
                format!("{} is not a positive finite number", p.bollinger_k),
            ));
        }
        Ok(())
    }

    /// The resolved indicator set.
    pub fn indicator_kinds(&self) -> BTreeSet<IndicatorKind> {
        parse_indicator_names(&self.indicators)
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}
