//! PriceLab CLI: indicator, correlation, and config commands.
//!
//! Commands:
//! - `indicators`: compute indicators for one or more symbols from CSV files
//! - `correlate`: correlation matrix of daily returns across a portfolio
//! - `config init`: write a default TOML config
//! - `config show`: print a validated TOML config

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pricelab_core::data::DuplicatePolicy;
use pricelab_core::domain::{Interval, Period};
use pricelab_runner::export::{
    export_correlation_csv, export_json, export_records_csv, format_correlation_table,
    generate_report,
};
use pricelab_runner::{
    analyze_batch, correlate_portfolio, load_portfolio, AnalysisConfig, CsvDirectorySource,
    SymbolAnalysis,
};

#[derive(Parser)]
#[command(
    name = "pricelab",
    about = "PriceLab CLI: technical indicators and cross-asset correlation"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute indicators for symbols stored as <DATA_DIR>/<SYMBOL>.csv.
    Indicators {
        /// Symbols to analyze. Defaults to the config's ticker.
        #[arg(long = "symbol")]
        symbols: Vec<String>,

        /// Directory holding one CSV file per symbol.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Comma-separated indicator names (SMA, EMA, RSI, BollingerBands).
        #[arg(long, value_delimiter = ',')]
        indicators: Option<Vec<String>>,

        /// Lookback period: 1mo, 3mo, 6mo, 1y, 5y, max.
        #[arg(long)]
        period: Option<Period>,

        /// Bar interval: 1d, 1wk, 1mo.
        #[arg(long)]
        interval: Option<Interval>,

        /// Keep the last record for duplicate timestamps instead of failing.
        #[arg(long, default_value_t = false)]
        keep_last: bool,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,

        /// Output file (one symbol) or directory (several). Defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Correlate daily returns across a portfolio of symbols.
    Correlate {
        /// Portfolio CSV whose first column lists tickers.
        #[arg(long, conflicts_with = "symbols", required_unless_present = "symbols")]
        portfolio: Option<PathBuf>,

        /// Tickers to correlate.
        #[arg(long, num_args = 1..)]
        symbols: Vec<String>,

        /// Directory holding one CSV file per symbol.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Path to a TOML config file (supplies the period and duplicate policy).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Lookback period: 1mo, 3mo, 6mo, 1y, 5y, max. Defaults to the
        /// config's correlation_period.
        #[arg(long)]
        period: Option<Period>,

        /// Keep the last record for duplicate timestamps instead of failing.
        #[arg(long, default_value_t = false)]
        keep_last: bool,

        /// Write the matrix as CSV to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Config file management commands.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default config.
    Init {
        #[arg(long, default_value = "pricelab.toml")]
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Print a config after validation.
    Show {
        #[arg(long, default_value = "pricelab.toml")]
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
    Markdown,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "md",
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Indicators {
            symbols,
            data_dir,
            config,
            indicators,
            period,
            interval,
            keep_last,
            format,
            output,
        } => {
            let mut analysis_config = load_config(config.as_deref())?;
            if let Some(indicators) = indicators {
                analysis_config.indicators = indicators;
            }
            if let Some(period) = period {
                analysis_config.period = period;
            }
            if let Some(interval) = interval {
                analysis_config.interval = interval;
            }
            if keep_last {
                analysis_config.duplicates = DuplicatePolicy::KeepLast;
            }
            let symbols = if symbols.is_empty() {
                vec![analysis_config.ticker.clone()]
            } else {
                symbols
            };
            run_indicators(&symbols, &data_dir, &analysis_config, format, output.as_deref())
        }
        Commands::Correlate {
            portfolio,
            symbols,
            data_dir,
            config,
            period,
            keep_last,
            output,
        } => {
            let analysis_config = load_config(config.as_deref())?;
            let period = period.unwrap_or(analysis_config.correlation_period);
            let policy = if keep_last {
                DuplicatePolicy::KeepLast
            } else {
                analysis_config.duplicates
            };
            run_correlate(
                portfolio.as_deref(),
                symbols,
                &data_dir,
                period,
                policy,
                output.as_deref(),
            )
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { path, force } => run_config_init(&path, force),
            ConfigAction::Show { path } => run_config_show(&path),
        },
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

fn run_indicators(
    symbols: &[String],
    data_dir: &Path,
    config: &AnalysisConfig,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    config.validate()?;
    let source = CsvDirectorySource::new(data_dir);
    let results = analyze_batch(&source, symbols, config);

    let mut failures = 0usize;
    for (symbol, result) in symbols.iter().zip(results) {
        let analysis = match result {
            Ok(analysis) => analysis,
            Err(e) => {
                eprintln!("Error for {symbol}: {e}");
                failures += 1;
                continue;
            }
        };
        let rendered = render(&analysis, format)?;

        match output {
            None => print!("{rendered}"),
            Some(path) if symbols.len() == 1 => write_output(path, &rendered)?,
            Some(dir) => {
                let path = dir.join(format!("{symbol}.{}", format.extension()));
                write_output(&path, &rendered)?;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} symbols failed", symbols.len());
    }
    Ok(())
}

fn render(analysis: &SymbolAnalysis, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Csv => export_records_csv(&analysis.augmented),
        OutputFormat::Json => export_json(analysis),
        OutputFormat::Markdown => Ok(generate_report(analysis)),
    }
}

fn run_correlate(
    portfolio: Option<&Path>,
    symbols: Vec<String>,
    data_dir: &Path,
    period: Period,
    policy: DuplicatePolicy,
    output: Option<&Path>,
) -> Result<()> {
    let tickers = match portfolio {
        Some(path) => load_portfolio(path)?,
        None => symbols.iter().map(|s| s.trim().to_ascii_uppercase()).collect(),
    };
    if tickers.is_empty() {
        bail!("no tickers to correlate");
    }

    let source = CsvDirectorySource::new(data_dir);
    let result = correlate_portfolio(&source, &tickers, period, policy)?;

    for skipped in &result.skipped {
        eprintln!("Skipped {}: {}", skipped.symbol, skipped.reason);
    }
    println!(
        "Correlation of daily returns ({} observations, period {period})\n",
        result.matrix.observations
    );
    print!("{}", format_correlation_table(&result.matrix));

    if let Some(path) = output {
        write_output(path, &export_correlation_csv(&result.matrix)?)?;
    }
    Ok(())
}

fn run_config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    AnalysisConfig::default().save(path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

fn run_config_show(path: &Path) -> Result<()> {
    let config = AnalysisConfig::from_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn indicators_parses_comma_list() {
        let cli = Cli::parse_from([
            "pricelab",
            "indicators",
            "--symbol",
            "AAPL",
            "--indicators",
            "SMA,rsi",
            "--period",
            "6mo",
            "--interval",
            "1wk",
            "--format",
            "json",
        ]);
        match cli.command {
            Commands::Indicators {
                symbols,
                indicators,
                period,
                interval,
                format,
                ..
            } => {
                assert_eq!(symbols, vec!["AAPL"]);
                assert_eq!(indicators.unwrap(), vec!["SMA", "rsi"]);
                assert_eq!(period, Some(Period::SixMonths));
                assert_eq!(interval, Some(Interval::Weekly));
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("expected indicators command"),
        }
    }

    #[test]
    fn correlate_requires_a_ticker_source() {
        assert!(Cli::try_parse_from(["pricelab", "correlate"]).is_err());
        assert!(Cli::try_parse_from(["pricelab", "correlate", "--symbols", "A", "B"]).is_ok());
        assert!(Cli::try_parse_from([
            "pricelab",
            "correlate",
            "--symbols",
            "A",
            "--portfolio",
            "p.csv"
        ])
        .is_err());
    }

    #[test]
    fn correlate_period_falls_back_to_config() {
        let cli = Cli::parse_from([
            "pricelab",
            "correlate",
            "--symbols",
            "A",
            "B",
            "--config",
            "pricelab.toml",
        ]);
        match cli.command {
            Commands::Correlate {
                config,
                period,
                keep_last,
                ..
            } => {
                assert_eq!(config, Some(PathBuf::from("pricelab.toml")));
                assert_eq!(period, None);
                assert!(!keep_last);
            }
            _ => panic!("expected correlate command"),
        }

        let cli = Cli::parse_from(["pricelab", "correlate", "--symbols", "A", "--period", "1y"]);
        match cli.command {
            Commands::Correlate { period, .. } => assert_eq!(period, Some(Period::OneYear)),
            _ => panic!("expected correlate command"),
        }
    }

    #[test]
    fn load_config_defaults_without_a_path() {
        let config = load_config(None).unwrap();
        assert_eq!(config.correlation_period, Period::SixMonths);
        assert_eq!(config.duplicates, DuplicatePolicy::Reject);
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["pricelab", "config", "show", "--verbose"]);
        assert!(cli.verbose);
    }
}
