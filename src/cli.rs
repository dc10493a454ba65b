//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{CsvLayout, CsvPriceAdapter};
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig};
use crate::domain::config_validation::validate_config;
use crate::domain::error::RebalancerError;
use crate::domain::metrics::Summary;
use crate::domain::portfolio::TransferShares;
use crate::domain::price_history::PriceHistory;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "rebalancer", about = "Two-asset tactical rebalancing backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Price file, overrides [data] path
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Report directory, overrides [report] output_dir
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the data range and warm-up boundary
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            data,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_backtest(&config, data.as_deref(), output.as_deref())
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, data } => run_info(&config, data.as_deref()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, RebalancerError> {
    tracing::info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

pub fn run_backtest(
    config_path: &Path,
    data_override: Option<&Path>,
    output_override: Option<&Path>,
) -> Result<(), RebalancerError> {
    // Stage 1: config
    let adapter = load_config(config_path)?;
    let bt_config = build_backtest_config(&adapter)?;
    validate_config(&bt_config)?;

    // Stage 2: data
    let data_port = build_data_port(&adapter, data_override)?;
    let history = PriceHistory::new(data_port.load_prices()?)?;

    // Stage 3: simulation
    let result = backtest_engine::run_backtest(&history, &bt_config)?;
    let summary = Summary::compute(&result, bt_config.starting_value);
    print_summary(&summary);

    // Stage 4: reports
    let output_dir = output_override
        .map(Path::to_path_buf)
        .or_else(|| adapter.get_string("report", "output_dir").map(PathBuf::from));
    if let Some(dir) = output_dir {
        CsvReportAdapter::new().write(&result, &dir)?;
        println!("\nReports written to: {}", dir.display());
    }

    Ok(())
}

pub fn run_dry_run(config_path: &Path) -> Result<(), RebalancerError> {
    let adapter = load_config(config_path)?;
    let config = build_backtest_config(&adapter)?;
    validate_config(&config)?;

    println!("Resolved parameters:");
    println!("  starting value:     {:.2}", config.starting_value);
    println!(
        "  allocation:         {:.1}% equity / {:.1}% bond",
        config.starting_equity_share * 100.0,
        config.starting_bond_share * 100.0
    );
    println!(
        "  charges:            {:.3}% equity / {:.3}% bond",
        config.equity_charge * 100.0,
        config.bond_charge * 100.0
    );
    println!(
        "  windows:            short {} / long {}",
        config.short_window, config.long_window
    );
    println!("  min rebalance gap:  {}", config.min_rebalance_gap);
    let band = config.ratio_band();
    println!("  ratio band:         [{}, {}]", band.lower, band.upper);
    println!("\nDry run complete: configuration is valid");
    Ok(())
}

pub fn run_validate(config_path: &Path) -> Result<(), RebalancerError> {
    let adapter = load_config(config_path)?;
    let config = build_backtest_config(&adapter)?;
    validate_config(&config)?;
    println!("Configuration is valid");
    Ok(())
}

pub fn run_info(config_path: &Path, data_override: Option<&Path>) -> Result<(), RebalancerError> {
    let adapter = load_config(config_path)?;
    let config = build_backtest_config(&adapter)?;
    let data_port = build_data_port(&adapter, data_override)?;

    let history = PriceHistory::new(data_port.load_prices()?)?;
    let (Some(first), Some(last)) = (history.first_date(), history.last_date()) else {
        println!("No price data");
        return Ok(());
    };
    println!("Data range: {} to {} ({} rows)", first, last, history.len());

    match history.warmup_date(config.warmup_index() + 1) {
        Some(date) => println!("Warm-up boundary: {}", date),
        None => println!(
            "Warm-up boundary: not reached (need {} rows)",
            config.min_rows()
        ),
    }
    Ok(())
}

fn print_summary(summary: &Summary) {
    println!("=== Backtest Results ===");
    println!("Final Value:      {:.2}", summary.final_value);
    println!("Total Return:     {:.2}%", summary.total_return * 100.0);
    println!("Max Drawdown:     -{:.1}%", summary.max_drawdown * 100.0);
    println!("Trading Days:     {}", summary.trading_days);
    println!("Total Charges:    {:.2}", summary.total_charges);
    println!("\n=== Rebalances ({}) ===", summary.rebalances());
    println!("  equity buy:   {}", summary.equity_buys);
    println!("  equity sell:  {}", summary.equity_sells);
    println!("  bond sell:    {}", summary.bond_sells);
    println!("  bond buy:     {}", summary.bond_buys);
    println!("  dropped:      {}", summary.dropped_intents);
}

pub fn build_data_port(
    adapter: &dyn ConfigPort,
    data_override: Option<&Path>,
) -> Result<CsvPriceAdapter, RebalancerError> {
    let path = match data_override {
        Some(p) => p.to_path_buf(),
        None => adapter
            .get_string("data", "path")
            .map(PathBuf::from)
            .ok_or_else(|| RebalancerError::ConfigMissing {
                section: "data".into(),
                key: "path".into(),
            })?,
    };
    Ok(CsvPriceAdapter::new(path, build_csv_layout(adapter)?))
}

pub fn build_csv_layout(adapter: &dyn ConfigPort) -> Result<CsvLayout, RebalancerError> {
    let defaults = CsvLayout::default();

    let delimiter = match adapter.get_string("data", "delimiter") {
        None => defaults.delimiter,
        // named forms, since ';' and '#' start INI comments
        Some(s) => match (s.as_str(), s.as_bytes()) {
            ("semicolon", _) => b';',
            ("comma", _) => b',',
            ("tab", _) => b'\t',
            (_, [byte]) => *byte,
            _ => {
                return Err(RebalancerError::invalid(
                    "data",
                    "delimiter",
                    "delimiter must be a single ASCII character",
                ));
            }
        },
    };

    Ok(CsvLayout {
        delimiter,
        date_column: adapter
            .get_string("data", "date_column")
            .unwrap_or(defaults.date_column),
        equity_column: adapter
            .get_string("data", "equity_column")
            .unwrap_or(defaults.equity_column),
        bond_column: adapter
            .get_string("data", "bond_column")
            .unwrap_or(defaults.bond_column),
        date_format: adapter
            .get_string("data", "date_format")
            .unwrap_or(defaults.date_format),
    })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, RebalancerError> {
    let d = BacktestConfig::default();
    let s = TransferShares::default();

    Ok(BacktestConfig {
        starting_value: read_f64(adapter, "backtest", "starting_value", d.starting_value)?,
        starting_equity_share: read_f64(
            adapter,
            "backtest",
            "starting_equity_share",
            d.starting_equity_share,
        )?,
        starting_bond_share: read_f64(
            adapter,
            "backtest",
            "starting_bond_share",
            d.starting_bond_share,
        )?,
        equity_charge: read_f64(adapter, "backtest", "equity_charge", d.equity_charge)?,
        bond_charge: read_f64(adapter, "backtest", "bond_charge", d.bond_charge)?,
        short_window: read_usize(adapter, "signals", "short_window", d.short_window)?,
        long_window: read_usize(adapter, "signals", "long_window", d.long_window)?,
        min_rebalance_gap: read_usize(adapter, "signals", "min_rebalance_gap", d.min_rebalance_gap)?,
        ratio_lower_bound: read_f64(adapter, "signals", "ratio_lower_bound", d.ratio_lower_bound)?,
        ratio_upper_bound: read_f64(adapter, "signals", "ratio_upper_bound", d.ratio_upper_bound)?,
        ratio_bound_scale: read_f64(adapter, "signals", "ratio_bound_scale", d.ratio_bound_scale)?,
        ratio_precision: read_usize(
            adapter,
            "signals",
            "ratio_precision",
            d.ratio_precision as usize,
        )?
        .try_into()
        .map_err(|_| RebalancerError::invalid("signals", "ratio_precision", "value too large"))?,
        shares: TransferShares {
            bond_sold_on_equity_buy: read_f64(
                adapter,
                "rebalance",
                "share_bond_sold_on_equity_buy",
                s.bond_sold_on_equity_buy,
            )?,
            equity_sold_on_equity_sell: read_f64(
                adapter,
                "rebalance",
                "share_equity_sold_on_equity_sell",
                s.equity_sold_on_equity_sell,
            )?,
            bond_sold_on_bond_sell: read_f64(
                adapter,
                "rebalance",
                "share_bond_sold_on_bond_sell",
                s.bond_sold_on_bond_sell,
            )?,
            equity_sold_on_bond_buy: read_f64(
                adapter,
                "rebalance",
                "share_equity_sold_on_bond_buy",
                s.equity_sold_on_bond_buy,
            )?,
        },
    })
}

/// Absent keys take `default`; present keys must parse.
fn read_f64(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, RebalancerError> {
    match adapter.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| RebalancerError::invalid(section, key, format!("'{}' is not a number", raw))),
    }
}

fn read_usize(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, RebalancerError> {
    let Some(raw) = adapter.get_string(section, key) else {
        return Ok(default);
    };
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| RebalancerError::invalid(section, key, format!("'{}' is not an integer", raw)))?;
    usize::try_from(value)
        .map_err(|_| RebalancerError::invalid(section, key, format!("{} must be non-negative", key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn empty_config_uses_strategy_defaults() {
        let config = build_backtest_config(&config_from("[backtest]\n")).unwrap();
        assert_eq!(config, BacktestConfig::default());
    }

    #[test]
    fn values_are_read_from_sections() {
        let adapter = config_from(
            "[backtest]\nstarting_value = 50000\nequity_charge = 0.001\n\
             [signals]\nshort_window = 10\nlong_window = 50\nmin_rebalance_gap = 5\n\
             [rebalance]\nshare_equity_sold_on_bond_buy = 0.5\n",
        );
        let config = build_backtest_config(&adapter).unwrap();
        assert_eq!(config.starting_value, 50_000.0);
        assert_eq!(config.equity_charge, 0.001);
        assert_eq!(config.short_window, 10);
        assert_eq!(config.long_window, 50);
        assert_eq!(config.min_rebalance_gap, 5);
        assert_eq!(config.shares.equity_sold_on_bond_buy, 0.5);
        assert_eq!(config.shares.bond_sold_on_equity_buy, 1.0);
    }

    #[test]
    fn negative_window_is_rejected() {
        let err = build_backtest_config(&config_from("[signals]\nlong_window = -5\n")).unwrap_err();
        assert!(matches!(
            err,
            RebalancerError::ConfigInvalid { ref key, .. } if key == "long_window"
        ));
    }

    #[test]
    fn malformed_number_is_rejected() {
        let err =
            build_backtest_config(&config_from("[backtest]\nbond_charge = cheap\n")).unwrap_err();
        assert!(matches!(
            err,
            RebalancerError::ConfigInvalid { ref key, .. } if key == "bond_charge"
        ));
    }

    #[test]
    fn csv_layout_defaults_and_overrides() {
        let layout = build_csv_layout(&config_from("[data]\n")).unwrap();
        assert_eq!(layout, CsvLayout::default());

        let layout = build_csv_layout(&config_from(
            "[data]\ndelimiter = ,\nequity_column = SPX\n",
        ))
        .unwrap();
        assert_eq!(layout.delimiter, b',');
        assert_eq!(layout.equity_column, "SPX");
        assert_eq!(layout.bond_column, "TLT 20Y");
    }

    #[test]
    fn multi_char_delimiter_is_rejected() {
        let err = build_csv_layout(&config_from("[data]\ndelimiter = ||\n")).unwrap_err();
        assert!(matches!(err, RebalancerError::ConfigInvalid { .. }));
    }

    #[test]
    fn named_delimiters() {
        let layout = build_csv_layout(&config_from("[data]\ndelimiter = semicolon\n")).unwrap();
        assert_eq!(layout.delimiter, b';');
        let layout = build_csv_layout(&config_from("[data]\ndelimiter = tab\n")).unwrap();
        assert_eq!(layout.delimiter, b'\t');
    }

    #[test]
    fn data_path_is_required_without_override() {
        let err = build_data_port(&config_from("[data]\n"), None).err().unwrap();
        assert!(matches!(err, RebalancerError::ConfigMissing { .. }));
        assert!(build_data_port(&config_from("[data]\n"), Some(Path::new("prices.csv"))).is_ok());
    }
}
