//! CopperWatch CLI — validation and monitoring commands.
//!
//! Commands:
//! - `validate` — walk-forward validation of the baseline predictor over a
//!   CSV price series, with stress test and position recommendations
//! - `monitor run` — evaluate alert rules against a price series, one-shot
//!   or as a background polling loop
//! - `rules export` / `rules import` — round-trip rule sets as JSON files

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use copperwatch_core::domain::{FeatureTable, PriceBar, PriceSeries};
use copperwatch_core::validate::daily_volatility;
use copperwatch_core::{LastValuePredictor, ValidationConfig, Validator};
use copperwatch_monitor::{
    AlertMonitor, ConsoleSink, FeedError, IndicatorPair, MarketFeed, MarketSnapshot,
    MonitorConfig, MonitorHandle, TickReport,
};

#[derive(Parser)]
#[command(
    name = "copperwatch",
    about = "CopperWatch CLI — copper forecast validation and risk alerting"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the baseline predictor against a price series.
    Validate {
        /// CSV price file (date,open,high,low,close,volume).
        #[arg(long)]
        prices: Option<PathBuf>,

        /// Use a synthetic random-walk series instead of a CSV file.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Bars to generate with --synthetic.
        #[arg(long, default_value_t = 400)]
        bars: usize,

        /// Account value the position advisor sizes against.
        #[arg(long, default_value_t = 1_000_000.0)]
        account: f64,

        /// Model price forecast to stress-test. Omit to skip the scenario
        /// sweep and position recommendations.
        #[arg(long)]
        base_prediction: Option<f64>,

        /// Write the full result as JSON to this path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Alert monitoring commands.
    Monitor {
        #[command(subcommand)]
        action: MonitorAction,
    },
    /// Rule-set management commands.
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
}

#[derive(Subcommand)]
enum MonitorAction {
    /// Evaluate alert rules against a price series.
    Run {
        /// CSV price file (date,open,high,low,close,volume).
        #[arg(long)]
        prices: PathBuf,

        /// TOML monitor config (poll interval, history limits, squeeze
        /// thresholds, rule-set path). Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Evaluate one tick and exit instead of polling.
        #[arg(long, default_value_t = false)]
        once: bool,
    },
}

#[derive(Subcommand)]
enum RulesAction {
    /// Write the default rule set as JSON.
    Export {
        /// Output path. Defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Validate a rule-set JSON file.
    Import {
        /// Rule-set JSON file.
        #[arg(long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Validate {
            prices,
            synthetic,
            bars,
            account,
            base_prediction,
            output,
        } => run_validate(prices, synthetic, bars, account, base_prediction, output),
        Commands::Monitor { action } => match action {
            MonitorAction::Run {
                prices,
                config,
                once,
            } => run_monitor(&prices, config.as_deref(), once),
        },
        Commands::Rules { action } => match action {
            RulesAction::Export { output } => run_rules_export(output.as_deref()),
            RulesAction::Import { input } => run_rules_import(&input),
        },
    }
}

// ─── validate ────────────────────────────────────────────────────────

fn run_validate(
    prices: Option<PathBuf>,
    synthetic: bool,
    bars: usize,
    account: f64,
    base_prediction: Option<f64>,
    output: Option<PathBuf>,
) -> Result<()> {
    if prices.is_some() && synthetic {
        bail!("--prices and --synthetic are mutually exclusive");
    }
    let series = match prices {
        Some(path) => load_series(&path)?,
        None if synthetic => synthetic_series(bars)?,
        None => bail!("one of --prices or --synthetic is required"),
    };

    let features = FeatureTable::lagged_returns(&series, &[1, 5, 20])?;
    let config = ValidationConfig {
        account_value: account,
        ..ValidationConfig::default()
    };
    let validator = Validator::new(config);
    let mut predictor = LastValuePredictor::default();

    let report = validator.run(&mut predictor, &series, &features, base_prediction)?;

    println!("{}", report.summary);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Result saved to: {}", path.display());
    }

    Ok(())
}

fn load_series(path: &Path) -> Result<PriceSeries> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut bars = Vec::new();
    for record in reader.deserialize() {
        let bar: PriceBar = record?;
        bars.push(bar);
    }
    Ok(PriceSeries::new(bars)?)
}

/// Random-walk series with mild drift, seeded for repeatable runs.
fn synthetic_series(bars: usize) -> Result<PriceSeries> {
    let mut rng = StdRng::seed_from_u64(42);
    let start = chrono::Local::now().date_naive() - chrono::Duration::days(bars as i64 * 2);
    let mut close = 70_000.0f64;
    let mut out = Vec::with_capacity(bars);
    let mut date = start;
    while out.len() < bars {
        // Weekdays only.
        if date.weekday().number_from_monday() <= 5 {
            let ret: f64 = rng.gen_range(-0.02..0.021);
            let open = close;
            close *= 1.0 + ret;
            let (lo, hi) = if close < open { (close, open) } else { (open, close) };
            out.push(PriceBar {
                date,
                open,
                high: hi * 1.003,
                low: lo * 0.997,
                close,
                volume: rng.gen_range(10_000u64..100_000),
            });
        }
        date += chrono::Duration::days(1);
    }
    Ok(PriceSeries::new(out)?)
}

// ─── monitor ─────────────────────────────────────────────────────────

/// TOML monitor configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct MonitorFileConfig {
    poll_interval_secs: u64,
    monitor: MonitorConfig,
    /// Rule-set JSON path. The default templates load when omitted.
    rules: Option<PathBuf>,
}

impl Default for MonitorFileConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            monitor: MonitorConfig::default(),
            rules: None,
        }
    }
}

fn run_monitor(prices: &Path, config_path: Option<&Path>, once: bool) -> Result<()> {
    let file_config = match config_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => MonitorFileConfig::default(),
    };

    let mut monitor = match &file_config.rules {
        Some(path) => {
            let mut monitor = AlertMonitor::new(file_config.monitor.clone());
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let count = monitor.import_rules(&text)?;
            println!("Loaded {count} rule(s) from {}", path.display());
            monitor
        }
        None => AlertMonitor::with_default_rules(file_config.monitor.clone()),
    };
    monitor.add_sink(Box::new(ConsoleSink));

    if once {
        let mut feed = CsvFeed::new(prices.to_path_buf());
        let snapshot = feed.poll().map_err(|e| anyhow::anyhow!("{e}"))?;
        let report = monitor.tick(Utc::now(), &snapshot);
        print_tick(&report);
        return Ok(());
    }

    let interval = StdDuration::from_secs(file_config.poll_interval_secs.max(1));
    let handle = MonitorHandle::spawn(monitor, CsvFeed::new(prices.to_path_buf()), interval)?;
    println!(
        "Monitoring {} every {}s — press Enter to stop.",
        prices.display(),
        interval.as_secs()
    );

    let mut line = String::new();
    let _ = std::io::stdin().lock().read_line(&mut line);

    let shared = handle.monitor();
    handle.stop();
    if let Ok(guard) = shared.lock() {
        println!(
            "Stopped at level: {} ({} alert(s) in history)",
            guard.current_level().label(),
            guard.history_len()
        );
    }
    Ok(())
}

fn print_tick(report: &TickReport) {
    if report.fired.is_empty() && report.squeeze.is_none() {
        println!("No alerts. Level: {}", report.overall.label());
    } else {
        for signal in &report.fired {
            println!("{} {}", signal.level.emoji(), signal.message);
        }
        if let Some(signal) = &report.squeeze {
            println!("{} {}", signal.level.emoji(), signal.message);
        }
        println!("Overall level: {}", report.overall.label());
    }
    for err in &report.errors {
        println!("WARNING: {err}");
    }
}

/// Re-reads the price CSV each poll and snapshots its two freshest bars.
struct CsvFeed {
    path: PathBuf,
}

impl CsvFeed {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl MarketFeed for CsvFeed {
    fn poll(&mut self) -> Result<MarketSnapshot, FeedError> {
        let series =
            load_series(&self.path).map_err(|e| FeedError::Unavailable(e.to_string()))?;
        let mut snapshot = MarketSnapshot::from_series(&series, Utc::now())
            .ok_or_else(|| FeedError::Unavailable("series has fewer than two bars".into()))?;

        // Realized 20-day volatility in percent, for the volatility rules.
        let closes = series.closes();
        if closes.len() >= 22 {
            let latest = daily_volatility(&closes[closes.len() - 21..]) * 100.0;
            let previous = daily_volatility(&closes[closes.len() - 22..closes.len() - 1]) * 100.0;
            snapshot.set("volatility_20d", IndicatorPair { latest, previous });
        }
        Ok(snapshot)
    }
}

// ─── rules ───────────────────────────────────────────────────────────

fn run_rules_export(output: Option<&Path>) -> Result<()> {
    let rules = copperwatch_monitor::rule::default_rules();
    let text = copperwatch_monitor::rule::export_rules(rules.iter())?;
    match output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {} rule(s) to {}", rules.len(), path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn run_rules_import(input: &Path) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let rules = copperwatch_monitor::rule::import_rules(&text)?;
    println!("Valid rule set: {} rule(s)", rules.len());
    for rule in &rules {
        let status = if rule.enabled { "enabled" } else { "disabled" };
        println!(
            "  {:<24} {:<12} {} ({status})",
            rule.id,
            rule.level.label(),
            rule.indicator
        );
    }
    Ok(())
}
