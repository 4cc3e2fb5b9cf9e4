//! forecast-core prediction CLI
//!
//! Computes indicators for each symbol, aggregates the rule votes and, when a
//! model directory is configured, adds the trained classifiers' decisions.
//!
//! # Usage
//! ```sh
//! cargo run --bin predict -- EURUSD=X GBPUSD=X
//! DATA_SOURCE=csv DATA_DIR=data/historical cargo run --bin predict -- --json
//! ```
//!
//! Logs go to stderr so `--json` output can be piped.

use anyhow::{Context, Result};
use clap::Parser;
use forecast_core::application::prediction_pipeline::PredictionEngine;
use forecast_core::application::ml::ModelStore;
use forecast_core::config::{Config, SourceKind};
use forecast_core::domain::ports::DataSource;
use forecast_core::domain::signal::PredictionResult;
use forecast_core::infrastructure::observability::PipelineMetrics;
use forecast_core::infrastructure::{CsvDataSource, JsonModelStore, SyntheticDataSource};
use std::path::PathBuf;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Symbols to predict (defaults to SYMBOLS)
    symbols: Vec<String>,

    /// Data source: mock or csv (overrides DATA_SOURCE)
    #[arg(long)]
    source: Option<SourceKind>,

    /// CSV directory (overrides DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Model artifact directory (overrides MODEL_DIR)
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Model artifact key (overrides MODEL_KEY)
    #[arg(long)]
    model_key: Option<String>,

    /// Seed for the mock source
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Print results as JSON lines
    #[arg(long)]
    json: bool,

    /// Print pipeline counters after the run
    #[arg(long)]
    metrics: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(source) = args.source {
        config.source = source;
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if args.model_dir.is_some() {
        config.model_dir = args.model_dir;
    }
    if let Some(key) = args.model_key {
        config.model_key = key;
    }
    let symbols = if args.symbols.is_empty() {
        config.symbols.clone()
    } else {
        args.symbols
    };

    info!(
        "forecast-core {} starting: source={:?}, lookback={} days, symbols={:?}",
        env!("CARGO_PKG_VERSION"),
        config.source,
        config.lookback_days,
        symbols
    );

    let source: Box<dyn DataSource> = match config.source {
        SourceKind::Mock => Box::new(SyntheticDataSource::new(args.seed)),
        SourceKind::Csv => Box::new(CsvDataSource::new(&config.data_dir)),
    };

    let metrics = PipelineMetrics::new()?;
    let mut engine = PredictionEngine::new(source, config.to_pipeline_config()?)
        .context("Failed to build prediction engine")?
        .with_metrics(metrics.clone());

    if let Some(dir) = &config.model_dir {
        let store = JsonModelStore::new(dir);
        match store.load(&config.model_key)? {
            Some(models) => engine = engine.with_models(models),
            None => warn!("No model artifact {} in {:?}; rule votes only", config.model_key, dir),
        }
    }

    let mut failed = 0;
    for symbol in &symbols {
        match engine.predict(symbol) {
            Some(result) if args.json => println!("{}", serde_json::to_string(&result)?),
            Some(result) => print_result(&result),
            None => {
                failed += 1;
                if !args.json {
                    println!("{:<10} no prediction", symbol);
                }
            }
        }
    }

    if args.metrics {
        eprint!("{}", metrics.render()?);
    }

    info!("{} of {} symbols predicted", symbols.len() - failed, symbols.len());
    if failed == symbols.len() && !symbols.is_empty() {
        anyhow::bail!("No symbol could be predicted");
    }
    Ok(())
}

fn print_result(result: &PredictionResult) {
    println!(
        "{:<10} {:<4} {:>5.1}%  (up {:.1}% / down {:.1}%)  price {:.5}  [{}]",
        result.symbol,
        result.direction,
        result.confidence,
        result.probability_up,
        result.probability_down,
        result.price,
        result.indicators.date()
    );
    let votes: Vec<String> = result
        .votes
        .iter()
        .map(|v| format!("{:?}={}", v.rule, v.direction))
        .collect();
    println!("           votes: {}", votes.join(" "));
    if !result.model_decisions.is_empty() {
        let decisions: Vec<String> = result
            .model_decisions
            .iter()
            .map(|(model, decision)| format!("{}={}", model, decision))
            .collect();
        println!("           models: {}", decisions.join(" "));
    }
}
