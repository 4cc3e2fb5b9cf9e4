//! Fits the up/down classifiers used by `predict`.
//!
//! Labels are "next close above this close". The newest rows of each symbol
//! are held out for evaluation, the scaler is fitted on the training rows only,
//! and the artifact is written to `<model-dir>/<model-key>.json`.

use anyhow::{Context, Result, bail};
use clap::Parser;
use forecast_core::application::indicators::IndicatorEngine;
use forecast_core::application::ml::{ClassificationReport, TrainingSet, default_schema};
use forecast_core::config::{Config, SourceKind};
use forecast_core::domain::ml::Scaler;
use forecast_core::domain::ports::DataSource;
use forecast_core::infrastructure::ml::SmartCoreClassifier;
use forecast_core::infrastructure::ml::smartcore_classifier::ForestParams;
use forecast_core::infrastructure::persistence::ModelArtifact;
use forecast_core::infrastructure::{CsvDataSource, JsonModelStore, SyntheticDataSource};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Symbols to train on (defaults to SYMBOLS)
    symbols: Vec<String>,

    #[arg(long)]
    source: Option<SourceKind>,

    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long, default_value = "data/models")]
    model_dir: PathBuf,

    #[arg(long)]
    model_key: Option<String>,

    /// Calendar days of history per symbol
    #[arg(long, default_value_t = 5 * 365)]
    history_days: u32,

    #[arg(long, default_value_t = 200)]
    n_trees: u16,

    #[arg(long, default_value_t = 20)]
    max_depth: u16,

    #[arg(long, default_value_t = 5)]
    min_split: usize,

    #[arg(long, default_value_t = 0.2)]
    test_fraction: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let source_kind = args.source.unwrap_or(config.source);
    let data_dir = args.data_dir.unwrap_or_else(|| config.data_dir.clone());
    let model_key = args.model_key.unwrap_or_else(|| config.model_key.clone());
    let symbols = if args.symbols.is_empty() {
        config.symbols.clone()
    } else {
        args.symbols
    };

    let source: Box<dyn DataSource> = match source_kind {
        SourceKind::Mock => Box::new(SyntheticDataSource::new(args.seed)),
        SourceKind::Csv => Box::new(CsvDataSource::new(&data_dir)),
    };
    let engine = IndicatorEngine::new(config.indicators.to_indicator_config()?)?;
    let schema = default_schema();

    let mut train = TrainingSet::default();
    let mut test = TrainingSet::default();
    for symbol in &symbols {
        let series = match source.fetch(symbol, args.history_days) {
            Ok(series) => series,
            Err(e) => {
                warn!("Skipping {}: {:#}", symbol, e);
                continue;
            }
        };
        let frame = match engine.compute_frame(&series) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Skipping {}: {}", symbol, e);
                continue;
            }
        };
        let rows = TrainingSet::from_frame(&frame, &schema);
        let (symbol_train, symbol_test) = rows.split_chronological(args.test_fraction);
        info!(
            "{}: {} rows ({} up), {} train / {} test",
            symbol,
            rows.len(),
            rows.up_count(),
            symbol_train.len(),
            symbol_test.len()
        );
        train.extend(symbol_train);
        test.extend(symbol_test);
    }

    if train.is_empty() {
        bail!("No training rows for {:?}", symbols);
    }

    let scaler = Scaler::fit_min_max(&train.features).context("Training rows have inconsistent widths")?;
    let train = train.scaled(&scaler)?;
    let test = test.scaled(&scaler)?;

    let params = ForestParams {
        n_trees: args.n_trees,
        max_depth: args.max_depth,
        min_samples_split: args.min_split,
        seed: args.seed,
    };
    let mut classifiers = BTreeMap::new();
    info!("Training random forest ({} trees)...", params.n_trees);
    classifiers.insert(
        "random_forest".to_string(),
        SmartCoreClassifier::fit_random_forest(&train.features, &train.up, params)?,
    );
    info!("Training logistic regression...");
    classifiers.insert(
        "logistic_regression".to_string(),
        SmartCoreClassifier::fit_logistic_regression(&train.features, &train.up)?,
    );
    info!("Training ensemble...");
    classifiers.insert(
        "ensemble".to_string(),
        SmartCoreClassifier::fit_ensemble(&train.features, &train.up, params)?,
    );

    if !test.is_empty() {
        for (key, model) in &classifiers {
            let predicted = model.predict_batch(&test.features)?;
            if let Some(report) = ClassificationReport::evaluate(&predicted, &test.up) {
                info!(
                    "{}: accuracy {:.1}%, precision {:.1}%, recall {:.1}%, F1 {:.1}% over {} test rows",
                    key,
                    report.accuracy * 100.0,
                    report.precision * 100.0,
                    report.recall * 100.0,
                    report.f1 * 100.0,
                    report.rows
                );
            }
        }
    }

    let artifact = ModelArtifact {
        feature_schema: schema,
        scaler,
        classifiers,
    };
    let path = JsonModelStore::new(&args.model_dir).save(&model_key, &artifact)?;
    info!("Model artifact written to {:?}", path);
    Ok(())
}
