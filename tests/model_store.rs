use chrono::NaiveDate;
use forecast_core::application::indicators::IndicatorEngine;
use forecast_core::application::ml::{ModelStore, TrainingSet, default_schema};
use forecast_core::application::prediction_pipeline::{PipelineConfig, PredictionEngine};
use forecast_core::domain::ml::{Decision, Scaler};
use forecast_core::domain::ports::DataSource;
use forecast_core::infrastructure::ml::SmartCoreClassifier;
use forecast_core::infrastructure::ml::smartcore_classifier::ForestParams;
use forecast_core::infrastructure::persistence::ModelArtifact;
use forecast_core::infrastructure::{JsonModelStore, SyntheticDataSource};
use std::collections::BTreeMap;
use std::fs;

fn source() -> SyntheticDataSource {
    SyntheticDataSource::new(11).with_end_date(NaiveDate::from_ymd_opt(2024, 10, 31).unwrap())
}

fn trained_artifact() -> ModelArtifact {
    let frame = IndicatorEngine::default()
        .compute_frame(&source().fetch("EURUSD=X", 2 * 365).unwrap())
        .unwrap();
    let schema = default_schema();
    let rows = TrainingSet::from_frame(&frame, &schema);

    let scaler = Scaler::fit_min_max(&rows.features).unwrap();
    let scaled = rows.scaled(&scaler).unwrap();
    let params = ForestParams {
        n_trees: 15,
        max_depth: 6,
        min_samples_split: 5,
        seed: 3,
    };

    let mut classifiers = BTreeMap::new();
    classifiers.insert(
        "random_forest".to_string(),
        SmartCoreClassifier::fit_random_forest(&scaled.features, &scaled.up, params).unwrap(),
    );
    classifiers.insert(
        "logistic_regression".to_string(),
        SmartCoreClassifier::fit_logistic_regression(&scaled.features, &scaled.up).unwrap(),
    );
    classifiers.insert(
        "ensemble".to_string(),
        SmartCoreClassifier::fit_ensemble(&scaled.features, &scaled.up, params).unwrap(),
    );

    ModelArtifact {
        feature_schema: schema,
        scaler,
        classifiers,
    }
}

#[test]
fn test_saved_models_drive_predictions() {
    let dir = std::env::temp_dir().join(format!("forecast-models-{}", std::process::id()));
    let store = JsonModelStore::new(&dir);
    store.save("EURUSD", &trained_artifact()).unwrap();

    let bundle = store.load("EURUSD").unwrap().expect("artifact saved above");
    assert_eq!(bundle.feature_schema.len(), 19);
    assert_eq!(bundle.adapter.len(), 3);

    let mut engine = PredictionEngine::new(source(), PipelineConfig::default())
        .unwrap()
        .with_models(bundle);
    let result = engine.predict("EURUSD=X").unwrap();

    assert_eq!(result.model_decisions.len(), 3);
    assert!(result.model_decisions.contains_key("ensemble"));
    for decision in result.model_decisions.values() {
        assert_ne!(*decision, Decision::Unavailable);
    }

    // Reloading the artifact gives the same decisions
    let reloaded = store.load("EURUSD").unwrap().unwrap();
    let decisions = reloaded
        .adapter
        .decide(&reloaded.feature_schema, &result.indicators);
    assert_eq!(decisions, result.model_decisions);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_corrupt_artifact_is_an_error() {
    let dir = std::env::temp_dir().join(format!("forecast-corrupt-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("GBPUSD.json"), "{\"feature_schema\": [\"rsi\"]").unwrap();

    let err = JsonModelStore::new(&dir).load("GBPUSD").err().expect("parse failure");
    assert!(format!("{:#}", err).contains("Failed to parse model artifact"));
    let _ = fs::remove_dir_all(&dir);
}
