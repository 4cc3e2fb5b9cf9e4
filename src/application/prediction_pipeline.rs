use crate::application::indicators::{IndicatorConfig, IndicatorEngine};
use crate::application::ml::ModelBundle;
use crate::application::signal_aggregator::SignalAggregator;
use crate::domain::errors::{PredictionError, SeriesError};
use crate::domain::market::{IndicatorSnapshot, OhlcSeries};
use crate::domain::ml::Decision;
use crate::domain::ports::DataSource;
use crate::domain::signal::{PredictionResult, Stage};
use crate::infrastructure::observability::PipelineMetrics;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

pub const DEFAULT_LOOKBACK_DAYS: u32 = 90;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub lookback_days: u32,
    pub indicators: IndicatorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            indicators: IndicatorConfig::default(),
        }
    }
}

/// Fetched series keyed by symbol. Entries never expire on their own.
#[derive(Debug, Clone, Default)]
pub struct SeriesCache {
    entries: HashMap<String, OhlcSeries>,
}

impl SeriesCache {
    pub fn get(&self, symbol: &str) -> Option<&OhlcSeries> {
        self.entries.get(symbol)
    }

    pub fn insert(&mut self, symbol: &str, series: OhlcSeries) {
        self.entries.insert(symbol.to_string(), series);
    }

    /// Returns whether an entry was removed.
    pub fn invalidate(&mut self, symbol: &str) -> bool {
        self.entries.remove(symbol).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Runs fetch → indicators → signal → result for one symbol at a time.
///
/// Not internally synchronised: cache-mutating calls take `&mut self`, so an
/// engine shared between threads must sit behind a `Mutex`.
pub struct PredictionEngine<S: DataSource> {
    source: S,
    lookback_days: u32,
    indicators: IndicatorEngine,
    aggregator: SignalAggregator,
    cache: SeriesCache,
    models: Option<ModelBundle>,
    metrics: Option<PipelineMetrics>,
}

impl<S: DataSource> PredictionEngine<S> {
    pub fn new(source: S, config: PipelineConfig) -> Result<Self, PredictionError> {
        info!(
            "Prediction engine initialized (source: {}, lookback: {} days)",
            source.name(),
            config.lookback_days
        );
        Ok(Self {
            source,
            lookback_days: config.lookback_days,
            indicators: IndicatorEngine::new(config.indicators)?,
            aggregator: SignalAggregator::new(),
            cache: SeriesCache::default(),
            models: None,
            metrics: None,
        })
    }

    /// Attach trained classifiers; their decisions are added to every result.
    pub fn with_models(mut self, models: ModelBundle) -> Self {
        info!(
            "Attached {} classifier(s) over {} features",
            models.adapter.len(),
            models.feature_schema.len()
        );
        self.models = Some(models);
        self
    }

    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    /// Drop the cached series for `symbol` so the next request refetches it.
    pub fn invalidate(&mut self, symbol: &str) -> bool {
        self.cache.invalidate(symbol)
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn compute_indicators(&self, series: &OhlcSeries) -> Result<IndicatorSnapshot, PredictionError> {
        self.indicators.compute_indicators(series)
    }

    /// Prediction for `symbol`, or `None` when any stage fails.
    pub fn predict(&mut self, symbol: &str) -> Option<PredictionResult> {
        self.try_predict(symbol).ok()
    }

    /// Same as `predict`, keeping the reason for a failed request.
    pub fn try_predict(&mut self, symbol: &str) -> Result<PredictionResult, PredictionError> {
        info!("Predicting {}", symbol);
        match self.run(symbol) {
            Ok(result) => {
                info!(
                    "{}: {} with {:.1}% confidence (price {:.5})",
                    symbol, result.direction, result.confidence, result.price
                );
                self.count_outcome("success", None);
                Ok(result)
            }
            Err(e) => {
                warn!("{}: aborted at {} stage: {}", symbol, e.stage(), e);
                self.count_outcome("failure", Some(e.stage()));
                Err(e)
            }
        }
    }

    fn run(&mut self, symbol: &str) -> Result<PredictionResult, PredictionError> {
        let series = self.fetch(symbol)?;
        let snapshot = self.indicators.compute_indicators(&series)?;
        let signal = self.aggregator.aggregate(&snapshot);
        let model_decisions = self.model_decisions(&snapshot);

        let (probability_up, probability_down) = signal.probabilities();
        debug!("{}: {} of 4 votes UP", symbol, signal.up_votes());
        Ok(PredictionResult {
            symbol: symbol.to_string(),
            direction: signal.direction,
            confidence: signal.confidence,
            probability_up,
            probability_down,
            price: snapshot.price(),
            indicators: snapshot,
            votes: signal.votes,
            model_decisions,
            timestamp: Utc::now(),
        })
    }

    fn fetch(&mut self, symbol: &str) -> Result<OhlcSeries, PredictionError> {
        if let Some(series) = self.cache.get(symbol) {
            debug!("Using cached series for {}", symbol);
            if let Some(m) = &self.metrics {
                m.cache_hits_total.inc();
            }
            return Ok(series.clone());
        }
        if let Some(m) = &self.metrics {
            m.cache_misses_total.inc();
        }

        let series = self
            .source
            .fetch(symbol, self.lookback_days)
            .map_err(|e| match e.downcast_ref::<SeriesError>() {
                Some(source) => PredictionError::InvalidSeries {
                    symbol: symbol.to_string(),
                    source: source.clone(),
                },
                None => PredictionError::DataUnavailable {
                    symbol: symbol.to_string(),
                    reason: format!("{:#}", e),
                },
            })?;

        if series.is_empty() {
            return Err(PredictionError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("{} returned no records", self.source.name()),
            });
        }

        info!(
            "Fetched {} records for {} from {}",
            series.len(),
            symbol,
            self.source.name()
        );
        self.cache.insert(symbol, series.clone());
        Ok(series)
    }

    fn model_decisions(&self, snapshot: &IndicatorSnapshot) -> BTreeMap<String, Decision> {
        let Some(models) = &self.models else {
            return BTreeMap::new();
        };
        let decisions = models.adapter.decide(&models.feature_schema, snapshot);
        if let Some(m) = &self.metrics {
            for (key, decision) in &decisions {
                m.classifier_decisions_total
                    .with_label_values(&[key.as_str(), &decision.to_string()])
                    .inc();
            }
        }
        decisions
    }

    fn count_outcome(&self, status: &str, failed_stage: Option<Stage>) {
        let Some(m) = &self.metrics else {
            return;
        };
        m.predictions_total.with_label_values(&[status]).inc();
        if let Some(stage) = failed_stage {
            m.stage_failures_total
                .with_label_values(&[stage.as_str()])
                .inc();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::OhlcBar;
    use anyhow::{Result, anyhow};
    use chrono::{Duration, NaiveDate};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        records: usize,
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn new(records: usize) -> Self {
            Self {
                records,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl DataSource for CountingSource {
        fn fetch(&self, _symbol: &str, _lookback_days: u32) -> Result<OhlcSeries> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            let bars = (0..self.records)
                .map(|i| {
                    let c = 1.1 + (i as f64 * 0.2).sin() * 0.01;
                    OhlcBar::new(start + Duration::days(i as i64), c, c + 0.002, c - 0.002, c)
                })
                .collect();
            Ok(OhlcSeries::new(bars)?)
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    struct FailingSource;

    impl DataSource for FailingSource {
        fn fetch(&self, symbol: &str, _lookback_days: u32) -> Result<OhlcSeries> {
            Err(anyhow!("connection refused for {}", symbol))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_predict_caches_series() {
        let mut engine = PredictionEngine::new(CountingSource::new(90), PipelineConfig::default()).unwrap();

        assert!(engine.predict("EURUSD=X").is_some());
        assert!(engine.predict("EURUSD=X").is_some());
        assert_eq!(engine.source.calls.load(Ordering::SeqCst), 1);

        assert!(engine.invalidate("EURUSD=X"));
        assert!(!engine.invalidate("EURUSD=X"));
        assert!(engine.predict("EURUSD=X").is_some());
        assert_eq!(engine.source.calls.load(Ordering::SeqCst), 2);

        engine.predict("GBPUSD=X");
        assert_eq!(engine.cache().len(), 2);
        engine.clear();
        assert!(engine.cache().is_empty());
    }

    #[test]
    fn test_empty_series_is_data_unavailable_and_not_cached() {
        let mut engine = PredictionEngine::new(CountingSource::new(0), PipelineConfig::default()).unwrap();
        let err = engine.try_predict("AUDUSD=X").unwrap_err();
        assert!(matches!(err, PredictionError::DataUnavailable { .. }));
        assert_eq!(err.stage(), Stage::Fetch);
        assert!(!engine.cache().contains("AUDUSD=X"));
    }

    #[test]
    fn test_short_series_aborts_without_result() {
        let mut engine = PredictionEngine::new(CountingSource::new(30), PipelineConfig::default()).unwrap();
        assert!(engine.predict("USDJPY=X").is_none());
        assert!(matches!(
            engine.try_predict("USDJPY=X"),
            Err(PredictionError::InsufficientData { required: 50, actual: 30 })
        ));
    }

    #[test]
    fn test_source_error_is_data_unavailable() {
        let metrics = PipelineMetrics::new().unwrap();
        let mut engine = PredictionEngine::new(FailingSource, PipelineConfig::default())
            .unwrap()
            .with_metrics(metrics.clone());

        let err = engine.try_predict("USDCAD=X").unwrap_err();
        match err {
            PredictionError::DataUnavailable { symbol, reason } => {
                assert_eq!(symbol, "USDCAD=X");
                assert!(reason.contains("connection refused"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            metrics
                .stage_failures_total
                .with_label_values(&["fetch"])
                .get(),
            1.0
        );
    }

    #[test]
    fn test_result_probabilities_and_no_models() {
        let mut engine = PredictionEngine::new(CountingSource::new(90), PipelineConfig::default()).unwrap();
        let result = engine.predict("EURUSD=X").unwrap();
        assert!((0.0..=100.0).contains(&result.confidence));
        assert!((result.probability_up + result.probability_down - 100.0).abs() < 0.5);
        assert_eq!(result.votes.len(), 4);
        assert!(result.model_decisions.is_empty());
        assert_eq!(result.price, result.indicators.price());
    }
}
