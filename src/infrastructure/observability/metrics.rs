//! Prometheus metrics for the prediction pipeline
//!
//! All metrics use the `forecast_` prefix and are read-only.

use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Counters maintained by the prediction engine
#[derive(Clone)]
pub struct PipelineMetrics {
    registry: Arc<Registry>,
    /// Prediction requests by outcome (success/failure)
    pub predictions_total: CounterVec,
    /// Aborted requests by stage
    pub stage_failures_total: CounterVec,
    /// Series served from the cache
    pub cache_hits_total: Counter,
    /// Series fetched from the data source
    pub cache_misses_total: Counter,
    /// Classifier decisions by model key and decision
    pub classifier_decisions_total: CounterVec,
}

impl PipelineMetrics {
    /// Create a new metrics set with every counter registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let predictions_total = CounterVec::new(
            Opts::new("forecast_predictions_total", "Prediction requests by status"),
            &["status"],
        )?;
        registry.register(Box::new(predictions_total.clone()))?;

        let stage_failures_total = CounterVec::new(
            Opts::new(
                "forecast_stage_failures_total",
                "Prediction requests aborted, by pipeline stage",
            ),
            &["stage"],
        )?;
        registry.register(Box::new(stage_failures_total.clone()))?;

        let cache_hits_total = Counter::with_opts(Opts::new(
            "forecast_cache_hits_total",
            "Series served from the in-process cache",
        ))?;
        registry.register(Box::new(cache_hits_total.clone()))?;

        let cache_misses_total = Counter::with_opts(Opts::new(
            "forecast_cache_misses_total",
            "Series fetched from the data source",
        ))?;
        registry.register(Box::new(cache_misses_total.clone()))?;

        let classifier_decisions_total = CounterVec::new(
            Opts::new(
                "forecast_classifier_decisions_total",
                "Classifier decisions by model and outcome",
            ),
            &["model", "decision"],
        )?;
        registry.register(Box::new(classifier_decisions_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            predictions_total,
            stage_failures_total,
            cache_hits_total,
            cache_misses_total,
            classifier_decisions_total,
        })
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
