//! Pull-free observability for the prediction engine
//!
//! Counters live in a private registry; callers render them on demand
//! (the `predict` binary prints them with `--metrics`).

pub mod metrics;

pub use metrics::PipelineMetrics;
