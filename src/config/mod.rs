//! Configuration module for forecast-core.
//!
//! Settings are read from environment variables (the `predict` binary loads a
//! `.env` file first) and grouped by concern: indicator windows and the
//! pipeline's data/model locations.

mod indicator_config;
mod pipeline_config;

pub use indicator_config::IndicatorEnvConfig;
pub use pipeline_config::{DEFAULT_SYMBOLS, MAX_LOOKBACK_DAYS, PipelineEnvConfig, SourceKind};

use crate::application::prediction_pipeline::PipelineConfig;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// Variable lookup used by every `from_lookup`; `from_env` reads the process environment.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub source: SourceKind,
    pub data_dir: PathBuf,
    pub lookback_days: u32,
    pub symbols: Vec<String>,
    pub model_dir: Option<PathBuf>,
    pub model_key: String,
    pub indicators: IndicatorEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: Lookup<'_>) -> Result<Self> {
        let pipeline = PipelineEnvConfig::from_lookup(get).context("Failed to load pipeline config")?;
        let indicators =
            IndicatorEnvConfig::from_lookup(get).context("Failed to load indicator config")?;

        Ok(Self {
            source: pipeline.source,
            data_dir: pipeline.data_dir,
            lookback_days: pipeline.lookback_days,
            symbols: pipeline.symbols,
            model_dir: pipeline.model_dir,
            model_key: pipeline.model_key,
            indicators,
        })
    }

    /// Create the engine's PipelineConfig from this Config
    pub fn to_pipeline_config(&self) -> Result<PipelineConfig> {
        Ok(PipelineConfig {
            lookback_days: self.lookback_days,
            indicators: self.indicators.to_indicator_config()?,
        })
    }
}

fn parse_var<T>(get: Lookup<'_>, key: &str, default: T) -> Result<T>
where
    T: FromStr + ToString,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    get(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse::<T>()
        .context(format!("Failed to parse {}", key))
}

fn parse_usize(get: Lookup<'_>, key: &str, default: usize) -> Result<usize> {
    parse_var(get, key, default)
}

fn parse_u32(get: Lookup<'_>, key: &str, default: u32) -> Result<u32> {
    parse_var(get, key, default)
}

fn parse_f64(get: Lookup<'_>, key: &str, default: f64) -> Result<f64> {
    parse_var(get, key, default)
}
