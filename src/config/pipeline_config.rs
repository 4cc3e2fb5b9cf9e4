//! Data source and model store configuration parsing from environment variables.

use super::{Lookup, parse_u32};
use crate::application::prediction_pipeline::DEFAULT_LOOKBACK_DAYS;
use anyhow::{Result, bail};
use std::path::PathBuf;
use std::str::FromStr;

/// Longest accepted LOOKBACK_DAYS, one century of daily history.
pub const MAX_LOOKBACK_DAYS: u32 = 36_500;

pub const DEFAULT_SYMBOLS: [&str; 5] = ["EURUSD=X", "GBPUSD=X", "USDJPY=X", "USDCAD=X", "AUDUSD=X"];

/// Where OHLC history comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Mock,
    Csv,
}

impl FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(SourceKind::Mock),
            "csv" => Ok(SourceKind::Csv),
            _ => bail!("Invalid DATA_SOURCE: {}. Must be 'mock' or 'csv'", s),
        }
    }
}

/// Pipeline environment configuration
#[derive(Debug, Clone)]
pub struct PipelineEnvConfig {
    pub source: SourceKind,
    pub data_dir: PathBuf,
    pub lookback_days: u32,
    pub symbols: Vec<String>,

    // Models are only loaded when MODEL_DIR is set
    pub model_dir: Option<PathBuf>,
    pub model_key: String,
}

impl PipelineEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: Lookup<'_>) -> Result<Self> {
        let source = SourceKind::from_str(&get("DATA_SOURCE").unwrap_or_else(|| "mock".to_string()))?;

        let symbols = match get("SYMBOLS") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        };

        let lookback_days = parse_u32(get, "LOOKBACK_DAYS", DEFAULT_LOOKBACK_DAYS)?;
        if !(1..=MAX_LOOKBACK_DAYS).contains(&lookback_days) {
            bail!(
                "LOOKBACK_DAYS must be between 1 and {}, got {}",
                MAX_LOOKBACK_DAYS,
                lookback_days
            );
        }

        Ok(Self {
            source,
            data_dir: PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "data/raw".to_string())),
            lookback_days,
            symbols,
            model_dir: get("MODEL_DIR").filter(|d| !d.is_empty()).map(PathBuf::from),
            model_key: get("MODEL_KEY").unwrap_or_else(|| "EURUSD".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> Result<PipelineEnvConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PipelineEnvConfig::from_lookup(&|k| vars.get(k).cloned())
    }

    #[test]
    fn test_pipeline_config_defaults() {
        let config = lookup(&[]).unwrap();
        assert_eq!(config.source, SourceKind::Mock);
        assert_eq!(config.lookback_days, 90);
        assert_eq!(config.symbols.len(), 5);
        assert!(config.model_dir.is_none());
    }

    #[test]
    fn test_csv_source_and_symbol_list() {
        let config = lookup(&[
            ("DATA_SOURCE", "CSV"),
            ("DATA_DIR", "/tmp/fx"),
            ("SYMBOLS", "EURUSD=X, GBPUSD=X,,"),
            ("MODEL_DIR", "/tmp/models"),
        ])
        .unwrap();
        assert_eq!(config.source, SourceKind::Csv);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/fx"));
        assert_eq!(config.symbols, vec!["EURUSD=X", "GBPUSD=X"]);
        assert_eq!(config.model_dir, Some(PathBuf::from("/tmp/models")));
    }

    #[test]
    fn test_invalid_source_rejected() {
        assert!(lookup(&[("DATA_SOURCE", "yahoo")]).is_err());
        assert!(lookup(&[("LOOKBACK_DAYS", "-3")]).is_err());
    }

    #[test]
    fn test_lookback_days_bounded() {
        let err = lookup(&[("LOOKBACK_DAYS", "4000000000")]).unwrap_err();
        assert!(err.to_string().contains("LOOKBACK_DAYS must be between 1 and 36500"));
        assert!(lookup(&[("LOOKBACK_DAYS", "0")]).is_err());
        assert_eq!(lookup(&[("LOOKBACK_DAYS", "36500")]).unwrap().lookback_days, 36_500);
    }
}
