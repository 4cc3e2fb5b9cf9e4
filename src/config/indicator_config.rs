//! Indicator window configuration parsing from environment variables.

use super::{Lookup, parse_f64, parse_usize};
use crate::application::indicators::IndicatorConfig;
use anyhow::{Result, bail};

/// Indicator environment configuration
#[derive(Debug, Clone)]
pub struct IndicatorEnvConfig {
    // RSI
    pub rsi_period: usize,

    // MACD
    pub macd_fast_period: usize,
    pub macd_slow_period: usize,
    pub macd_signal_period: usize,

    // Bollinger Bands
    pub bb_period: usize,
    pub bb_std_dev: f64,

    // Volatility
    pub atr_period: usize,
    pub volatility_period: usize,
}

impl IndicatorEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: Lookup<'_>) -> Result<Self> {
        let defaults = IndicatorConfig::default();
        Ok(Self {
            rsi_period: parse_usize(get, "RSI_PERIOD", defaults.rsi_period)?,
            macd_fast_period: parse_usize(get, "MACD_FAST_PERIOD", defaults.macd_fast_period)?,
            macd_slow_period: parse_usize(get, "MACD_SLOW_PERIOD", defaults.macd_slow_period)?,
            macd_signal_period: parse_usize(
                get,
                "MACD_SIGNAL_PERIOD",
                defaults.macd_signal_period,
            )?,
            bb_period: parse_usize(get, "BB_PERIOD", defaults.bb_period)?,
            bb_std_dev: parse_f64(get, "BB_STD_DEV", defaults.bb_std_dev)?,
            atr_period: parse_usize(get, "ATR_PERIOD", defaults.atr_period)?,
            volatility_period: parse_usize(get, "VOLATILITY_PERIOD", defaults.volatility_period)?,
        })
    }

    /// Validated indicator windows for the engine
    pub fn to_indicator_config(&self) -> Result<IndicatorConfig> {
        let config = IndicatorConfig {
            rsi_period: self.rsi_period,
            macd_fast_period: self.macd_fast_period,
            macd_slow_period: self.macd_slow_period,
            macd_signal_period: self.macd_signal_period,
            bb_period: self.bb_period,
            bb_std_dev: self.bb_std_dev,
            atr_period: self.atr_period,
            volatility_period: self.volatility_period,
        };
        if let Err(reason) = config.validate() {
            bail!("Invalid indicator config: {}", reason);
        }
        Ok(config)
    }
}
