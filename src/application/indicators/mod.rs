mod engine;
mod frame;
pub mod rolling;

pub use engine::{IndicatorEngine, compute_indicators};
pub use frame::IndicatorFrame;

/// Moving-average windows reported in every snapshot, as `sma_<w>`.
pub const SMA_WINDOWS: [usize; 4] = [5, 10, 20, 50];

/// Look-back periods for the indicator engine.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub macd_fast_period: usize,
    pub macd_slow_period: usize,
    pub macd_signal_period: usize,
    pub bb_period: usize,
    pub bb_std_dev: f64,
    pub atr_period: usize,
    pub volatility_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast_period: 12,
            macd_slow_period: 26,
            macd_signal_period: 9,
            bb_period: 20,
            bb_std_dev: 2.0,
            atr_period: 14,
            volatility_period: 20,
        }
    }
}

impl IndicatorConfig {
    /// Largest window any indicator needs; shorter series are rejected.
    pub fn min_records(&self) -> usize {
        SMA_WINDOWS
            .iter()
            .copied()
            .chain([
                self.rsi_period,
                self.macd_slow_period,
                self.bb_period,
                self.atr_period,
                self.volatility_period,
            ])
            .max()
            .unwrap_or(0)
    }

    pub fn validate(&self) -> Result<(), String> {
        let periods = [
            ("rsi_period", self.rsi_period),
            ("macd_fast_period", self.macd_fast_period),
            ("macd_slow_period", self.macd_slow_period),
            ("macd_signal_period", self.macd_signal_period),
            ("bb_period", self.bb_period),
            ("atr_period", self.atr_period),
            ("volatility_period", self.volatility_period),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(format!("{} must be greater than zero", name));
        }
        // Sample standard deviation needs two values per window
        for (name, period) in [
            ("bb_period", self.bb_period),
            ("volatility_period", self.volatility_period),
        ] {
            if period < 2 {
                return Err(format!("{} must be at least 2, got {}", name, period));
            }
        }
        if self.macd_fast_period >= self.macd_slow_period {
            return Err(format!(
                "macd_fast_period ({}) must be shorter than macd_slow_period ({})",
                self.macd_fast_period, self.macd_slow_period
            ));
        }
        if !self.bb_std_dev.is_finite() || self.bb_std_dev <= 0.0 {
            return Err(format!("bb_std_dev must be positive, got {}", self.bb_std_dev));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_min_records_is_slow_sma() {
        assert_eq!(IndicatorConfig::default().min_records(), 50);
    }

    #[test]
    fn test_min_records_follows_longest_period() {
        let config = IndicatorConfig {
            bb_period: 60,
            ..Default::default()
        };
        assert_eq!(config.min_records(), 60);
    }

    #[test]
    fn test_validate_rejects_bad_periods() {
        assert!(IndicatorConfig::default().validate().is_ok());

        let zero = IndicatorConfig {
            atr_period: 0,
            ..Default::default()
        };
        assert!(zero.validate().unwrap_err().contains("atr_period"));

        let crossed = IndicatorConfig {
            macd_fast_period: 30,
            ..Default::default()
        };
        assert!(crossed.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_single_row_std_windows() {
        let bb = IndicatorConfig {
            bb_period: 1,
            ..Default::default()
        };
        assert_eq!(bb.validate().unwrap_err(), "bb_period must be at least 2, got 1");

        let vol = IndicatorConfig {
            volatility_period: 1,
            ..Default::default()
        };
        assert!(vol.validate().unwrap_err().contains("volatility_period"));
    }
}
