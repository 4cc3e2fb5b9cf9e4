use super::rolling::{diff, fill_forward_backward, pct_change, rolling_mean, rolling_std, sanitize};
use super::{IndicatorConfig, IndicatorFrame, SMA_WINDOWS};
use crate::domain::errors::PredictionError;
use crate::domain::market::{Indicator, IndicatorSnapshot, OhlcSeries};
use ta::Next;
use ta::indicators::MovingAverageConvergenceDivergence;
use tracing::debug;

const SMA_INDICATORS: [Indicator; 4] = [
    Indicator::Sma5,
    Indicator::Sma10,
    Indicator::Sma20,
    Indicator::Sma50,
];

type Columns = [Vec<Option<f64>>; Indicator::COUNT];

/// Computes the full indicator set over a daily series.
///
/// Every row only looks at itself and earlier rows. Leading rows whose
/// windows are incomplete are back-filled from the first defined value
/// before the frame is built.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self {
            config: IndicatorConfig::default(),
        }
    }
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> Result<Self, PredictionError> {
        config
            .validate()
            .map_err(|reason| PredictionError::InvalidConfig { reason })?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// Snapshot for the most recent bar.
    pub fn compute_indicators(
        &self,
        series: &OhlcSeries,
    ) -> Result<IndicatorSnapshot, PredictionError> {
        Ok(self.compute_frame(series)?.latest())
    }

    pub fn compute_frame(&self, series: &OhlcSeries) -> Result<IndicatorFrame, PredictionError> {
        let required = self.config.min_records();
        if series.len() < required {
            return Err(PredictionError::InsufficientData {
                required,
                actual: series.len(),
            });
        }

        let mut columns = self.raw_columns(series)?;
        for column in columns.iter_mut() {
            sanitize(column);
            fill_forward_backward(column);
        }

        let dates: Vec<_> = series.bars().iter().map(|b| b.date).collect();
        let frame = IndicatorFrame::from_columns(&dates, &columns)?;
        debug!(
            "Computed indicators over {} rows ({} dropped)",
            frame.len(),
            frame.dropped()
        );
        Ok(frame)
    }

    fn raw_columns(&self, series: &OhlcSeries) -> Result<Columns, PredictionError> {
        let cfg = &self.config;
        let bars = series.bars();
        let closes = series.closes();
        let close_col: Vec<Option<f64>> = closes.iter().copied().map(Some).collect();

        let mut columns: Columns = std::array::from_fn(|_| Vec::new());
        let mut set = |ind: Indicator, values: Vec<Option<f64>>| columns[ind.index()] = values;

        set(Indicator::Price, close_col.clone());

        for (window, ind) in SMA_WINDOWS.into_iter().zip(SMA_INDICATORS) {
            set(ind, rolling_mean(&close_col, window)?);
        }

        // RSI from simple rolling means of gains and losses
        let delta = diff(&closes);
        let gains: Vec<Option<f64>> = delta.iter().map(|d| d.map(|d| d.max(0.0))).collect();
        let losses: Vec<Option<f64>> = delta.iter().map(|d| d.map(|d| (-d).max(0.0))).collect();
        let avg_gain = rolling_mean(&gains, cfg.rsi_period)?;
        let avg_loss = rolling_mean(&losses, cfg.rsi_period)?;
        let rsi = avg_gain
            .iter()
            .zip(&avg_loss)
            .map(|(g, l)| Some(relative_strength_index((*g)?, (*l)?)))
            .collect();
        set(Indicator::Rsi, rsi);

        let mut macd = MovingAverageConvergenceDivergence::new(
            cfg.macd_fast_period,
            cfg.macd_slow_period,
            cfg.macd_signal_period,
        )
        .map_err(|e| PredictionError::InvalidConfig {
            reason: format!("MACD periods: {:?}", e),
        })?;
        let mut macd_line = Vec::with_capacity(closes.len());
        let mut macd_signal = Vec::with_capacity(closes.len());
        let mut macd_hist = Vec::with_capacity(closes.len());
        for close in &closes {
            let out = macd.next(*close);
            macd_line.push(Some(out.macd));
            macd_signal.push(Some(out.signal));
            macd_hist.push(Some(out.histogram));
        }
        set(Indicator::Macd, macd_line);
        set(Indicator::MacdSignal, macd_signal);
        set(Indicator::MacdHist, macd_hist);

        let bb_middle = rolling_mean(&close_col, cfg.bb_period)?;
        let bb_std = rolling_std(&close_col, cfg.bb_period);
        let band = |sign: f64| -> Vec<Option<f64>> {
            bb_middle
                .iter()
                .zip(&bb_std)
                .map(|(m, s)| Some((*m)? + sign * cfg.bb_std_dev * (*s)?))
                .collect()
        };
        set(Indicator::BbUpper, band(1.0));
        set(Indicator::BbLower, band(-1.0));
        set(Indicator::BbMiddle, bb_middle.clone());

        // True range; the first bar has no previous close and uses high - low.
        let true_range: Vec<Option<f64>> = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let hl = bar.high - bar.low;
                Some(match i.checked_sub(1).map(|p| bars[p].close) {
                    Some(prev) => hl
                        .max((bar.high - prev).abs())
                        .max((bar.low - prev).abs()),
                    None => hl,
                })
            })
            .collect();
        set(Indicator::Atr, rolling_mean(&true_range, cfg.atr_period)?);

        let daily_return = pct_change(&closes, 1);
        set(
            Indicator::Volatility,
            rolling_std(&daily_return, cfg.volatility_period),
        );
        set(Indicator::DailyReturn, daily_return);

        set(
            Indicator::IntradayRange,
            bars.iter()
                .map(|b| Some((b.high - b.low) / b.close * 100.0))
                .collect(),
        );

        let gap = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let prev = bars[i.checked_sub(1)?].close;
                Some((bar.open - prev) / prev * 100.0)
            })
            .collect();
        set(Indicator::Gap, gap);
        set(Indicator::Roc5, pct_change(&closes, 5));
        set(Indicator::Roc10, pct_change(&closes, 10));

        Ok(columns)
    }
}

/// RSI from average gain and loss. A window without losses reads 100.
pub fn relative_strength_index(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// Snapshot for the most recent bar using the default periods.
pub fn compute_indicators(series: &OhlcSeries) -> Result<IndicatorSnapshot, PredictionError> {
    IndicatorEngine::default().compute_indicators(series)
}
