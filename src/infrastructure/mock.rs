use crate::domain::market::{OhlcBar, OhlcSeries};
use crate::domain::ports::DataSource;
use anyhow::{Result, bail};
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Deterministic random-walk daily bars.
///
/// The walk for a symbol depends only on the seed, the symbol and the end
/// date, so repeated fetches return identical series. Weekends are skipped
/// like a forex daily feed.
#[derive(Debug, Clone)]
pub struct SyntheticDataSource {
    seed: u64,
    end: NaiveDate,
    daily_volatility: f64,
}

impl SyntheticDataSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            end: Utc::now().date_naive(),
            daily_volatility: 0.006,
        }
    }

    /// Pin the last generated date (today by default).
    pub fn with_end_date(mut self, end: NaiveDate) -> Self {
        self.end = end;
        self
    }

    pub fn with_daily_volatility(mut self, volatility: f64) -> Self {
        self.daily_volatility = volatility;
        self
    }

    fn symbol_seed(&self, symbol: &str) -> u64 {
        // FNV-1a
        symbol.bytes().fold(self.seed ^ 0xcbf2_9ce4_8422_2325, |h, b| {
            (h ^ b as u64).wrapping_mul(0x0100_0000_01b3)
        })
    }
}

impl Default for SyntheticDataSource {
    fn default() -> Self {
        Self::new(42)
    }
}

fn base_price(symbol: &str) -> f64 {
    let symbol = symbol.to_uppercase();
    if symbol.contains("JPY") {
        150.0
    } else if symbol.starts_with("EUR") {
        1.08
    } else if symbol.starts_with("GBP") {
        1.27
    } else if symbol.starts_with("AUD") {
        0.66
    } else if symbol.starts_with("USD") {
        1.36
    } else {
        100.0
    }
}

impl DataSource for SyntheticDataSource {
    fn fetch(&self, symbol: &str, lookback_days: u32) -> Result<OhlcSeries> {
        if !(self.daily_volatility.is_finite() && self.daily_volatility > 0.0 && self.daily_volatility < 0.5) {
            bail!("Daily volatility {} out of range", self.daily_volatility);
        }

        let mut rng = StdRng::seed_from_u64(self.symbol_seed(symbol));
        let mut prev_close = base_price(symbol);
        let Some(start) = self
            .end
            .checked_sub_signed(Duration::days(i64::from(lookback_days)))
            .and_then(|d| d.succ_opt())
        else {
            bail!("Lookback of {} days reaches past the calendar", lookback_days);
        };

        let mut bars = Vec::new();
        let mut date = start;
        while date <= self.end {
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                let gap = rng.random_range(-0.1..=0.1) * self.daily_volatility;
                let change = rng.random_range(-1.0..=1.0) * self.daily_volatility;
                let open = prev_close * (1.0 + gap);
                let close = open * (1.0 + change);
                let high = open.max(close) * (1.0 + rng.random_range(0.0..=0.5) * self.daily_volatility);
                let low = open.min(close) * (1.0 - rng.random_range(0.0..=0.5) * self.daily_volatility);

                bars.push(OhlcBar::new(date, open, high, low, close));
                prev_close = close;
            }
            date += Duration::days(1);
        }

        debug!("Generated {} synthetic bars for {}", bars.len(), symbol);
        Ok(OhlcSeries::new(bars)?)
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
