use chrono::NaiveDate;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

/// Every value carried by an indicator snapshot, in reporting order.
///
/// The key strings are the names feature schemas and callers use; changing one
/// is a breaking change for stored model artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Indicator {
    Price,
    Sma5,
    Sma10,
    Sma20,
    Sma50,
    Rsi,
    Macd,
    MacdSignal,
    MacdHist,
    BbUpper,
    BbMiddle,
    BbLower,
    Atr,
    DailyReturn,
    Volatility,
    IntradayRange,
    Gap,
    Roc5,
    Roc10,
}

impl Indicator {
    pub const COUNT: usize = 19;

    pub const ALL: [Indicator; Indicator::COUNT] = [
        Indicator::Price,
        Indicator::Sma5,
        Indicator::Sma10,
        Indicator::Sma20,
        Indicator::Sma50,
        Indicator::Rsi,
        Indicator::Macd,
        Indicator::MacdSignal,
        Indicator::MacdHist,
        Indicator::BbUpper,
        Indicator::BbMiddle,
        Indicator::BbLower,
        Indicator::Atr,
        Indicator::DailyReturn,
        Indicator::Volatility,
        Indicator::IntradayRange,
        Indicator::Gap,
        Indicator::Roc5,
        Indicator::Roc10,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Indicator::Price => "price",
            Indicator::Sma5 => "sma_5",
            Indicator::Sma10 => "sma_10",
            Indicator::Sma20 => "sma_20",
            Indicator::Sma50 => "sma_50",
            Indicator::Rsi => "rsi",
            Indicator::Macd => "macd",
            Indicator::MacdSignal => "macd_signal",
            Indicator::MacdHist => "macd_hist",
            Indicator::BbUpper => "bb_upper",
            Indicator::BbMiddle => "bb_middle",
            Indicator::BbLower => "bb_lower",
            Indicator::Atr => "atr",
            Indicator::DailyReturn => "daily_return",
            Indicator::Volatility => "volatility",
            Indicator::IntradayRange => "intraday_range",
            Indicator::Gap => "gap",
            Indicator::Roc5 => "roc_5",
            Indicator::Roc10 => "roc_10",
        }
    }

    /// Case-insensitive lookup by key.
    pub fn from_key(name: &str) -> Option<Indicator> {
        Indicator::ALL
            .into_iter()
            .find(|ind| ind.key().eq_ignore_ascii_case(name.trim()))
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for Indicator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

/// Indicator values for one row of a series, normally its most recent record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    date: NaiveDate,
    values: [f64; Indicator::COUNT],
}

impl IndicatorSnapshot {
    pub fn new(date: NaiveDate, values: [f64; Indicator::COUNT]) -> Self {
        Self { date, values }
    }

    /// Build from `(indicator, value)` pairs; unspecified indicators are 0.0.
    pub fn from_pairs(date: NaiveDate, pairs: &[(Indicator, f64)]) -> Self {
        let mut values = [0.0; Indicator::COUNT];
        for (ind, value) in pairs {
            values[ind.index()] = *value;
        }
        Self { date, values }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn value(&self, indicator: Indicator) -> f64 {
        self.values[indicator.index()]
    }

    /// Case-insensitive lookup by indicator key, e.g. `get("SMA_20")`.
    pub fn get(&self, name: &str) -> Option<f64> {
        Indicator::from_key(name).map(|ind| self.value(ind))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Indicator, f64)> + '_ {
        Indicator::ALL.into_iter().map(|ind| (ind, self.value(ind)))
    }

    pub fn price(&self) -> f64 {
        self.value(Indicator::Price)
    }

    pub fn rsi(&self) -> f64 {
        self.value(Indicator::Rsi)
    }
}

impl Serialize for IndicatorSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Indicator::COUNT + 1))?;
        map.serialize_entry("date", &self.date)?;
        for (ind, value) in self.iter() {
            map.serialize_entry(ind.key(), &value)?;
        }
        map.end()
    }
}
