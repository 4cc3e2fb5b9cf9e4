// Indicator names and per-row snapshots
pub mod indicator;

// Validated daily price series
pub mod ohlc;

pub use indicator::{Indicator, IndicatorSnapshot};
pub use ohlc::{OhlcBar, OhlcSeries};
