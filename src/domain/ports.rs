use crate::domain::market::OhlcSeries;
use anyhow::Result;

/// Supplier of historical daily bars.
///
/// Calls block until the series is available. Nothing here enforces a timeout;
/// callers own timeout policy at the network boundary.
pub trait DataSource: Send + Sync {
    /// Bars covering roughly the last `lookback_days` calendar days.
    /// An empty series means the source had nothing for the symbol.
    fn fetch(&self, symbol: &str, lookback_days: u32) -> Result<OhlcSeries>;

    fn name(&self) -> &str;
}

impl<T: DataSource + ?Sized> DataSource for Box<T> {
    fn fetch(&self, symbol: &str, lookback_days: u32) -> Result<OhlcSeries> {
        (**self).fetch(symbol, lookback_days)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
