use crate::domain::market::{OhlcBar, OhlcSeries};
use crate::domain::ports::DataSource;
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One row of a yfinance-style export. Extra columns (Adj Close, Volume) are ignored.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "date", alias = "Datetime", alias = "Price")]
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open", alias = "open", deserialize_with = "csv::invalid_option")]
    open: Option<f64>,
    #[serde(rename = "High", alias = "high", deserialize_with = "csv::invalid_option")]
    high: Option<f64>,
    #[serde(rename = "Low", alias = "low", deserialize_with = "csv::invalid_option")]
    low: Option<f64>,
    #[serde(rename = "Close", alias = "close", deserialize_with = "csv::invalid_option")]
    close: Option<f64>,
}

/// Daily history read from `<dir>/<symbol>.csv`, or `<dir>/<PAIR>_historical.csv`
/// where `PAIR` is the symbol without its `=X` suffix.
///
/// Rows are sorted by date; rows without a parsable date or with a missing
/// price are skipped, and a repeated date keeps its last row.
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    dir: PathBuf,
}

impl CsvDataSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn locate(&self, symbol: &str) -> Option<PathBuf> {
        let pair = symbol.trim_end_matches("=X");
        [
            self.dir.join(format!("{}.csv", symbol)),
            self.dir.join(format!("{}_historical.csv", pair)),
        ]
        .into_iter()
        .find(|p| p.is_file())
    }

    fn read(path: &Path) -> Result<Vec<OhlcBar>> {
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        let mut by_date = BTreeMap::new();
        let mut skipped = 0usize;
        for result in rdr.deserialize() {
            let record: CsvRecord = result.with_context(|| format!("Malformed row in {:?}", path))?;
            let date = record
                .date
                .get(..10)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
            match (date, record.open, record.high, record.low, record.close) {
                (Some(date), Some(open), Some(high), Some(low), Some(close)) => {
                    by_date.insert(date, OhlcBar::new(date, open, high, low, close));
                }
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!("Skipped {} incomplete rows in {:?}", skipped, path);
        }
        Ok(by_date.into_values().collect())
    }
}

impl DataSource for CsvDataSource {
    fn fetch(&self, symbol: &str, lookback_days: u32) -> Result<OhlcSeries> {
        let Some(path) = self.locate(symbol) else {
            bail!("No CSV history for {} in {:?}", symbol, self.dir);
        };

        let series = OhlcSeries::new(Self::read(&path)?)?;
        let window = series.trailing_days(lookback_days);
        info!(
            "Read {} rows from {:?}, {} within {} days",
            series.len(),
            path,
            window.len(),
            lookback_days
        );
        Ok(window)
    }

    fn name(&self) -> &str {
        "csv"
    }
}
