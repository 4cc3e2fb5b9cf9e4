use crate::domain::errors::SeriesError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily Open/High/Low/Close record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl OhlcBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
        }
    }

    fn invalid_field(&self) -> Option<(&'static str, f64)> {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite() || *v <= 0.0)
    }
}

/// Daily bars ordered by strictly increasing date.
///
/// Construction validates ordering and prices, so every consumer can treat the
/// series as clean input. An empty series is allowed and is how a data source
/// reports that it had nothing for a symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OhlcSeries {
    bars: Vec<OhlcBar>,
}

impl OhlcSeries {
    pub fn new(bars: Vec<OhlcBar>) -> Result<Self, SeriesError> {
        for (index, bar) in bars.iter().enumerate() {
            if let Some((field, value)) = bar.invalid_field() {
                return Err(SeriesError::InvalidPrice {
                    index,
                    field,
                    value,
                });
            }
            if index > 0 {
                let previous = bars[index - 1].date;
                if bar.date <= previous {
                    return Err(SeriesError::NonIncreasingDate {
                        index,
                        date: bar.date,
                        previous,
                    });
                }
            }
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[OhlcBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&OhlcBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Bars whose date falls within `days` calendar days of the last bar.
    pub fn trailing_days(&self, days: u32) -> OhlcSeries {
        let Some(last) = self.bars.last() else {
            return OhlcSeries::default();
        };
        // A window reaching past the earliest representable date covers everything
        let Some(cutoff) = last
            .date
            .checked_sub_signed(chrono::Duration::days(i64::from(days)))
        else {
            return self.clone();
        };
        OhlcSeries {
            bars: self
                .bars
                .iter()
                .filter(|b| b.date > cutoff)
                .copied()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn bar(d: u32, close: f64) -> OhlcBar {
        OhlcBar::new(day(d), close, close + 1.0, close - 0.5, close)
    }

    #[test]
    fn test_series_accepts_increasing_dates() {
        let series = OhlcSeries::new(vec![bar(1, 10.0), bar(2, 11.0), bar(5, 12.0)]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![10.0, 11.0, 12.0]);
    }

    #[test]
    fn test_series_rejects_duplicate_date() {
        let err = OhlcSeries::new(vec![bar(1, 10.0), bar(1, 11.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::NonIncreasingDate { index: 1, .. }));
    }

    #[test]
    fn test_series_rejects_non_positive_price() {
        let mut bad = bar(2, 11.0);
        bad.low = 0.0;
        let err = OhlcSeries::new(vec![bar(1, 10.0), bad]).unwrap_err();
        assert_eq!(
            err,
            SeriesError::InvalidPrice {
                index: 1,
                field: "low",
                value: 0.0
            }
        );
    }

    #[test]
    fn test_series_rejects_nan() {
        let mut bad = bar(1, 10.0);
        bad.close = f64::NAN;
        assert!(OhlcSeries::new(vec![bad]).is_err());
    }

    #[test]
    fn test_trailing_days_window() {
        let series = OhlcSeries::new((1..=20).map(|d| bar(d, d as f64)).collect()).unwrap();
        let window = series.trailing_days(5);
        assert_eq!(window.len(), 5);
        assert_eq!(window.bars()[0].date, day(16));
        assert!(OhlcSeries::default().trailing_days(5).is_empty());
    }

    #[test]
    fn test_trailing_days_beyond_calendar_keeps_everything() {
        let series = OhlcSeries::new((1..=20).map(|d| bar(d, d as f64)).collect()).unwrap();
        assert_eq!(series.trailing_days(u32::MAX), series);
    }
}
