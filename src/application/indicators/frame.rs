use crate::domain::errors::PredictionError;
use crate::domain::market::{Indicator, IndicatorSnapshot};
use chrono::NaiveDate;

/// Cleaned indicator rows for a whole series.
///
/// Always holds at least one row; the last row describes the most recent bar.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    rows: Vec<IndicatorSnapshot>,
    dropped: usize,
}

impl IndicatorFrame {
    /// Assemble rows from raw columns, dropping any row that is still missing a value.
    pub(crate) fn from_columns(
        dates: &[NaiveDate],
        columns: &[Vec<Option<f64>>; Indicator::COUNT],
    ) -> Result<Self, PredictionError> {
        let rows: Vec<IndicatorSnapshot> = dates
            .iter()
            .enumerate()
            .filter_map(|(i, date)| {
                let mut values = [0.0; Indicator::COUNT];
                for (slot, column) in values.iter_mut().zip(columns.iter()) {
                    *slot = column[i]?;
                }
                Some(IndicatorSnapshot::new(*date, values))
            })
            .collect();

        if rows.is_empty() {
            return Err(PredictionError::AllDataInvalid { rows: dates.len() });
        }

        Ok(Self {
            dropped: dates.len() - rows.len(),
            rows,
        })
    }

    pub fn rows(&self) -> &[IndicatorSnapshot] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows removed during cleaning.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn latest(&self) -> IndicatorSnapshot {
        self.rows[self.rows.len() - 1]
    }

    /// One indicator across all rows.
    pub fn column(&self, indicator: Indicator) -> Vec<f64> {
        self.rows.iter().map(|r| r.value(indicator)).collect()
    }
}
