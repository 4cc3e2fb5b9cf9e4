use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::signal::Stage;

/// Errors that abort a whole prediction request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("No data available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("Insufficient data: need {required} records, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("All rows became invalid after cleaning ({rows} rows in)")]
    AllDataInvalid { rows: usize },

    #[error("Invalid OHLC series for {symbol}: {source}")]
    InvalidSeries {
        symbol: String,
        #[source]
        source: SeriesError,
    },

    #[error("Invalid indicator configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl PredictionError {
    /// Pipeline stage that produced the error.
    pub fn stage(&self) -> Stage {
        match self {
            PredictionError::DataUnavailable { .. } | PredictionError::InvalidSeries { .. } => {
                Stage::Fetch
            }
            PredictionError::InsufficientData { .. }
            | PredictionError::AllDataInvalid { .. }
            | PredictionError::InvalidConfig { .. } => Stage::ComputeIndicators,
        }
    }
}

/// Rejections raised while building an `OhlcSeries`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("date {date} at index {index} does not follow {previous}")]
    NonIncreasingDate {
        index: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },

    #[error("{field} at index {index} must be finite and positive, got {value}")]
    InvalidPrice {
        index: usize,
        field: &'static str,
        value: f64,
    },
}

/// Failure of a single classifier. Never aborts the prediction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("Feature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Non-finite feature value at position {index}")]
    NonFiniteInput { index: usize },

    #[error("Model {name} failed: {reason}")]
    Model { name: String, reason: String },
}

/// Feature names that had no counterpart in the snapshot and were defaulted to 0.0.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unmatched feature names: {}", .names.join(", "))]
pub struct UnmatchedFeatures {
    pub names: Vec<String>,
}
