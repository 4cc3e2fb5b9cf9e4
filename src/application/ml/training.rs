use super::feature_vector_builder::FeatureVectorBuilder;
use crate::application::indicators::IndicatorFrame;
use crate::domain::errors::InferenceError;
use crate::domain::ml::{FeatureSchema, Scaler};
use serde::Serialize;
use smartcore::metrics::{accuracy, f1, precision, recall};

/// Feature columns the bundled training binary uses by default.
/// `SMA_200` resolves through the moving-average fallback.
pub const DEFAULT_FEATURES: [&str; 19] = [
    "SMA_10",
    "SMA_20",
    "SMA_50",
    "SMA_200",
    "RSI",
    "MACD",
    "MACD_Signal",
    "MACD_Hist",
    "BB_Upper",
    "BB_Lower",
    "BB_Middle",
    "BB_Width",
    "Daily_Return",
    "Intraday_Range",
    "Gap",
    "Volatility",
    "ATR",
    "ROC_5",
    "ROC_10",
];

pub fn default_schema() -> FeatureSchema {
    FeatureSchema::new(DEFAULT_FEATURES)
}

/// Labelled rows: features in schema order, `true` when the next close is higher.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    pub features: Vec<Vec<f64>>,
    pub up: Vec<bool>,
}

impl TrainingSet {
    /// One row per frame row except the last, which has no next close.
    /// Features go through the same builder as inference.
    pub fn from_frame(frame: &IndicatorFrame, schema: &FeatureSchema) -> Self {
        let rows = frame.rows();
        let mut set = Self::default();
        for pair in rows.windows(2) {
            set.features
                .push(FeatureVectorBuilder::build(schema, &pair[0]).values().to_vec());
            set.up.push(pair[1].price() > pair[0].price());
        }
        set
    }

    pub fn len(&self) -> usize {
        self.up.len()
    }

    pub fn is_empty(&self) -> bool {
        self.up.is_empty()
    }

    pub fn up_count(&self) -> usize {
        self.up.iter().filter(|u| **u).count()
    }

    pub fn extend(&mut self, other: TrainingSet) {
        self.features.extend(other.features);
        self.up.extend(other.up);
    }

    /// Oldest rows for training, newest `test_fraction` for evaluation.
    pub fn split_chronological(&self, test_fraction: f64) -> (TrainingSet, TrainingSet) {
        let test_len = ((self.len() as f64) * test_fraction.clamp(0.0, 1.0)).round() as usize;
        let cut = self.len() - test_len.min(self.len());
        (
            TrainingSet {
                features: self.features[..cut].to_vec(),
                up: self.up[..cut].to_vec(),
            },
            TrainingSet {
                features: self.features[cut..].to_vec(),
                up: self.up[cut..].to_vec(),
            },
        )
    }

    pub fn scaled(&self, scaler: &Scaler) -> Result<TrainingSet, InferenceError> {
        Ok(TrainingSet {
            features: self
                .features
                .iter()
                .map(|row| scaler.transform(row))
                .collect::<Result<_, _>>()?,
            up: self.up.clone(),
        })
    }
}

/// Hold-out scores, with UP as the positive class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub rows: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl ClassificationReport {
    /// `None` when there are no rows or the lengths differ.
    pub fn evaluate(predicted: &[bool], actual: &[bool]) -> Option<Self> {
        if predicted.is_empty() || predicted.len() != actual.len() {
            return None;
        }
        let classes = |v: &[bool]| v.iter().map(|&u| i32::from(u)).collect::<Vec<i32>>();
        let labels = |v: &[bool]| v.iter().map(|&u| f64::from(u8::from(u))).collect::<Vec<f64>>();
        let (y_true, y_pred) = (labels(actual), labels(predicted));

        // No UP predictions and no UP labels leave F1 undefined
        let f1_score = f1(&y_true, &y_pred, 1.0);
        Some(Self {
            rows: predicted.len(),
            accuracy: accuracy(&classes(actual), &classes(predicted)),
            precision: precision(&y_true, &y_pred),
            recall: recall(&y_true, &y_pred),
            f1: if f1_score.is_finite() { f1_score } else { 0.0 },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::indicators::IndicatorEngine;
    use crate::domain::market::{OhlcBar, OhlcSeries};
    use chrono::{Duration, NaiveDate};

    fn frame() -> IndicatorFrame {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = (0..80)
            .map(|i| {
                let c = 100.0 + (i as f64 * 0.7).sin() * 3.0;
                OhlcBar::new(start + Duration::days(i), c, c + 1.0, c - 1.0, c)
            })
            .collect();
        IndicatorEngine::default()
            .compute_frame(&OhlcSeries::new(bars).unwrap())
            .unwrap()
    }

    #[test]
    fn test_labels_follow_next_close() {
        let frame = frame();
        let set = TrainingSet::from_frame(&frame, &default_schema());
        assert_eq!(set.len(), frame.len() - 1);
        assert!(set.features.iter().all(|row| row.len() == DEFAULT_FEATURES.len()));

        let rows = frame.rows();
        for (i, up) in set.up.iter().enumerate() {
            assert_eq!(*up, rows[i + 1].price() > rows[i].price());
        }
    }

    #[test]
    fn test_chronological_split_keeps_order() {
        let set = TrainingSet::from_frame(&frame(), &default_schema());
        let (train, test) = set.split_chronological(0.2);
        assert_eq!(train.len() + test.len(), set.len());
        assert_eq!(test.len(), (set.len() as f64 * 0.2).round() as usize);
        assert_eq!(train.features[0], set.features[0]);
        assert_eq!(test.features.last(), set.features.last());
    }

    #[test]
    fn test_classification_report() {
        let predicted = [true, true, false, false, true];
        let actual = [true, false, false, true, true];
        let report = ClassificationReport::evaluate(&predicted, &actual).unwrap();

        // 2 true positives, 1 false positive, 1 false negative, 1 true negative
        assert_eq!(report.rows, 5);
        assert!((report.accuracy - 0.6).abs() < 1e-12);
        assert!((report.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.f1 - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_report_without_up_calls() {
        let report = ClassificationReport::evaluate(&[false, false], &[true, false]).unwrap();
        assert_eq!(report.accuracy, 0.5);
        assert_eq!(report.precision, 0.0);
        assert_eq!(report.recall, 0.0);
        assert_eq!(report.f1, 0.0);

        assert!(ClassificationReport::evaluate(&[], &[]).is_none());
        assert!(ClassificationReport::evaluate(&[true], &[true, false]).is_none());
    }
}
