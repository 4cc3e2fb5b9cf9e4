use crate::domain::errors::InferenceError;
use serde::{Deserialize, Serialize};

/// Feature scaling fitted at training time and replayed before inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Scaler {
    Identity,
    /// Maps each column to [0, 1] using the training minimum and maximum.
    MinMax { data_min: Vec<f64>, data_max: Vec<f64> },
    /// Subtracts the training mean and divides by the training deviation.
    Standard { mean: Vec<f64>, scale: Vec<f64> },
}

impl Scaler {
    /// Fit a min-max scaler over training rows. Returns `None` for no rows or ragged rows.
    pub fn fit_min_max(rows: &[Vec<f64>]) -> Option<Scaler> {
        let width = rows.first()?.len();
        if rows.iter().any(|r| r.len() != width) {
            return None;
        }
        let mut data_min = vec![f64::INFINITY; width];
        let mut data_max = vec![f64::NEG_INFINITY; width];
        for row in rows {
            for (i, v) in row.iter().enumerate() {
                data_min[i] = data_min[i].min(*v);
                data_max[i] = data_max[i].max(*v);
            }
        }
        Some(Scaler::MinMax { data_min, data_max })
    }

    /// Number of columns expected, `None` for identity.
    pub fn width(&self) -> Option<usize> {
        match self {
            Scaler::Identity => None,
            Scaler::MinMax { data_min, .. } => Some(data_min.len()),
            Scaler::Standard { mean, .. } => Some(mean.len()),
        }
    }

    pub fn transform(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        if let Some(index) = features.iter().position(|v| !v.is_finite()) {
            return Err(InferenceError::NonFiniteInput { index });
        }
        if let Some(expected) = self.width()
            && expected != features.len()
        {
            return Err(InferenceError::DimensionMismatch {
                expected,
                actual: features.len(),
            });
        }

        let scaled = match self {
            Scaler::Identity => features.to_vec(),
            Scaler::MinMax { data_min, data_max } => features
                .iter()
                .zip(data_min.iter().zip(data_max))
                .map(|(x, (lo, hi))| {
                    // Constant training column: scale of 1, like sklearn.
                    let range = if hi - lo == 0.0 { 1.0 } else { hi - lo };
                    (x - lo) / range
                })
                .collect(),
            Scaler::Standard { mean, scale } => features
                .iter()
                .zip(mean.iter().zip(scale))
                .map(|(x, (m, s))| {
                    let s = if *s == 0.0 { 1.0 } else { *s };
                    (x - m) / s
                })
                .collect(),
        };
        Ok(scaled)
    }
}
