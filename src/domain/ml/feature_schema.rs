use crate::domain::market::Indicator;
use serde::{Deserialize, Serialize};

/// Ordered feature names agreed between training and inference.
///
/// The order is the column order the scaler and classifiers were fitted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema(Vec<String>);

impl FeatureSchema {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// How a single feature value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "indicator")]
pub enum FeatureSource {
    Direct(Indicator),
    /// Requested moving average was missing; another SMA stood in.
    SmaFallback(Indicator),
    /// Band width derived from the Bollinger bands.
    BbWidth,
    /// Nothing matched; value is 0.0.
    Defaulted,
}

/// Feature values in schema order, one per schema name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
    sources: Vec<FeatureSource>,
}

impl FeatureVector {
    pub(crate) fn with_capacity(len: usize) -> Self {
        Self {
            names: Vec::with_capacity(len),
            values: Vec::with_capacity(len),
            sources: Vec::with_capacity(len),
        }
    }

    pub(crate) fn push(&mut self, name: &str, value: f64, source: FeatureSource) {
        self.names.push(name.to_string());
        self.values.push(value);
        self.sources.push(source);
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn sources(&self) -> &[FeatureSource] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Names that resolved to nothing and were defaulted to 0.0.
    pub fn unmatched(&self) -> Vec<String> {
        self.names
            .iter()
            .zip(&self.sources)
            .filter(|(_, src)| **src == FeatureSource::Defaulted)
            .map(|(name, _)| name.clone())
            .collect()
    }
}
