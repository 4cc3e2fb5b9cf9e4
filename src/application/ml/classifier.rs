use super::classifier_adapter::ClassifierAdapter;
use crate::domain::errors::InferenceError;
use crate::domain::ml::FeatureSchema;
use anyhow::Result;

/// Interface for trained binary classifiers.
pub trait Classifier: Send + Sync {
    /// `true` when the model predicts the next close above the current one.
    /// Receives features already scaled.
    fn predict_up(&self, features: &[f64]) -> Result<bool, InferenceError>;

    /// Get model name/type
    fn name(&self) -> &str;
}

/// Everything needed to run the classifiers of one artifact.
pub struct ModelBundle {
    pub feature_schema: FeatureSchema,
    pub adapter: ClassifierAdapter,
}

impl ModelBundle {
    pub fn new(feature_schema: FeatureSchema, adapter: ClassifierAdapter) -> Self {
        Self {
            feature_schema,
            adapter,
        }
    }
}

/// Source of trained artifacts, keyed by model name (e.g. the currency pair).
pub trait ModelStore: Send + Sync {
    /// `Ok(None)` when no artifact exists for the key.
    fn load(&self, key: &str) -> Result<Option<ModelBundle>>;
}
