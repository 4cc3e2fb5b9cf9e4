pub mod classifier;
pub mod classifier_adapter;
pub mod feature_vector_builder;
pub mod training;

pub use classifier::{Classifier, ModelBundle, ModelStore};
pub use classifier_adapter::{ClassifierAdapter, decide};
pub use feature_vector_builder::FeatureVectorBuilder;
pub use training::{ClassificationReport, TrainingSet, default_schema};
