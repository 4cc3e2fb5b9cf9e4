pub mod smartcore_classifier;

pub use smartcore_classifier::SmartCoreClassifier;
