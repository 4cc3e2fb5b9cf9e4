use super::classifier::{Classifier, ModelBundle};
use super::feature_vector_builder::FeatureVectorBuilder;
use crate::domain::errors::InferenceError;
use crate::domain::market::IndicatorSnapshot;
use crate::domain::ml::{Decision, FeatureSchema, FeatureVector, Scaler};
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::{debug, warn};

/// A fitted scaler plus the classifiers trained on its output.
///
/// Each classifier is evaluated independently: a failure in one never
/// affects the decisions of the others.
pub struct ClassifierAdapter {
    scaler: Scaler,
    classifiers: BTreeMap<String, Box<dyn Classifier>>,
}

impl ClassifierAdapter {
    pub fn new(scaler: Scaler) -> Self {
        Self {
            scaler,
            classifiers: BTreeMap::new(),
        }
    }

    pub fn with_classifier(mut self, key: impl Into<String>, classifier: Box<dyn Classifier>) -> Self {
        self.classifiers.insert(key.into(), classifier);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, classifier: Box<dyn Classifier>) {
        self.classifiers.insert(key.into(), classifier);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.classifiers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }

    /// Scale once, then run every classifier, keeping each outcome separate.
    pub fn evaluate(&self, features: &FeatureVector) -> BTreeMap<String, Result<Decision, InferenceError>> {
        let scaled = self.scaler.transform(features.values());

        self.classifiers
            .iter()
            .map(|(key, classifier)| {
                let outcome = match &scaled {
                    Ok(input) => run_isolated(classifier.as_ref(), input).map(Decision::from_up),
                    Err(e) => Err(e.clone()),
                };
                (key.clone(), outcome)
            })
            .collect()
    }

    /// Decisions per classifier key; failures become `Unavailable`.
    pub fn decide_vector(&self, features: &FeatureVector) -> BTreeMap<String, Decision> {
        self.evaluate(features)
            .into_iter()
            .map(|(key, outcome)| {
                let decision = outcome.unwrap_or_else(|e| {
                    warn!("Classifier {} unavailable: {}", key, e);
                    Decision::Unavailable
                });
                (key, decision)
            })
            .collect()
    }

    pub fn decide(&self, schema: &FeatureSchema, snapshot: &IndicatorSnapshot) -> BTreeMap<String, Decision> {
        let features = FeatureVectorBuilder::build(schema, snapshot);
        let unmatched = features.unmatched();
        if !unmatched.is_empty() {
            debug!("Features defaulted to 0.0: {:?}", unmatched);
        }
        self.decide_vector(&features)
    }
}

fn run_isolated(classifier: &dyn Classifier, input: &[f64]) -> Result<bool, InferenceError> {
    catch_unwind(AssertUnwindSafe(|| classifier.predict_up(input))).unwrap_or_else(|_| {
        Err(InferenceError::Model {
            name: classifier.name().to_string(),
            reason: "panicked during inference".to_string(),
        })
    })
}

/// Run every classifier of `models` against `snapshot`, using `schema` for feature order.
pub fn decide(
    models: &ModelBundle,
    schema: &FeatureSchema,
    snapshot: &IndicatorSnapshot,
) -> BTreeMap<String, Decision> {
    models.adapter.decide(schema, snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::Indicator;
    use chrono::NaiveDate;

    /// Predicts up when the first scaled feature is above a threshold.
    struct Threshold(f64);

    impl Classifier for Threshold {
        fn predict_up(&self, features: &[f64]) -> Result<bool, InferenceError> {
            Ok(features[0] > self.0)
        }

        fn name(&self) -> &str {
            "threshold"
        }
    }

    struct Broken;

    impl Classifier for Broken {
        fn predict_up(&self, _features: &[f64]) -> Result<bool, InferenceError> {
            Err(InferenceError::Model {
                name: "broken".to_string(),
                reason: "weights missing".to_string(),
            })
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    struct Panicking;

    impl Classifier for Panicking {
        fn predict_up(&self, features: &[f64]) -> Result<bool, InferenceError> {
            Ok(features[99] > 0.0)
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    fn snapshot(rsi: f64) -> IndicatorSnapshot {
        IndicatorSnapshot::from_pairs(
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            &[(Indicator::Rsi, rsi)],
        )
    }

    #[test]
    fn test_buy_and_sell() {
        let adapter = ClassifierAdapter::new(Scaler::Identity)
            .with_classifier("low", Box::new(Threshold(40.0)))
            .with_classifier("high", Box::new(Threshold(60.0)));
        let schema = FeatureSchema::new(["RSI"]);

        let decisions = adapter.decide(&schema, &snapshot(50.0));
        assert_eq!(decisions["low"], Decision::Buy);
        assert_eq!(decisions["high"], Decision::Sell);
    }

    #[test]
    fn test_failures_are_isolated_per_classifier() {
        let adapter = ClassifierAdapter::new(Scaler::Identity)
            .with_classifier("ok", Box::new(Threshold(10.0)))
            .with_classifier("broken", Box::new(Broken))
            .with_classifier("panicking", Box::new(Panicking));
        let schema = FeatureSchema::new(["rsi"]);

        let decisions = adapter.decide(&schema, &snapshot(50.0));
        assert_eq!(decisions.len(), 3);
        assert_eq!(decisions["ok"], Decision::Buy);
        assert_eq!(decisions["broken"], Decision::Unavailable);
        assert_eq!(decisions["panicking"], Decision::Unavailable);
    }

    #[test]
    fn test_scaling_failure_marks_all_unavailable() {
        // Scaler fitted on two columns, schema supplies one
        let scaler = Scaler::fit_min_max(&[vec![0.0, 0.0], vec![100.0, 1.0]]).unwrap();
        let adapter = ClassifierAdapter::new(scaler)
            .with_classifier("a", Box::new(Threshold(0.5)))
            .with_classifier("b", Box::new(Threshold(0.1)));

        let features = FeatureVectorBuilder::build(&FeatureSchema::new(["rsi"]), &snapshot(50.0));
        let outcomes = adapter.evaluate(&features);
        assert!(matches!(
            outcomes["a"],
            Err(InferenceError::DimensionMismatch { expected: 2, actual: 1 })
        ));
        assert!(outcomes["b"].is_err());
    }

    #[test]
    fn test_scaler_applied_before_inference() {
        let scaler = Scaler::fit_min_max(&[vec![0.0], vec![100.0]]).unwrap();
        let adapter = ClassifierAdapter::new(scaler).with_classifier("m", Box::new(Threshold(0.55)));
        let schema = FeatureSchema::new(["rsi"]);

        // 50 scales to 0.5, 60 to 0.6
        assert_eq!(adapter.decide(&schema, &snapshot(50.0))["m"], Decision::Sell);
        assert_eq!(adapter.decide(&schema, &snapshot(60.0))["m"], Decision::Buy);
    }

    #[test]
    fn test_decide_with_bundle() {
        let bundle = ModelBundle::new(
            FeatureSchema::new(["rsi"]),
            ClassifierAdapter::new(Scaler::Identity).with_classifier("m", Box::new(Threshold(30.0))),
        );
        let decisions = decide(&bundle, &bundle.feature_schema, &snapshot(45.0));
        assert_eq!(decisions["m"], Decision::Buy);
    }
}
