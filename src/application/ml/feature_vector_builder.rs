use crate::domain::errors::UnmatchedFeatures;
use crate::domain::market::{Indicator, IndicatorSnapshot};
use crate::domain::ml::{FeatureSchema, FeatureSource, FeatureVector};

/// Stand-ins for any moving-average feature the snapshot does not carry, in priority order.
const SMA_FALLBACK_ORDER: [Indicator; 4] = [
    Indicator::Sma50,
    Indicator::Sma20,
    Indicator::Sma10,
    Indicator::Sma5,
];

/// Maps an indicator snapshot onto a classifier's feature schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureVectorBuilder;

impl FeatureVectorBuilder {
    /// One value per schema name, in schema order. Unresolvable names become 0.0.
    pub fn build(schema: &FeatureSchema, snapshot: &IndicatorSnapshot) -> FeatureVector {
        let mut vector = FeatureVector::with_capacity(schema.len());
        for name in schema.names() {
            let (value, source) = resolve(name, snapshot);
            vector.push(name, value, source);
        }
        vector
    }

    /// Like `build`, but fails when any name had to be defaulted.
    pub fn build_strict(
        schema: &FeatureSchema,
        snapshot: &IndicatorSnapshot,
    ) -> Result<FeatureVector, UnmatchedFeatures> {
        let vector = Self::build(schema, snapshot);
        let names = vector.unmatched();
        if names.is_empty() {
            Ok(vector)
        } else {
            Err(UnmatchedFeatures { names })
        }
    }
}

fn resolve(name: &str, snapshot: &IndicatorSnapshot) -> (f64, FeatureSource) {
    if let Some(ind) = Indicator::from_key(name) {
        return (snapshot.value(ind), FeatureSource::Direct(ind));
    }

    let lowered = name.to_ascii_lowercase();
    if lowered.contains("sma") {
        for ind in SMA_FALLBACK_ORDER {
            if let Some(value) = snapshot.get(ind.key()) {
                return (value, FeatureSource::SmaFallback(ind));
            }
        }
    }

    if lowered.contains("bb_width") {
        let middle = snapshot.value(Indicator::BbMiddle);
        let width = if middle == 0.0 {
            0.0
        } else {
            (snapshot.value(Indicator::BbUpper) - snapshot.value(Indicator::BbLower)) / middle
                * 100.0
        };
        return (width, FeatureSource::BbWidth);
    }

    (0.0, FeatureSource::Defaulted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot::from_pairs(
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            &[
                (Indicator::Sma5, 1.05),
                (Indicator::Sma10, 1.04),
                (Indicator::Sma20, 1.03),
                (Indicator::Sma50, 1.02),
                (Indicator::Rsi, 58.0),
                (Indicator::Macd, 0.002),
                (Indicator::BbUpper, 1.10),
                (Indicator::BbMiddle, 1.00),
                (Indicator::BbLower, 0.90),
            ],
        )
    }

    #[test]
    fn test_direct_lookup_is_case_insensitive() {
        let schema = FeatureSchema::new(["RSI", "MACD", "SMA_20"]);
        let fv = FeatureVectorBuilder::build(&schema, &snapshot());
        assert_eq!(fv.values(), &[58.0, 0.002, 1.03]);
        assert_eq!(fv.sources()[0], FeatureSource::Direct(Indicator::Rsi));
    }

    #[test]
    fn test_missing_sma_falls_back_to_sma_50() {
        let schema = FeatureSchema::new(["SMA_200"]);
        let fv = FeatureVectorBuilder::build(&schema, &snapshot());
        assert_eq!(fv.values(), &[1.02]);
        assert_eq!(fv.sources()[0], FeatureSource::SmaFallback(Indicator::Sma50));
        assert!(fv.unmatched().is_empty());
    }

    #[test]
    fn test_bb_width_is_derived() {
        let schema = FeatureSchema::new(["BB_Width"]);
        let fv = FeatureVectorBuilder::build(&schema, &snapshot());
        assert!((fv.values()[0] - 20.0).abs() < 1e-9);
        assert_eq!(fv.sources()[0], FeatureSource::BbWidth);
    }

    #[test]
    fn test_bb_width_zero_middle() {
        let snap = IndicatorSnapshot::from_pairs(
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            &[(Indicator::BbUpper, 1.0), (Indicator::BbLower, -1.0)],
        );
        let fv = FeatureVectorBuilder::build(&FeatureSchema::new(["bb_width"]), &snap);
        assert_eq!(fv.values(), &[0.0]);
    }

    #[test]
    fn test_unknown_names_default_to_zero_and_keep_length() {
        let schema = FeatureSchema::new(["RSI", "Momentum_Z", "Spread", "MACD"]);
        let fv = FeatureVectorBuilder::build(&schema, &snapshot());
        assert_eq!(fv.len(), schema.len());
        assert_eq!(fv.values(), &[58.0, 0.0, 0.0, 0.002]);
        assert_eq!(fv.unmatched(), vec!["Momentum_Z".to_string(), "Spread".to_string()]);
    }

    #[test]
    fn test_strict_build_reports_unmatched() {
        let schema = FeatureSchema::new(["RSI", "Momentum_Z"]);
        let err = FeatureVectorBuilder::build_strict(&schema, &snapshot()).unwrap_err();
        assert_eq!(err.names, vec!["Momentum_Z".to_string()]);

        let ok = FeatureVectorBuilder::build_strict(&FeatureSchema::new(["rsi"]), &snapshot());
        assert!(ok.is_ok());
    }

    #[test]
    fn test_empty_schema() {
        let fv = FeatureVectorBuilder::build(&FeatureSchema::new(Vec::<String>::new()), &snapshot());
        assert!(fv.is_empty());
    }
}
