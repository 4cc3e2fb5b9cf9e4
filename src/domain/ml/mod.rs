pub mod decision;
pub mod feature_schema;
pub mod scaler;

pub use decision::Decision;
pub use feature_schema::{FeatureSchema, FeatureSource, FeatureVector};
pub use scaler::Scaler;
