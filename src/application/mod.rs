// Indicator computation over daily bars
pub mod indicators;

// Feature assembly and classifier evaluation
pub mod ml;

// Rule voting
pub mod signal_aggregator;

// Fetch → indicators → signal → result
pub mod prediction_pipeline;
