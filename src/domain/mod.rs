// Price series and indicator snapshots
pub mod market;

// Feature schemas, scalers and model decisions
pub mod ml;

// Port interfaces
pub mod ports;

// Votes, stages and prediction results
pub mod signal;

// Domain-specific error types
pub mod errors;
