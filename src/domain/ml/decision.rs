use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-classifier outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Buy,
    Sell,
    /// Scaling or inference failed for this classifier.
    Unavailable,
}

impl Decision {
    /// Class 1 of the training target means the next close was higher.
    pub fn from_up(up: bool) -> Self {
        if up { Decision::Buy } else { Decision::Sell }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Buy => write!(f, "BUY"),
            Decision::Sell => write!(f, "SELL"),
            Decision::Unavailable => write!(f, "UNAVAILABLE"),
        }
    }
}
