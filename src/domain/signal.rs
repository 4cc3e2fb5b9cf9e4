use crate::domain::market::IndicatorSnapshot;
use crate::domain::ml::Decision;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "UP"),
            Direction::Down => write!(f, "DOWN"),
        }
    }
}

/// The four rules voting on each snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteRule {
    /// SMA20 against SMA50
    Trend,
    /// RSI zones
    Momentum,
    /// MACD against its signal line
    Crossover,
    /// Close against SMA20
    PricePosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignalVote {
    pub rule: VoteRule,
    pub direction: Direction,
}

impl SignalVote {
    pub fn new(rule: VoteRule, direction: Direction) -> Self {
        Self { rule, direction }
    }

    pub fn up_if(rule: VoteRule, condition: bool) -> Self {
        let direction = if condition {
            Direction::Up
        } else {
            Direction::Down
        };
        Self { rule, direction }
    }
}

/// Stages that can abort a prediction request.
///
/// Signal aggregation and result assembly work on a validated snapshot and
/// cannot fail, so they have no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Fetch,
    ComputeIndicators,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::ComputeIndicators => "compute_indicators",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one prediction request. Built once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    pub symbol: String,
    pub direction: Direction,
    /// Share of UP votes, in percent.
    pub confidence: f64,
    pub probability_up: f64,
    pub probability_down: f64,
    pub price: f64,
    pub indicators: IndicatorSnapshot,
    pub votes: Vec<SignalVote>,
    /// Empty when the engine has no models attached.
    pub model_decisions: BTreeMap<String, Decision>,
    pub timestamp: DateTime<Utc>,
}
