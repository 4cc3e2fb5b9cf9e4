use crate::domain::market::{Indicator, IndicatorSnapshot};
use crate::domain::signal::{Direction, SignalVote, VoteRule};
use serde::Serialize;

const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;
const RSI_MIDLINE: f64 = 50.0;

/// Number of UP votes needed for an UP call; a 2-2 split resolves to UP.
const UP_QUORUM: usize = 2;

/// Rule-voting result for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedSignal {
    pub direction: Direction,
    /// Percentage of UP votes, whatever the final direction.
    pub confidence: f64,
    pub votes: Vec<SignalVote>,
}

impl AggregatedSignal {
    pub fn up_votes(&self) -> usize {
        self.votes
            .iter()
            .filter(|v| v.direction == Direction::Up)
            .count()
    }

    /// `(probability_up, probability_down)`, mirrored around the chosen direction.
    ///
    /// The probability of the chosen direction is the confidence, which is an
    /// UP-vote share. A DOWN call with one UP vote therefore reports a 25%
    /// probability of going down.
    pub fn probabilities(&self) -> (f64, f64) {
        match self.direction {
            Direction::Up => (self.confidence, 100.0 - self.confidence),
            Direction::Down => (100.0 - self.confidence, self.confidence),
        }
    }
}

/// Turns an indicator snapshot into a direction by majority of four rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalAggregator;

impl SignalAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn votes(&self, snapshot: &IndicatorSnapshot) -> Vec<SignalVote> {
        let sma_20 = snapshot.value(Indicator::Sma20);
        let sma_50 = snapshot.value(Indicator::Sma50);
        let rsi = snapshot.rsi();
        let macd = snapshot.value(Indicator::Macd);
        let macd_signal = snapshot.value(Indicator::MacdSignal);

        vec![
            SignalVote::up_if(VoteRule::Trend, sma_20 > sma_50),
            SignalVote::new(VoteRule::Momentum, momentum_direction(rsi)),
            SignalVote::up_if(VoteRule::Crossover, macd > macd_signal),
            SignalVote::up_if(VoteRule::PricePosition, snapshot.price() > sma_20),
        ]
    }

    pub fn aggregate(&self, snapshot: &IndicatorSnapshot) -> AggregatedSignal {
        let votes = self.votes(snapshot);
        let up = votes.iter().filter(|v| v.direction == Direction::Up).count();
        let direction = if up >= UP_QUORUM {
            Direction::Up
        } else {
            Direction::Down
        };
        AggregatedSignal {
            direction,
            confidence: up as f64 / votes.len() as f64 * 100.0,
            votes,
        }
    }
}

fn momentum_direction(rsi: f64) -> Direction {
    if rsi > RSI_OVERBOUGHT {
        Direction::Down
    } else if rsi < RSI_OVERSOLD {
        Direction::Up
    } else if rsi > RSI_MIDLINE {
        Direction::Up
    } else {
        Direction::Down
    }
}
