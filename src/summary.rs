use itertools::{Itertools, MinMaxResult};
use serde::Serialize;

use crate::engine::{Outcome, RoundResult};
use crate::util::{mean_ms, median_ms, std_dev_ms};

/// End-of-session report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    pub rounds: usize,
    pub on_time: usize,
    pub early: usize,
    pub score: u32,
    pub best_ms: Option<u64>,
    pub worst_ms: Option<u64>,
    pub mean_ms: Option<f64>,
    pub median_ms: Option<f64>,
    pub std_dev_ms: Option<f64>,
}

impl SessionSummary {
    pub fn from_results(results: &[RoundResult], score: u32) -> Self {
        let reactions: Vec<u64> = results.iter().filter_map(|r| r.reaction_ms).collect();
        let early = results
            .iter()
            .filter(|r| r.outcome == Outcome::EarlyClick)
            .count();

        let (best_ms, worst_ms) = match reactions.iter().minmax() {
            MinMaxResult::NoElements => (None, None),
            MinMaxResult::OneElement(&t) => (Some(t), Some(t)),
            MinMaxResult::MinMax(&lo, &hi) => (Some(lo), Some(hi)),
        };

        Self {
            rounds: results.len(),
            on_time: reactions.len(),
            early,
            score,
            best_ms,
            worst_ms,
            mean_ms: mean_ms(&reactions),
            median_ms: median_ms(&reactions),
            std_dev_ms: std_dev_ms(&reactions),
        }
    }

    /// Share of rounds resolved on time, 0-100.
    pub fn accuracy(&self) -> f64 {
        if self.rounds == 0 {
            0.0
        } else {
            (self.on_time as f64 / self.rounds as f64 * 100.0).round()
        }
    }
}
