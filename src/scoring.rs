use crate::difficulty::Difficulty;

pub const DEFAULT_EARLY_PENALTY: u32 = 5;

/// Points for an on-time click: `round(max(1, 1000 / ms) * multiplier)`.
///
/// A 0 ms reaction counts as 1 ms. Combo does not feed into points.
pub fn points(reaction_ms: u64, difficulty: Difficulty) -> u32 {
    let ms = reaction_ms.max(1) as f64;
    ((1000.0 / ms).max(1.0) * difficulty.multiplier()).round() as u32
}

/// True iff `reaction_ms` beats the prior best (or there is none yet).
pub fn is_new_best(reaction_ms: Option<u64>, prior_best_ms: Option<u64>) -> bool {
    match (reaction_ms, prior_best_ms) {
        (Some(_), None) => true,
        (Some(t), Some(best)) => t < best,
        (None, _) => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scorer {
    penalty: u32,
}

impl Scorer {
    pub fn new(penalty: u32) -> Self {
        Self { penalty }
    }

    pub fn score(&self, reaction_ms: u64, difficulty: Difficulty) -> u32 {
        points(reaction_ms, difficulty)
    }

    pub fn penalty(&self) -> u32 {
        self.penalty
    }

    /// Deducts the penalty from `total`, never going below zero.
    pub fn apply_penalty(&self, total: u32) -> u32 {
        total.saturating_sub(self.penalty)
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(DEFAULT_EARLY_PENALTY)
    }
}
