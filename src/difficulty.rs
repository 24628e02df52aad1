use serde::{Deserialize, Serialize};

/// Closed interval of candidate wait times before the panel turns ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    /// Returns None unless `0 < min_ms < max_ms`.
    pub fn new(min_ms: u64, max_ms: u64) -> Option<Self> {
        if min_ms > 0 && min_ms < max_ms {
            Some(Self { min_ms, max_ms })
        } else {
            None
        }
    }

    pub fn contains(&self, delay_ms: u64) -> bool {
        (self.min_ms..=self.max_ms).contains(&delay_ms)
    }

    /// Number of distinct integer delays in the range.
    pub fn span(&self) -> u64 {
        self.max_ms - self.min_ms + 1
    }
}

#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn delay_range(&self) -> DelayRange {
        match self {
            Difficulty::Easy => DelayRange {
                min_ms: 800,
                max_ms: 2200,
            },
            Difficulty::Medium => DelayRange {
                min_ms: 900,
                max_ms: 3500,
            },
            Difficulty::Hard => DelayRange {
                min_ms: 900,
                max_ms: 5200,
            },
        }
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 1.2,
            Difficulty::Hard => 1.5,
        }
    }

    /// Cycles easy -> medium -> hard -> easy, used by the difficulty hotkey.
    pub fn next(&self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }
}
