//! Best time and leaderboard, persisted through a [`KvStore`].
//!
//! Storage failures never interrupt play: they are logged and the in-memory
//! copy stays authoritative for the rest of the run.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::engine::{EngineEvent, RoundResult};
use crate::scoring::is_new_best;
use crate::store::{KvStore, Result, StoreError};

pub const BEST_TIME_KEY: &str = "bestTime";
pub const LEADERBOARD_KEY: &str = "leaderboard";
pub const MAX_LEADERBOARD_ENTRIES: usize = 10;
pub const DEFAULT_PLAYER: &str = "Player";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    /// Best reaction time in ms at the moment of saving (0 if none)
    pub score: u64,
    pub date: NaiveDate,
}

pub struct Records {
    store: Box<dyn KvStore>,
    best_ms: Option<u64>,
    leaderboard: Vec<LeaderboardEntry>,
}

impl Records {
    /// Loads both records, defaulting whatever cannot be read.
    pub fn load(store: Box<dyn KvStore>) -> Self {
        let best_ms = read_json::<u64>(&*store, BEST_TIME_KEY).unwrap_or_else(|e| {
            log::warn!("could not load best time: {}", e);
            None
        });
        let leaderboard = read_json::<Vec<LeaderboardEntry>>(&*store, LEADERBOARD_KEY)
            .unwrap_or_else(|e| {
                log::warn!("could not load leaderboard: {}", e);
                None
            })
            .unwrap_or_default();

        Self {
            store,
            best_ms,
            leaderboard,
        }
    }

    pub fn best_time(&self) -> Option<u64> {
        self.best_ms
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    /// Updates the best time from a round result. Returns true on a new best.
    pub fn record(&mut self, result: &RoundResult) -> bool {
        if !is_new_best(result.reaction_ms, self.best_ms) {
            return false;
        }
        self.best_ms = result.reaction_ms;
        persist(&mut *self.store, BEST_TIME_KEY, &self.best_ms);
        true
    }

    /// Feeds engine events through; only round results matter here.
    pub fn observe(&mut self, event: &EngineEvent) {
        if let EngineEvent::RoundResolved(result) = event {
            self.record(result);
        }
    }

    /// Appends the current best under `name`, keeping the newest entries.
    pub fn save_best(&mut self, name: Option<&str>) -> &LeaderboardEntry {
        self.save_best_on(name, Local::now().date_naive())
    }

    pub fn save_best_on(&mut self, name: Option<&str>, date: NaiveDate) -> &LeaderboardEntry {
        let name = match name.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => DEFAULT_PLAYER.to_string(),
        };
        self.leaderboard.push(LeaderboardEntry {
            name,
            score: self.best_ms.unwrap_or(0),
            date,
        });
        if self.leaderboard.len() > MAX_LEADERBOARD_ENTRIES {
            let excess = self.leaderboard.len() - MAX_LEADERBOARD_ENTRIES;
            self.leaderboard.drain(..excess);
        }
        persist(&mut *self.store, LEADERBOARD_KEY, &self.leaderboard);
        &self.leaderboard[self.leaderboard.len() - 1]
    }

    pub fn clear_leaderboard(&mut self) {
        self.leaderboard.clear();
        if let Err(e) = self.store.remove(LEADERBOARD_KEY) {
            log::warn!("could not clear leaderboard: {}", e);
        }
    }
}

fn persist<T: Serialize>(store: &mut dyn KvStore, key: &str, value: &T) {
    let written = serde_json::to_string(value)
        .map_err(StoreError::from)
        .and_then(|json| store.set(key, &json));
    if let Err(e) = written {
        log::warn!("could not persist {}: {}", key, e);
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(store: &dyn KvStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}
