use serde::{Deserialize, Serialize};

use crate::difficulty::Difficulty;

pub const DEFAULT_SESSION_SECS: u32 = 30;
pub const TICK_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub duration_secs: u32,
    pub difficulty: Difficulty,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_SESSION_SECS,
            difficulty: Difficulty::Easy,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub seconds_remaining: u32,
    pub is_running: bool,
    pub score: u32,
    pub combo: u32,
}

/// Result of advancing the session clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    /// Nothing happened: not running, or no whole second elapsed.
    Idle,
    Running(u32),
    /// The countdown reached zero. Reported once per `start`.
    Expired,
}

/// One-second countdown bounding a play session
#[derive(Debug, Clone)]
pub struct SessionClock {
    duration_secs: u32,
    state: SessionState,
    next_tick_at_ms: Option<u64>,
    expiry_reported: bool,
}

impl SessionClock {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            duration_secs,
            state: SessionState {
                seconds_remaining: duration_secs,
                ..SessionState::default()
            },
            next_tick_at_ms: None,
            expiry_reported: false,
        }
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// Takes effect on the next `start`.
    pub fn set_duration(&mut self, duration_secs: u32) {
        self.duration_secs = duration_secs;
    }

    /// Resets the countdown and the score. Restarts if already running.
    pub fn start(&mut self, now_ms: u64) {
        self.state = SessionState {
            seconds_remaining: self.duration_secs,
            is_running: true,
            score: 0,
            combo: 0,
        };
        self.next_tick_at_ms = Some(now_ms + TICK_INTERVAL_MS);
        self.expiry_reported = false;
    }

    /// Halts ticking, keeping the remaining time.
    pub fn pause(&mut self) {
        self.state.is_running = false;
        self.next_tick_at_ms = None;
    }

    pub fn stop(&mut self) {
        self.pause();
    }

    /// Continues a paused countdown. Returns false when there is no time left.
    pub fn resume(&mut self, now_ms: u64) -> bool {
        if self.state.is_running {
            return true;
        }
        if self.state.seconds_remaining == 0 || self.expiry_reported {
            return false;
        }
        self.state.is_running = true;
        self.next_tick_at_ms = Some(now_ms + TICK_INTERVAL_MS);
        true
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> ClockTick {
        if !self.state.is_running {
            return ClockTick::Idle;
        }

        self.state.seconds_remaining = self.state.seconds_remaining.saturating_sub(1);
        if self.state.seconds_remaining > 0 {
            return ClockTick::Running(self.state.seconds_remaining);
        }

        self.state.is_running = false;
        self.next_tick_at_ms = None;
        if self.expiry_reported {
            ClockTick::Idle
        } else {
            self.expiry_reported = true;
            ClockTick::Expired
        }
    }

    /// Runs every tick whose deadline has passed by `now_ms`.
    pub fn poll(&mut self, now_ms: u64) -> ClockTick {
        let mut last = ClockTick::Idle;
        while let Some(due) = self.next_tick_at_ms {
            if now_ms < due {
                break;
            }
            last = self.tick();
            if last == ClockTick::Expired {
                break;
            }
            self.next_tick_at_ms = Some(due + TICK_INTERVAL_MS);
        }
        last
    }

    pub fn record_hit(&mut self, points: u32) {
        self.state.score = self.state.score.saturating_add(points);
        self.state.combo += 1;
    }

    pub fn record_miss(&mut self, penalty: u32) {
        self.state.score = self.state.score.saturating_sub(penalty);
        self.state.combo = 0;
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.state.seconds_remaining
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_SECS)
    }
}
