use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::difficulty::Difficulty;
use crate::engine::{EngineConfig, DEFAULT_COUNTDOWN_SECS, DEFAULT_NEXT_ROUND_DELAY_MS};
use crate::scoring::DEFAULT_EARLY_PENALTY;
use crate::session::{SessionConfig, DEFAULT_SESSION_SECS};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub duration_secs: u32,
    pub difficulty: Difficulty,
    pub countdown_secs: u32,
    pub next_round_delay_ms: u64,
    pub early_penalty: u32,
    pub muted: bool,
    pub player_name: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_SESSION_SECS,
            difficulty: Difficulty::Easy,
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            next_round_delay_ms: DEFAULT_NEXT_ROUND_DELAY_MS,
            early_penalty: DEFAULT_EARLY_PENALTY,
            muted: false,
            player_name: None,
        }
    }
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            duration_secs: self.duration_secs.max(1),
            difficulty: self.difficulty,
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            session: self.session_config(),
            countdown_secs: self.countdown_secs,
            next_round_delay_ms: self.next_round_delay_ms,
            early_penalty: self.early_penalty,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|e| {
                log::warn!("ignoring unreadable config {}: {}", self.path.display(), e);
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
