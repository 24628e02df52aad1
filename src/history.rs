use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::difficulty::Difficulty;
use crate::engine::{Outcome, RoundResult};
use crate::store::Result;

/// One row of the reaction history CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub date: DateTime<Local>,
    pub difficulty: Difficulty,
    pub outcome: Outcome,
    pub reaction_ms: Option<u64>,
    pub points: i64,
}

impl From<&RoundResult> for HistoryRecord {
    fn from(result: &RoundResult) -> Self {
        Self {
            date: result.timestamp,
            difficulty: result.difficulty,
            outcome: result.outcome,
            reaction_ms: result.reaction_ms,
            points: result.points,
        }
    }
}

/// Append-only log of every resolved round
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::with_path(AppDirs::history_path().unwrap_or_else(|| PathBuf::from("reflex_history.csv")))
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, result: &RoundResult) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // A header is only written when the file is new
        let needs_header = !self.path.exists();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(HistoryRecord::from(result))?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<HistoryRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut records = Vec::new();
        for row in reader.deserialize() {
            records.push(row?);
        }
        Ok(records)
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new()
    }
}
