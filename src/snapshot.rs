use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::{
    board::{Tile, TileId},
    session::LevelStatus,
    targets::Targets,
};

/// Plain-data view of a session, ready for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub taken_at: DateTime<Utc>,
    pub seed: u64,
    pub level: u32,
    pub status: LevelStatus,
    pub dice_count: u32,
    pub starting_dice: u32,
    pub score: u64,
    pub quota: u32,
    pub selected: Vec<TileId>,
    pub targets: Targets,
    pub roll_history: Vec<u8>,
    pub tiles: Vec<Tile>,
}

impl SessionSnapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes numbered JSON snapshots into one directory.
pub struct SnapshotWriter {
    output_dir: PathBuf,
    written: u64,
}

impl SnapshotWriter {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            written: 0,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn write(&mut self, snapshot: &SessionSnapshot) -> Result<PathBuf, SnapshotError> {
        fs::create_dir_all(&self.output_dir)?;
        self.written += 1;
        let file_path = self.output_dir.join(format!(
            "snapshot_{:04}_level_{:03}.json",
            self.written, snapshot.level
        ));
        fs::write(&file_path, snapshot.to_json()?)?;
        Ok(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::GameConfig, session::LevelSession};

    #[test]
    fn writes_numbered_json_files() {
        let temp = tempfile::tempdir().unwrap();
        let mut session = LevelSession::new(GameConfig::seeded(12));
        session.start_level(4);
        let mut writer = SnapshotWriter::new(temp.path().join("snaps"));

        let first = writer.write(&session.snapshot()).unwrap();
        let second = writer.write(&session.snapshot()).unwrap();
        assert!(first.ends_with("snapshot_0001_level_004.json"));
        assert!(second.ends_with("snapshot_0002_level_004.json"));

        let data = fs::read_to_string(first).unwrap();
        let value: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(value["level"], 4);
        assert_eq!(value["dice_count"], 20);
        assert_eq!(value["status"]["status"], "playing");
        assert_eq!(value["tiles"].as_array().map(|t| t.len()), Some(12));
        assert!(value["targets"].as_object().is_some());
    }
}
