use serde::{Deserialize, Serialize};

use crate::{
    board::{Tile, TileId},
    targets::Targets,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Info,
    Warning,
    Error,
    Success,
}

/// Notifications for the presentation layer, drained from the session after
/// each command.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    LevelStarted { level: u32, dice: u32 },
    BoardGenerated { tiles: Vec<Tile> },
    TargetsUpdated { targets: Targets },
    DiceRolled { value: u8 },
    DiceCountChanged { remaining: u32 },
    SelectionChanged { selected: Vec<TileId>, quota: u32 },
    ScoreChanged { score: u64 },
    LevelCompleted { stars: u8, bonus: u64 },
    LevelFailed { percent: u32 },
    Message { text: String, kind: MessageKind },
}

impl GameEvent {
    pub fn message(text: impl Into<String>, kind: MessageKind) -> Self {
        GameEvent::Message {
            text: text.into(),
            kind,
        }
    }
}
