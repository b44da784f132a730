//! Game configuration loaded from YAML

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Top-level settings for a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Master seed. A fresh one is drawn when omitted.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub levels: LevelsConfig,
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub dice: DiceConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default = "default_extra_dice_grant")]
    pub extra_dice_grant: u32,
    /// When set, reaching the quota only readies the selection; the caller
    /// runs `process_selection` after its own animation.
    #[serde(default)]
    pub defer_processing: bool,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelsConfig {
    #[serde(default = "default_total_levels")]
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default = "default_total_tiles")]
    pub total_tiles: usize,
    /// The board is regenerated once fewer tiles than this remain available.
    #[serde(default = "default_refill_threshold")]
    pub refill_threshold: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiceProfile {
    /// First roll, low-dice rescue and six-drought rules only.
    Classic,
    /// Classic plus the progress-aware rules.
    Adaptive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiceConfig {
    #[serde(default = "default_profile")]
    pub profile: DiceProfile,
    #[serde(default = "default_bonus_die_chance")]
    pub bonus_die_chance: f64,
    /// Sixes only grant a bonus die while fewer dice than this remain.
    #[serde(default = "default_bonus_die_ceiling")]
    pub bonus_die_ceiling: u32,
    #[serde(default)]
    pub adaptive: AdaptiveConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveConfig {
    #[serde(default = "default_stuck_margin")]
    pub stuck_margin: f64,
    #[serde(default = "default_min_rolls_for_stuck")]
    pub min_rolls_for_stuck: u32,
    #[serde(default = "default_low_roll_max")]
    pub low_roll_max: u8,
    #[serde(default = "default_low_streak_len")]
    pub low_streak_len: u32,
    #[serde(default = "default_fast_progress_ratio")]
    pub fast_progress_ratio: f64,
    #[serde(default = "default_fast_progress_dice")]
    pub fast_progress_dice: u32,
    #[serde(default = "default_hard_level")]
    pub hard_level: u32,
    #[serde(default = "default_throttle_chance")]
    pub throttle_chance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_points_per_tile")]
    pub points_per_tile: u64,
    #[serde(default = "default_completion_bonus")]
    pub completion_bonus: u64,
    #[serde(default = "default_dice_bonus")]
    pub dice_bonus: u64,
    #[serde(default = "default_level_bonus")]
    pub level_bonus: u64,
}

/// Presentation pacing. The core never sleeps; runners may.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_roll_delay_ms")]
    pub roll_delay_ms: u64,
    #[serde(default = "default_process_delay_ms")]
    pub process_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_total_levels() -> u32 {
    100
}

fn default_total_tiles() -> usize {
    12
}

fn default_refill_threshold() -> usize {
    6
}

fn default_profile() -> DiceProfile {
    DiceProfile::Classic
}

fn default_bonus_die_chance() -> f64 {
    0.5
}

fn default_bonus_die_ceiling() -> u32 {
    15
}

fn default_stuck_margin() -> f64 {
    0.1
}

fn default_min_rolls_for_stuck() -> u32 {
    3
}

fn default_low_roll_max() -> u8 {
    2
}

fn default_low_streak_len() -> u32 {
    2
}

fn default_fast_progress_ratio() -> f64 {
    0.7
}

fn default_fast_progress_dice() -> u32 {
    10
}

fn default_hard_level() -> u32 {
    50
}

fn default_throttle_chance() -> f64 {
    0.3
}

fn default_points_per_tile() -> u64 {
    100
}

fn default_completion_bonus() -> u64 {
    500
}

fn default_dice_bonus() -> u64 {
    50
}

fn default_level_bonus() -> u64 {
    10
}

fn default_extra_dice_grant() -> u32 {
    3
}

fn default_roll_delay_ms() -> u64 {
    1_000
}

fn default_process_delay_ms() -> u64 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LevelsConfig {
    fn default() -> Self {
        Self {
            total: default_total_levels(),
        }
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            total_tiles: default_total_tiles(),
            refill_threshold: default_refill_threshold(),
        }
    }
}

impl Default for DiceConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            bonus_die_chance: default_bonus_die_chance(),
            bonus_die_ceiling: default_bonus_die_ceiling(),
            adaptive: AdaptiveConfig::default(),
        }
    }
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            stuck_margin: default_stuck_margin(),
            min_rolls_for_stuck: default_min_rolls_for_stuck(),
            low_roll_max: default_low_roll_max(),
            low_streak_len: default_low_streak_len(),
            fast_progress_ratio: default_fast_progress_ratio(),
            fast_progress_dice: default_fast_progress_dice(),
            hard_level: default_hard_level(),
            throttle_chance: default_throttle_chance(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            points_per_tile: default_points_per_tile(),
            completion_bonus: default_completion_bonus(),
            dice_bonus: default_dice_bonus(),
            level_bonus: default_level_bonus(),
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            roll_delay_ms: default_roll_delay_ms(),
            process_delay_ms: default_process_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: None,
            levels: LevelsConfig::default(),
            board: BoardConfig::default(),
            dice: DiceConfig::default(),
            scoring: ScoringConfig::default(),
            extra_dice_grant: default_extra_dice_grant(),
            defer_processing: false,
            pacing: PacingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl GameConfig {
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Classic rules with a fixed seed, as used by headless runs and tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn with_profile(mut self, profile: DiceProfile) -> Self {
        self.dice.profile = profile;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.levels.total == 0 {
            return Err(ConfigError::Validation(
                "levels.total must be greater than zero".into(),
            ));
        }
        if self.board.total_tiles == 0 {
            return Err(ConfigError::Validation(
                "board.total_tiles must be greater than zero".into(),
            ));
        }
        let chances = [
            ("dice.bonus_die_chance", self.dice.bonus_die_chance),
            (
                "dice.adaptive.throttle_chance",
                self.dice.adaptive.throttle_chance,
            ),
        ];
        for (name, value) in chances {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<GameConfig, ConfigError> {
        GameConfig::from_yaml(self.base_dir.join(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = GameConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.board.total_tiles, 12);
        assert_eq!(config.dice.profile, DiceProfile::Classic);
        assert_eq!(config.extra_dice_grant, 3);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = "seed: 7\ndice:\n  profile: adaptive\n  adaptive:\n    hard_level: 40\n";
        let config = GameConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.dice.profile, DiceProfile::Adaptive);
        assert_eq!(config.dice.adaptive.hard_level, 40);
        assert_eq!(config.dice.adaptive.throttle_chance, 0.3);
        assert_eq!(config.dice.bonus_die_ceiling, 15);
    }

    #[test]
    fn rejects_out_of_range_chance() {
        let err = GameConfig::from_yaml_str("dice:\n  bonus_die_chance: 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn yaml_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.yaml");
        let config = GameConfig::seeded(99).with_profile(DiceProfile::Adaptive);
        config.to_yaml(&path).unwrap();
        let loaded = ConfigLoader::new(dir.path()).load("game.yaml").unwrap();
        assert_eq!(loaded, config);
    }
}
