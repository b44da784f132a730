//! Level session: owns one level's lifecycle and every piece of mutable game
//! state. Player commands go through here and return `Result`s; a rejected
//! command leaves the state untouched and emits a warning message.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    board::{Board, TileId, TileStatus},
    catalog::Category,
    config::GameConfig,
    dice::{DiceAi, RollContext, RollOutcome},
    events::{GameEvent, MessageKind},
    rng::{RandomSource, RngManager},
    snapshot::SessionSnapshot,
    targets::{generate_targets, Targets},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("No level in progress")]
    LevelNotActive,
    #[error("Level is not complete yet")]
    LevelNotWon,
    #[error("No dice left! Reset level.")]
    NoDiceLeft,
    #[error("Process selected tiles first!")]
    SelectionPending,
    #[error("Roll dice first!")]
    NoQuota,
    #[error("Select only {0} tiles")]
    QuotaFull(u32),
    #[error("Select {0} more tiles")]
    SelectionIncomplete(u32),
    #[error("Tile already used")]
    TileUsed,
    #[error("No tile with id {0}")]
    UnknownTile(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LevelStatus {
    /// No level started yet.
    Idle,
    Playing,
    Won { stars: u8, bonus: u64 },
    Failed { percent: u32 },
}

impl LevelStatus {
    pub fn is_over(self) -> bool {
        matches!(self, LevelStatus::Won { .. } | LevelStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub tile: TileId,
    pub selected: bool,
    pub ready: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessReport {
    pub points: u64,
    /// Amount credited to each target, after capping.
    pub applied: BTreeMap<Category, u32>,
    pub completed: Vec<Category>,
    pub refilled: bool,
}

/// Starting dice for a level.
pub fn dice_for_level(level: u32) -> u32 {
    match level {
        0..=9 => 20,
        10..=29 => 18,
        30..=49 => 16,
        50..=69 => 14,
        70..=89 => 12,
        _ => 10,
    }
}

/// Stars from the share of starting dice left over.
pub fn star_rating(remaining: u32, starting: u32) -> u8 {
    if starting == 0 {
        return 1;
    }
    let ratio = (remaining as f64 / starting as f64).min(1.0);
    match ratio {
        r if r >= 0.8 => 5,
        r if r >= 0.6 => 4,
        r if r >= 0.4 => 3,
        r if r >= 0.2 => 2,
        _ => 1,
    }
}

pub struct LevelSession {
    config: GameConfig,
    rng: RngManager,
    level: u32,
    status: LevelStatus,
    dice_count: u32,
    starting_dice: u32,
    score: u64,
    quota: u32,
    selected: Vec<TileId>,
    board: Board,
    targets: Targets,
    dice: DiceAi,
    events: Vec<GameEvent>,
}

impl LevelSession {
    pub fn new(config: GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => RngManager::new(seed),
            None => RngManager::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    pub fn with_rng(config: GameConfig, rng: RngManager) -> Self {
        let dice = DiceAi::from_config(&config.dice);
        Self {
            config,
            rng,
            level: 1,
            status: LevelStatus::Idle,
            dice_count: 0,
            starting_dice: 0,
            score: 0,
            quota: 0,
            selected: Vec::new(),
            board: Board::default(),
            targets: Targets::default(),
            dice,
            events: Vec::new(),
        }
    }

    pub fn start_level(&mut self, level: u32) {
        let total = self.config.levels.total.max(1);
        self.level = (level.max(1) - 1) % total + 1;
        self.status = LevelStatus::Playing;
        self.dice_count = dice_for_level(self.level);
        self.starting_dice = self.dice_count;
        self.quota = 0;
        self.selected.clear();
        self.dice = DiceAi::from_config(&self.config.dice);
        self.targets = generate_targets(self.level, &mut self.rng.stream("targets"));
        self.board = Board::generate(self.config.board.total_tiles, &mut self.rng.stream("board"));

        log::info!(
            "level {} started: {} dice, {} targets, {} tiles",
            self.level,
            self.dice_count,
            self.targets.len(),
            self.board.len()
        );
        self.emit(GameEvent::LevelStarted {
            level: self.level,
            dice: self.dice_count,
        });
        self.emit_board();
        self.emit_targets();
        self.emit_dice_count();
        self.emit(GameEvent::ScoreChanged { score: self.score });
        self.message(format!("LEVEL {} - Good luck!", self.level), MessageKind::Info);
    }

    pub fn request_roll(&mut self) -> Result<u8, Rejection> {
        if self.status != LevelStatus::Playing {
            return self.reject(Rejection::LevelNotActive);
        }
        if self.dice_count == 0 {
            return self.reject(Rejection::NoDiceLeft);
        }
        if self.quota > 0 {
            return self.reject(Rejection::SelectionPending);
        }

        self.dice_count -= 1;
        let context = RollContext {
            dice_remaining: self.dice_count,
            starting_dice: self.starting_dice,
            level: self.level,
            progress: self.targets.progress(),
        };
        let RollOutcome {
            value, bonus_die, ..
        } = self.dice.roll(context, &mut self.rng.stream("dice"));
        if bonus_die {
            self.dice_count = self.dice_count.saturating_add(1);
        }

        let available = self.board.available_count() as u32;
        let quota = value as u32;
        if quota > available {
            log::warn!("quota {quota} exceeds {available} available tiles, clamping");
        }
        self.quota = quota.min(available);
        self.board.clear_selection();
        self.selected.clear();

        self.emit(GameEvent::DiceRolled { value });
        self.emit_dice_count();
        self.message(
            format!("Rolled: {value}. Select {} tiles.", self.quota),
            MessageKind::Info,
        );
        if bonus_die {
            self.message("Lucky six! +1 bonus die", MessageKind::Success);
        }
        if self.quota == 0 {
            self.evaluate_completion();
        }
        Ok(value)
    }

    pub fn toggle_tile_selection(&mut self, id: TileId) -> Result<ToggleOutcome, Rejection> {
        if self.status != LevelStatus::Playing {
            return self.reject(Rejection::LevelNotActive);
        }
        if self.quota == 0 {
            return self.reject(Rejection::NoQuota);
        }
        let status = match self.board.get(id) {
            Some(tile) => tile.status,
            None => return self.reject(Rejection::UnknownTile(id.raw())),
        };

        let selected = match status {
            TileStatus::Used => return self.reject(Rejection::TileUsed),
            TileStatus::Selected => {
                self.selected.retain(|tile| *tile != id);
                self.set_tile_status(id, TileStatus::Available);
                false
            }
            TileStatus::Available => {
                if self.selected.len() as u32 >= self.quota {
                    return self.reject(Rejection::QuotaFull(self.quota));
                }
                self.selected.push(id);
                self.set_tile_status(id, TileStatus::Selected);
                true
            }
        };

        self.emit(GameEvent::SelectionChanged {
            selected: self.selected.clone(),
            quota: self.quota,
        });
        let ready = self.selected.len() as u32 == self.quota;
        if ready && !self.config.defer_processing {
            self.process_selection()?;
        }
        Ok(ToggleOutcome {
            tile: id,
            selected,
            ready,
        })
    }

    pub fn process_selection(&mut self) -> Result<ProcessReport, Rejection> {
        if self.selected.is_empty() {
            return Ok(ProcessReport::default());
        }
        let picked = self.selected.len() as u32;
        if picked < self.quota {
            return self.reject(Rejection::SelectionIncomplete(self.quota - picked));
        }
        if picked > self.quota {
            log::warn!("selection of {picked} exceeds quota {}, truncating", self.quota);
            for id in self.selected.split_off(self.quota as usize) {
                self.set_tile_status(id, TileStatus::Available);
            }
        }

        let mut counts: BTreeMap<Category, u32> = BTreeMap::new();
        for id in &self.selected {
            if let Some(tile) = self.board.get(*id) {
                *counts.entry(tile.category).or_insert(0) += 1;
            }
        }

        let scoring = self.config.scoring.clone();
        let mut report = ProcessReport::default();
        for (category, count) in counts {
            let Some(target) = self.targets.get_mut(category) else {
                continue;
            };
            let was_complete = target.is_complete();
            let applied = target.collect(count);
            report.points += applied as u64 * scoring.points_per_tile;
            report.applied.insert(category, applied);
            if !was_complete && target.is_complete() {
                report.points += scoring.completion_bonus;
                report.completed.push(category);
            }
        }

        for id in std::mem::take(&mut self.selected) {
            self.set_tile_status(id, TileStatus::Used);
        }
        self.quota = 0;
        self.score += report.points;

        self.emit_targets();
        for category in &report.completed {
            self.message(
                format!(
                    "{category} completed! +{} bonus",
                    scoring.completion_bonus
                ),
                MessageKind::Success,
            );
        }
        self.emit(GameEvent::ScoreChanged { score: self.score });
        self.message(format!("+{} points!", report.points), MessageKind::Info);

        if self.board.available_count() < self.config.board.refill_threshold {
            self.board =
                Board::generate(self.config.board.total_tiles, &mut self.rng.stream("board"));
            report.refilled = true;
            log::debug!("board refilled with {} tiles", self.board.len());
            self.emit_board();
        }

        self.evaluate_completion();
        Ok(report)
    }

    /// Settles the level once every target is met, or once the dice are gone
    /// with no selection pending.
    pub fn evaluate_completion(&mut self) -> LevelStatus {
        if self.status != LevelStatus::Playing {
            return self.status;
        }
        if self.targets.all_complete() {
            let stars = star_rating(self.dice_count, self.starting_dice);
            let bonus = self.dice_count as u64 * self.config.scoring.dice_bonus
                + self.level as u64 * self.config.scoring.level_bonus;
            self.score += bonus;
            self.status = LevelStatus::Won { stars, bonus };
            log::info!(
                "level {} complete: {stars} stars, bonus {bonus}, score {}",
                self.level,
                self.score
            );
            self.emit(GameEvent::LevelCompleted { stars, bonus });
            self.emit(GameEvent::ScoreChanged { score: self.score });
            self.message(
                format!("LEVEL {} COMPLETE! Bonus: +{bonus} points", self.level),
                MessageKind::Success,
            );
        } else if self.dice_count == 0 && self.quota == 0 {
            let percent = self.targets.completion_percent();
            self.status = LevelStatus::Failed { percent };
            log::info!("level {} failed at {percent}%", self.level);
            self.emit(GameEvent::LevelFailed { percent });
            self.message(
                format!("Out of dice! Level failed. You collected {percent}% of targets."),
                MessageKind::Error,
            );
        }
        self.status
    }

    pub fn continue_to_next_level(&mut self) -> Result<u32, Rejection> {
        if !matches!(self.status, LevelStatus::Won { .. }) {
            return self.reject(Rejection::LevelNotWon);
        }
        let next = if self.level >= self.config.levels.total {
            1
        } else {
            self.level + 1
        };
        self.start_level(next);
        Ok(self.level)
    }

    /// Replays the current level from scratch; the score is kept.
    pub fn reset_level(&mut self) {
        self.start_level(self.level);
        self.message("Level reset!", MessageKind::Info);
    }

    pub fn return_home(&mut self) {
        self.score = 0;
        self.start_level(1);
        self.message("Returned to level 1", MessageKind::Info);
    }

    /// Adds dice to the running level. A failed level resumes play.
    pub fn grant_bonus_dice(&mut self, count: u32) -> u32 {
        self.dice_count = self.dice_count.saturating_add(count);
        self.emit_dice_count();
        self.message(format!("+{count} dice added!"), MessageKind::Success);
        if matches!(self.status, LevelStatus::Failed { .. }) && self.dice_count > 0 {
            self.status = LevelStatus::Playing;
            log::info!("level {} resumed with {} dice", self.level, self.dice_count);
        }
        self.dice_count
    }

    pub fn grant_extra_dice(&mut self) -> u32 {
        self.grant_bonus_dice(self.config.extra_dice_grant)
    }

    /// Points at a random unfinished target.
    pub fn hint(&mut self) -> Option<(Category, u32)> {
        let incomplete = self.targets.incomplete();
        if incomplete.is_empty() {
            self.message("All targets complete!", MessageKind::Success);
            return None;
        }
        let category = incomplete[self.rng.stream("hints").index(incomplete.len())];
        let remaining = self.targets.get(category).map(|t| t.remaining()).unwrap_or(0);
        self.message(
            format!("Hint: Focus on {category}. Need {remaining} more."),
            MessageKind::Info,
        );
        Some((category, remaining))
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            taken_at: chrono::Utc::now(),
            seed: self.rng.seed(),
            level: self.level,
            status: self.status,
            dice_count: self.dice_count,
            starting_dice: self.starting_dice,
            score: self.score,
            quota: self.quota,
            selected: self.selected.clone(),
            targets: self.targets.clone(),
            roll_history: self.dice.history().to_vec(),
            tiles: self.board.tiles().to_vec(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn status(&self) -> LevelStatus {
        self.status
    }

    pub fn dice_count(&self) -> u32 {
        self.dice_count
    }

    pub fn starting_dice(&self) -> u32 {
        self.starting_dice
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn quota(&self) -> u32 {
        self.quota
    }

    pub fn selected(&self) -> &[TileId] {
        &self.selected
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn targets(&self) -> &Targets {
        &self.targets
    }

    pub fn targets_mut(&mut self) -> &mut Targets {
        &mut self.targets
    }

    pub fn roll_history(&self) -> &[u8] {
        self.dice.history()
    }

    pub fn dice_ai(&self) -> &DiceAi {
        &self.dice
    }

    fn set_tile_status(&mut self, id: TileId, status: TileStatus) {
        if let Some(tile) = self.board.get_mut(id) {
            tile.status = status;
        }
    }

    fn reject<T>(&mut self, rejection: Rejection) -> Result<T, Rejection> {
        log::debug!("rejected: {rejection}");
        self.message(rejection.to_string(), MessageKind::Warning);
        Err(rejection)
    }

    fn message(&mut self, text: impl Into<String>, kind: MessageKind) {
        self.emit(GameEvent::message(text, kind));
    }

    fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    fn emit_board(&mut self) {
        self.emit(GameEvent::BoardGenerated {
            tiles: self.board.tiles().to_vec(),
        });
    }

    fn emit_targets(&mut self) {
        self.emit(GameEvent::TargetsUpdated {
            targets: self.targets.clone(),
        });
    }

    fn emit_dice_count(&mut self) {
        self.emit(GameEvent::DiceCountChanged {
            remaining: self.dice_count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dice_table_breakpoints() {
        assert_eq!(dice_for_level(1), 20);
        assert_eq!(dice_for_level(9), 20);
        assert_eq!(dice_for_level(10), 18);
        assert_eq!(dice_for_level(29), 18);
        assert_eq!(dice_for_level(49), 16);
        assert_eq!(dice_for_level(69), 14);
        assert_eq!(dice_for_level(89), 12);
        assert_eq!(dice_for_level(90), 10);
        assert_eq!(dice_for_level(100), 10);
    }

    #[test]
    fn star_tiers() {
        assert_eq!(star_rating(20, 20), 5);
        assert_eq!(star_rating(16, 20), 5);
        assert_eq!(star_rating(12, 20), 4);
        assert_eq!(star_rating(8, 20), 3);
        assert_eq!(star_rating(4, 20), 2);
        assert_eq!(star_rating(3, 20), 1);
        assert_eq!(star_rating(25, 20), 5);
        assert_eq!(star_rating(0, 0), 1);
    }

    #[test]
    fn rejected_commands_emit_warning_without_state_change() {
        let mut session = LevelSession::new(GameConfig::seeded(1));
        assert_eq!(session.request_roll(), Err(Rejection::LevelNotActive));

        session.start_level(1);
        session.drain_events();
        assert_eq!(
            session.toggle_tile_selection(TileId::new(0)),
            Err(Rejection::NoQuota)
        );
        let events = session.drain_events();
        assert!(matches!(
            events.as_slice(),
            [GameEvent::Message {
                kind: MessageKind::Warning,
                ..
            }]
        ));
        assert_eq!(session.dice_count(), 20);
    }

    #[test]
    fn dice_grants_saturate() {
        let mut session = LevelSession::new(GameConfig::seeded(3));
        session.start_level(1);
        assert_eq!(session.grant_bonus_dice(u32::MAX), u32::MAX);
        assert_eq!(session.grant_bonus_dice(u32::MAX), u32::MAX);
        assert_eq!(session.status(), LevelStatus::Playing);
        assert!(session.request_roll().is_ok());
        assert_eq!(session.dice_count(), u32::MAX - 1);
    }

    #[test]
    fn level_numbers_wrap_into_range() {
        let mut session = LevelSession::new(GameConfig::seeded(2));
        session.start_level(101);
        assert_eq!(session.level(), 1);
        session.start_level(0);
        assert_eq!(session.level(), 1);
        session.start_level(100);
        assert_eq!(session.level(), 100);
        assert_eq!(session.dice_count(), 10);
    }
}
