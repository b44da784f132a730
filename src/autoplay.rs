//! Headless player used by the CLI runner and by the integration tests.

use std::{collections::BTreeMap, thread, time::Duration};

use crate::{
    board::{Board, TileId},
    catalog::Category,
    config::PacingConfig,
    session::{LevelSession, LevelStatus},
    targets::Targets,
};

/// Upper bound on rolls within one attempt, in case a bonus-die streak keeps
/// the level alive far longer than any real game would.
const MAX_ROLLS_PER_ATTEMPT: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pacing {
    pub roll_delay: Duration,
    pub process_delay: Duration,
}

impl Pacing {
    pub fn headless() -> Self {
        Self::default()
    }

    pub fn from_config(config: &PacingConfig) -> Self {
        Self {
            roll_delay: Duration::from_millis(config.roll_delay_ms),
            process_delay: Duration::from_millis(config.process_delay_ms),
        }
    }
}

/// Picks `count` available tiles, taking what unfinished targets still need
/// first and filling up with anything else.
pub fn choose_tiles(board: &Board, targets: &Targets, count: usize) -> Vec<TileId> {
    let mut wanted: BTreeMap<Category, u32> = targets
        .iter()
        .map(|(category, target)| (category, target.remaining()))
        .collect();
    let mut picks = Vec::with_capacity(count);
    let mut rest = Vec::new();
    for tile in board.available() {
        match wanted.get_mut(&tile.category) {
            Some(need) if *need > 0 && picks.len() < count => {
                *need -= 1;
                picks.push(tile.id);
            }
            _ => rest.push(tile.id),
        }
    }
    let missing = count.saturating_sub(picks.len());
    picks.extend(rest.into_iter().take(missing));
    picks
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelReport {
    pub level: u32,
    pub attempt: u32,
    pub status: LevelStatus,
    pub rolls: usize,
    pub dice_left: u32,
    pub score: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub levels_won: u32,
    pub gave_up: bool,
    pub final_score: u64,
    pub reports: Vec<LevelReport>,
}

pub struct Autoplayer {
    pacing: Pacing,
    max_attempts: u32,
}

impl Autoplayer {
    pub fn new(pacing: Pacing, max_attempts: u32) -> Self {
        Self {
            pacing,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn headless() -> Self {
        Self::new(Pacing::headless(), 3)
    }

    /// Plays the running level until it is won or lost.
    pub fn play_level(&self, session: &mut LevelSession) -> LevelStatus {
        let mut rolls = 0;
        while session.status() == LevelStatus::Playing && rolls < MAX_ROLLS_PER_ATTEMPT {
            rolls += 1;
            if session.request_roll().is_err() {
                break;
            }
            pause(self.pacing.roll_delay);

            let picks = choose_tiles(session.board(), session.targets(), session.quota() as usize);
            for id in picks {
                if session.toggle_tile_selection(id).is_err() {
                    break;
                }
            }
            if session.config().defer_processing {
                pause(self.pacing.process_delay);
                if session.process_selection().is_err() {
                    break;
                }
            }
        }
        session.status()
    }

    /// Plays `levels` levels in a row starting at the session's current level,
    /// retrying failed levels up to the attempt limit.
    pub fn run<F>(&self, session: &mut LevelSession, levels: u32, mut on_level_end: F) -> RunSummary
    where
        F: FnMut(&LevelSession, &LevelReport),
    {
        let mut summary = RunSummary::default();
        if session.status() == LevelStatus::Idle {
            session.start_level(session.level());
        }

        let mut attempt = 1;
        while summary.levels_won < levels {
            let status = self.play_level(session);
            let report = LevelReport {
                level: session.level(),
                attempt,
                status,
                rolls: session.roll_history().len(),
                dice_left: session.dice_count(),
                score: session.score(),
            };
            on_level_end(session, &report);
            summary.reports.push(report);

            match status {
                LevelStatus::Won { .. } => {
                    summary.levels_won += 1;
                    attempt = 1;
                    if summary.levels_won < levels && session.continue_to_next_level().is_err() {
                        break;
                    }
                }
                _ if attempt < self.max_attempts => {
                    attempt += 1;
                    session.reset_level();
                }
                _ => {
                    summary.gave_up = true;
                    break;
                }
            }
        }
        summary.final_score = session.score();
        summary
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::GameConfig, targets::Target};

    #[test]
    fn choose_tiles_prefers_unfinished_targets() {
        let mut session = LevelSession::new(GameConfig::seeded(31));
        session.start_level(1);
        let (category, _) = session.targets().iter().next().map(|(c, t)| (c, *t)).unwrap();
        let on_board = session
            .board()
            .available()
            .filter(|tile| tile.category == category)
            .count();

        let picks = choose_tiles(session.board(), session.targets(), 6);
        assert_eq!(picks.len(), 6);
        let matching = picks
            .iter()
            .filter(|id| session.board().get(**id).map(|t| t.category) == Some(category))
            .count();
        let need = session.targets().get(category).unwrap().needed as usize;
        assert!(matching >= on_board.min(need));
    }

    #[test]
    fn choose_tiles_skips_finished_targets() {
        let mut session = LevelSession::new(GameConfig::seeded(32));
        session.start_level(1);
        let category = session.targets().iter().next().map(|(c, _)| c).unwrap();
        *session.targets_mut().get_mut(category).unwrap() = Target {
            needed: 3,
            collected: 3,
        };
        let picks = choose_tiles(session.board(), session.targets(), 2);
        let expected: Vec<TileId> = session.board().available().take(2).map(|t| t.id).collect();
        assert_eq!(picks, expected);
    }
}
