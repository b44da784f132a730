//! Adaptive die ("Dice AI")
//!
//! Every roll walks an ordered list of [`RollRule`]s. The first rule that
//! matches (and passes its own chance gate) supplies the face distribution;
//! a uniform die is used when none match. Sixes reset the drought counter and
//! may grant a bonus die to the session.

use crate::{
    config::{AdaptiveConfig, DiceConfig, DiceProfile},
    rng::RandomSource,
};

pub const FACES: u8 = 6;

/// Rolls credited as "since the last six" before any six has been rolled,
/// on top of the roll index. Puts the drought rule in reach from roll 2.
pub const NO_SIX_HEAD_START: u32 = 4;

/// Weighted face table for a single roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Distribution {
    pub faces: [u8; 6],
    pub weights: [u32; 6],
}

impl Distribution {
    pub const UNIFORM: Distribution = Distribution {
        faces: [1, 2, 3, 4, 5, 6],
        weights: [1, 1, 1, 1, 1, 1],
    };

    /// Opening roll, leaning to a decent quota.
    pub const OPENING: Distribution = Distribution {
        faces: [4, 5, 6, 3, 2, 1],
        weights: [25, 25, 20, 15, 10, 5],
    };

    pub const RESCUE: Distribution = Distribution {
        faces: [6, 5, 4, 3, 2, 1],
        weights: [40, 20, 15, 10, 10, 5],
    };

    pub const DROUGHT: Distribution = Distribution {
        faces: [6, 1, 2, 3, 4, 5],
        weights: [35, 13, 13, 13, 13, 13],
    };

    pub const HIGH_LEANING: Distribution = Distribution {
        faces: [6, 5, 4, 3, 2, 1],
        weights: [25, 25, 20, 15, 10, 5],
    };

    pub const LOW_LEANING: Distribution = Distribution {
        faces: [1, 2, 3, 4, 5, 6],
        weights: [25, 25, 20, 15, 10, 5],
    };

    pub fn sample<R: RandomSource>(&self, rng: &mut R) -> u8 {
        rng.weighted(&self.faces, &self.weights)
    }

    pub fn probability(&self, face: u8) -> f64 {
        let total: u32 = self.weights.iter().sum();
        if total == 0 {
            return 0.0;
        }
        let hit: u32 = self
            .faces
            .iter()
            .zip(self.weights)
            .filter(|(f, _)| **f == face)
            .map(|(_, w)| w)
            .sum();
        hit as f64 / total as f64
    }
}

/// Session facts the die may react to, taken at the moment of the roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollContext {
    /// Dice left after this roll has been spent.
    pub dice_remaining: u32,
    pub starting_dice: u32,
    pub level: u32,
    /// Collected over needed across all targets, in `[0, 1]`.
    pub progress: f64,
}

/// What a rule sees when deciding whether it applies.
#[derive(Debug, Clone, Copy)]
pub struct RollView {
    /// 1-based index of the roll being made.
    pub roll_index: u32,
    pub rolls_since_six: u32,
    pub low_streak: u32,
    pub stuck: bool,
    pub context: RollContext,
}

pub trait RollRule {
    fn name(&self) -> &'static str;

    fn evaluate(&self, view: &RollView) -> Option<Distribution>;

    /// Probability that a matching rule is actually applied.
    fn chance(&self) -> f64 {
        1.0
    }
}

pub struct OpeningRoll;

impl RollRule for OpeningRoll {
    fn name(&self) -> &'static str {
        "opening"
    }

    fn evaluate(&self, view: &RollView) -> Option<Distribution> {
        (view.roll_index == 1).then_some(Distribution::OPENING)
    }
}

pub struct LowDiceRescue {
    pub max_dice: u32,
    pub min_rolls_since_six: u32,
}

impl Default for LowDiceRescue {
    fn default() -> Self {
        Self {
            max_dice: 3,
            min_rolls_since_six: 2,
        }
    }
}

impl RollRule for LowDiceRescue {
    fn name(&self) -> &'static str {
        "low_dice_rescue"
    }

    fn evaluate(&self, view: &RollView) -> Option<Distribution> {
        let low = view.context.dice_remaining <= self.max_dice;
        (low && view.rolls_since_six > self.min_rolls_since_six).then_some(Distribution::RESCUE)
    }
}

pub struct SixDrought {
    pub max_rolls_since_six: u32,
}

impl Default for SixDrought {
    fn default() -> Self {
        Self {
            max_rolls_since_six: 5,
        }
    }
}

impl RollRule for SixDrought {
    fn name(&self) -> &'static str {
        "six_drought"
    }

    fn evaluate(&self, view: &RollView) -> Option<Distribution> {
        (view.rolls_since_six > self.max_rolls_since_six).then_some(Distribution::DROUGHT)
    }
}

/// Helps a player trailing the expected pace or stuck on low faces.
pub struct Struggling {
    pub low_streak_len: u32,
}

impl RollRule for Struggling {
    fn name(&self) -> &'static str {
        "struggling"
    }

    fn evaluate(&self, view: &RollView) -> Option<Distribution> {
        let streak = self.low_streak_len > 0 && view.low_streak >= self.low_streak_len;
        (view.stuck || streak).then_some(Distribution::HIGH_LEANING)
    }
}

/// Slows down players who are far ahead, and every player on hard levels.
pub struct Throttle {
    pub fast_progress_ratio: f64,
    pub fast_progress_dice: u32,
    pub hard_level: u32,
    pub chance: f64,
}

impl RollRule for Throttle {
    fn name(&self) -> &'static str {
        "throttle"
    }

    fn evaluate(&self, view: &RollView) -> Option<Distribution> {
        let ctx = &view.context;
        let fast =
            ctx.progress > self.fast_progress_ratio && ctx.dice_remaining > self.fast_progress_dice;
        (fast || ctx.level > self.hard_level).then_some(Distribution::LOW_LEANING)
    }

    fn chance(&self) -> f64 {
        self.chance
    }
}

/// Thresholds for the derived "stuck" flag and low-roll streak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressTracking {
    pub stuck_margin: f64,
    pub min_rolls_for_stuck: u32,
    pub low_roll_max: u8,
}

impl ProgressTracking {
    fn from_adaptive(config: &AdaptiveConfig) -> Self {
        Self {
            stuck_margin: config.stuck_margin,
            min_rolls_for_stuck: config.min_rolls_for_stuck,
            low_roll_max: config.low_roll_max,
        }
    }

    fn is_stuck(&self, rolls_so_far: u32, context: &RollContext) -> bool {
        if rolls_so_far < self.min_rolls_for_stuck || context.starting_dice == 0 {
            return false;
        }
        let expected = (rolls_so_far as f64 / context.starting_dice as f64).min(1.0);
        context.progress + self.stuck_margin < expected
    }
}

impl Default for ProgressTracking {
    fn default() -> Self {
        Self::from_adaptive(&AdaptiveConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BonusDiePolicy {
    pub chance: f64,
    /// Bonus dice are only granted while fewer dice than this remain.
    pub ceiling: u32,
}

impl Default for BonusDiePolicy {
    fn default() -> Self {
        Self {
            chance: 0.5,
            ceiling: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollOutcome {
    pub value: u8,
    pub roll_index: u32,
    /// Name of the rule that shaped the roll, `"uniform"` when none did.
    pub rule: &'static str,
    pub bonus_die: bool,
}

pub struct DiceAiBuilder {
    rules: Vec<Box<dyn RollRule>>,
    bonus: BonusDiePolicy,
    tracking: ProgressTracking,
}

impl DiceAiBuilder {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            bonus: BonusDiePolicy::default(),
            tracking: ProgressTracking::default(),
        }
    }

    pub fn with_rule(mut self, rule: impl RollRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn push_rule(&mut self, rule: impl RollRule + 'static) {
        self.rules.push(Box::new(rule));
    }

    pub fn bonus_die(mut self, bonus: BonusDiePolicy) -> Self {
        self.bonus = bonus;
        self
    }

    pub fn tracking(mut self, tracking: ProgressTracking) -> Self {
        self.tracking = tracking;
        self
    }

    pub fn build(self) -> DiceAi {
        DiceAi {
            rules: self.rules,
            bonus: self.bonus,
            tracking: self.tracking,
            history: Vec::new(),
            last_six_at: None,
            low_streak: 0,
            stuck: false,
        }
    }
}

impl Default for DiceAiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-level die. Replaced whenever a level starts or is reset.
pub struct DiceAi {
    rules: Vec<Box<dyn RollRule>>,
    bonus: BonusDiePolicy,
    tracking: ProgressTracking,
    history: Vec<u8>,
    last_six_at: Option<u32>,
    low_streak: u32,
    stuck: bool,
}

impl DiceAi {
    pub fn builder() -> DiceAiBuilder {
        DiceAiBuilder::new()
    }

    pub fn classic() -> Self {
        Self::classic_builder().build()
    }

    fn classic_builder() -> DiceAiBuilder {
        DiceAiBuilder::new()
            .with_rule(OpeningRoll)
            .with_rule(LowDiceRescue::default())
            .with_rule(SixDrought::default())
    }

    pub fn from_config(config: &DiceConfig) -> Self {
        let adaptive = &config.adaptive;
        let mut builder = Self::classic_builder()
            .bonus_die(BonusDiePolicy {
                chance: config.bonus_die_chance,
                ceiling: config.bonus_die_ceiling,
            })
            .tracking(ProgressTracking::from_adaptive(adaptive));
        if config.profile == DiceProfile::Adaptive {
            builder.push_rule(Struggling {
                low_streak_len: adaptive.low_streak_len,
            });
            builder.push_rule(Throttle {
                fast_progress_ratio: adaptive.fast_progress_ratio,
                fast_progress_dice: adaptive.fast_progress_dice,
                hard_level: adaptive.hard_level,
                chance: adaptive.throttle_chance,
            });
        }
        builder.build()
    }

    pub fn history(&self) -> &[u8] {
        &self.history
    }

    /// Index of the latest six this level, if any.
    pub fn last_six_at(&self) -> Option<u32> {
        self.last_six_at
    }

    pub fn low_streak(&self) -> u32 {
        self.low_streak
    }

    pub fn is_stuck(&self) -> bool {
        self.stuck
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn roll<R: RandomSource>(&mut self, context: RollContext, rng: &mut R) -> RollOutcome {
        let rolls_so_far = self.history.len() as u32;
        let roll_index = rolls_so_far + 1;
        self.stuck = self.tracking.is_stuck(rolls_so_far, &context);

        let view = RollView {
            roll_index,
            rolls_since_six: match self.last_six_at {
                Some(at) => roll_index - at,
                None => roll_index + NO_SIX_HEAD_START,
            },
            low_streak: self.low_streak,
            stuck: self.stuck,
            context,
        };

        let mut chosen = ("uniform", Distribution::UNIFORM);
        for rule in &self.rules {
            if let Some(distribution) = rule.evaluate(&view) {
                let chance = rule.chance();
                if chance >= 1.0 || rng.chance(chance) {
                    chosen = (rule.name(), distribution);
                    break;
                }
            }
        }
        let (rule, distribution) = chosen;
        let value = distribution.sample(rng);

        let mut bonus_die = false;
        if value == FACES {
            self.last_six_at = Some(roll_index);
            bonus_die = context.dice_remaining < self.bonus.ceiling && rng.chance(self.bonus.chance);
        }

        self.history.push(value);
        if value <= self.tracking.low_roll_max {
            self.low_streak += 1;
        } else {
            self.low_streak = 0;
        }

        log::debug!("roll #{roll_index} -> {value} via {rule} (bonus die: {bonus_die})");
        RollOutcome {
            value,
            roll_index,
            rule,
            bonus_die,
        }
    }
}

impl Default for DiceAi {
    fn default() -> Self {
        Self::classic()
    }
}
