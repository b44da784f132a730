use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    catalog::{category_count, Category},
    rng::RandomSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub needed: u32,
    pub collected: u32,
}

impl Target {
    pub fn new(needed: u32) -> Self {
        Self {
            needed,
            collected: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.collected >= self.needed
    }

    pub fn remaining(&self) -> u32 {
        self.needed.saturating_sub(self.collected)
    }

    /// Adds up to `amount`, capped at `needed`. Returns what was applied.
    pub fn collect(&mut self, amount: u32) -> u32 {
        let before = self.collected;
        self.collected = before.saturating_add(amount).min(self.needed);
        self.collected - before
    }
}

/// Collection targets of the running level, keyed by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Targets(BTreeMap<Category, Target>);

impl Targets {
    pub fn get(&self, category: Category) -> Option<&Target> {
        self.0.get(&category)
    }

    pub fn get_mut(&mut self, category: Category) -> Option<&mut Target> {
        self.0.get_mut(&category)
    }

    pub fn insert(&mut self, category: Category, target: Target) {
        self.0.insert(category, target);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &Target)> {
        self.0.iter().map(|(category, target)| (*category, target))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn all_complete(&self) -> bool {
        self.0.values().all(Target::is_complete)
    }

    pub fn incomplete(&self) -> Vec<Category> {
        self.iter()
            .filter(|(_, target)| !target.is_complete())
            .map(|(category, _)| category)
            .collect()
    }

    pub fn total_needed(&self) -> u32 {
        self.0.values().map(|t| t.needed).sum()
    }

    pub fn total_collected(&self) -> u32 {
        self.0.values().map(|t| t.collected).sum()
    }

    /// Share of all targets collected, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let needed = self.total_needed();
        if needed == 0 {
            return 1.0;
        }
        self.total_collected() as f64 / needed as f64
    }

    pub fn completion_percent(&self) -> u32 {
        (self.progress() * 100.0).round() as u32
    }
}

/// How many categories a level asks for.
pub fn category_count_for_level(level: u32) -> usize {
    let wanted = match level {
        0..=9 => 1,
        10..=29 => 2,
        30..=49 => 3,
        _ => 4,
    };
    wanted.min(category_count())
}

pub fn base_needed(level: u32) -> u32 {
    level / 3 + 3
}

pub fn generate_targets<R: RandomSource>(level: u32, rng: &mut R) -> Targets {
    let wanted = category_count_for_level(level);
    let mut chosen: Vec<Category> = Vec::with_capacity(wanted);
    while chosen.len() < wanted {
        let category = Category::ALL[rng.index(Category::ALL.len())];
        if !chosen.contains(&category) {
            chosen.push(category);
        }
    }

    let base = base_needed(level);
    let variance = ((base as f64 * 0.3).floor() as u32).max(1);
    let mut targets = Targets::default();
    for category in chosen {
        let bonus = rng.uniform_int(0, variance - 1);
        targets.insert(category, Target::new(base + bonus));
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn breakpoints_pick_category_count() {
        assert_eq!(category_count_for_level(1), 1);
        assert_eq!(category_count_for_level(9), 1);
        assert_eq!(category_count_for_level(10), 2);
        assert_eq!(category_count_for_level(29), 2);
        assert_eq!(category_count_for_level(30), 3);
        assert_eq!(category_count_for_level(49), 3);
        assert_eq!(category_count_for_level(50), 4);
        assert_eq!(category_count_for_level(100), 4);
    }

    #[test]
    fn needed_stays_inside_base_and_variance() {
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        for level in 1..=100 {
            let targets = generate_targets(level, &mut rng);
            assert_eq!(targets.len(), category_count_for_level(level));
            let base = base_needed(level);
            let variance = ((base as f64 * 0.3).floor() as u32).max(1);
            for (_, target) in targets.iter() {
                assert!(target.needed >= base);
                assert!(target.needed < base + variance);
                assert_eq!(target.collected, 0);
            }
        }
    }

    #[test]
    fn collect_caps_at_needed() {
        let mut target = Target::new(4);
        assert_eq!(target.collect(3), 3);
        assert_eq!(target.collect(3), 1);
        assert_eq!(target.collected, 4);
        assert_eq!(target.collect(2), 0);
        assert!(target.is_complete());
    }

    #[test]
    fn completion_percent_aggregates_across_targets() {
        let mut targets = Targets::default();
        targets.insert(Category::Birds, Target { needed: 4, collected: 3 });
        targets.insert(Category::Fruits, Target { needed: 4, collected: 0 });
        assert_eq!(targets.completion_percent(), 38);
        assert_eq!(targets.incomplete(), vec![Category::Birds, Category::Fruits]);
    }
}
