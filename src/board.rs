use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    catalog::{Category, TileKind},
    rng::RandomSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(u32);

impl TileId {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileStatus {
    Available,
    Selected,
    Used,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tile {
    pub id: TileId,
    pub category: Category,
    pub kind: TileKind,
    pub status: TileStatus,
}

impl Tile {
    pub fn is_available(&self) -> bool {
        self.status == TileStatus::Available
    }
}

/// Tile population of one board, before shuffling.
pub fn category_counts<R: RandomSource>(
    total_tiles: usize,
    rng: &mut R,
) -> BTreeMap<Category, usize> {
    let mut counts: BTreeMap<Category, usize> = Category::ALL
        .iter()
        .map(|category| {
            let share = total_tiles * category.percentage() as usize / 100;
            (*category, share)
        })
        .collect();
    let assigned: usize = counts.values().sum();
    for _ in assigned..total_tiles {
        let category = Category::ALL[rng.index(Category::ALL.len())];
        *counts.entry(category).or_insert(0) += 1;
    }
    counts
}

/// Builds the shuffled tile sequence for a board of `total_tiles`.
///
/// Kinds are drawn with replacement, so the same face may appear more than
/// once. Ids follow the final board order.
pub fn generate_pool<R: RandomSource>(total_tiles: usize, rng: &mut R) -> Vec<Tile> {
    let counts = category_counts(total_tiles, rng);
    let mut faces: Vec<(Category, TileKind)> = Vec::with_capacity(total_tiles);
    for (category, count) in counts {
        let kinds = category.kinds();
        for _ in 0..count {
            faces.push((category, kinds[rng.index(kinds.len())]));
        }
    }
    rng.shuffle(&mut faces);
    faces
        .into_iter()
        .enumerate()
        .map(|(index, (category, kind))| Tile {
            id: TileId(index as u32),
            category,
            kind,
            status: TileStatus::Available,
        })
        .collect()
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Board {
    tiles: Vec<Tile>,
}

impl Board {
    pub fn generate<R: RandomSource>(total_tiles: usize, rng: &mut R) -> Self {
        Self {
            tiles: generate_pool(total_tiles, rng),
        }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id.raw() as usize)
    }

    pub fn get_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.get_mut(id.raw() as usize)
    }

    pub fn available(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|tile| tile.is_available())
    }

    pub fn available_count(&self) -> usize {
        self.available().count()
    }

    /// Returns every selected tile to the available state.
    pub fn clear_selection(&mut self) {
        for tile in &mut self.tiles {
            if tile.status == TileStatus::Selected {
                tile.status = TileStatus::Available;
            }
        }
    }
}
