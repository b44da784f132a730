use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Animals,
    Birds,
    Flowers,
    Fruits,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Animals,
        Category::Birds,
        Category::Flowers,
        Category::Fruits,
    ];

    pub fn spec(self) -> &'static CategorySpec {
        match self {
            Category::Animals => &CATALOG[0],
            Category::Birds => &CATALOG[1],
            Category::Flowers => &CATALOG[2],
            Category::Fruits => &CATALOG[3],
        }
    }

    pub fn display(self) -> &'static str {
        self.spec().display
    }

    pub fn percentage(self) -> u32 {
        self.spec().percentage
    }

    pub fn kinds(self) -> &'static [TileKind] {
        self.spec().kinds
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

/// One concrete tile face inside a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileKind {
    pub name: &'static str,
    pub glyph: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct CategorySpec {
    pub category: Category,
    pub display: &'static str,
    pub glyph: &'static str,
    /// Share of the board, in percent. All entries sum to 100.
    pub percentage: u32,
    pub kinds: &'static [TileKind],
}

const fn kind(name: &'static str, glyph: &'static str, color: &'static str) -> TileKind {
    TileKind { name, glyph, color }
}

const CATALOG: [CategorySpec; 4] = [
    CategorySpec {
        category: Category::Animals,
        display: "Animals",
        glyph: "🦁",
        percentage: 30,
        kinds: &[
            kind("lion", "🦁", "#f4a261"),
            kind("elephant", "🐘", "#8d99ae"),
            kind("giraffe", "🦒", "#e9c46a"),
            kind("panda", "🐼", "#f1faee"),
            kind("tiger", "🐯", "#f77f00"),
            kind("fox", "🦊", "#e76f51"),
            kind("bear", "🐻", "#6d4c41"),
            kind("zebra", "🦓", "#adb5bd"),
        ],
    },
    CategorySpec {
        category: Category::Birds,
        display: "Birds",
        glyph: "🦜",
        percentage: 25,
        kinds: &[
            kind("parrot", "🦜", "#2a9d8f"),
            kind("eagle", "🦅", "#7f5539"),
            kind("peacock", "🦚", "#0077b6"),
            kind("owl", "🦉", "#9c6644"),
            kind("flamingo", "🦩", "#ff8fab"),
            kind("swan", "🦢", "#edf2f4"),
            kind("sparrow", "🐦", "#48cae4"),
            kind("rooster", "🐓", "#d62828"),
        ],
    },
    CategorySpec {
        category: Category::Flowers,
        display: "Flowers",
        glyph: "🌹",
        percentage: 25,
        kinds: &[
            kind("rose", "🌹", "#c9184a"),
            kind("blossom", "🌸", "#ffc2d1"),
            kind("sunflower", "🌻", "#ffd60a"),
            kind("hibiscus", "🌺", "#ff4d6d"),
            kind("tulip", "🌷", "#ff758f"),
            kind("bouquet", "💐", "#b5e48c"),
            kind("lotus", "🪷", "#f4acb7"),
            kind("daisy", "🌼", "#fff3b0"),
        ],
    },
    CategorySpec {
        category: Category::Fruits,
        display: "Fruits",
        glyph: "🍎",
        percentage: 20,
        kinds: &[
            kind("apple", "🍎", "#e63946"),
            kind("banana", "🍌", "#ffe66d"),
            kind("grapes", "🍇", "#7b2cbf"),
            kind("orange", "🍊", "#fb8500"),
            kind("strawberry", "🍓", "#d00000"),
            kind("pineapple", "🍍", "#fcbf49"),
            kind("mango", "🥭", "#f9c74f"),
            kind("peach", "🍑", "#ffb4a2"),
        ],
    },
];

pub fn catalog() -> &'static [CategorySpec] {
    &CATALOG
}

pub fn category_count() -> usize {
    CATALOG.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentages_sum_to_one_hundred() {
        let total: u32 = catalog().iter().map(|spec| spec.percentage).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn every_category_has_kinds_and_matching_spec() {
        for category in Category::ALL {
            let spec = category.spec();
            assert_eq!(spec.category, category);
            assert!(!category.kinds().is_empty());
        }
    }
}
