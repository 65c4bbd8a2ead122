use std::collections::HashSet;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Shape of one level: how many cues are narrated per step and how many steps
/// must be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub id: u32,
    pub command_count_per_step: u32,
    pub total_steps: u32,
}

impl LevelConfig {
    pub const fn new(id: u32, command_count_per_step: u32, total_steps: u32) -> Self {
        Self {
            id,
            command_count_per_step,
            total_steps,
        }
    }

    pub fn path_len(&self) -> usize {
        self.total_steps as usize * self.command_count_per_step as usize
    }

    /// Indices into the path covered by `step_index`.
    pub fn step_range(&self, step_index: u32) -> Range<usize> {
        let width = self.command_count_per_step as usize;
        let start = step_index as usize * width;
        start..start + width
    }
}

const DEFAULT_LEVELS: [LevelConfig; 5] = [
    LevelConfig::new(1, 1, 3),
    LevelConfig::new(2, 1, 5),
    LevelConfig::new(3, 2, 3),
    LevelConfig::new(4, 2, 4),
    LevelConfig::new(5, 3, 4),
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("level catalog cannot be empty")]
    Empty,
    #[error("level {id} needs at least one command per step")]
    ZeroCommands { id: u32 },
    #[error("level {id} needs at least one step")]
    ZeroSteps { id: u32 },
    #[error("level id {id} appears more than once")]
    DuplicateId { id: u32 },
}

/// Ordered, non-empty list of level configs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelCatalog {
    levels: Vec<LevelConfig>,
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self {
            levels: DEFAULT_LEVELS.to_vec(),
        }
    }
}

impl LevelCatalog {
    pub fn new(levels: Vec<LevelConfig>) -> Result<Self, CatalogError> {
        if levels.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(levels.len());
        for level in &levels {
            if level.command_count_per_step == 0 {
                return Err(CatalogError::ZeroCommands { id: level.id });
            }
            if level.total_steps == 0 {
                return Err(CatalogError::ZeroSteps { id: level.id });
            }
            if !seen.insert(level.id) {
                return Err(CatalogError::DuplicateId { id: level.id });
            }
        }

        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[LevelConfig] {
        &self.levels
    }

    pub fn first(&self) -> LevelConfig {
        self.levels[0]
    }

    pub fn contains(&self, id: u32) -> bool {
        self.position(id).is_some()
    }

    /// Looks up a level, falling back to the first entry for unknown ids.
    pub fn get(&self, id: u32) -> LevelConfig {
        match self.position(id) {
            Some(index) => self.levels[index],
            None => {
                let fallback = self.first();
                warn!(
                    target: "level_catalog",
                    requested = id,
                    fallback = fallback.id,
                    "unknown level id, using first catalog entry"
                );
                fallback
            }
        }
    }

    /// The level after `id`, wrapping from the last entry back to the first.
    pub fn next_level(&self, id: u32) -> LevelConfig {
        let current = self.position(id).unwrap_or(0);
        self.levels[(current + 1) % self.levels.len()]
    }

    fn position(&self, id: u32) -> Option<usize> {
        self.levels.iter().position(|level| level.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_level_falls_back_to_first() {
        let catalog = LevelCatalog::default();
        assert_eq!(catalog.get(42), catalog.first());
        assert_eq!(catalog.get(3).id, 3);
    }

    #[test]
    fn next_level_wraps_to_first() {
        let catalog = LevelCatalog::default();
        let last = *catalog.levels().last().expect("default catalog has levels");
        assert_eq!(catalog.next_level(last.id), catalog.first());
        assert_eq!(catalog.next_level(1).id, 2);
    }

    #[test]
    fn rejects_invalid_catalogs() {
        assert_eq!(LevelCatalog::new(Vec::new()), Err(CatalogError::Empty));
        assert_eq!(
            LevelCatalog::new(vec![LevelConfig::new(7, 0, 2)]),
            Err(CatalogError::ZeroCommands { id: 7 })
        );
        assert_eq!(
            LevelCatalog::new(vec![LevelConfig::new(7, 1, 0)]),
            Err(CatalogError::ZeroSteps { id: 7 })
        );
        assert_eq!(
            LevelCatalog::new(vec![LevelConfig::new(1, 1, 1), LevelConfig::new(1, 2, 2)]),
            Err(CatalogError::DuplicateId { id: 1 })
        );
    }

    #[test]
    fn step_range_slices_by_command_width() {
        let level = LevelConfig::new(9, 3, 4);
        assert_eq!(level.path_len(), 12);
        assert_eq!(level.step_range(0), 0..3);
        assert_eq!(level.step_range(3), 9..12);
    }
}
