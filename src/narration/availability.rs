use std::sync::atomic::{AtomicBool, Ordering};

use crate::navigation::Direction;

/// Per-attempt record of which directions have a playable audio asset.
///
/// Owned by a single session and shared with its narration tasks. A direction
/// only ever moves from available to unavailable once the attempt is running.
#[derive(Debug, Default)]
pub struct AudioAvailability {
    flags: [AtomicBool; 3],
}

impl AudioAvailability {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self::from_flags(true, true, true)
    }

    pub fn from_flags(straight: bool, left: bool, right: bool) -> Self {
        Self {
            flags: [
                AtomicBool::new(straight),
                AtomicBool::new(left),
                AtomicBool::new(right),
            ],
        }
    }

    pub fn is_available(&self, direction: Direction) -> bool {
        self.flags[direction.index()].load(Ordering::SeqCst)
    }

    /// Marks `direction` unavailable and reports whether it was available before.
    pub(crate) fn downgrade(&self, direction: Direction) -> bool {
        self.flags[direction.index()].swap(false, Ordering::SeqCst)
    }

    pub fn available_directions(&self) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|direction| self.is_available(*direction))
            .collect()
    }
}
