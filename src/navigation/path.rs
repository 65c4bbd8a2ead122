use rand::Rng;
use tracing::debug;

use super::catalog::LevelConfig;
use super::movement::MovementModel;
use super::types::{Direction, GridCell, Pose};

/// Result of generating one level attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPath {
    pub path: Vec<Direction>,
    pub goal: GridCell,
    /// Pose reached by replaying `path` from the origin, before grid snapping.
    pub end_pose: Pose,
}

/// Draws random command paths and derives the goal cell they lead to.
///
/// The walk is unconstrained: it may revisit cells or end on the origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathGenerator {
    movement: MovementModel,
}

impl PathGenerator {
    pub fn new(movement: MovementModel) -> Self {
        Self { movement }
    }

    pub fn generate<R: Rng + ?Sized>(&self, config: &LevelConfig, rng: &mut R) -> GeneratedPath {
        let path: Vec<Direction> = (0..config.path_len()).map(|_| draw(rng)).collect();
        let generated = self.trace(path);

        debug!(
            target: "path_generator",
            level = config.id,
            commands = generated.path.len(),
            goal_x = generated.goal.x,
            goal_z = generated.goal.z,
            "generated level path"
        );

        generated
    }

    /// Simulates `path` from the origin and snaps the end position to a cell centre.
    pub fn trace(&self, path: Vec<Direction>) -> GeneratedPath {
        let end_pose = path
            .iter()
            .fold(Pose::ORIGIN, |pose, direction| self.movement.apply(pose, *direction));
        let grid = self.movement.grid_size();
        let goal = GridCell {
            x: snap_to_cell_center(end_pose.x, grid),
            z: snap_to_cell_center(end_pose.z, grid),
        };

        GeneratedPath {
            path,
            goal,
            end_pose,
        }
    }
}

// Straight takes two of the four equally likely outcomes.
fn draw<R: Rng + ?Sized>(rng: &mut R) -> Direction {
    match rng.gen_range(0..4u8) {
        0 | 1 => Direction::Straight,
        2 => Direction::Left,
        _ => Direction::Right,
    }
}

fn snap_to_cell_center(value: f64, grid: f64) -> f64 {
    (value / grid).round() * grid + grid / 2.0
}
