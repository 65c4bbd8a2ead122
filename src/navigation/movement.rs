use crate::config::{DEFAULT_GRID_SIZE, DEFAULT_TURN_ANGLE_DEGREES};

use super::types::{Direction, Pose};

/// Maps an accepted direction onto the player's pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementModel {
    grid_size: f64,
    turn_angle_degrees: f64,
}

impl Default for MovementModel {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_SIZE, DEFAULT_TURN_ANGLE_DEGREES)
    }
}

impl MovementModel {
    pub fn new(grid_size: f64, turn_angle_degrees: f64) -> Self {
        Self {
            grid_size,
            turn_angle_degrees,
        }
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    pub fn turn_angle_degrees(&self) -> f64 {
        self.turn_angle_degrees
    }

    pub fn apply(&self, pose: Pose, direction: Direction) -> Pose {
        match direction {
            Direction::Straight => {
                let heading = pose.rotation_radians();
                Pose {
                    x: pose.x - heading.sin() * self.grid_size,
                    z: pose.z - heading.cos() * self.grid_size,
                    ..pose
                }
            }
            Direction::Left => Pose {
                rotation_degrees: pose.rotation_degrees + self.turn_angle_degrees,
                ..pose
            },
            Direction::Right => Pose {
                rotation_degrees: pose.rotation_degrees - self.turn_angle_degrees,
                ..pose
            },
        }
    }
}
