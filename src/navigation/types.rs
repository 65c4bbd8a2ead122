use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single narrated instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Straight,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Straight, Direction::Left, Direction::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Straight => "straight",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Direction::Straight => 0,
            Direction::Left => 1,
            Direction::Right => 2,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unrecognised direction: {input:?}")]
pub struct ParseDirectionError {
    input: String,
}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    /// Accepts the symbolic names an input adapter is likely to emit.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "straight" | "forward" | "up" => Ok(Direction::Straight),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _ => Err(ParseDirectionError {
                input: s.to_string(),
            }),
        }
    }
}

/// Game status of a single attempt. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Start,
    Listening,
    Moving,
    Success,
    Fail,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Start => "start",
            GameStatus::Listening => "listening",
            GameStatus::Moving => "moving",
            GameStatus::Success => "success",
            GameStatus::Fail => "fail",
        }
    }

    pub fn accepts_input(&self) -> bool {
        matches!(self, GameStatus::Moving)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GameStatus::Success | GameStatus::Fail)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Player position on the ground plane plus heading.
///
/// `rotation_degrees` is never normalised; two left turns from the origin
/// leave it at 180, four leave it at 360.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub z: f64,
    pub rotation_degrees: f64,
}

impl Pose {
    pub const ORIGIN: Pose = Pose {
        x: 0.0,
        z: 0.0,
        rotation_degrees: 0.0,
    };

    pub fn rotation_radians(&self) -> f64 {
        self.rotation_degrees.to_radians()
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::ORIGIN
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub x: f64,
    pub z: f64,
}
