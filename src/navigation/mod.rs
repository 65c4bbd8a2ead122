//! Grid navigation: direction vocabulary, level catalog, movement and path generation.

pub mod catalog;
pub mod movement;
pub mod path;
pub mod types;

pub use catalog::{CatalogError, LevelCatalog, LevelConfig};
pub use movement::MovementModel;
pub use path::{GeneratedPath, PathGenerator};
pub use types::{Direction, GameStatus, GridCell, ParseDirectionError, Pose};
