use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::navigation::MovementModel;

pub const DEFAULT_GRID_SIZE: f64 = 5.0;
pub const DEFAULT_TURN_ANGLE_DEGREES: f64 = 90.0;

pub const ENV_GRID_SIZE: &str = "NAVCUE_GRID_SIZE";
pub const ENV_TURN_ANGLE: &str = "NAVCUE_TURN_ANGLE";
pub const ENV_PROBE_TIMEOUT_MS: &str = "NAVCUE_PROBE_TIMEOUT_MS";
pub const ENV_SPEECH_TIMEOUT_MS: &str = "NAVCUE_SPEECH_TIMEOUT_MS";
pub const ENV_CUE_PAUSE_MS: &str = "NAVCUE_CUE_PAUSE_MS";
pub const ENV_STEP_DELAY_MS: &str = "NAVCUE_STEP_DELAY_MS";
pub const ENV_LOADING_MS: &str = "NAVCUE_LOADING_MS";
pub const ENV_SEED: &str = "NAVCUE_SEED";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{key} has an invalid value: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("grid size must be a positive finite number, got {0}")]
    InvalidGridSize(f64),
    #[error("turn angle must be finite, got {0}")]
    InvalidTurnAngle(f64),
    #[error("event buffer must hold at least one entry")]
    EmptyEventBuffer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    pub grid_size: f64,
    pub turn_angle_degrees: f64,
    /// Upper bound for each per-direction audio availability check.
    pub probe_timeout: Duration,
    /// Upper bound for a single synthesized-speech cue.
    pub speech_safety_timeout: Duration,
    pub inter_cue_pause: Duration,
    pub step_advance_delay: Duration,
    pub min_loading_display: Duration,
    pub event_buffer: usize,
    /// Fixed seed for path generation; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            turn_angle_degrees: DEFAULT_TURN_ANGLE_DEGREES,
            probe_timeout: Duration::from_millis(1_200),
            speech_safety_timeout: Duration::from_millis(4_000),
            inter_cue_pause: Duration::from_millis(600),
            step_advance_delay: Duration::from_millis(1_000),
            min_loading_display: Duration::from_millis(800),
            event_buffer: 32,
            seed: None,
        }
    }
}

impl TrainerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `NAVCUE_*` overrides resolved through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = parse_var::<f64, _>(&lookup, ENV_GRID_SIZE)? {
            self.grid_size = value;
        }
        if let Some(value) = parse_var::<f64, _>(&lookup, ENV_TURN_ANGLE)? {
            self.turn_angle_degrees = value;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_PROBE_TIMEOUT_MS)? {
            self.probe_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_SPEECH_TIMEOUT_MS)? {
            self.speech_safety_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_CUE_PAUSE_MS)? {
            self.inter_cue_pause = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_STEP_DELAY_MS)? {
            self.step_advance_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_LOADING_MS)? {
            self.min_loading_display = Duration::from_millis(ms);
        }
        if let Some(seed) = parse_var::<u64, _>(&lookup, ENV_SEED)? {
            self.seed = Some(seed);
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.grid_size.is_finite() || self.grid_size <= 0.0 {
            return Err(ConfigError::InvalidGridSize(self.grid_size));
        }
        if !self.turn_angle_degrees.is_finite() {
            return Err(ConfigError::InvalidTurnAngle(self.turn_angle_degrees));
        }
        if self.event_buffer == 0 {
            return Err(ConfigError::EmptyEventBuffer);
        }
        Ok(())
    }

    pub fn movement_model(&self) -> MovementModel {
        MovementModel::new(self.grid_size, self.turn_angle_degrees)
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidValue { key, value: raw })
}
