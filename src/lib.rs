//! NavCue Core Library
//!
//! Session engine for an audio-cued navigation trainer: random level paths,
//! narrated command steps with speech fallback, and a state machine that
//! validates the player's moves against the narrated path.

pub mod config;
pub mod narration;
pub mod navigation;
pub mod session;
pub mod telemetry;
