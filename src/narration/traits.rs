use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tokio::time::sleep;
use tracing::info;

use crate::navigation::Direction;

use super::assets::CueAssets;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("cue asset unavailable: {locator}")]
    Unavailable { locator: String },
    #[error("playback rejected: {message}")]
    Rejected { message: String },
    #[error("playback failed: {message}")]
    Failed { message: String },
}

impl PlaybackError {
    pub fn unavailable<S: Into<String>>(locator: S) -> Self {
        Self::Unavailable {
            locator: locator.into(),
        }
    }

    pub fn rejected<S: Into<String>>(message: S) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    pub fn failed<S: Into<String>>(message: S) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Plays the recorded audio asset of a cue.
#[async_trait]
pub trait CuePlayback: Send + Sync {
    /// Resolves once the asset is buffered enough to play through.
    async fn can_play_through(&self, direction: Direction) -> Result<(), PlaybackError>;

    /// Resolves once the asset has finished playing.
    async fn play(&self, direction: Direction) -> Result<(), PlaybackError>;
}

/// Voices a phrase when recorded audio is not usable.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn speak(&self, phrase: &str) -> Result<()>;
}

/// Playback backend for headless runs: no asset is ever playable.
#[derive(Debug, Clone, Default)]
pub struct NullCuePlayback {
    assets: CueAssets,
}

impl NullCuePlayback {
    pub fn new(assets: CueAssets) -> Self {
        Self { assets }
    }
}

#[async_trait]
impl CuePlayback for NullCuePlayback {
    async fn can_play_through(&self, direction: Direction) -> Result<(), PlaybackError> {
        Err(PlaybackError::unavailable(self.assets.locator(direction)))
    }

    async fn play(&self, direction: Direction) -> Result<(), PlaybackError> {
        Err(PlaybackError::unavailable(self.assets.locator(direction)))
    }
}

/// Writes phrases to the log and holds for a per-word speaking time.
#[derive(Debug, Clone)]
pub struct LogSpeechSynthesizer {
    per_word: Duration,
}

impl Default for LogSpeechSynthesizer {
    fn default() -> Self {
        Self::new(Duration::from_millis(250))
    }
}

impl LogSpeechSynthesizer {
    pub fn new(per_word: Duration) -> Self {
        Self { per_word }
    }
}

#[async_trait]
impl SpeechSynthesizer for LogSpeechSynthesizer {
    async fn speak(&self, phrase: &str) -> Result<()> {
        info!(target: "narration", phrase, "speaking cue");
        let words = phrase.split_whitespace().count().max(1) as u32;
        sleep(self.per_word * words).await;
        Ok(())
    }
}
