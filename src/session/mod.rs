//! Session state machine and the runtime that drives it.

pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod runtime;
pub mod state;

pub use engine::{InputOutcome, SessionEngine};
pub use error::{SessionError, TransitionError};
pub use lifecycle::{ReplayIgnoredReason, SessionEvent, SessionSnapshot};
pub use runtime::SessionHandle;
pub use state::{PendingKind, PendingTransition, Session};

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use crate::config::{ConfigError, TrainerConfig};
use crate::narration::{
    AvailabilityProbe, CueAssets, CuePlayback, LogSpeechSynthesizer, NarrationPlayer,
    NullCuePlayback, SpeechSynthesizer,
};
use crate::navigation::LevelCatalog;

/// Builds running sessions from a shared configuration and collaborators.
pub struct SessionManager {
    config: TrainerConfig,
    catalog: LevelCatalog,
    assets: CueAssets,
    playback: Arc<dyn CuePlayback>,
    speech: Arc<dyn SpeechSynthesizer>,
}

impl SessionManager {
    /// Headless manager: no cue audio is playable and speech goes to the log.
    pub fn new(config: TrainerConfig) -> Result<Self, ConfigError> {
        let assets = CueAssets::default();
        Self::with_components(
            config,
            LevelCatalog::default(),
            assets.clone(),
            Arc::new(NullCuePlayback::new(assets)),
            Arc::new(LogSpeechSynthesizer::default()),
        )
    }

    pub fn with_components(
        config: TrainerConfig,
        catalog: LevelCatalog,
        assets: CueAssets,
        playback: Arc<dyn CuePlayback>,
        speech: Arc<dyn SpeechSynthesizer>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            catalog,
            assets,
            playback,
            speech,
        })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    /// Spawns a session worker and asks it to load `level_id`.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn start_session(
        &self,
        level_id: u32,
    ) -> Result<(SessionHandle, broadcast::Receiver<SessionEvent>), SessionError> {
        let engine = SessionEngine::new(self.catalog.clone(), &self.config);
        let narrator = Arc::new(NarrationPlayer::from_config(
            &self.config,
            self.assets.clone(),
            Arc::clone(&self.playback),
            Arc::clone(&self.speech),
        ));
        let probe = AvailabilityProbe::new(Arc::clone(&self.playback), self.config.probe_timeout);

        let (handle, events) = runtime::spawn_session(&self.config, engine, narrator, probe);
        handle.start_level(level_id).await?;

        info!(
            target: "session_manager",
            level = level_id,
            seeded = self.config.seed.is_some(),
            "session started"
        );
        Ok((handle, events))
    }
}

#[cfg(test)]
mod tests;
