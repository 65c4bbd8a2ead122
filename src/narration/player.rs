use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::config::TrainerConfig;
use crate::navigation::Direction;
use crate::telemetry::events::record_cue_delivered;

use super::assets::CueAssets;
use super::availability::AudioAvailability;
use super::traits::{CuePlayback, SpeechSynthesizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The cached availability already said the asset cannot play.
    Unavailable,
    /// The asset was expected to play but the attempt errored or was rejected.
    PlaybackFailed,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::Unavailable => "unavailable",
            FallbackReason::PlaybackFailed => "playback_failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechOutcome {
    Completed,
    Errored,
    TimedOut,
}

/// How a cue ended up being voiced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueDelivery {
    Audio,
    Speech {
        reason: FallbackReason,
        outcome: SpeechOutcome,
    },
}

impl CueDelivery {
    pub fn channel(&self) -> &'static str {
        match self {
            CueDelivery::Audio => "audio",
            CueDelivery::Speech { .. } => "speech",
        }
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            CueDelivery::Audio => None,
            CueDelivery::Speech { reason, .. } => Some(*reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayOutcome {
    Played,
    AlreadyInFlight,
}

/// Voices cues one at a time.
///
/// All playback goes through a single voice lane, so a step narration and a
/// replay can never overlap even when requested from different tasks.
pub struct NarrationPlayer {
    assets: CueAssets,
    playback: Arc<dyn CuePlayback>,
    speech: Arc<dyn SpeechSynthesizer>,
    inter_cue_pause: Duration,
    speech_safety_timeout: Duration,
    voice_lane: Mutex<()>,
    replay_in_flight: AtomicBool,
}

impl std::fmt::Debug for NarrationPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrationPlayer")
            .field("inter_cue_pause", &self.inter_cue_pause)
            .field("speech_safety_timeout", &self.speech_safety_timeout)
            .field("replaying", &self.is_replaying())
            .finish_non_exhaustive()
    }
}

impl NarrationPlayer {
    pub fn new(
        assets: CueAssets,
        playback: Arc<dyn CuePlayback>,
        speech: Arc<dyn SpeechSynthesizer>,
        inter_cue_pause: Duration,
        speech_safety_timeout: Duration,
    ) -> Self {
        Self {
            assets,
            playback,
            speech,
            inter_cue_pause,
            speech_safety_timeout,
            voice_lane: Mutex::new(()),
            replay_in_flight: AtomicBool::new(false),
        }
    }

    pub fn from_config(
        config: &TrainerConfig,
        assets: CueAssets,
        playback: Arc<dyn CuePlayback>,
        speech: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self::new(
            assets,
            playback,
            speech,
            config.inter_cue_pause,
            config.speech_safety_timeout,
        )
    }

    pub fn is_replaying(&self) -> bool {
        self.replay_in_flight.load(Ordering::SeqCst)
    }

    /// Voices a single cue and returns once it has been fully delivered.
    pub async fn play_cue(
        &self,
        direction: Direction,
        availability: &AudioAvailability,
    ) -> CueDelivery {
        let _lane = self.voice_lane.lock().await;
        self.voice_cue(direction, availability).await
    }

    /// Voices `cues` strictly in order, pausing between consecutive cues.
    pub async fn play_sequence(
        &self,
        cues: &[Direction],
        availability: &AudioAvailability,
    ) -> Vec<CueDelivery> {
        let _lane = self.voice_lane.lock().await;
        let mut deliveries = Vec::with_capacity(cues.len());

        for (index, direction) in cues.iter().enumerate() {
            if index > 0 && !self.inter_cue_pause.is_zero() {
                sleep(self.inter_cue_pause).await;
            }
            deliveries.push(self.voice_cue(*direction, availability).await);
        }

        deliveries
    }

    /// Replays `cues` unless another replay is still running.
    pub async fn replay(
        &self,
        cues: &[Direction],
        availability: &AudioAvailability,
    ) -> ReplayOutcome {
        if self.replay_in_flight.swap(true, Ordering::SeqCst) {
            debug!(target: "narration", "replay already in flight, ignoring request");
            return ReplayOutcome::AlreadyInFlight;
        }

        let _guard = ReplayGuard {
            flag: &self.replay_in_flight,
        };
        self.play_sequence(cues, availability).await;
        ReplayOutcome::Played
    }

    async fn voice_cue(&self, direction: Direction, availability: &AudioAvailability) -> CueDelivery {
        let started = Instant::now();

        let delivery = if !availability.is_available(direction) {
            CueDelivery::Speech {
                reason: FallbackReason::Unavailable,
                outcome: self.speak(direction).await,
            }
        } else {
            match self.playback.play(direction).await {
                Ok(()) => CueDelivery::Audio,
                Err(err) => {
                    availability.downgrade(direction);
                    warn!(
                        target: "narration",
                        direction = %direction,
                        locator = self.assets.locator(direction),
                        %err,
                        "cue playback failed, using speech for the rest of the attempt"
                    );
                    CueDelivery::Speech {
                        reason: FallbackReason::PlaybackFailed,
                        outcome: self.speak(direction).await,
                    }
                }
            }
        };

        record_cue_delivered(
            direction.as_str(),
            delivery.channel(),
            delivery.fallback_reason().map(|reason| reason.as_str()),
            started.elapsed(),
        );

        delivery
    }

    async fn speak(&self, direction: Direction) -> SpeechOutcome {
        let phrase = self.assets.phrase(direction);
        match timeout(self.speech_safety_timeout, self.speech.speak(phrase)).await {
            Ok(Ok(())) => SpeechOutcome::Completed,
            Ok(Err(err)) => {
                warn!(
                    target: "narration",
                    direction = %direction,
                    %err,
                    "speech synthesis failed, treating cue as delivered"
                );
                SpeechOutcome::Errored
            }
            Err(_) => {
                warn!(
                    target: "narration",
                    direction = %direction,
                    timeout = ?self.speech_safety_timeout,
                    "speech synthesis timed out, treating cue as delivered"
                );
                SpeechOutcome::TimedOut
            }
        }
    }
}

struct ReplayGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for ReplayGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
