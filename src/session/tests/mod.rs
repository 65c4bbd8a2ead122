
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{sleep, timeout};

use crate::config::TrainerConfig;
use crate::narration::{CueAssets, CuePlayback, PlaybackError, SpeechSynthesizer};
use crate::navigation::{Direction, LevelCatalog, LevelConfig};

use super::{SessionEvent, SessionManager};

const EVENT_WAIT: Duration = Duration::from_secs(3);

struct RecordingSpeech {
    delay: Duration,
    spoken: Mutex<Vec<String>>,
}

impl RecordingSpeech {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            spoken: Mutex::new(Vec::new()),
        })
    }

    fn spoken(&self) -> Vec<String> {
        self.spoken.lock().expect("spoken lock poisoned").clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for RecordingSpeech {
    async fn speak(&self, phrase: &str) -> Result<()> {
        sleep(self.delay).await;
        self.spoken
            .lock()
            .expect("spoken lock poisoned")
            .push(phrase.to_string());
        Ok(())
    }
}

/// Every asset buffers fine but refuses to actually play.
struct RejectingPlayback;

#[async_trait]
impl CuePlayback for RejectingPlayback {
    async fn can_play_through(&self, _direction: Direction) -> Result<(), PlaybackError> {
        Ok(())
    }

    async fn play(&self, _direction: Direction) -> Result<(), PlaybackError> {
        Err(PlaybackError::rejected("autoplay blocked"))
    }
}

/// Playable assets whose buffering takes `probe_delay`; counts every check.
struct CountingPlayback {
    probe_delay: Duration,
    probes: AtomicUsize,
}

impl CountingPlayback {
    fn new(probe_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            probe_delay,
            probes: AtomicUsize::new(0),
        })
    }

    fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CuePlayback for CountingPlayback {
    async fn can_play_through(&self, _direction: Direction) -> Result<(), PlaybackError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        sleep(self.probe_delay).await;
        Ok(())
    }

    async fn play(&self, _direction: Direction) -> Result<(), PlaybackError> {
        Ok(())
    }
}

fn test_config() -> TrainerConfig {
    TrainerConfig {
        probe_timeout: Duration::from_millis(50),
        speech_safety_timeout: Duration::from_millis(500),
        inter_cue_pause: Duration::from_millis(5),
        step_advance_delay: Duration::from_millis(20),
        min_loading_display: Duration::from_millis(10),
        event_buffer: 128,
        seed: Some(7),
        ..TrainerConfig::default()
    }
}

fn single_level(commands_per_step: u32, total_steps: u32) -> LevelCatalog {
    LevelCatalog::new(vec![LevelConfig::new(1, commands_per_step, total_steps)])
        .expect("valid catalog")
}

fn manager(
    catalog: LevelCatalog,
    playback: Arc<dyn CuePlayback>,
    speech: Arc<dyn SpeechSynthesizer>,
) -> SessionManager {
    manager_with(test_config(), catalog, playback, speech)
}

fn manager_with(
    config: TrainerConfig,
    catalog: LevelCatalog,
    playback: Arc<dyn CuePlayback>,
    speech: Arc<dyn SpeechSynthesizer>,
) -> SessionManager {
    SessionManager::with_components(config, catalog, CueAssets::default(), playback, speech)
        .expect("valid test config")
}

fn silent_playback() -> Arc<dyn CuePlayback> {
    Arc::new(crate::narration::NullCuePlayback::default())
}

async fn next_event<F>(events: &mut broadcast::Receiver<SessionEvent>, mut matches: F) -> SessionEvent
where
    F: FnMut(&SessionEvent) -> bool,
{
    timeout(EVENT_WAIT, async {
        loop {
            match events.recv().await {
                Ok(event) if matches(&event) => return event,
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => panic!("session event stream closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for session event")
}

/// Collects every event up to and including the first one that matches.
async fn events_until<F>(
    events: &mut broadcast::Receiver<SessionEvent>,
    mut matches: F,
) -> Vec<SessionEvent>
where
    F: FnMut(&SessionEvent) -> bool,
{
    let mut seen = Vec::new();
    next_event(events, |event| {
        seen.push(event.clone());
        matches(event)
    })
    .await;
    seen
}

async fn level_ready(events: &mut broadcast::Receiver<SessionEvent>) -> (u64, u32) {
    match next_event(events, |event| matches!(event, SessionEvent::LevelReady { .. })).await {
        SessionEvent::LevelReady {
            attempt_id, level, ..
        } => (attempt_id, level),
        other => panic!("unexpected event: {other:?}"),
    }
}

/// Waits for a step to be narrated and for input to open, returning its cues.
async fn narrated_step(events: &mut broadcast::Receiver<SessionEvent>) -> Vec<Direction> {
    let cues = match next_event(events, |event| {
        matches!(event, SessionEvent::StepNarrating { .. })
    })
    .await
    {
        SessionEvent::StepNarrating { cues, .. } => cues,
        other => panic!("unexpected event: {other:?}"),
    };
    next_event(events, |event| {
        matches!(event, SessionEvent::AwaitingInput { .. })
    })
    .await;
    cues
}
