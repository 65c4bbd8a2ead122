use anyhow::{bail, Context, Result};
use navcue_core::config::TrainerConfig;
use navcue_core::session::{SessionEvent, SessionManager};
use navcue_core::telemetry::init_tracing;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

/// Headless smoke driver: plays the first level by echoing every narrated cue.
#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = TrainerConfig::from_env().context("invalid NAVCUE_* configuration")?;
    let manager = SessionManager::new(config)?;
    let level = manager.catalog().first().id;
    let (handle, mut events) = manager.start_session(level).await?;
    let mut cues = Vec::new();

    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(target: "autopilot", skipped, "autopilot fell behind session events");
                continue;
            }
            Err(RecvError::Closed) => bail!("session stopped before the level finished"),
        };

        match event {
            SessionEvent::LevelReady { .. } => handle.begin_step().await?,
            SessionEvent::StepNarrating {
                cues: narrated, ..
            } => cues = narrated,
            SessionEvent::AwaitingInput { .. } => {
                for cue in cues.drain(..) {
                    handle.input(cue).await?;
                }
            }
            SessionEvent::Succeeded { attempt_id, level } => {
                let snapshot = handle.snapshot();
                info!(
                    target: "autopilot",
                    attempt_id,
                    level,
                    pose = ?snapshot.pose,
                    goal = ?snapshot.goal,
                    "autopilot reached the goal"
                );
                return Ok(());
            }
            SessionEvent::Failed {
                expected, received, ..
            } => bail!("autopilot diverged: expected {expected}, sent {received}"),
            _ => {}
        }
    }
}
