use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::narration::{
    AudioAvailability, AvailabilityProbe, CueDelivery, NarrationPlayer, ReplayOutcome,
};
use crate::navigation::{Direction, GameStatus};
use crate::session::engine::{InputOutcome, SessionEngine};
use crate::session::error::TransitionError;
use crate::session::lifecycle::{ReplayIgnoredReason, SessionEvent, SessionSnapshot};

use super::SessionCommand;

/// Narration of one step finished, successfully or not.
#[derive(Debug, Clone, Copy)]
struct NarrationDone {
    attempt_id: u64,
    step_index: u32,
}

#[derive(Debug, Clone, Copy)]
enum Regeneration {
    Start(u32),
    Retry,
    Advance,
}

/// Owns the engine and is the only task that mutates it.
pub(crate) struct SessionWorker<R> {
    engine: SessionEngine<R>,
    narrator: Arc<NarrationPlayer>,
    probe: AvailabilityProbe,
    min_loading_display: Duration,
    command_rx: mpsc::Receiver<SessionCommand>,
    narration_tx: mpsc::UnboundedSender<NarrationDone>,
    narration_rx: mpsc::UnboundedReceiver<NarrationDone>,
    events_tx: broadcast::Sender<SessionEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    pacing_deadline: Option<Instant>,
    voice_tasks: Vec<JoinHandle<()>>,
}

impl<R> SessionWorker<R>
where
    R: Rng + Send + Sync + 'static,
{
    pub(crate) fn new(
        engine: SessionEngine<R>,
        narrator: Arc<NarrationPlayer>,
        probe: AvailabilityProbe,
        min_loading_display: Duration,
        command_rx: mpsc::Receiver<SessionCommand>,
        events_tx: broadcast::Sender<SessionEvent>,
        snapshot_tx: watch::Sender<SessionSnapshot>,
    ) -> Self {
        let (narration_tx, narration_rx) = mpsc::unbounded_channel();
        Self {
            engine,
            narrator,
            probe,
            min_loading_display,
            command_rx,
            narration_tx,
            narration_rx,
            events_tx,
            snapshot_tx,
            pacing_deadline: None,
            voice_tasks: Vec::new(),
        }
    }

    pub(crate) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(mut self) {
        loop {
            let pacing = self.pacing_deadline;

            tokio::select! {
                biased;

                Some(done) = self.narration_rx.recv() => {
                    self.handle_narration_done(done);
                }

                _ = sleep_until(pacing.unwrap_or_else(Instant::now)), if pacing.is_some() => {
                    self.fire_pending();
                }

                maybe_command = self.command_rx.recv() => {
                    match maybe_command {
                        Some(command) => self.handle_command(command).await,
                        None => break,
                    }
                }
            }
        }

        debug!(target: "session_manager", "session worker stopped");
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::StartLevel(level_id) => {
                self.regenerate(Regeneration::Start(level_id)).await
            }
            SessionCommand::Retry => self.regenerate(Regeneration::Retry).await,
            SessionCommand::AdvanceLevel => self.regenerate(Regeneration::Advance).await,
            SessionCommand::BeginStep => self.begin_step(),
            SessionCommand::Input(direction) => self.submit(direction),
            SessionCommand::Replay => self.replay(),
        }
    }

    async fn regenerate(&mut self, request: Regeneration) {
        let level = match self.target_level(request) {
            Ok(level) => level,
            Err(err) => {
                warn!(target: "session_manager", %err, ?request, "level regeneration rejected");
                return;
            }
        };

        // Voice tasks of the previous attempt run to completion; their
        // completions carry the old attempt id and are ignored.
        self.pacing_deadline = None;
        self.emit(SessionEvent::Loading { level });
        self.snapshot_tx.send_replace(SessionSnapshot::loading(level));

        let availability = self.preload().await;
        let result = match request {
            Regeneration::Start(level_id) => Ok(self.engine.start_level(level_id, availability)),
            Regeneration::Retry => self.engine.retry(availability),
            Regeneration::Advance => self.engine.advance_level(availability),
        };

        let ready = match result {
            Ok(session) => SessionEvent::LevelReady {
                attempt_id: session.attempt_id(),
                level: session.level(),
                total_steps: session.config().total_steps,
                commands_per_step: session.config().command_count_per_step,
            },
            Err(err) => {
                warn!(target: "session_manager", %err, ?request, "level regeneration failed");
                return;
            }
        };

        info!(target: "session_manager", ?ready, "level ready");
        self.publish_snapshot();
        self.emit(ready);
    }

    fn target_level(&self, request: Regeneration) -> Result<u32, TransitionError> {
        let catalog = self.engine.catalog();
        match request {
            Regeneration::Start(level_id) if catalog.contains(level_id) => Ok(level_id),
            Regeneration::Start(_) => Ok(catalog.first().id),
            Regeneration::Retry => self
                .engine
                .require_status("retry", GameStatus::Fail)
                .map(|session| session.level()),
            Regeneration::Advance => self
                .engine
                .require_status("advance level", GameStatus::Success)
                .map(|session| catalog.next_level(session.level()).id),
        }
    }

    /// Probes cue audio while the loading screen is held for its minimum time.
    async fn preload(&self) -> Arc<AudioAvailability> {
        let started = Instant::now();
        let (availability, ()) = tokio::join!(
            self.probe.probe(&Direction::ALL),
            sleep(self.min_loading_display),
        );

        debug!(
            target: "session_manager",
            elapsed = ?started.elapsed(),
            "preload finished"
        );
        Arc::new(availability)
    }

    fn begin_step(&mut self) {
        match self.engine.begin_step() {
            Ok(cues) => self.narrate(cues),
            Err(err) => warn!(target: "session_manager", %err, "begin step rejected"),
        }
    }

    fn narrate(&mut self, cues: Vec<Direction>) {
        let Some(session) = self.engine.session() else {
            return;
        };
        let attempt_id = session.attempt_id();
        let step_index = session.current_step_index();
        let availability = session.audio_availability();

        self.publish_snapshot();
        self.emit(SessionEvent::StepNarrating {
            attempt_id,
            step_index,
            cues: cues.clone(),
        });

        let narrator = Arc::clone(&self.narrator);
        let events_tx = self.events_tx.clone();
        let done_tx = self.narration_tx.clone();
        let task = tokio::spawn(async move {
            let deliveries = narrator.play_sequence(&cues, &availability).await;
            report_fallbacks(&events_tx, attempt_id, &cues, &deliveries);
            if done_tx
                .send(NarrationDone {
                    attempt_id,
                    step_index,
                })
                .is_err()
            {
                debug!(target: "session_manager", "worker gone before narration finished");
            }
        });
        self.track(task);
    }

    fn handle_narration_done(&mut self, done: NarrationDone) {
        if !self
            .engine
            .narration_finished(done.attempt_id, done.step_index)
        {
            return;
        }

        self.publish_snapshot();
        self.emit(SessionEvent::AwaitingInput {
            attempt_id: done.attempt_id,
            step_index: done.step_index,
        });
    }

    fn submit(&mut self, direction: Direction) {
        let Some(session) = self.engine.session() else {
            debug!(target: "session_manager", %direction, "input before any level started");
            return;
        };
        let attempt_id = session.attempt_id();
        let level = session.level();

        let events = match self.engine.submit(direction) {
            InputOutcome::Ignored => return,
            InputOutcome::Accepted { pose, remaining } => vec![SessionEvent::MoveAccepted {
                attempt_id,
                direction,
                pose,
                remaining,
            }],
            InputOutcome::StepComplete {
                pose, next_step, ..
            } => vec![
                SessionEvent::MoveAccepted {
                    attempt_id,
                    direction,
                    pose,
                    remaining: 0,
                },
                SessionEvent::StepCompleted {
                    attempt_id,
                    next_step,
                },
            ],
            InputOutcome::Succeeded { pose } => vec![
                SessionEvent::MoveAccepted {
                    attempt_id,
                    direction,
                    pose,
                    remaining: 0,
                },
                SessionEvent::Succeeded { attempt_id, level },
            ],
            InputOutcome::Failed { expected, received } => vec![SessionEvent::Failed {
                attempt_id,
                expected,
                received,
            }],
        };

        self.pacing_deadline = self
            .engine
            .pending_transition()
            .map(|pending| Instant::now() + pending.delay);
        self.publish_snapshot();
        for event in events {
            self.emit(event);
        }
    }

    fn fire_pending(&mut self) {
        self.pacing_deadline = None;
        if let Some(cues) = self.engine.fire_pending() {
            self.narrate(cues);
        }
    }

    fn replay(&mut self) {
        let Some(session) = self.engine.session() else {
            return;
        };
        let attempt_id = session.attempt_id();

        if session.status() != GameStatus::Moving || session.pending_transition().is_some() {
            self.emit(SessionEvent::ReplayIgnored {
                attempt_id,
                reason: ReplayIgnoredReason::NotMoving,
            });
            return;
        }
        if self.narrator.is_replaying() {
            self.emit(SessionEvent::ReplayIgnored {
                attempt_id,
                reason: ReplayIgnoredReason::AlreadyInFlight,
            });
            return;
        }

        let cues = session.commands_for_step().to_vec();
        let availability = session.audio_availability();
        let narrator = Arc::clone(&self.narrator);
        let events_tx = self.events_tx.clone();
        let task = tokio::spawn(async move {
            if narrator.replay(&cues, &availability).await == ReplayOutcome::AlreadyInFlight {
                let _ = events_tx.send(SessionEvent::ReplayIgnored {
                    attempt_id,
                    reason: ReplayIgnoredReason::AlreadyInFlight,
                });
            }
        });
        self.track(task);
    }

    fn track(&mut self, task: JoinHandle<()>) {
        self.voice_tasks.retain(|task| !task.is_finished());
        self.voice_tasks.push(task);
    }

    fn emit(&self, event: SessionEvent) {
        if self.events_tx.send(event).is_err() {
            debug!(target: "session_manager", "no session event subscribers");
        }
    }

    fn publish_snapshot(&self) {
        if let Some(snapshot) = self.engine.snapshot() {
            self.snapshot_tx.send_replace(snapshot);
        }
    }
}

/// Runs when the worker finishes or its task is aborted by the handle.
impl<R> Drop for SessionWorker<R> {
    fn drop(&mut self) {
        for task in self.voice_tasks.drain(..) {
            task.abort();
        }
    }
}

fn report_fallbacks(
    events_tx: &broadcast::Sender<SessionEvent>,
    attempt_id: u64,
    cues: &[Direction],
    deliveries: &[CueDelivery],
) {
    for (direction, delivery) in cues.iter().zip(deliveries) {
        if let Some(reason) = delivery.fallback_reason() {
            let _ = events_tx.send(SessionEvent::CueFallback {
                attempt_id,
                direction: *direction,
                reason,
            });
        }
    }
}
