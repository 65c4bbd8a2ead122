use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::navigation::Direction;
use crate::session::error::SessionError;
use crate::session::lifecycle::{SessionEvent, SessionSnapshot};

use super::SessionCommand;

/// Input surface of a running session.
///
/// Every method only enqueues a command; outcomes are observed through
/// [`SessionEvent`]s and snapshots. Dropping the handle stops the session.
pub struct SessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
    events_tx: broadcast::Sender<SessionEvent>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    worker: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub(super) fn new(
        command_tx: mpsc::Sender<SessionCommand>,
        events_tx: broadcast::Sender<SessionEvent>,
        snapshot_rx: watch::Receiver<SessionSnapshot>,
        worker: JoinHandle<()>,
    ) -> Self {
        Self {
            command_tx,
            events_tx,
            snapshot_rx,
            worker: Some(worker),
        }
    }

    pub async fn start_level(&self, level_id: u32) -> Result<(), SessionError> {
        self.send(SessionCommand::StartLevel(level_id)).await
    }

    pub async fn begin_step(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::BeginStep).await
    }

    pub async fn input(&self, direction: Direction) -> Result<(), SessionError> {
        self.send(SessionCommand::Input(direction)).await
    }

    pub async fn replay(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Replay).await
    }

    pub async fn retry(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Retry).await
    }

    pub async fn advance_level(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::AdvanceLevel).await
    }

    /// Latest published view of the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Renderer feed; yields every snapshot published after subscription.
    pub fn snapshots(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.command_tx.send(command).await.map_err(|err| {
            warn!(
                target: "session_manager",
                command = ?err.0,
                "session worker stopped, dropping command"
            );
            SessionError::Closed
        })
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}
