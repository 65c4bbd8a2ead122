mod handle;
mod worker;

pub use handle::SessionHandle;

use std::sync::Arc;

use rand::Rng;
use tokio::sync::{broadcast, mpsc, watch};

use crate::config::TrainerConfig;
use crate::narration::{AvailabilityProbe, NarrationPlayer};
use crate::navigation::Direction;

use super::engine::SessionEngine;
use super::lifecycle::{SessionEvent, SessionSnapshot};

use self::worker::SessionWorker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionCommand {
    StartLevel(u32),
    BeginStep,
    Input(Direction),
    Replay,
    Retry,
    AdvanceLevel,
}

pub(crate) fn spawn_session<R>(
    config: &TrainerConfig,
    engine: SessionEngine<R>,
    narrator: Arc<NarrationPlayer>,
    probe: AvailabilityProbe,
) -> (SessionHandle, broadcast::Receiver<SessionEvent>)
where
    R: Rng + Send + Sync + 'static,
{
    let (command_tx, command_rx) = mpsc::channel(config.event_buffer);
    let (events_tx, events_rx) = broadcast::channel(config.event_buffer);
    let (snapshot_tx, snapshot_rx) =
        watch::channel(SessionSnapshot::loading(engine.catalog().first().id));

    let worker = SessionWorker::new(
        engine,
        narrator,
        probe,
        config.min_loading_display,
        command_rx,
        events_tx.clone(),
        snapshot_tx,
    );
    let worker_handle = worker.spawn();
    let handle = SessionHandle::new(command_tx, events_tx, snapshot_rx, worker_handle);

    (handle, events_rx)
}
