//! Read-only views of a running session for renderers and observers.

use serde::Serialize;

use crate::narration::FallbackReason;
use crate::navigation::{Direction, GameStatus, GridCell, Pose};

use super::state::Session;

/// Everything a renderer needs to draw the current frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub attempt_id: u64,
    pub level: u32,
    pub pose: Pose,
    /// `None` until the first attempt has been generated.
    pub goal: Option<GridCell>,
    pub status: GameStatus,
    pub step_index: u32,
    pub total_steps: u32,
    pub moves_accepted: usize,
    pub commands_in_step: usize,
    pub loading: bool,
}

impl SessionSnapshot {
    pub fn loading(level: u32) -> Self {
        Self {
            attempt_id: 0,
            level,
            pose: Pose::ORIGIN,
            goal: None,
            status: GameStatus::Start,
            step_index: 0,
            total_steps: 0,
            moves_accepted: 0,
            commands_in_step: 0,
            loading: true,
        }
    }

    pub(crate) fn from_session(session: &Session) -> Self {
        Self {
            attempt_id: session.attempt_id,
            level: session.config.id,
            pose: session.pose,
            goal: Some(session.goal),
            status: session.status,
            step_index: session.current_step_index,
            total_steps: session.config.total_steps,
            moves_accepted: session.moves_accepted_in_step,
            commands_in_step: session.commands_for_step.len(),
            loading: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayIgnoredReason {
    NotMoving,
    AlreadyInFlight,
}

/// Lifecycle notifications emitted by the session runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Loading {
        level: u32,
    },
    LevelReady {
        attempt_id: u64,
        level: u32,
        total_steps: u32,
        commands_per_step: u32,
    },
    StepNarrating {
        attempt_id: u64,
        step_index: u32,
        cues: Vec<Direction>,
    },
    AwaitingInput {
        attempt_id: u64,
        step_index: u32,
    },
    MoveAccepted {
        attempt_id: u64,
        direction: Direction,
        pose: Pose,
        remaining: usize,
    },
    StepCompleted {
        attempt_id: u64,
        next_step: u32,
    },
    Succeeded {
        attempt_id: u64,
        level: u32,
    },
    Failed {
        attempt_id: u64,
        expected: Direction,
        received: Direction,
    },
    CueFallback {
        attempt_id: u64,
        direction: Direction,
        reason: FallbackReason,
    },
    ReplayIgnored {
        attempt_id: u64,
        reason: ReplayIgnoredReason,
    },
}

impl SessionEvent {
    pub fn attempt_id(&self) -> Option<u64> {
        match self {
            SessionEvent::Loading { .. } => None,
            SessionEvent::LevelReady { attempt_id, .. }
            | SessionEvent::StepNarrating { attempt_id, .. }
            | SessionEvent::AwaitingInput { attempt_id, .. }
            | SessionEvent::MoveAccepted { attempt_id, .. }
            | SessionEvent::StepCompleted { attempt_id, .. }
            | SessionEvent::Succeeded { attempt_id, .. }
            | SessionEvent::Failed { attempt_id, .. }
            | SessionEvent::CueFallback { attempt_id, .. }
            | SessionEvent::ReplayIgnored { attempt_id, .. } => Some(*attempt_id),
        }
    }
}
