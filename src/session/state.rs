use std::sync::Arc;
use std::time::Duration;

use crate::narration::AudioAvailability;
use crate::navigation::{Direction, GameStatus, GeneratedPath, GridCell, LevelConfig, Pose};

/// Transition the engine has scheduled but not yet applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransition {
    pub kind: PendingKind,
    pub step_index: u32,
    pub delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    /// Narrate the step at `step_index` once the delay has elapsed.
    BeginNextStep,
}

/// State of one attempt at one level.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) attempt_id: u64,
    pub(crate) config: LevelConfig,
    pub(crate) path: Vec<Direction>,
    pub(crate) goal: GridCell,
    pub(crate) pose: Pose,
    pub(crate) current_step_index: u32,
    pub(crate) commands_for_step: Vec<Direction>,
    pub(crate) moves_accepted_in_step: usize,
    pub(crate) status: GameStatus,
    pub(crate) audio_availability: Arc<AudioAvailability>,
    pub(crate) pending_transition: Option<PendingTransition>,
}

impl Session {
    pub(crate) fn new(
        attempt_id: u64,
        config: LevelConfig,
        generated: GeneratedPath,
        audio_availability: Arc<AudioAvailability>,
    ) -> Self {
        let mut session = Self {
            attempt_id,
            config,
            path: generated.path,
            goal: generated.goal,
            pose: Pose::ORIGIN,
            current_step_index: 0,
            commands_for_step: Vec::new(),
            moves_accepted_in_step: 0,
            status: GameStatus::Start,
            audio_availability,
            pending_transition: None,
        };
        session.load_step(0);
        session
    }

    /// Points the session at `step_index`, re-slicing its commands and
    /// clearing accepted moves.
    pub(crate) fn load_step(&mut self, step_index: u32) {
        let range = self.config.step_range(step_index);
        self.current_step_index = step_index;
        self.commands_for_step = self.path[range].to_vec();
        self.moves_accepted_in_step = 0;
    }

    pub(crate) fn expected_command(&self) -> Option<Direction> {
        self.commands_for_step
            .get(self.moves_accepted_in_step)
            .copied()
    }

    pub(crate) fn is_final_step(&self) -> bool {
        self.current_step_index + 1 >= self.config.total_steps
    }

    pub(crate) fn step_complete(&self) -> bool {
        self.moves_accepted_in_step >= self.commands_for_step.len()
    }

    pub fn attempt_id(&self) -> u64 {
        self.attempt_id
    }

    pub fn level(&self) -> u32 {
        self.config.id
    }

    pub fn config(&self) -> LevelConfig {
        self.config
    }

    pub fn path(&self) -> &[Direction] {
        &self.path
    }

    pub fn goal(&self) -> GridCell {
        self.goal
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn current_step_index(&self) -> u32 {
        self.current_step_index
    }

    pub fn commands_for_step(&self) -> &[Direction] {
        &self.commands_for_step
    }

    pub fn moves_accepted_in_step(&self) -> usize {
        self.moves_accepted_in_step
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn audio_availability(&self) -> Arc<AudioAvailability> {
        Arc::clone(&self.audio_availability)
    }

    pub fn pending_transition(&self) -> Option<PendingTransition> {
        self.pending_transition
    }
}
