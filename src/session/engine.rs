use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::TrainerConfig;
use crate::narration::AudioAvailability;
use crate::navigation::{
    Direction, GameStatus, GeneratedPath, LevelCatalog, LevelConfig, MovementModel, PathGenerator,
    Pose,
};
use crate::telemetry::events::{record_attempt_finished, record_level_started, LevelStartedEvent};

use super::error::TransitionError;
use super::lifecycle::SessionSnapshot;
use super::state::{PendingKind, PendingTransition, Session};

/// Result of feeding one direction to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputOutcome {
    /// Input arrived while the session was not accepting moves.
    Ignored,
    Accepted {
        pose: Pose,
        remaining: usize,
    },
    StepComplete {
        pose: Pose,
        next_step: u32,
        delay: Duration,
    },
    Succeeded {
        pose: Pose,
    },
    Failed {
        expected: Direction,
        received: Direction,
    },
}

/// Synchronous game state machine.
///
/// Drives one [`Session`] at a time through
/// `Start -> Listening -> Moving -> (Listening ...) -> Success | Fail`.
/// Timing is never handled here: pacing between steps is exposed as a
/// [`PendingTransition`] for the caller to fire.
pub struct SessionEngine<R = StdRng> {
    catalog: LevelCatalog,
    generator: PathGenerator,
    movement: MovementModel,
    step_advance_delay: Duration,
    rng: R,
    next_attempt_id: u64,
    session: Option<Session>,
}

impl<R> std::fmt::Debug for SessionEngine<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEngine")
            .field("catalog", &self.catalog)
            .field("step_advance_delay", &self.step_advance_delay)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl SessionEngine<StdRng> {
    /// Seeds from `config.seed` when present, otherwise from OS entropy.
    pub fn new(catalog: LevelCatalog, config: &TrainerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(catalog, config, rng)
    }
}

impl<R: Rng> SessionEngine<R> {
    pub fn with_rng(catalog: LevelCatalog, config: &TrainerConfig, rng: R) -> Self {
        let movement = config.movement_model();
        Self {
            catalog,
            generator: PathGenerator::new(movement),
            movement,
            step_advance_delay: config.step_advance_delay,
            rng,
            next_attempt_id: 0,
            session: None,
        }
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn status(&self) -> Option<GameStatus> {
        self.session.as_ref().map(|session| session.status)
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.session.as_ref().map(SessionSnapshot::from_session)
    }

    pub fn pending_transition(&self) -> Option<PendingTransition> {
        self.session
            .as_ref()
            .and_then(|session| session.pending_transition)
    }

    /// Generates a fresh attempt at `level_id`, replacing any current session.
    /// Unknown ids fall back to the first catalog level.
    pub fn start_level(
        &mut self,
        level_id: u32,
        audio_availability: Arc<AudioAvailability>,
    ) -> &Session {
        let config = self.catalog.get(level_id);
        let generated = self.generator.generate(&config, &mut self.rng);
        self.install(config, generated, audio_availability)
    }

    /// Starts an attempt that replays a fixed path instead of a random one.
    #[cfg(test)]
    pub(crate) fn start_with_path(
        &mut self,
        config: LevelConfig,
        path: Vec<Direction>,
        audio_availability: Arc<AudioAvailability>,
    ) -> &Session {
        let generated = self.generator.trace(path);
        self.install(config, generated, audio_availability)
    }

    /// Regenerates the current level after a failed attempt.
    pub fn retry(
        &mut self,
        audio_availability: Arc<AudioAvailability>,
    ) -> Result<&Session, TransitionError> {
        let level = self.require_status("retry", GameStatus::Fail)?.config.id;
        Ok(self.start_level(level, audio_availability))
    }

    /// Moves on to the next catalog level after a successful attempt.
    pub fn advance_level(
        &mut self,
        audio_availability: Arc<AudioAvailability>,
    ) -> Result<&Session, TransitionError> {
        let level = self
            .require_status("advance level", GameStatus::Success)?
            .config
            .id;
        let next = self.catalog.next_level(level);
        Ok(self.start_level(next.id, audio_availability))
    }

    /// `Start -> Listening`. Returns the cues to narrate.
    pub fn begin_step(&mut self) -> Result<Vec<Direction>, TransitionError> {
        self.require_status("begin step", GameStatus::Start)?;
        let session = self.session.as_mut().ok_or(TransitionError::NoSession)?;

        session.load_step(session.current_step_index);
        session.status = GameStatus::Listening;
        debug!(
            target: "session_engine",
            attempt_id = session.attempt_id,
            step = session.current_step_index,
            "narrating first step"
        );
        Ok(session.commands_for_step.clone())
    }

    /// `Listening -> Moving` once the step's narration has been voiced.
    ///
    /// Completions for another attempt or step are stale and ignored.
    pub fn narration_finished(&mut self, attempt_id: u64, step_index: u32) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        if session.attempt_id != attempt_id
            || session.current_step_index != step_index
            || session.status != GameStatus::Listening
        {
            debug!(
                target: "session_engine",
                attempt_id,
                step_index,
                "ignoring stale narration completion"
            );
            return false;
        }

        session.status = GameStatus::Moving;
        true
    }

    /// Validates `direction` against the next expected command.
    pub fn submit(&mut self, direction: Direction) -> InputOutcome {
        let Some(session) = self.session.as_mut() else {
            return InputOutcome::Ignored;
        };

        if !session.status.accepts_input() || session.pending_transition.is_some() {
            debug!(
                target: "session_engine",
                status = %session.status,
                direction = %direction,
                "input ignored"
            );
            return InputOutcome::Ignored;
        }

        let Some(expected) = session.expected_command() else {
            return InputOutcome::Ignored;
        };

        if direction != expected {
            session.status = GameStatus::Fail;
            info!(
                target: "session_engine",
                attempt_id = session.attempt_id,
                step = session.current_step_index,
                expected = %expected,
                received = %direction,
                "input mismatch, attempt failed"
            );
            record_attempt_finished(
                session.attempt_id,
                session.config.id,
                GameStatus::Fail.as_str(),
                session.current_step_index,
                session.config.total_steps,
            );
            return InputOutcome::Failed {
                expected,
                received: direction,
            };
        }

        session.pose = self.movement.apply(session.pose, direction);
        session.moves_accepted_in_step += 1;
        let pose = session.pose;

        if !session.step_complete() {
            return InputOutcome::Accepted {
                pose,
                remaining: session.commands_for_step.len() - session.moves_accepted_in_step,
            };
        }

        if session.is_final_step() {
            session.status = GameStatus::Success;
            info!(
                target: "session_engine",
                attempt_id = session.attempt_id,
                level = session.config.id,
                "level completed"
            );
            record_attempt_finished(
                session.attempt_id,
                session.config.id,
                GameStatus::Success.as_str(),
                session.config.total_steps,
                session.config.total_steps,
            );
            return InputOutcome::Succeeded { pose };
        }

        let next_step = session.current_step_index + 1;
        session.load_step(next_step);
        session.pending_transition = Some(PendingTransition {
            kind: PendingKind::BeginNextStep,
            step_index: next_step,
            delay: self.step_advance_delay,
        });

        InputOutcome::StepComplete {
            pose,
            next_step,
            delay: self.step_advance_delay,
        }
    }

    /// Applies the scheduled transition, if any. Returns the cues to narrate.
    pub fn fire_pending(&mut self) -> Option<Vec<Direction>> {
        let session = self.session.as_mut()?;
        let pending = session.pending_transition.take()?;

        match pending.kind {
            PendingKind::BeginNextStep => {
                session.status = GameStatus::Listening;
                debug!(
                    target: "session_engine",
                    attempt_id = session.attempt_id,
                    step = pending.step_index,
                    "narrating next step"
                );
                Some(session.commands_for_step.clone())
            }
        }
    }

    fn install(
        &mut self,
        config: LevelConfig,
        generated: GeneratedPath,
        audio_availability: Arc<AudioAvailability>,
    ) -> &Session {
        self.next_attempt_id += 1;
        let session = Session::new(
            self.next_attempt_id,
            config,
            generated,
            audio_availability,
        );

        record_level_started(LevelStartedEvent {
            attempt_id: session.attempt_id,
            level: config.id,
            total_steps: config.total_steps,
            commands_per_step: config.command_count_per_step,
            goal_x: session.goal.x,
            goal_z: session.goal.z,
            audio_available: session
                .audio_availability
                .available_directions()
                .iter()
                .map(Direction::as_str)
                .collect(),
        });

        self.session.insert(session)
    }

    pub(crate) fn require_status(
        &self,
        action: &'static str,
        expected: GameStatus,
    ) -> Result<&Session, TransitionError> {
        let session = self.session.as_ref().ok_or(TransitionError::NoSession)?;
        if session.status != expected {
            return Err(TransitionError::InvalidStatus {
                action,
                status: session.status,
            });
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn engine() -> SessionEngine {
        let config = TrainerConfig {
            seed: Some(11),
            ..TrainerConfig::default()
        };
        SessionEngine::new(LevelCatalog::default(), &config)
    }

    fn scripted(engine: &mut SessionEngine, path: Vec<Direction>, commands_per_step: u32) {
        let total_steps = path.len() as u32 / commands_per_step;
        engine.start_with_path(
            LevelConfig::new(1, commands_per_step, total_steps),
            path,
            Arc::new(AudioAvailability::none()),
        );
    }

    fn enter_moving(engine: &mut SessionEngine) {
        let session = engine.session().expect("session started");
        let (attempt, step) = (session.attempt_id(), session.current_step_index());
        assert!(engine.narration_finished(attempt, step));
    }

    fn assert_pose(pose: Pose, x: f64, z: f64, rotation: f64) {
        assert!((pose.x - x).abs() < EPSILON, "x: {} != {x}", pose.x);
        assert!((pose.z - z).abs() < EPSILON, "z: {} != {z}", pose.z);
        assert!(
            (pose.rotation_degrees - rotation).abs() < EPSILON,
            "rotation: {} != {rotation}",
            pose.rotation_degrees
        );
    }

    #[test]
    fn worked_example_reaches_success() {
        use Direction::*;

        let mut engine = engine();
        scripted(&mut engine, vec![Straight, Left, Straight], 1);

        assert_eq!(engine.begin_step(), Ok(vec![Straight]));
        enter_moving(&mut engine);
        match engine.submit(Straight) {
            InputOutcome::StepComplete {
                pose, next_step, ..
            } => {
                assert_pose(pose, 0.0, -5.0, 0.0);
                assert_eq!(next_step, 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        assert_eq!(engine.fire_pending(), Some(vec![Left]));
        assert_eq!(engine.status(), Some(GameStatus::Listening));
        enter_moving(&mut engine);
        match engine.submit(Left) {
            InputOutcome::StepComplete { pose, .. } => assert_pose(pose, 0.0, -5.0, 90.0),
            other => panic!("unexpected outcome: {other:?}"),
        }

        assert_eq!(engine.fire_pending(), Some(vec![Straight]));
        enter_moving(&mut engine);
        match engine.submit(Straight) {
            InputOutcome::Succeeded { pose } => assert_pose(pose, -5.0, -5.0, 90.0),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(engine.status(), Some(GameStatus::Success));
    }

    #[test]
    fn worked_example_wrong_turn_fails_in_place() {
        use Direction::*;

        let mut engine = engine();
        scripted(&mut engine, vec![Straight, Left, Straight], 1);
        engine.begin_step().expect("begin");
        enter_moving(&mut engine);
        engine.submit(Straight);
        engine.fire_pending();
        enter_moving(&mut engine);

        assert_eq!(
            engine.submit(Right),
            InputOutcome::Failed {
                expected: Left,
                received: Right
            }
        );
        let session = engine.session().expect("session");
        assert_eq!(session.status(), GameStatus::Fail);
        assert_pose(session.pose(), 0.0, -5.0, 0.0);

        // Nothing moves after failing.
        assert_eq!(engine.submit(Left), InputOutcome::Ignored);
        assert_pose(engine.session().expect("session").pose(), 0.0, -5.0, 0.0);
    }

    #[test]
    fn generated_path_played_back_succeeds_after_all_steps() {
        let mut engine = engine();
        for level in LevelCatalog::default().levels().to_vec() {
            engine.start_level(level.id, Arc::new(AudioAvailability::none()));
            let path = engine.session().expect("session").path().to_vec();
            let mut narrated_steps = 0;

            let mut cues = engine.begin_step().expect("begin");
            let mut inputs = path.iter();
            loop {
                narrated_steps += 1;
                enter_moving(&mut engine);
                let mut last = InputOutcome::Ignored;
                for _ in &cues {
                    last = engine.submit(*inputs.next().expect("path has inputs"));
                }
                match last {
                    InputOutcome::StepComplete { .. } => {
                        cues = engine.fire_pending().expect("pending step");
                    }
                    InputOutcome::Succeeded { .. } => break,
                    other => panic!("unexpected outcome: {other:?}"),
                }
            }

            assert_eq!(narrated_steps, level.total_steps);
            assert_eq!(engine.status(), Some(GameStatus::Success));
            let session = engine.session().expect("session");
            let goal = session.goal();
            let pose = session.pose();
            assert!((goal.x - pose.x).abs() <= 2.5 + EPSILON);
            assert!((goal.z - pose.z).abs() <= 2.5 + EPSILON);
        }
    }

    #[test]
    fn wrong_input_at_any_position_fails() {
        let mut engine = engine();
        engine.start_level(5, Arc::new(AudioAvailability::none()));
        let path = engine.session().expect("session").path().to_vec();
        let config = engine.session().expect("session").config();

        for wrong_at in 0..path.len() {
            engine.start_with_path(config, path.clone(), Arc::new(AudioAvailability::none()));
            engine.begin_step().expect("begin");
            enter_moving(&mut engine);

            for (index, expected) in path.iter().enumerate() {
                if index == wrong_at {
                    let wrong = Direction::ALL
                        .into_iter()
                        .find(|direction| direction != expected)
                        .expect("another direction exists");
                    let before = engine.session().expect("session").pose();
                    assert!(matches!(
                        engine.submit(wrong),
                        InputOutcome::Failed { .. }
                    ));
                    assert_eq!(engine.session().expect("session").pose(), before);
                    break;
                }
                if let InputOutcome::StepComplete { .. } = engine.submit(*expected) {
                    engine.fire_pending();
                    enter_moving(&mut engine);
                }
            }
            assert_eq!(engine.status(), Some(GameStatus::Fail));
        }
    }

    #[test]
    fn input_outside_moving_never_mutates() {
        use Direction::*;

        let mut engine = engine();
        scripted(&mut engine, vec![Left, Right, Straight, Straight], 2);

        // Start
        assert_eq!(engine.submit(Left), InputOutcome::Ignored);
        engine.begin_step().expect("begin");
        // Listening
        assert_eq!(engine.submit(Left), InputOutcome::Ignored);
        let session = engine.session().expect("session");
        assert_eq!(session.moves_accepted_in_step(), 0);
        assert_eq!(session.pose(), Pose::ORIGIN);

        enter_moving(&mut engine);
        assert!(matches!(
            engine.submit(Left),
            InputOutcome::Accepted { remaining: 1, .. }
        ));
        assert!(matches!(
            engine.submit(Right),
            InputOutcome::StepComplete { next_step: 1, .. }
        ));

        // Pending pacing delay: still Moving, but no input until narrated.
        let session = engine.session().expect("session");
        assert_eq!(session.status(), GameStatus::Moving);
        assert_eq!(session.moves_accepted_in_step(), 0);
        assert_eq!(session.commands_for_step(), &[Straight, Straight]);
        let before = session.pose();
        assert_eq!(engine.submit(Straight), InputOutcome::Ignored);
        assert_eq!(engine.session().expect("session").pose(), before);
    }

    #[test]
    fn success_ignores_further_input() {
        use Direction::*;

        let mut engine = engine();
        scripted(&mut engine, vec![Right], 1);
        engine.begin_step().expect("begin");
        enter_moving(&mut engine);
        assert!(matches!(engine.submit(Right), InputOutcome::Succeeded { .. }));
        let before = engine.session().expect("session").pose();
        assert_eq!(engine.submit(Straight), InputOutcome::Ignored);
        assert_eq!(engine.session().expect("session").pose(), before);
    }

    #[test]
    fn stale_narration_completion_is_ignored() {
        let mut engine = engine();
        engine.start_level(1, Arc::new(AudioAvailability::none()));
        let attempt = engine.session().expect("session").attempt_id();

        // Not listening yet.
        assert!(!engine.narration_finished(attempt, 0));
        engine.begin_step().expect("begin");
        assert!(!engine.narration_finished(attempt + 1, 0));
        assert!(!engine.narration_finished(attempt, 1));
        assert!(engine.narration_finished(attempt, 0));
        assert_eq!(engine.status(), Some(GameStatus::Moving));
    }

    #[test]
    fn retry_and_advance_require_terminal_status() {
        use Direction::*;

        let mut engine = engine();
        assert_eq!(engine.begin_step(), Err(TransitionError::NoSession));

        scripted(&mut engine, vec![Left], 1);
        assert_eq!(
            engine
                .retry(Arc::new(AudioAvailability::none()))
                .map(|session| session.attempt_id()),
            Err(TransitionError::InvalidStatus {
                action: "retry",
                status: GameStatus::Start
            })
        );
        engine.begin_step().expect("begin");
        assert!(engine.begin_step().is_err());

        enter_moving(&mut engine);
        engine.submit(Right);
        let failed_attempt = engine.session().expect("session").attempt_id();
        assert!(engine
            .advance_level(Arc::new(AudioAvailability::none()))
            .is_err());

        let retried = engine
            .retry(Arc::new(AudioAvailability::all()))
            .expect("retry from fail");
        assert_eq!(retried.status(), GameStatus::Start);
        assert_eq!(retried.level(), 1);
        assert!(retried.attempt_id() > failed_attempt);
        assert_eq!(retried.pose(), Pose::ORIGIN);
        assert_eq!(retried.moves_accepted_in_step(), 0);
        assert!(retried.audio_availability().is_available(Left));
    }

    #[test]
    fn advance_wraps_to_first_level() {
        let mut engine = engine();
        let last = *engine
            .catalog()
            .levels()
            .last()
            .expect("catalog has levels");
        let first = engine.catalog().first();

        let config = engine.catalog().get(last.id);
        let path = vec![Direction::Straight; config.path_len()];
        engine.start_with_path(config, path.clone(), Arc::new(AudioAvailability::none()));
        engine.begin_step().expect("begin");
        enter_moving(&mut engine);
        for direction in path {
            if let InputOutcome::StepComplete { .. } = engine.submit(direction) {
                engine.fire_pending();
                enter_moving(&mut engine);
            }
        }
        assert_eq!(engine.status(), Some(GameStatus::Success));

        let next = engine
            .advance_level(Arc::new(AudioAvailability::none()))
            .expect("advance from success");
        assert_eq!(next.level(), first.id);
        assert_eq!(next.status(), GameStatus::Start);
    }

    #[test]
    fn unknown_level_uses_first_config() {
        let mut engine = engine();
        let session = engine.start_level(999, Arc::new(AudioAvailability::none()));
        assert_eq!(session.level(), 1);
        assert_eq!(session.path().len(), session.config().path_len());
    }

    #[test]
    fn commands_for_step_track_the_path_slice() {
        let mut engine = engine();
        engine.start_level(4, Arc::new(AudioAvailability::none()));
        let session = engine.session().expect("session");
        let config = session.config();
        assert_eq!(
            session.commands_for_step(),
            &session.path()[config.step_range(0)]
        );
    }
}
