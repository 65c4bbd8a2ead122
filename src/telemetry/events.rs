use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

pub(crate) const TARGET: &str = "telemetry::trainer";
pub(crate) const EVENT_LEVEL_STARTED: &str = "level_started";
pub(crate) const EVENT_CUE_DELIVERED: &str = "cue_delivered";
pub(crate) const EVENT_ATTEMPT_FINISHED: &str = "attempt_finished";

#[derive(Debug, Serialize)]
pub struct LevelStartedEvent {
    pub attempt_id: u64,
    pub level: u32,
    pub total_steps: u32,
    pub commands_per_step: u32,
    pub goal_x: f64,
    pub goal_z: f64,
    pub audio_available: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct CueDeliveredEvent {
    pub direction: &'static str,
    pub channel: &'static str,
    pub fallback_reason: Option<&'static str>,
    pub latency_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct AttemptFinishedEvent {
    pub attempt_id: u64,
    pub level: u32,
    pub outcome: &'static str,
    pub steps_completed: u32,
    pub total_steps: u32,
}

pub fn record_level_started(event: LevelStartedEvent) {
    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: TARGET,
            event = EVENT_LEVEL_STARTED,
            attempt_id = event.attempt_id,
            level = event.level,
            total_steps = event.total_steps,
            commands_per_step = event.commands_per_step,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_LEVEL_STARTED,
            %err,
            "failed to encode level start event"
        ),
    }
}

pub fn record_cue_delivered(
    direction: &'static str,
    channel: &'static str,
    fallback_reason: Option<&'static str>,
    latency: Duration,
) {
    let event = CueDeliveredEvent {
        direction,
        channel,
        fallback_reason,
        latency_ms: duration_to_ms(latency),
    };

    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: TARGET,
            event = EVENT_CUE_DELIVERED,
            direction = event.direction,
            channel = event.channel,
            latency_ms = event.latency_ms,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_CUE_DELIVERED,
            %err,
            "failed to encode cue delivery event"
        ),
    }
}

pub fn record_attempt_finished(
    attempt_id: u64,
    level: u32,
    outcome: &'static str,
    steps_completed: u32,
    total_steps: u32,
) {
    let event = AttemptFinishedEvent {
        attempt_id,
        level,
        outcome,
        steps_completed,
        total_steps,
    };

    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: TARGET,
            event = EVENT_ATTEMPT_FINISHED,
            attempt_id = event.attempt_id,
            level = event.level,
            outcome = event.outcome,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_ATTEMPT_FINISHED,
            %err,
            "failed to encode attempt finished event"
        ),
    }
}

pub(crate) fn duration_to_ms(duration: Duration) -> u64 {
    duration.as_millis().min(u64::MAX as u128) as u64
}
