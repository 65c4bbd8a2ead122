use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{info, warn};

use crate::navigation::Direction;
use crate::telemetry::events::duration_to_ms;

use super::availability::AudioAvailability;
use super::traits::CuePlayback;

/// Checks, once per attempt, which cue assets can actually be played.
#[derive(Clone)]
pub struct AvailabilityProbe {
    playback: Arc<dyn CuePlayback>,
    timeout: Duration,
}

impl std::fmt::Debug for AvailabilityProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvailabilityProbe")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AvailabilityProbe {
    pub fn new(playback: Arc<dyn CuePlayback>, timeout: Duration) -> Self {
        Self { playback, timeout }
    }

    /// Probes every requested direction concurrently. Directions that were not
    /// requested, errored or missed the timeout are reported unavailable.
    pub async fn probe(&self, directions: &[Direction]) -> AudioAvailability {
        let (straight, left, right) = tokio::join!(
            self.check(Direction::Straight, directions),
            self.check(Direction::Left, directions),
            self.check(Direction::Right, directions),
        );

        let availability = AudioAvailability::from_flags(straight, left, right);
        info!(
            target: "availability_probe",
            straight,
            left,
            right,
            "cue audio availability resolved"
        );
        availability
    }

    async fn check(&self, direction: Direction, requested: &[Direction]) -> bool {
        if !requested.contains(&direction) {
            return false;
        }

        match timeout(self.timeout, self.playback.can_play_through(direction)).await {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                warn!(
                    target: "availability_probe",
                    direction = %direction,
                    %err,
                    "cue asset cannot play"
                );
                false
            }
            Err(_) => {
                warn!(
                    target: "availability_probe",
                    direction = %direction,
                    timeout_ms = duration_to_ms(self.timeout),
                    "cue asset probe timed out"
                );
                false
            }
        }
    }
}
