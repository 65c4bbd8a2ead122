//! Cue narration: audio playback with synthesized-speech fallback.

pub mod assets;
pub mod availability;
pub mod player;
pub mod probe;
pub mod traits;

pub use assets::{CueAsset, CueAssets};
pub use availability::AudioAvailability;
pub use player::{CueDelivery, FallbackReason, NarrationPlayer, ReplayOutcome, SpeechOutcome};
pub use probe::AvailabilityProbe;
pub use traits::{
    CuePlayback, LogSpeechSynthesizer, NullCuePlayback, PlaybackError, SpeechSynthesizer,
};
