//! Effect trait definition
//!
//! Base trait for every pipeline stage, plus the stage identifiers that fix
//! the canonical execution order.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::Waveform;
use crate::error::{Result, VoiceFxError};

/// Pipeline stages in canonical execution order
///
/// The discriminant is the stage's position: the effects chain runs
/// `PitchShift` through `Normalize`, the enhancement pass runs
/// `NoiseReduction` through `Preemphasis`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectStage {
    PitchShift = 0,
    SpeedChange = 1,
    Robot = 2,
    Echo = 3,
    Reverb = 4,
    Normalize = 5,
    NoiseReduction = 6,
    Compression = 7,
    Preemphasis = 8,
}

impl EffectStage {
    /// Stable identifier used in reports and logs
    pub fn name(&self) -> &'static str {
        match self {
            EffectStage::PitchShift => "pitch_shift",
            EffectStage::SpeedChange => "speed_change",
            EffectStage::Robot => "robot",
            EffectStage::Echo => "echo",
            EffectStage::Reverb => "reverb",
            EffectStage::Normalize => "normalize",
            EffectStage::NoiseReduction => "noise_reduction",
            EffectStage::Compression => "compression",
            EffectStage::Preemphasis => "preemphasis",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            EffectStage::PitchShift => "Pitch Shift",
            EffectStage::SpeedChange => "Speed Change",
            EffectStage::Robot => "Robot Voice",
            EffectStage::Echo => "Echo",
            EffectStage::Reverb => "Reverb",
            EffectStage::Normalize => "Normalize",
            EffectStage::NoiseReduction => "Noise Reduction",
            EffectStage::Compression => "Compression",
            EffectStage::Preemphasis => "Pre-emphasis",
        }
    }

    /// Position in the canonical order (lower runs first)
    pub fn position(&self) -> u32 {
        *self as u32
    }

    /// Whether this stage belongs to the enhancement pass
    pub fn is_enhancement(&self) -> bool {
        *self >= EffectStage::NoiseReduction
    }

    /// Build the recoverable error a failing stage reports
    pub fn failure(&self, reason: impl Into<String>) -> VoiceFxError {
        VoiceFxError::StageExecution {
            stage: self.name(),
            reason: reason.into(),
        }
    }
}

/// Base trait for all pipeline stages
///
/// Stages are pure: `apply` never mutates the input and never keeps state
/// between calls, so a single instance can be shared across threads.
pub trait Effect: Send + Sync + std::fmt::Debug {
    /// Which stage this effect implements
    fn stage(&self) -> EffectStage;

    /// Transform `input` into a new waveform at the same sample rate
    ///
    /// # Errors
    /// * `StageExecution` - If the stage cannot process this input
    fn apply(&self, input: &Waveform) -> Result<Waveform>;

    /// Get the effect parameters as JSON (for reports)
    fn params(&self) -> Value;

    /// Get the stage identifier
    fn name(&self) -> &'static str {
        self.stage().name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enhancement_stages_follow_effects() {
        assert!(!EffectStage::Normalize.is_enhancement());
        assert!(EffectStage::NoiseReduction.is_enhancement());
        assert!(EffectStage::Normalize < EffectStage::NoiseReduction);
        assert!(EffectStage::PitchShift < EffectStage::SpeedChange);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(EffectStage::PitchShift.name(), "pitch_shift");
        assert_eq!(EffectStage::Normalize.position(), 5);
        let json = serde_json::to_string(&EffectStage::SpeedChange).unwrap();
        assert_eq!(json, "\"speed_change\"");
    }

    #[test]
    fn test_failure_is_recoverable() {
        let err = EffectStage::Echo.failure("boom");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("echo"));
    }
}
