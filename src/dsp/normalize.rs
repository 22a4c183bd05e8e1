//! Peak Normalization

use serde_json::{json, Value};

use crate::dsp::effect::{Effect, EffectStage};
use crate::engine::Waveform;
use crate::error::Result;

/// Peak level after normalization
pub const TARGET_PEAK: f32 = 0.95;

/// Scales the waveform so its absolute peak is exactly [`TARGET_PEAK`]
///
/// Silent input is returned unchanged, as is input already at the target,
/// so applying it twice gives the same result as applying it once.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Normalize;

impl Effect for Normalize {
    fn stage(&self) -> EffectStage {
        EffectStage::Normalize
    }

    fn apply(&self, input: &Waveform) -> Result<Waveform> {
        let peak = input.peak();
        if peak == 0.0 || peak == TARGET_PEAK {
            return Ok(input.clone());
        }
        if !peak.is_finite() {
            return Err(self.stage().failure("peak level is not finite"));
        }

        let samples = input
            .samples()
            .iter()
            .map(|&s| s / peak * TARGET_PEAK)
            .collect();
        Ok(input.with_samples(samples))
    }

    fn params(&self) -> Value {
        json!({ "target_peak": TARGET_PEAK })
    }
}
