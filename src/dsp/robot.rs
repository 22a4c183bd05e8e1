//! Robot Voice
//!
//! Ring modulation against a low-frequency carrier, with bit-depth
//! reduction at higher intensities.

use std::f64::consts::PI;

use serde_json::{json, Value};

use crate::dsp::effect::{Effect, EffectStage};
use crate::engine::Waveform;
use crate::error::Result;

/// Intensity above which the output is bit-crushed
const QUANTIZE_ABOVE: f32 = 0.3;

/// Ring-modulated robot voice
#[derive(Debug, Clone, PartialEq)]
pub struct RobotVoice {
    intensity: f32,
}

impl RobotVoice {
    /// Create a robot voice effect
    ///
    /// # Arguments
    /// * `intensity` - Effect strength in [0, 1]; sets carrier frequency and depth
    pub fn new(intensity: f32) -> Self {
        Self { intensity }
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Carrier frequency in Hz (30 Hz at zero intensity, 130 Hz at full)
    pub fn carrier_hz(&self) -> f32 {
        30.0 + 100.0 * self.intensity
    }

    /// Bit depth the output is quantized to, if any
    pub fn bit_depth(&self) -> Option<u32> {
        (self.intensity > QUANTIZE_ABOVE)
            .then(|| 8 + ((1.0 - self.intensity) * 8.0).round().max(0.0) as u32)
    }
}

impl Effect for RobotVoice {
    fn stage(&self) -> EffectStage {
        EffectStage::Robot
    }

    fn apply(&self, input: &Waveform) -> Result<Waveform> {
        if self.intensity == 0.0 {
            return Ok(input.clone());
        }

        let intensity = self.intensity;
        let step = 2.0 * PI * self.carrier_hz() as f64 / input.sample_rate() as f64;
        let levels = self.bit_depth().map(|bits| (1u64 << (bits - 1)) as f32);

        let samples = input
            .samples()
            .iter()
            .enumerate()
            .map(|(n, &x)| {
                let carrier = (step * n as f64).sin() as f32;
                let modulated = x * (1.0 + intensity * carrier);
                match levels {
                    Some(max) => (modulated * max).round() / max,
                    None => modulated,
                }
            })
            .collect();

        Ok(input.with_samples(samples))
    }

    fn params(&self) -> Value {
        json!({
            "intensity": self.intensity,
            "carrier_hz": self.carrier_hz(),
            "bit_depth": self.bit_depth(),
        })
    }
}
