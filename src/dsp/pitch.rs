//! Pitch Shift
//!
//! Shifts pitch by a number of semitones while preserving duration: the
//! signal is time-stretched by the pitch ratio, then resampled back to its
//! original length.

use serde_json::{json, Value};

use crate::dsp::effect::{Effect, EffectStage};
use crate::dsp::stft::MIN_ANALYSIS_SAMPLES;
use crate::dsp::stretch::time_stretch;
use crate::engine::codec::resample_samples;
use crate::engine::Waveform;
use crate::error::Result;

/// Duration-preserving pitch shifter
#[derive(Debug, Clone, PartialEq)]
pub struct PitchShift {
    semitones: f32,
}

impl PitchShift {
    /// Create a pitch shift
    ///
    /// # Arguments
    /// * `semitones` - Shift amount; positive raises pitch
    pub fn new(semitones: f32) -> Self {
        Self { semitones }
    }

    pub fn semitones(&self) -> f32 {
        self.semitones
    }

    /// Frequency multiplier for this shift
    pub fn ratio(&self) -> f32 {
        2.0f32.powf(self.semitones / 12.0)
    }
}

impl Effect for PitchShift {
    fn stage(&self) -> EffectStage {
        EffectStage::PitchShift
    }

    fn apply(&self, input: &Waveform) -> Result<Waveform> {
        if self.semitones == 0.0 {
            return Ok(input.clone());
        }
        if !self.semitones.is_finite() {
            return Err(self.stage().failure("semitone shift is not finite"));
        }
        if input.len() < MIN_ANALYSIS_SAMPLES {
            return Err(self.stage().failure(format!(
                "input has {} samples, need at least {} for analysis",
                input.len(),
                MIN_ANALYSIS_SAMPLES
            )));
        }

        // Stretch by the inverse ratio, then resample so the length comes back
        let rate = 1.0 / self.ratio();
        let stretched = time_stretch(input.samples(), rate);
        let mut shifted = resample_samples(&stretched, rate as f64)
            .map_err(|e| self.stage().failure(e.to_string()))?;
        shifted.resize(input.len(), 0.0);

        Ok(input.with_samples(shifted))
    }

    fn params(&self) -> Value {
        json!({ "pitch_shift_semitones": self.semitones })
    }
}
