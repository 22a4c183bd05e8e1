//! Speed Change
//!
//! Pitch-preserving time-scale modification using a phase vocoder.

use serde_json::{json, Value};

use crate::dsp::effect::{Effect, EffectStage};
use crate::dsp::stft::{phase_vocoder, Stft, HOP_LENGTH, MIN_ANALYSIS_SAMPLES, N_FFT};
use crate::engine::Waveform;
use crate::error::Result;

/// Time-stretch raw samples by `rate` (> 1 is faster/shorter)
///
/// The output holds `round(len / rate)` samples.
pub fn time_stretch(samples: &[f32], rate: f32) -> Vec<f32> {
    let stft = Stft::new(N_FFT, HOP_LENGTH);
    let frames = stft.forward(samples);
    let stretched = phase_vocoder(&frames, rate, HOP_LENGTH, N_FFT);
    let length = (samples.len() as f64 / rate as f64).round() as usize;
    stft.inverse(&stretched, length)
}

/// Speed change that keeps the pitch
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedChange {
    factor: f32,
}

impl SpeedChange {
    /// Create a speed change
    ///
    /// # Arguments
    /// * `factor` - Playback speed multiplier; 2.0 halves the duration
    pub fn new(factor: f32) -> Self {
        Self { factor }
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }
}

impl Effect for SpeedChange {
    fn stage(&self) -> EffectStage {
        EffectStage::SpeedChange
    }

    fn apply(&self, input: &Waveform) -> Result<Waveform> {
        if self.factor == 1.0 {
            return Ok(input.clone());
        }
        if !(self.factor.is_finite() && self.factor > 0.0) {
            return Err(self
                .stage()
                .failure(format!("invalid speed factor {}", self.factor)));
        }
        if input.len() < MIN_ANALYSIS_SAMPLES {
            return Err(self.stage().failure(format!(
                "input has {} samples, need at least {} for analysis",
                input.len(),
                MIN_ANALYSIS_SAMPLES
            )));
        }

        Ok(input.with_samples(time_stretch(input.samples(), self.factor)))
    }

    fn params(&self) -> Value {
        json!({ "speed_factor": self.factor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_factor_is_identity() {
        let wave = Waveform::sine(440.0, 0.5, 22050).unwrap();
        assert_eq!(SpeedChange::new(1.0).apply(&wave).unwrap(), wave);
    }

    #[test]
    fn test_duration_scales_inversely() {
        let wave = Waveform::sine(440.0, 1.0, 16000).unwrap();

        let fast = SpeedChange::new(2.0).apply(&wave).unwrap();
        assert_eq!(fast.len(), 8000);

        let slow = SpeedChange::new(0.5).apply(&wave).unwrap();
        assert_eq!(slow.len(), 32000);
        assert_eq!(slow.sample_rate(), 16000);

        let odd = SpeedChange::new(1.3).apply(&wave).unwrap();
        assert_eq!(odd.len(), (16000.0f64 / 1.3f32 as f64).round() as usize);
    }

    #[test]
    fn test_stretch_keeps_level() {
        let wave = Waveform::sine(440.0, 1.0, 16000).unwrap();
        let slow = SpeedChange::new(0.8).apply(&wave).unwrap();
        assert!(slow.is_finite());
        assert!((slow.rms() - wave.rms()).abs() < 0.15);
    }

    #[test]
    fn test_clip_shorter_than_window() {
        let wave = Waveform::sine(300.0, 0.2, 8000).unwrap();

        let fast = SpeedChange::new(1.5).apply(&wave).unwrap();
        assert_eq!(fast.len(), 1067);
        assert!(fast.is_finite());
        assert!(fast.peak() > 0.1);
    }

    #[test]
    fn test_degenerate_input_fails() {
        let wave = Waveform::silence(100, 16000).unwrap();
        let err = SpeedChange::new(1.5).apply(&wave).unwrap_err();
        assert!(err.is_recoverable());
    }
}
