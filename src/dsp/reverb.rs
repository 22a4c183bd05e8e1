//! Reverb Effect
//!
//! Early-reflection model: six feed-forward taps at fixed base delays,
//! scaled by room size and attenuated geometrically by damping. There is
//! no feedback path, so the tail never outlasts the input.

use serde_json::{json, Value};

use crate::dsp::effect::{Effect, EffectStage};
use crate::engine::Waveform;
use crate::error::Result;

/// Base tap delays in seconds, before room scaling
pub const TAP_DELAYS_S: [f64; 6] = [0.03, 0.05, 0.08, 0.13, 0.21, 0.34];

/// Feed-forward multi-tap reverb
#[derive(Debug, Clone, PartialEq)]
pub struct Reverb {
    /// Scales every tap delay (0.1-1.0)
    room_size: f32,
    /// Higher damping lowers the per-tap gain (0.1-1.0)
    damping: f32,
}

impl Reverb {
    /// Create a reverb effect
    ///
    /// # Arguments
    /// * `room_size` - Tap delay scale
    /// * `damping` - High values make reflections die out faster
    pub fn new(room_size: f32, damping: f32) -> Self {
        Self { room_size, damping }
    }

    pub fn room_size(&self) -> f32 {
        self.room_size
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    /// Gain of tap `k` (zero-based)
    pub fn tap_gain(&self, k: usize) -> f32 {
        (0.7 - self.damping * 0.4).powi(k as i32 + 1)
    }

    /// Offset of each tap in samples at `sample_rate`
    pub fn tap_offsets(&self, sample_rate: u32) -> [usize; 6] {
        TAP_DELAYS_S.map(|base| (base * sample_rate as f64 * self.room_size as f64).max(0.0) as usize)
    }
}

impl Effect for Reverb {
    fn stage(&self) -> EffectStage {
        EffectStage::Reverb
    }

    fn apply(&self, input: &Waveform) -> Result<Waveform> {
        let dry = input.samples();
        let mut out = dry.to_vec();

        for (k, &d) in self.tap_offsets(input.sample_rate()).iter().enumerate() {
            if d == 0 || d >= dry.len() {
                continue;
            }
            let gain = self.tap_gain(k);
            for n in d..dry.len() {
                out[n] += gain * dry[n - d];
            }
        }

        Ok(input.with_samples(out))
    }

    fn params(&self) -> Value {
        json!({ "room_size": self.room_size, "damping": self.damping })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tap_offsets_scale_with_room() {
        let reverb = Reverb::new(0.5, 0.5);
        assert_eq!(reverb.tap_offsets(1000), [15, 25, 40, 65, 105, 170]);
    }

    #[test]
    fn test_impulse_response_taps() {
        let mut samples = vec![0.0; 400];
        samples[0] = 1.0;
        let wave = Waveform::new(samples, 1000).unwrap();

        let reverb = Reverb::new(1.0, 0.5);
        let out = reverb.apply(&wave).unwrap();

        assert_eq!(out.len(), 400);
        assert_eq!(out.samples()[0], 1.0);
        // Gain base is 0.7 - 0.5 * 0.4 = 0.5
        assert_relative_eq!(out.samples()[30], 0.5, epsilon = 1e-6);
        assert_relative_eq!(out.samples()[50], 0.25, epsilon = 1e-6);
        assert_relative_eq!(out.samples()[340], 0.5f32.powi(6), epsilon = 1e-6);
    }

    #[test]
    fn test_taps_beyond_input_are_skipped() {
        let mut samples = vec![0.0; 60];
        samples[0] = 1.0;
        let wave = Waveform::new(samples, 1000).unwrap();

        let out = Reverb::new(1.0, 0.1).apply(&wave).unwrap();
        let nonzero: Vec<usize> = out
            .samples()
            .iter()
            .enumerate()
            .filter(|(_, s)| **s != 0.0)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(nonzero, vec![0, 30, 50]);
    }
}
