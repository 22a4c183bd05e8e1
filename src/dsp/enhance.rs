//! Speech enhancement stages
//!
//! Spectral-subtraction noise reduction, a static waveshaping compressor and
//! a first-order pre-emphasis high-pass. Together they make up the optional
//! enhancement pass run after the effects chain.

use serde_json::{json, Value};

use crate::dsp::effect::{Effect, EffectStage};
use crate::dsp::stft::Stft;
use crate::engine::Waveform;
use crate::error::Result;

// ============================================================================
// Noise Reduction
// ============================================================================

/// Spectral subtraction against a noise floor estimated from the opening frames
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseReduction {
    /// Multiplier on the noise estimate before subtraction
    alpha: f32,
    /// Number of leading frames averaged into the noise estimate
    noise_frames: usize,
    /// Fraction of the original magnitude that is always kept
    floor_ratio: f32,
}

impl NoiseReduction {
    pub fn new(alpha: f32, noise_frames: usize, floor_ratio: f32) -> Self {
        Self {
            alpha,
            noise_frames,
            floor_ratio,
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn noise_frames(&self) -> usize {
        self.noise_frames
    }

    pub fn floor_ratio(&self) -> f32 {
        self.floor_ratio
    }
}

impl Default for NoiseReduction {
    fn default() -> Self {
        Self::new(2.0, 10, 0.1)
    }
}

impl Effect for NoiseReduction {
    fn stage(&self) -> EffectStage {
        EffectStage::NoiseReduction
    }

    fn apply(&self, input: &Waveform) -> Result<Waveform> {
        if input.is_empty() {
            return Ok(input.clone());
        }
        if self.noise_frames == 0 {
            return Err(self.stage().failure("noise estimate needs at least one frame"));
        }

        let stft = Stft::default();
        let mut frames = stft.forward(input.samples());
        let bins = stft.num_bins();

        let estimate_frames = self.noise_frames.min(frames.len());
        let mut noise_floor = vec![0.0f32; bins];
        for frame in &frames[..estimate_frames] {
            for (floor, bin) in noise_floor.iter_mut().zip(frame) {
                *floor += bin.norm();
            }
        }
        for floor in &mut noise_floor {
            *floor /= estimate_frames as f32;
        }

        for frame in &mut frames {
            for (bin, &floor) in frame.iter_mut().zip(&noise_floor) {
                let magnitude = bin.norm();
                if magnitude > 0.0 {
                    let reduced = (magnitude - self.alpha * floor).max(self.floor_ratio * magnitude);
                    // Keep the original phase
                    *bin *= reduced / magnitude;
                }
            }
        }

        Ok(input.with_samples(stft.inverse(&frames, input.len())))
    }

    fn params(&self) -> Value {
        json!({
            "alpha": self.alpha,
            "noise_frames": self.noise_frames,
            "floor_ratio": self.floor_ratio,
        })
    }
}

// ============================================================================
// Compressor
// ============================================================================

/// Memoryless compressor: magnitudes above `threshold` are scaled down by `ratio`
#[derive(Debug, Clone, PartialEq)]
pub struct Compressor {
    threshold: f32,
    ratio: f32,
}

impl Compressor {
    pub fn new(threshold: f32, ratio: f32) -> Self {
        Self { threshold, ratio }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    #[inline]
    fn compress_sample(&self, x: f32) -> f32 {
        let magnitude = x.abs();
        if magnitude > self.threshold {
            x.signum() * (self.threshold + (magnitude - self.threshold) / self.ratio)
        } else {
            x
        }
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(0.5, 4.0)
    }
}

impl Effect for Compressor {
    fn stage(&self) -> EffectStage {
        EffectStage::Compression
    }

    fn apply(&self, input: &Waveform) -> Result<Waveform> {
        if self.ratio <= 0.0 {
            return Err(self
                .stage()
                .failure(format!("ratio must be positive, got {}", self.ratio)));
        }
        let samples = input
            .samples()
            .iter()
            .map(|&x| self.compress_sample(x))
            .collect();
        Ok(input.with_samples(samples))
    }

    fn params(&self) -> Value {
        json!({ "threshold": self.threshold, "ratio": self.ratio })
    }
}

// ============================================================================
// Pre-emphasis
// ============================================================================

/// First-order high-pass: `y[n] = x[n] - coefficient * x[n-1]`
#[derive(Debug, Clone, PartialEq)]
pub struct Preemphasis {
    coefficient: f32,
}

impl Preemphasis {
    pub fn new(coefficient: f32) -> Self {
        Self { coefficient }
    }

    pub fn coefficient(&self) -> f32 {
        self.coefficient
    }
}

impl Default for Preemphasis {
    fn default() -> Self {
        Self::new(0.97)
    }
}

impl Effect for Preemphasis {
    fn stage(&self) -> EffectStage {
        EffectStage::Preemphasis
    }

    fn apply(&self, input: &Waveform) -> Result<Waveform> {
        let x = input.samples();
        let mut out = Vec::with_capacity(x.len());
        if let Some(&first) = x.first() {
            out.push(first);
        }
        out.extend(x.windows(2).map(|w| w[1] - self.coefficient * w[0]));
        Ok(input.with_samples(out))
    }

    fn params(&self) -> Value {
        json!({ "coefficient": self.coefficient })
    }
}
