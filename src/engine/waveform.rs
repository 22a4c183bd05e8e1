//! Canonical Waveform
//!
//! The in-memory representation every pipeline stage consumes and produces:
//! mono `f32` samples plus an explicit sample rate. Waveforms are values;
//! stages never mutate their input.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::engine::format::AudioFormat;
use crate::error::{Result, VoiceFxError};

// ============================================================================
// Constants
// ============================================================================

/// Minimum acceptable audio duration in seconds (100ms)
pub const MIN_DURATION_SECS: f64 = 0.1;

/// Minimum acceptable source sample rate
pub const MIN_SAMPLE_RATE: u32 = 8000;

/// Peak level below which audio is considered silent
pub const SILENCE_PEAK_THRESHOLD: f32 = 0.001;

// ============================================================================
// Waveform
// ============================================================================

/// Single-channel audio with an explicit sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    /// Create a waveform from mono samples
    ///
    /// # Errors
    /// * `InvalidWaveform` - If `sample_rate` is zero
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(VoiceFxError::InvalidWaveform {
                reason: "sample rate must be positive".to_string(),
            });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a mono waveform from interleaved multichannel samples
    ///
    /// Channels are averaged per frame. A trailing partial frame is dropped.
    pub fn from_interleaved(interleaved: &[f32], channels: usize, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(VoiceFxError::InvalidWaveform {
                reason: "channel count must be positive".to_string(),
            });
        }
        if channels == 1 {
            return Self::new(interleaved.to_vec(), sample_rate);
        }

        let frames = interleaved.len() / channels;
        let mut mono = Vec::new();
        mono.try_reserve_exact(frames)
            .map_err(|e| VoiceFxError::Resource {
                details: format!("cannot allocate {} samples: {}", frames, e),
            })?;

        let scale = 1.0 / channels as f32;
        for frame in interleaved.chunks_exact(channels) {
            mono.push(frame.iter().sum::<f32>() * scale);
        }

        Self::new(mono, sample_rate)
    }

    /// A waveform of `num_samples` zeros
    pub fn silence(num_samples: usize, sample_rate: u32) -> Result<Self> {
        Self::new(vec![0.0; num_samples], sample_rate)
    }

    /// Generate a sine test tone at unit amplitude
    ///
    /// # Arguments
    /// * `frequency` - Frequency of the sine wave in Hz
    /// * `duration_secs` - Duration of the tone in seconds
    /// * `sample_rate` - Sample rate in Hz
    pub fn sine(frequency: f32, duration_secs: f32, sample_rate: u32) -> Result<Self> {
        let num_samples = (duration_secs as f64 * sample_rate as f64).round() as usize;
        let angular = 2.0 * std::f64::consts::PI * frequency as f64 / sample_rate.max(1) as f64;
        let samples = (0..num_samples)
            .map(|i| (angular * i as f64).sin() as f32)
            .collect();
        Self::new(samples, sample_rate)
    }

    /// Build a new waveform at the same sample rate
    ///
    /// Used by stages to return their output buffer.
    pub fn with_samples(&self, samples: Vec<f32>) -> Self {
        Self {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    /// Sample values
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the waveform has no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Maximum absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
    }

    /// Root mean square level (linear)
    pub fn rms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = self.samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (sum_sq / self.samples.len() as f64).sqrt() as f32
    }

    /// Check that no sample is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.samples.iter().all(|s| s.is_finite())
    }

    /// Keep at most `max_secs` seconds from the start
    pub fn truncated(&self, max_secs: f64) -> Self {
        let max_samples = (max_secs * self.sample_rate as f64) as usize;
        if self.samples.len() <= max_samples {
            return self.clone();
        }
        self.with_samples(self.samples[..max_samples].to_vec())
    }

    /// Join waveforms end to end
    ///
    /// # Errors
    /// * `InvalidWaveform` - If the list is empty or sample rates differ
    pub fn concat(parts: &[Waveform]) -> Result<Self> {
        let first = parts.first().ok_or_else(|| VoiceFxError::InvalidWaveform {
            reason: "nothing to concatenate".to_string(),
        })?;

        if let Some(other) = parts.iter().find(|w| w.sample_rate != first.sample_rate) {
            return Err(VoiceFxError::InvalidWaveform {
                reason: format!(
                    "sample rate mismatch: {} vs {}",
                    first.sample_rate, other.sample_rate
                ),
            });
        }

        let total: usize = parts.iter().map(|w| w.len()).sum();
        let mut samples = Vec::with_capacity(total);
        for part in parts {
            samples.extend_from_slice(&part.samples);
        }
        Ok(first.with_samples(samples))
    }

    /// Drop samples whose magnitude does not exceed `threshold`
    ///
    /// Returns the waveform unchanged if every sample is below the threshold.
    pub fn trim_silence(&self, threshold: f32) -> Self {
        let voiced: Vec<f32> = self
            .samples
            .iter()
            .copied()
            .filter(|s| s.abs() > threshold)
            .collect();
        if voiced.is_empty() {
            self.clone()
        } else {
            self.with_samples(voiced)
        }
    }

    /// Run the input checks applied to uploaded audio
    pub fn validate(&self, max_duration_secs: f64) -> AudioValidation {
        let duration = self.duration_secs();
        AudioValidation {
            has_audio_data: !self.is_empty(),
            duration_valid: (MIN_DURATION_SECS..=max_duration_secs).contains(&duration),
            sample_rate_valid: self.sample_rate >= MIN_SAMPLE_RATE,
            not_silent: self.peak() > SILENCE_PEAK_THRESHOLD,
            duration_secs: duration,
        }
    }
}

// ============================================================================
// Audio Validation
// ============================================================================

/// Results of the input audio checks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioValidation {
    /// Waveform contains at least one sample
    pub has_audio_data: bool,
    /// Duration lies between 0.1s and the configured maximum
    pub duration_valid: bool,
    /// Source sample rate is at least 8kHz
    pub sample_rate_valid: bool,
    /// Peak level is above the silence threshold
    pub not_silent: bool,
    /// Measured duration in seconds
    pub duration_secs: f64,
}

impl AudioValidation {
    /// True if every check passed
    pub fn is_valid(&self) -> bool {
        self.has_audio_data && self.duration_valid && self.sample_rate_valid && self.not_silent
    }

    /// Names of the checks that failed
    pub fn failed_checks(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if !self.has_audio_data {
            failed.push("has_audio_data");
        }
        if !self.duration_valid {
            failed.push("duration_valid");
        }
        if !self.sample_rate_valid {
            failed.push("sample_rate_valid");
        }
        if !self.not_silent {
            failed.push("not_silent");
        }
        failed
    }
}

// ============================================================================
// Audio Metadata
// ============================================================================

/// Read-only description of a waveform and its encoded form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioMetadata {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    /// Always 1: the canonical waveform is mono
    pub channels: u16,
    pub format: AudioFormat,
    /// Size of the encoded bytes
    pub byte_size: usize,
    pub num_samples: usize,
    pub peak: f32,
    pub rms: f32,
    /// Hex SHA-256 of the encoded bytes
    pub checksum: String,
}

impl AudioMetadata {
    /// Describe a waveform together with the bytes it was decoded from or encoded to
    pub fn describe(waveform: &Waveform, format: AudioFormat, bytes: &[u8]) -> Self {
        Self {
            duration_seconds: waveform.duration_secs(),
            sample_rate: waveform.sample_rate(),
            channels: 1,
            format,
            byte_size: bytes.len(),
            num_samples: waveform.len(),
            peak: waveform.peak(),
            rms: waveform.rms(),
            checksum: sha256_hex(bytes),
        }
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_sample_rate_rejected() {
        let result = Waveform::new(vec![0.0; 10], 0);
        assert!(matches!(result, Err(VoiceFxError::InvalidWaveform { .. })));
    }

    #[test]
    fn test_from_interleaved_averages_channels() {
        let interleaved = vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        let wave = Waveform::from_interleaved(&interleaved, 2, 44100).unwrap();
        assert_eq!(wave.samples(), &[0.5, 0.5, 0.0]);
        assert_eq!(wave.sample_rate(), 44100);
    }

    #[test]
    fn test_sine_properties() {
        let wave = Waveform::sine(440.0, 1.0, 22050).unwrap();
        assert_eq!(wave.len(), 22050);
        assert_relative_eq!(wave.duration_secs(), 1.0);
        assert!(wave.peak() > 0.99 && wave.peak() <= 1.0);
        // RMS of a unit sine is 1/sqrt(2)
        assert!((wave.rms() - std::f32::consts::FRAC_1_SQRT_2).abs() < 0.01);
    }

    #[test]
    fn test_truncated() {
        let wave = Waveform::sine(440.0, 2.0, 8000).unwrap();
        let short = wave.truncated(0.5);
        assert_eq!(short.len(), 4000);
        assert_eq!(&short.samples()[..], &wave.samples()[..4000]);

        let same = wave.truncated(10.0);
        assert_eq!(same, wave);
    }

    #[test]
    fn test_concat_requires_matching_rates() {
        let a = Waveform::silence(100, 16000).unwrap();
        let b = Waveform::silence(50, 16000).unwrap();
        let c = Waveform::silence(50, 22050).unwrap();

        assert_eq!(Waveform::concat(&[a.clone(), b]).unwrap().len(), 150);
        assert!(Waveform::concat(&[a, c]).is_err());
        assert!(Waveform::concat(&[]).is_err());
    }

    #[test]
    fn test_trim_silence() {
        let wave = Waveform::new(vec![0.0, 0.5, 0.001, -0.2, 0.0], 8000).unwrap();
        assert_eq!(wave.trim_silence(0.01).samples(), &[0.5, -0.2]);

        let quiet = Waveform::silence(10, 8000).unwrap();
        assert_eq!(quiet.trim_silence(0.01), quiet);
    }

    #[test]
    fn test_validation_flags_silence_and_short_audio() {
        let silent = Waveform::silence(8000, 16000).unwrap();
        let report = silent.validate(300.0);
        assert!(!report.is_valid());
        assert_eq!(report.failed_checks(), vec!["not_silent"]);

        let short = Waveform::sine(440.0, 0.05, 16000).unwrap();
        assert!(short.validate(300.0).failed_checks().contains(&"duration_valid"));
    }

    #[test]
    fn test_metadata_describe() {
        let wave = Waveform::sine(440.0, 0.5, 16000).unwrap();
        let meta = AudioMetadata::describe(&wave, AudioFormat::Wav, b"abc");
        assert_eq!(meta.channels, 1);
        assert_eq!(meta.byte_size, 3);
        assert_eq!(meta.num_samples, 8000);
        assert_eq!(
            meta.checksum,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
