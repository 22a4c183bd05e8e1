//! Short-time Fourier transform
//!
//! Centered, Hann-windowed STFT and its overlap-add inverse, shared by the
//! time-stretch, pitch-shift and noise-reduction stages. Frames are
//! zero-padded by half a window on both sides so frame `t` is centered on
//! sample `t * hop`.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex32;
use rustfft::{Fft, FftPlanner};

/// Analysis window length in samples
pub const N_FFT: usize = 2048;

/// Distance between frame centers in samples
pub const HOP_LENGTH: usize = 512;

/// Shortest input the vocoder stages will process (one hop)
pub const MIN_ANALYSIS_SAMPLES: usize = HOP_LENGTH;

/// One-sided spectra, one `Vec` of `n_fft / 2 + 1` bins per frame
pub type Spectrogram = Vec<Vec<Complex32>>;

/// Forward/inverse transform pair for a fixed window and hop
pub struct Stft {
    n_fft: usize,
    hop: usize,
    window: Vec<f32>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl Stft {
    /// Plan transforms for the given window and hop lengths
    pub fn new(n_fft: usize, hop: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(n_fft);
        let inverse = planner.plan_fft_inverse(n_fft);

        // Periodic Hann
        let window = (0..n_fft)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / n_fft as f32).cos())
            .collect();

        Self {
            n_fft,
            hop,
            window,
            forward,
            inverse,
        }
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Number of one-sided frequency bins per frame
    pub fn num_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Analyse `samples` into a spectrogram
    ///
    /// Produces `1 + len / hop` frames.
    pub fn forward(&self, samples: &[f32]) -> Spectrogram {
        let pad = self.n_fft / 2;
        let mut padded = vec![0.0f32; samples.len() + 2 * pad];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        let num_frames = 1 + (padded.len() - self.n_fft) / self.hop;
        let bins = self.num_bins();
        let mut frames = Vec::with_capacity(num_frames);
        let mut buffer = vec![Complex32::new(0.0, 0.0); self.n_fft];

        for t in 0..num_frames {
            let start = t * self.hop;
            for (i, slot) in buffer.iter_mut().enumerate() {
                *slot = Complex32::new(padded[start + i] * self.window[i], 0.0);
            }
            self.forward.process(&mut buffer);
            frames.push(buffer[..bins].to_vec());
        }

        frames
    }

    /// Resynthesize `length` samples from a spectrogram
    ///
    /// Overlap-add with window-sum-square normalisation; output is zero
    /// padded or truncated to exactly `length`.
    pub fn inverse(&self, frames: &Spectrogram, length: usize) -> Vec<f32> {
        if frames.is_empty() {
            return vec![0.0; length];
        }

        let n = self.n_fft;
        let bins = self.num_bins();
        let full_len = n + self.hop * (frames.len() - 1);
        let mut output = vec![0.0f32; full_len];
        let mut window_sum = vec![0.0f32; full_len];
        let mut buffer = vec![Complex32::new(0.0, 0.0); n];
        let scale = 1.0 / n as f32;

        for (t, frame) in frames.iter().enumerate() {
            // Rebuild the full Hermitian spectrum
            for k in 0..n {
                buffer[k] = if k < bins {
                    frame.get(k).copied().unwrap_or_default()
                } else {
                    frame.get(n - k).map(|c| c.conj()).unwrap_or_default()
                };
            }
            self.inverse.process(&mut buffer);

            let start = t * self.hop;
            for i in 0..n {
                let w = self.window[i];
                output[start + i] += buffer[i].re * scale * w;
                window_sum[start + i] += w * w;
            }
        }

        for (sample, &norm) in output.iter_mut().zip(&window_sum) {
            if norm > f32::MIN_POSITIVE {
                *sample /= norm;
            }
        }

        let pad = n / 2;
        let mut trimmed: Vec<f32> = output.into_iter().skip(pad).take(length).collect();
        trimmed.resize(length, 0.0);
        trimmed
    }
}

impl Default for Stft {
    fn default() -> Self {
        Self::new(N_FFT, HOP_LENGTH)
    }
}

/// Wrap a phase value into `[-PI, PI)`
#[inline]
fn wrap_phase(phase: f32) -> f32 {
    (phase + PI).rem_euclid(2.0 * PI) - PI
}

/// Stretch a spectrogram in time by a factor of `1 / rate`
///
/// Magnitudes are linearly interpolated between neighbouring frames and
/// phases are accumulated from the measured per-bin phase advance, so
/// partials keep their frequency while the frame count changes.
pub fn phase_vocoder(frames: &Spectrogram, rate: f32, hop: usize, n_fft: usize) -> Spectrogram {
    let Some(first) = frames.first() else {
        return Vec::new();
    };
    let bins = first.len();

    // Expected phase advance per hop for each bin center
    let phase_advance: Vec<f32> = (0..bins)
        .map(|k| 2.0 * PI * k as f32 * hop as f32 / n_fft as f32)
        .collect();

    let mut phase_acc: Vec<f32> = first.iter().map(|c| c.arg()).collect();
    let zero = vec![Complex32::new(0.0, 0.0); bins];
    let column = |idx: usize| frames.get(idx).unwrap_or(&zero);

    let num_steps = (frames.len() as f64 / rate as f64).ceil() as usize;
    let mut stretched = Vec::with_capacity(num_steps);

    for step in 0..num_steps {
        let position = step as f64 * rate as f64;
        let base = position.floor() as usize;
        let alpha = (position - base as f64) as f32;
        let left = column(base);
        let right = column(base + 1);

        let frame: Vec<Complex32> = (0..bins)
            .map(|k| {
                let magnitude = (1.0 - alpha) * left[k].norm() + alpha * right[k].norm();
                Complex32::from_polar(magnitude, phase_acc[k])
            })
            .collect();
        stretched.push(frame);

        for k in 0..bins {
            let deviation = wrap_phase(right[k].arg() - left[k].arg() - phase_advance[k]);
            phase_acc[k] = wrap_phase(phase_acc[k] + phase_advance[k] + deviation);
        }
    }

    stretched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, len: usize, sr: f32) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / sr).sin())
            .collect()
    }

    #[test]
    fn test_frame_count() {
        let stft = Stft::default();
        assert_eq!(stft.forward(&vec![0.0; 4096]).len(), 1 + 4096 / HOP_LENGTH);
        assert_eq!(stft.forward(&vec![0.0; 100]).len(), 1);
        assert_eq!(stft.forward(&vec![0.0; 100])[0].len(), N_FFT / 2 + 1);
    }

    #[test]
    fn test_round_trip_reconstructs_signal() {
        let stft = Stft::default();
        let signal = sine(440.0, 8000, 16000.0);
        let rebuilt = stft.inverse(&stft.forward(&signal), signal.len());

        assert_eq!(rebuilt.len(), signal.len());
        for (a, b) in signal.iter().zip(&rebuilt) {
            assert!((a - b).abs() < 1e-3, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_phase_vocoder_frame_count() {
        let stft = Stft::default();
        let frames = stft.forward(&sine(440.0, 16000, 16000.0));
        let n = frames.len();

        assert_eq!(phase_vocoder(&frames, 2.0, HOP_LENGTH, N_FFT).len(), (n + 1) / 2);
        assert_eq!(phase_vocoder(&frames, 0.5, HOP_LENGTH, N_FFT).len(), n * 2);
        assert!(phase_vocoder(&Vec::new(), 1.5, HOP_LENGTH, N_FFT).is_empty());
    }

    #[test]
    fn test_wrap_phase_range() {
        for value in [-10.0f32, -PI, 0.0, 3.0, PI, 12.5] {
            let wrapped = wrap_phase(value);
            assert!((-PI..PI).contains(&wrapped) || (wrapped - PI).abs() < 1e-5);
        }
    }
}
