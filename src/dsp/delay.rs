//! Echo Effect
//!
//! Single feed-forward delay tap mixed onto the dry signal.

use serde_json::{json, Value};

use crate::dsp::effect::{Effect, EffectStage};
use crate::engine::Waveform;
use crate::error::Result;

/// Feed-forward echo: `out[n] = in[n] + decay * in[n - d]`
#[derive(Debug, Clone, PartialEq)]
pub struct Echo {
    /// Delay time in seconds
    delay_s: f32,
    /// Gain applied to the delayed copy
    decay: f32,
}

impl Echo {
    /// Create an echo effect
    ///
    /// # Arguments
    /// * `delay_s` - Delay time in seconds
    /// * `decay` - Level of the echo relative to the dry signal
    pub fn new(delay_s: f32, decay: f32) -> Self {
        Self { delay_s, decay }
    }

    pub fn delay_s(&self) -> f32 {
        self.delay_s
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }

    /// Delay in samples at `sample_rate`
    pub fn delay_samples(&self, sample_rate: u32) -> usize {
        (self.delay_s as f64 * sample_rate as f64).round().max(0.0) as usize
    }
}

impl Effect for Echo {
    fn stage(&self) -> EffectStage {
        EffectStage::Echo
    }

    fn apply(&self, input: &Waveform) -> Result<Waveform> {
        let d = self.delay_samples(input.sample_rate());
        let dry = input.samples();
        if d >= dry.len() {
            return Ok(input.clone());
        }

        let mut out = dry.to_vec();
        for (n, sample) in out.iter_mut().enumerate().skip(d) {
            *sample += self.decay * dry[n - d];
        }

        Ok(input.with_samples(out))
    }

    fn params(&self) -> Value {
        json!({ "delay_s": self.delay_s, "decay": self.decay })
    }
}
