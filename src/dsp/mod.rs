//! DSP Effects Library
//!
//! Stateless signal-processing stages for the voice effects pipeline.
//! All stages implement the `Effect` trait for uniform processing.

mod delay;
mod effect;
mod enhance;
mod normalize;
mod pitch;
mod reverb;
mod robot;
pub mod stft;
mod stretch;

pub use delay::Echo;
pub use effect::{Effect, EffectStage};
pub use enhance::{Compressor, NoiseReduction, Preemphasis};
pub use normalize::{Normalize, TARGET_PEAK};
pub use pitch::PitchShift;
pub use reverb::{Reverb, TAP_DELAYS_S};
pub use robot::RobotVoice;
pub use stretch::{time_stretch, SpeedChange};
