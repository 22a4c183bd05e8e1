//! VoiceFX - Voice Effects and Enhancement
//!
//! VoiceFX turns uploaded audio into effect-processed audio:
//! 1. Codec - Decode wav/mp3/ogg/flac/m4a into a mono waveform and encode results
//! 2. Effects - Pitch shift, speed change, robot, echo, reverb and normalization
//!
//! # Architecture
//!
//! A request flows through four steps:
//! - Decode: bytes + declared extension into a canonical [`Waveform`]
//! - Resolve: a preset name or explicit [`EffectConfig`], range-checked
//! - Apply: the [`EffectPipeline`] runs enabled stages in a fixed order;
//!   a failing stage is skipped and reported, never fatal
//! - Encode: the processed waveform into the requested output format
//!
//! # Example
//!
//! ```no_run
//! use voicefx::{EffectConfig, EffectSelection, ProcessorSettings, VoiceEffectsProcessor};
//!
//! # fn main() -> voicefx::Result<()> {
//! let processor = VoiceEffectsProcessor::new(ProcessorSettings::default())?;
//! let bytes = std::fs::read("voice.wav")?;
//! let config = EffectConfig::new().with_pitch_shift(4.0).with_normalize(true);
//!
//! let processed = processor.process(&bytes, "wav", &EffectSelection::Config(config), None)?;
//! println!("{}", processed.report.summary());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod processor;
pub mod settings;
pub mod store;

pub use dsp::{Effect, EffectStage};
pub use engine::{AudioCodec, AudioFormat, AudioMetadata, CodecCapabilities, Waveform};
pub use error::{Result, VoiceFxError};
pub use pipeline::{
    apply_effects, enhance, EffectConfig, EffectPipeline, PipelineOutput, PipelineReport,
    PresetCatalog, StageOutcome,
};
pub use processor::{EffectSelection, ProcessedAudio, SupportedFormats, VoiceEffectsProcessor};
pub use settings::ProcessorSettings;
pub use store::{AudioStore, MemoryAudioStore, StoredAudio};
