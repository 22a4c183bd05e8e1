//! Effects Pipeline
//!
//! Configuration, validation, presets and the ordered stage runner that
//! turns a waveform plus an [`EffectConfig`] into a processed waveform and a
//! per-stage report.

pub mod chain;
pub mod config;
pub mod presets;
pub mod report;
pub mod validate;

pub use chain::{apply_effects, enhance, EffectPipeline};
pub use config::{EchoParams, EffectConfig, EnhanceConfig, ReverbParams, RobotParams};
pub use presets::{Preset, PresetCatalog};
pub use report::{PipelineOutput, PipelineReport, StageOutcome, StageReport};
pub use validate::{validate, ParameterRange, ParameterValidator, PARAMETER_RANGES};
