//! Effect pipeline
//!
//! Stages always run in canonical order:
//! 1. Pitch shift
//! 2. Speed change
//! 3. Robot voice
//! 4. Echo
//! 5. Reverb
//! 6. Normalize
//!
//! The enhancement pass (noise reduction, compression, pre-emphasis) is a
//! separate pipeline run afterwards on request.
//!
//! A stage that fails, panics or produces non-finite samples is skipped: its
//! input flows on to the next stage unchanged and the report records why.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use log::{debug, warn};

use crate::dsp::{
    Compressor, Echo, Effect, EffectStage, NoiseReduction, Normalize, PitchShift, Preemphasis,
    Reverb, RobotVoice, SpeedChange,
};
use crate::engine::Waveform;
use crate::pipeline::config::{EffectConfig, EnhanceConfig};
use crate::pipeline::report::{PipelineOutput, PipelineReport, StageOutcome, StageReport};

/// Ordered, immutable list of stages
#[derive(Debug, Default)]
pub struct EffectPipeline {
    stages: Vec<Box<dyn Effect>>,
}

impl EffectPipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the effects chain for a configuration
    ///
    /// Only enabled stages are added; identity settings (pitch 0, speed 1.0)
    /// add nothing.
    pub fn from_config(config: &EffectConfig) -> Self {
        let mut pipeline = Self::new();
        if let Some(semitones) = config.active_pitch_shift() {
            pipeline.add(Box::new(PitchShift::new(semitones)));
        }
        if let Some(factor) = config.active_speed() {
            pipeline.add(Box::new(SpeedChange::new(factor)));
        }
        if let Some(robot) = config.active_robot() {
            pipeline.add(Box::new(RobotVoice::new(robot.intensity)));
        }
        if let Some(echo) = config.active_echo() {
            pipeline.add(Box::new(Echo::new(echo.delay_s, echo.decay)));
        }
        if let Some(reverb) = config.active_reverb() {
            pipeline.add(Box::new(Reverb::new(reverb.room_size, reverb.damping)));
        }
        if config.normalize {
            pipeline.add(Box::new(Normalize));
        }
        pipeline
    }

    /// Build the enhancement pass
    pub fn enhancement(config: &EnhanceConfig) -> Self {
        let mut pipeline = Self::new();
        pipeline.add(Box::new(NoiseReduction::new(
            config.noise_alpha,
            config.noise_frames,
            config.floor_ratio,
        )));
        pipeline.add(Box::new(Compressor::new(
            config.compress_threshold,
            config.compress_ratio,
        )));
        pipeline.add(Box::new(Preemphasis::new(config.preemphasis)));
        pipeline
    }

    /// Add a stage at its canonical position
    ///
    /// Stages of the same kind keep insertion order.
    pub fn add(&mut self, effect: Box<dyn Effect>) {
        let position = self.insert_position(effect.stage());
        self.stages.insert(position, effect);
    }

    /// Stages in execution order
    pub fn stages(&self) -> Vec<EffectStage> {
        self.stages.iter().map(|e| e.stage()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage over `input`
    ///
    /// Never fails: in the worst case every stage is skipped and the output
    /// equals the input.
    pub fn run(&self, input: &Waveform) -> PipelineOutput {
        let mut current = input.clone();
        let mut report = PipelineReport::new();

        for effect in &self.stages {
            let stage = effect.stage();
            let start = Instant::now();
            let result = catch_unwind(AssertUnwindSafe(|| effect.apply(&current)));
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

            let outcome = match result {
                Ok(Ok(output)) if output.is_finite() => {
                    debug!(
                        "Stage {} applied in {:.2} ms ({} -> {} samples)",
                        stage.name(),
                        elapsed_ms,
                        current.len(),
                        output.len()
                    );
                    current = output;
                    StageOutcome::Applied
                }
                Ok(Ok(_)) => StageOutcome::Skipped {
                    reason: "stage produced non-finite samples".to_string(),
                },
                Ok(Err(err)) => StageOutcome::Skipped {
                    reason: err.to_string(),
                },
                Err(_) => StageOutcome::Skipped {
                    reason: "stage panicked".to_string(),
                },
            };

            if let StageOutcome::Skipped { reason } = &outcome {
                warn!("Skipping stage {}: {}", stage.name(), reason);
            }

            report.record(StageReport {
                stage,
                outcome,
                params: effect.params(),
                elapsed_ms,
            });
        }

        PipelineOutput {
            waveform: current,
            report,
        }
    }

    fn insert_position(&self, stage: EffectStage) -> usize {
        self.stages
            .iter()
            .position(|existing| existing.stage() > stage)
            .unwrap_or(self.stages.len())
    }
}

/// Apply the effects chain described by `config`
pub fn apply_effects(input: &Waveform, config: &EffectConfig) -> PipelineOutput {
    EffectPipeline::from_config(config).run(input)
}

/// Run the enhancement pass
pub fn enhance(input: &Waveform, config: &EnhanceConfig) -> PipelineOutput {
    EffectPipeline::enhancement(config).run(input)
}
