//! Parameter validation
//!
//! Range-checks every present field of an [`EffectConfig`] in a fixed order
//! and reports the first violation.

use serde::Serialize;

use crate::error::{Result, VoiceFxError};
use crate::pipeline::config::EffectConfig;

/// Inclusive range accepted for one configuration field
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterRange {
    pub field: &'static str,
    pub min: f32,
    pub max: f32,
}

impl ParameterRange {
    const fn new(field: &'static str, min: f32, max: f32) -> Self {
        Self { field, min, max }
    }

    /// Check a value; NaN is always rejected
    pub fn check(&self, value: f32) -> Result<()> {
        if (self.min..=self.max).contains(&value) {
            Ok(())
        } else {
            Err(VoiceFxError::ParameterRange {
                field: self.field,
                value,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Accepted ranges, in checking order
pub const PARAMETER_RANGES: [ParameterRange; 7] = [
    ParameterRange::new("pitch_shift_semitones", -12.0, 12.0),
    ParameterRange::new("speed_factor", 0.25, 4.0),
    ParameterRange::new("robot.intensity", 0.0, 1.0),
    ParameterRange::new("echo.delay_s", 0.1, 2.0),
    ParameterRange::new("echo.decay", 0.1, 0.9),
    ParameterRange::new("reverb.room_size", 0.1, 1.0),
    ParameterRange::new("reverb.damping", 0.1, 1.0),
];

/// Fail-fast range checker for effect configurations
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterValidator;

impl ParameterValidator {
    /// Check each present field against its range
    ///
    /// Parameter records are checked even when their `enabled` flag is off.
    ///
    /// # Errors
    /// * `ParameterRange` - For the first field outside its range
    pub fn check(&self, config: &EffectConfig) -> Result<()> {
        let values = [
            config.pitch_shift_semitones,
            config.speed_factor,
            config.robot.map(|r| r.intensity),
            config.echo.map(|e| e.delay_s),
            config.echo.map(|e| e.decay),
            config.reverb.map(|r| r.room_size),
            config.reverb.map(|r| r.damping),
        ];

        PARAMETER_RANGES
            .iter()
            .zip(values)
            .filter_map(|(range, value)| value.map(|v| (range, v)))
            .try_for_each(|(range, value)| range.check(value))
    }

    /// Accepted ranges, for listings
    pub fn ranges(&self) -> &'static [ParameterRange] {
        &PARAMETER_RANGES
    }
}

/// Validate a configuration with the default validator
pub fn validate(config: &EffectConfig) -> Result<()> {
    ParameterValidator.check(config)
}
