//! Effect configuration
//!
//! One optional parameter set per primitive. Absent or disabled entries
//! mean the stage is skipped.

use serde::{Deserialize, Serialize};

use crate::dsp::EffectStage;

/// Default ring-modulation intensity
pub const DEFAULT_ROBOT_INTENSITY: f32 = 0.5;
/// Default echo delay in seconds
pub const DEFAULT_ECHO_DELAY_S: f32 = 0.3;
/// Default echo decay
pub const DEFAULT_ECHO_DECAY: f32 = 0.5;
/// Default reverb room size
pub const DEFAULT_REVERB_ROOM_SIZE: f32 = 0.5;
/// Default reverb damping
pub const DEFAULT_REVERB_DAMPING: f32 = 0.5;

fn enabled_by_default() -> bool {
    true
}

fn default_robot_intensity() -> f32 {
    DEFAULT_ROBOT_INTENSITY
}

fn default_echo_delay() -> f32 {
    DEFAULT_ECHO_DELAY_S
}

fn default_echo_decay() -> f32 {
    DEFAULT_ECHO_DECAY
}

fn default_room_size() -> f32 {
    DEFAULT_REVERB_ROOM_SIZE
}

fn default_damping() -> f32 {
    DEFAULT_REVERB_DAMPING
}

/// Robot voice settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobotParams {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Effect strength (0.0-1.0)
    #[serde(default = "default_robot_intensity")]
    pub intensity: f32,
}

impl Default for RobotParams {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: DEFAULT_ROBOT_INTENSITY,
        }
    }
}

/// Echo settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EchoParams {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Delay in seconds (0.1-2.0)
    #[serde(default = "default_echo_delay")]
    pub delay_s: f32,
    /// Echo level (0.1-0.9)
    #[serde(default = "default_echo_decay")]
    pub decay: f32,
}

impl Default for EchoParams {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_s: DEFAULT_ECHO_DELAY_S,
            decay: DEFAULT_ECHO_DECAY,
        }
    }
}

/// Reverb settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReverbParams {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Tap delay scale (0.1-1.0)
    #[serde(default = "default_room_size")]
    pub room_size: f32,
    /// Reflection attenuation (0.1-1.0)
    #[serde(default = "default_damping")]
    pub damping: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            enabled: true,
            room_size: DEFAULT_REVERB_ROOM_SIZE,
            damping: DEFAULT_REVERB_DAMPING,
        }
    }
}

/// Requested effects for one processing call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    /// Pitch shift in semitones (-12 to 12)
    pub pitch_shift_semitones: Option<f32>,
    /// Playback speed multiplier (0.25 to 4.0)
    pub speed_factor: Option<f32>,
    pub robot: Option<RobotParams>,
    pub echo: Option<EchoParams>,
    pub reverb: Option<ReverbParams>,
    /// Peak-normalize the result
    pub normalize: bool,
}

impl EffectConfig {
    /// An empty configuration (every stage skipped)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pitch_shift(mut self, semitones: f32) -> Self {
        self.pitch_shift_semitones = Some(semitones);
        self
    }

    pub fn with_speed(mut self, factor: f32) -> Self {
        self.speed_factor = Some(factor);
        self
    }

    pub fn with_robot(mut self, intensity: f32) -> Self {
        self.robot = Some(RobotParams {
            enabled: true,
            intensity,
        });
        self
    }

    pub fn with_echo(mut self, delay_s: f32, decay: f32) -> Self {
        self.echo = Some(EchoParams {
            enabled: true,
            delay_s,
            decay,
        });
        self
    }

    pub fn with_reverb(mut self, room_size: f32, damping: f32) -> Self {
        self.reverb = Some(ReverbParams {
            enabled: true,
            room_size,
            damping,
        });
        self
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Pitch shift amount, if the stage should run
    pub fn active_pitch_shift(&self) -> Option<f32> {
        self.pitch_shift_semitones.filter(|&n| n != 0.0)
    }

    /// Speed factor, if the stage should run
    pub fn active_speed(&self) -> Option<f32> {
        self.speed_factor.filter(|&f| f != 1.0)
    }

    pub fn active_robot(&self) -> Option<RobotParams> {
        self.robot.filter(|p| p.enabled)
    }

    pub fn active_echo(&self) -> Option<EchoParams> {
        self.echo.filter(|p| p.enabled)
    }

    pub fn active_reverb(&self) -> Option<ReverbParams> {
        self.reverb.filter(|p| p.enabled)
    }

    /// Stages this configuration will run, in execution order
    pub fn enabled_stages(&self) -> Vec<EffectStage> {
        let mut stages = Vec::new();
        if self.active_pitch_shift().is_some() {
            stages.push(EffectStage::PitchShift);
        }
        if self.active_speed().is_some() {
            stages.push(EffectStage::SpeedChange);
        }
        if self.active_robot().is_some() {
            stages.push(EffectStage::Robot);
        }
        if self.active_echo().is_some() {
            stages.push(EffectStage::Echo);
        }
        if self.active_reverb().is_some() {
            stages.push(EffectStage::Reverb);
        }
        if self.normalize {
            stages.push(EffectStage::Normalize);
        }
        stages
    }

    /// True if no stage would run
    pub fn is_empty(&self) -> bool {
        self.enabled_stages().is_empty()
    }
}

/// Parameters of the enhancement pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    /// Spectral subtraction over-subtraction factor
    pub noise_alpha: f32,
    /// Leading STFT frames used for the noise estimate
    pub noise_frames: usize,
    /// Fraction of each bin's magnitude that is always kept
    pub floor_ratio: f32,
    pub compress_threshold: f32,
    pub compress_ratio: f32,
    /// Pre-emphasis coefficient
    pub preemphasis: f32,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            noise_alpha: 2.0,
            noise_frames: 10,
            floor_ratio: 0.1,
            compress_threshold: 0.5,
            compress_ratio: 4.0,
            preemphasis: 0.97,
        }
    }
}
