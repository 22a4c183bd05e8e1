//! Processor settings
//!
//! JSON-backed configuration for the processor and CLI. Any field missing
//! from the file takes its default.

use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::capabilities::DEFAULT_FFMPEG_BINARY;
use crate::engine::{AudioFormat, WavEncoding};
use crate::error::{Result, VoiceFxError};
use crate::pipeline::EnhanceConfig;

/// Accepted preview lengths in seconds
pub const PREVIEW_LIMIT_RANGE: RangeInclusive<f64> = 5.0..=60.0;

/// Default preview length in seconds
pub const DEFAULT_PREVIEW_SECONDS: f64 = 30.0;

/// Default longest accepted input in seconds
pub const DEFAULT_MAX_DURATION_SECONDS: f64 = 300.0;

/// Default largest accepted input in bytes (50 MiB)
pub const DEFAULT_MAX_INPUT_BYTES: usize = 50 * 1024 * 1024;

/// Default lifetime of stored results in seconds
pub const DEFAULT_STORE_TTL_SECONDS: u64 = 300;

/// Settings for [`crate::processor::VoiceEffectsProcessor`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorSettings {
    /// Output format when a request does not name one
    pub default_output_format: AudioFormat,
    /// Default preview length in seconds
    pub preview_max_seconds: f64,
    /// Longest input accepted for processing
    pub max_duration_seconds: f64,
    /// Largest encoded input accepted
    pub max_input_bytes: usize,
    /// Sample layout for WAV output
    pub wav_encoding: WavEncoding,
    /// External transcoder binary
    pub ffmpeg_binary: String,
    /// Enhancement pass parameters
    pub enhance: EnhanceConfig,
    /// How long stored results live
    pub store_ttl_seconds: u64,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            default_output_format: AudioFormat::Wav,
            preview_max_seconds: DEFAULT_PREVIEW_SECONDS,
            max_duration_seconds: DEFAULT_MAX_DURATION_SECONDS,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            wav_encoding: WavEncoding::default(),
            ffmpeg_binary: DEFAULT_FFMPEG_BINARY.to_string(),
            enhance: EnhanceConfig::default(),
            store_ttl_seconds: DEFAULT_STORE_TTL_SECONDS,
        }
    }
}

impl ProcessorSettings {
    /// Load settings from a JSON file and validate them
    ///
    /// # Errors
    /// * `FileRead` - If the file cannot be read
    /// * `Serialization` - If the file is not valid settings JSON
    /// * `InvalidSettings` - If a value is out of range
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| VoiceFxError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let settings: ProcessorSettings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Write settings to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| VoiceFxError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Check every value for consistency
    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &'static str, reason: String| {
            Err(VoiceFxError::InvalidSettings { field, reason })
        };

        if !self.default_output_format.is_output_format() {
            return invalid(
                "default_output_format",
                format!("{} cannot be produced", self.default_output_format),
            );
        }
        if !PREVIEW_LIMIT_RANGE.contains(&self.preview_max_seconds) {
            return invalid(
                "preview_max_seconds",
                format!(
                    "{} is outside {}..={}",
                    self.preview_max_seconds,
                    PREVIEW_LIMIT_RANGE.start(),
                    PREVIEW_LIMIT_RANGE.end()
                ),
            );
        }
        if !(self.max_duration_seconds > 0.0) {
            return invalid("max_duration_seconds", "must be positive".to_string());
        }
        if self.max_input_bytes == 0 {
            return invalid("max_input_bytes", "must be positive".to_string());
        }
        if self.ffmpeg_binary.trim().is_empty() {
            return invalid("ffmpeg_binary", "must not be empty".to_string());
        }
        if self.enhance.noise_frames == 0 {
            return invalid("enhance.noise_frames", "must be at least 1".to_string());
        }
        if !(self.enhance.compress_ratio >= 1.0) {
            return invalid("enhance.compress_ratio", "must be at least 1.0".to_string());
        }
        if !(0.0..1.0).contains(&self.enhance.preemphasis) {
            return invalid("enhance.preemphasis", "must lie in [0, 1)".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let settings = ProcessorSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.preview_max_seconds, 30.0);
        assert_eq!(settings.max_input_bytes, 52_428_800);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("voicefx.json");

        let settings = ProcessorSettings {
            default_output_format: AudioFormat::Flac,
            preview_max_seconds: 10.0,
            ..ProcessorSettings::default()
        };
        settings.save(&path).unwrap();

        let loaded = ProcessorSettings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{"max_duration_seconds": 60.0, "enhance": {"noise_alpha": 1.5}}"#)
            .unwrap();

        let loaded = ProcessorSettings::load(&path).unwrap();
        assert_eq!(loaded.max_duration_seconds, 60.0);
        assert_eq!(loaded.enhance.noise_alpha, 1.5);
        assert_eq!(loaded.enhance.noise_frames, 10);
        assert_eq!(loaded.default_output_format, AudioFormat::Wav);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let settings = ProcessorSettings {
            preview_max_seconds: 90.0,
            ..ProcessorSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(VoiceFxError::InvalidSettings {
                field: "preview_max_seconds",
                ..
            })
        ));

        let settings = ProcessorSettings {
            default_output_format: AudioFormat::M4a,
            ..ProcessorSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = ProcessorSettings::load(&dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_READ_ERROR");
    }
}
