//! Error handling for VoiceFX
//!
//! Every failure carries a stable error code and a recovery hint so the
//! calling layer can report it without inspecting variants.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for VoiceFX operations
pub type Result<T> = std::result::Result<T, VoiceFxError>;

/// Main error type for VoiceFX operations
#[derive(Error, Debug)]
pub enum VoiceFxError {
    // Codec Errors
    #[error("Could not decode audio (primary: {primary}; fallback: {fallback})")]
    Decode { primary: String, fallback: String },

    #[error("Could not encode audio as {format}: {reason}")]
    Encode { format: String, reason: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Resampling failed: {reason}")]
    Resample { reason: String },

    #[error("Invalid waveform: {reason}")]
    InvalidWaveform { reason: String },

    // Validation Errors
    #[error("Parameter out of range: {field} = {value} (valid range: {min}..={max})")]
    ParameterRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("Unknown preset: {name}")]
    UnknownPreset { name: String },

    // Processing Errors
    #[error("Stage '{stage}' failed: {reason}")]
    StageExecution { stage: &'static str, reason: String },

    // Resource Errors
    #[error("Resource limit exceeded: {details}")]
    Resource { details: String },

    #[error("Stored audio not found: {id}")]
    NotFound { id: String },

    // Configuration Errors
    #[error("Invalid setting {field}: {reason}")]
    InvalidSettings { field: &'static str, reason: String },

    // I/O Errors
    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VoiceFxError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            VoiceFxError::Decode { .. } => "DECODE_ERROR",
            VoiceFxError::Encode { .. } => "ENCODE_ERROR",
            VoiceFxError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            VoiceFxError::Resample { .. } => "RESAMPLE_ERROR",
            VoiceFxError::InvalidWaveform { .. } => "INVALID_WAVEFORM",
            VoiceFxError::ParameterRange { .. } => "PARAMETER_RANGE",
            VoiceFxError::UnknownPreset { .. } => "UNKNOWN_PRESET",
            VoiceFxError::StageExecution { .. } => "STAGE_EXECUTION",
            VoiceFxError::Resource { .. } => "RESOURCE_ERROR",
            VoiceFxError::NotFound { .. } => "NOT_FOUND",
            VoiceFxError::InvalidSettings { .. } => "INVALID_SETTINGS",
            VoiceFxError::FileRead { .. } => "FILE_READ_ERROR",
            VoiceFxError::FileWrite { .. } => "FILE_WRITE_ERROR",
            VoiceFxError::Io(_) => "IO_ERROR",
            VoiceFxError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the pipeline can continue past this error
    ///
    /// Only a single stage failing is recovered locally; everything else
    /// aborts the request.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, VoiceFxError::StageExecution { .. })
    }

    /// Returns a suggested recovery action for this error
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "Convert the file to WAV or FLAC and try again",
            Self::Encode { .. } => "Request WAV output, or install ffmpeg for compressed formats",
            Self::UnsupportedFormat { .. } => "Supported input: wav, mp3, ogg, flac, m4a; output: wav, mp3, ogg, flac",
            Self::ParameterRange { .. } => "Adjust the parameter to be within its valid range",
            Self::UnknownPreset { .. } => "List the available presets and pick one of them",
            Self::StageExecution { .. } => "The stage was skipped; other effects were still applied",
            Self::Resource { .. } => "Process a shorter audio segment",
            Self::InvalidWaveform { .. } => "Check that the audio contains samples and a valid sample rate",
            Self::InvalidSettings { .. } => "Fix the value in the settings file or remove it to use the default",
            Self::FileRead { .. } => "Check that the file exists and is readable",
            Self::FileWrite { .. } => "Check that the directory exists and is writable",
            _ => "Check the error details and try again",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = VoiceFxError::ParameterRange {
            field: "pitch_shift_semitones",
            value: 13.0,
            min: -12.0,
            max: 12.0,
        };
        assert_eq!(err.error_code(), "PARAMETER_RANGE");
        assert!(err.to_string().contains("pitch_shift_semitones"));
    }

    #[test]
    fn test_only_stage_errors_are_recoverable() {
        let stage = VoiceFxError::StageExecution {
            stage: "pitch_shift",
            reason: "too short".to_string(),
        };
        assert!(stage.is_recoverable());

        let decode = VoiceFxError::Decode {
            primary: "bad header".to_string(),
            fallback: "ffmpeg unavailable".to_string(),
        };
        assert!(!decode.is_recoverable());
        assert!(decode.to_string().contains("bad header"));
        assert!(decode.to_string().contains("ffmpeg unavailable"));
    }
}
