//! Audio container formats
//!
//! Input accepts wav, mp3, ogg, flac and m4a; output is limited to
//! wav, mp3, ogg and flac.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VoiceFxError};

/// Container/codec identifiers known to the codec layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    Mp3,
    Ogg,
    Flac,
    M4a,
}

/// Formats accepted by `decode`
pub const INPUT_FORMATS: [AudioFormat; 5] = [
    AudioFormat::Wav,
    AudioFormat::Mp3,
    AudioFormat::Ogg,
    AudioFormat::Flac,
    AudioFormat::M4a,
];

/// Formats produced by `encode`
pub const OUTPUT_FORMATS: [AudioFormat; 4] = [
    AudioFormat::Wav,
    AudioFormat::Mp3,
    AudioFormat::Ogg,
    AudioFormat::Flac,
];

impl AudioFormat {
    /// Parse a declared extension such as `"wav"`, `".MP3"` or `"clip.flac"`
    pub fn from_extension(declared: &str) -> Result<Self> {
        let ext = declared
            .rsplit('.')
            .next()
            .unwrap_or(declared)
            .trim()
            .to_ascii_lowercase();

        match ext.as_str() {
            "wav" | "wave" => Ok(AudioFormat::Wav),
            "mp3" => Ok(AudioFormat::Mp3),
            "ogg" | "oga" => Ok(AudioFormat::Ogg),
            "flac" => Ok(AudioFormat::Flac),
            "m4a" | "mp4" | "aac" => Ok(AudioFormat::M4a),
            _ => Err(VoiceFxError::UnsupportedFormat {
                format: declared.to_string(),
            }),
        }
    }

    /// Guess the container from its leading magic bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
            Some(AudioFormat::Wav)
        } else if bytes.starts_with(b"fLaC") {
            Some(AudioFormat::Flac)
        } else if bytes.starts_with(b"OggS") {
            Some(AudioFormat::Ogg)
        } else if bytes.len() >= 8 && &bytes[4..8] == b"ftyp" {
            Some(AudioFormat::M4a)
        } else if bytes.starts_with(b"ID3") || (bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0) {
            Some(AudioFormat::Mp3)
        } else {
            None
        }
    }

    /// Resolve the format of an input from its declared extension, falling
    /// back to content sniffing
    pub fn resolve(declared: &str, bytes: &[u8]) -> Result<Self> {
        Self::from_extension(declared).or_else(|err| Self::sniff(bytes).ok_or(err))
    }

    /// Canonical file extension (without dot)
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Flac => "flac",
            AudioFormat::M4a => "m4a",
        }
    }

    /// Whether `encode` can target this format
    pub fn is_output_format(&self) -> bool {
        OUTPUT_FORMATS.contains(self)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = VoiceFxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_extension(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("wav", AudioFormat::Wav)]
    #[test_case(".MP3", AudioFormat::Mp3)]
    #[test_case("voice.ogg", AudioFormat::Ogg)]
    #[test_case("FLAC", AudioFormat::Flac)]
    #[test_case("memo.m4a", AudioFormat::M4a)]
    fn test_from_extension(declared: &str, expected: AudioFormat) {
        assert_eq!(AudioFormat::from_extension(declared).unwrap(), expected);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = AudioFormat::from_extension("aiff").unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
    }

    #[test]
    fn test_sniff_magic_bytes() {
        assert_eq!(AudioFormat::sniff(b"RIFF\0\0\0\0WAVEfmt "), Some(AudioFormat::Wav));
        assert_eq!(AudioFormat::sniff(b"fLaC\0\0"), Some(AudioFormat::Flac));
        assert_eq!(AudioFormat::sniff(b"OggS\0"), Some(AudioFormat::Ogg));
        assert_eq!(AudioFormat::sniff(b"ID3\x04"), Some(AudioFormat::Mp3));
        assert_eq!(AudioFormat::sniff(b"\0\0\0\x20ftypM4A "), Some(AudioFormat::M4a));
        assert_eq!(AudioFormat::sniff(b"hello"), None);
    }

    #[test]
    fn test_resolve_prefers_declared_extension() {
        assert_eq!(AudioFormat::resolve("ogg", b"RIFF\0\0\0\0WAVE").unwrap(), AudioFormat::Ogg);
        assert_eq!(AudioFormat::resolve("bin", b"RIFF\0\0\0\0WAVE").unwrap(), AudioFormat::Wav);
        assert!(AudioFormat::resolve("bin", b"nothing").is_err());
    }

    #[test]
    fn test_m4a_is_input_only() {
        assert!(INPUT_FORMATS.contains(&AudioFormat::M4a));
        assert!(!AudioFormat::M4a.is_output_format());
        assert!(AudioFormat::Flac.is_output_format());
    }
}
