//! Codec capability table
//!
//! Decoders and encoders are ranked once, and each one's availability is
//! recorded as a plain fact when the table is built. Choosing an engine for a
//! request is then a pure lookup over this table.

use std::process::Command;

use log::debug;
use serde::Serialize;

use crate::engine::format::AudioFormat;

/// Default name of the external transcoder binary
pub const DEFAULT_FFMPEG_BINARY: &str = "ffmpeg";

/// Decoder engines, in rank order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecoderKind {
    /// In-process demuxer/decoder (wav, mp3, ogg/vorbis, flac, m4a/aac)
    Symphonia,
    /// External ffmpeg demux to WAV, then native WAV read
    Ffmpeg,
}

/// Encoder engines, in rank order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EncoderKind {
    /// Direct uncompressed PCM writer
    NativeWav,
    /// External ffmpeg transcode from an intermediate WAV container
    Ffmpeg,
}

/// Decoders in the order they are tried
pub const DECODER_RANKING: [DecoderKind; 2] = [DecoderKind::Symphonia, DecoderKind::Ffmpeg];

/// Encoders in the order they are considered
pub const ENCODER_RANKING: [EncoderKind; 2] = [EncoderKind::NativeWav, EncoderKind::Ffmpeg];

impl DecoderKind {
    pub fn name(&self) -> &'static str {
        match self {
            DecoderKind::Symphonia => "symphonia",
            DecoderKind::Ffmpeg => "ffmpeg",
        }
    }
}

impl EncoderKind {
    pub fn name(&self) -> &'static str {
        match self {
            EncoderKind::NativeWav => "native-wav",
            EncoderKind::Ffmpeg => "ffmpeg",
        }
    }

    /// Whether this encoder can produce `format`
    pub fn supports(&self, format: AudioFormat) -> bool {
        match self {
            EncoderKind::NativeWav => format == AudioFormat::Wav,
            EncoderKind::Ffmpeg => format.is_output_format(),
        }
    }
}

/// Availability of every codec engine, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodecCapabilities {
    /// In-process decoder is compiled in
    pub symphonia: bool,
    /// Native WAV writer is compiled in
    pub native_wav: bool,
    /// External transcoder responded to a version probe
    pub ffmpeg: bool,
    /// Binary used for the external transcoder
    pub ffmpeg_binary: String,
}

impl CodecCapabilities {
    /// Probe the system once for optional engines
    pub fn detect() -> Self {
        Self::detect_with_binary(DEFAULT_FFMPEG_BINARY)
    }

    /// Probe using a specific transcoder binary
    pub fn detect_with_binary(binary: &str) -> Self {
        let ffmpeg = probe_ffmpeg(binary);
        debug!("Codec capabilities: ffmpeg ({}) available = {}", binary, ffmpeg);
        Self {
            symphonia: true,
            native_wav: true,
            ffmpeg,
            ffmpeg_binary: binary.to_string(),
        }
    }

    /// In-process engines only; never spawns external tools
    pub fn native_only() -> Self {
        Self {
            symphonia: true,
            native_wav: true,
            ffmpeg: false,
            ffmpeg_binary: DEFAULT_FFMPEG_BINARY.to_string(),
        }
    }

    pub fn decoder_available(&self, kind: DecoderKind) -> bool {
        match kind {
            DecoderKind::Symphonia => self.symphonia,
            DecoderKind::Ffmpeg => self.ffmpeg,
        }
    }

    pub fn encoder_available(&self, kind: EncoderKind) -> bool {
        match kind {
            EncoderKind::NativeWav => self.native_wav,
            EncoderKind::Ffmpeg => self.ffmpeg,
        }
    }

    /// Primary and fallback decoders, in rank order
    ///
    /// Both slots are always reported; an unavailable engine still occupies
    /// its slot so the caller can record why it was not used.
    pub fn decoder_slots(&self) -> [(DecoderKind, bool); 2] {
        DECODER_RANKING.map(|kind| (kind, self.decoder_available(kind)))
    }

    /// Highest-ranked available encoder for `format`
    pub fn encoder_for(&self, format: AudioFormat) -> Option<EncoderKind> {
        ENCODER_RANKING
            .into_iter()
            .find(|kind| kind.supports(format) && self.encoder_available(*kind))
    }

    /// Output formats that can currently be produced
    pub fn writable_formats(&self) -> Vec<AudioFormat> {
        crate::engine::format::OUTPUT_FORMATS
            .into_iter()
            .filter(|f| self.encoder_for(*f).is_some())
            .collect()
    }
}

impl Default for CodecCapabilities {
    fn default() -> Self {
        Self::native_only()
    }
}

/// Run `<binary> -version` and report whether it succeeded
fn probe_ffmpeg(binary: &str) -> bool {
    Command::new(binary)
        .arg("-version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_only_encodes_wav_only() {
        let caps = CodecCapabilities::native_only();
        assert_eq!(caps.encoder_for(AudioFormat::Wav), Some(EncoderKind::NativeWav));
        assert_eq!(caps.encoder_for(AudioFormat::Mp3), None);
        assert_eq!(caps.writable_formats(), vec![AudioFormat::Wav]);
    }

    #[test]
    fn test_ffmpeg_covers_compressed_outputs() {
        let caps = CodecCapabilities {
            ffmpeg: true,
            ..CodecCapabilities::native_only()
        };
        assert_eq!(caps.encoder_for(AudioFormat::Wav), Some(EncoderKind::NativeWav));
        assert_eq!(caps.encoder_for(AudioFormat::Ogg), Some(EncoderKind::Ffmpeg));
        assert_eq!(caps.encoder_for(AudioFormat::M4a), None);
        assert_eq!(caps.writable_formats().len(), 4);
    }

    #[test]
    fn test_decoder_slots_keep_rank_order() {
        let caps = CodecCapabilities::native_only();
        let slots = caps.decoder_slots();
        assert_eq!(slots[0], (DecoderKind::Symphonia, true));
        assert_eq!(slots[1], (DecoderKind::Ffmpeg, false));
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let caps = CodecCapabilities::detect_with_binary("definitely-not-a-real-transcoder-binary");
        assert!(!caps.ffmpeg);
        assert!(caps.symphonia);
    }
}
