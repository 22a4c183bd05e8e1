//! Audio Engine Module
//!
//! Core audio handling shared by every effect:
//! - Canonical mono waveform and its metadata
//! - Format identification
//! - Codec capability table
//! - Decode, encode and resample

pub mod capabilities;
pub mod codec;
pub mod format;
pub mod waveform;

pub use capabilities::{CodecCapabilities, DecoderKind, EncoderKind};
pub use codec::{decode_wav, encode_wav, resample, AudioCodec, WavEncoding};
pub use format::{AudioFormat, INPUT_FORMATS, OUTPUT_FORMATS};
pub use waveform::{AudioMetadata, AudioValidation, Waveform};
