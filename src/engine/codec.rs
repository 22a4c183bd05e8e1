//! Audio codec
//!
//! Decodes arbitrary input bytes into a canonical mono [`Waveform`] and
//! encodes waveforms back to a requested output format.
//!
//! Decoding tries the in-process decoder first and falls back to an external
//! ffmpeg demux when it fails. WAV output is written natively; compressed
//! output is transcoded by ffmpeg from an intermediate WAV file.

use std::ffi::OsStr;
use std::io::Cursor;
use std::path::Path;
use std::process::Command;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, warn};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use serde::{Deserialize, Serialize};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::engine::capabilities::{CodecCapabilities, DecoderKind, EncoderKind};
use crate::engine::format::AudioFormat;
use crate::engine::waveform::Waveform;
use crate::error::{Result, VoiceFxError};

/// Upper bound on flush calls when draining the resampler tail
const MAX_RESAMPLER_FLUSHES: usize = 64;

/// Sample layout used for native WAV output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WavEncoding {
    /// 16-bit signed integer PCM
    #[default]
    Pcm16,
    /// 32-bit IEEE float
    Float32,
}

/// Format-tolerant decoder/encoder over a fixed capability table
#[derive(Debug, Clone, Default)]
pub struct AudioCodec {
    capabilities: CodecCapabilities,
    wav_encoding: WavEncoding,
}

impl AudioCodec {
    /// Create a codec over an already-resolved capability table
    pub fn new(capabilities: CodecCapabilities) -> Self {
        Self {
            capabilities,
            wav_encoding: WavEncoding::default(),
        }
    }

    /// Set the sample layout for WAV output
    pub fn with_wav_encoding(mut self, encoding: WavEncoding) -> Self {
        self.wav_encoding = encoding;
        self
    }

    pub fn capabilities(&self) -> &CodecCapabilities {
        &self.capabilities
    }

    pub fn wav_encoding(&self) -> WavEncoding {
        self.wav_encoding
    }

    /// Decode input bytes into a mono waveform at the source's native rate
    ///
    /// # Arguments
    /// * `bytes` - Encoded audio
    /// * `declared_extension` - Extension or filename supplied by the caller;
    ///   content sniffing is used when it is not recognised
    ///
    /// # Errors
    /// * `UnsupportedFormat` - If neither the extension nor the content identify a known format
    /// * `Decode` - If both the primary and the fallback decoder fail
    /// * `Resource` - If the decoded audio cannot be allocated
    pub fn decode(&self, bytes: &[u8], declared_extension: &str) -> Result<Waveform> {
        let format = AudioFormat::resolve(declared_extension, bytes)?;
        let [primary, fallback] = self.capabilities.decoder_slots();

        let primary_cause = match self.attempt_decode(primary, bytes, format) {
            Ok(waveform) => return Ok(waveform),
            Err(err @ VoiceFxError::Resource { .. }) => return Err(err),
            Err(err) => err.to_string(),
        };
        warn!(
            "{} could not decode {} input ({}); trying {}",
            primary.0.name(),
            format,
            primary_cause,
            fallback.0.name()
        );

        let fallback_cause = match self.attempt_decode(fallback, bytes, format) {
            Ok(waveform) => return Ok(waveform),
            Err(err @ VoiceFxError::Resource { .. }) => return Err(err),
            Err(err) => err.to_string(),
        };

        Err(VoiceFxError::Decode {
            primary: format!("{}: {}", primary.0.name(), primary_cause),
            fallback: format!("{}: {}", fallback.0.name(), fallback_cause),
        })
    }

    /// Encode a waveform into `format`
    ///
    /// # Errors
    /// * `Encode` - If no available encoder supports the format, or the encoder fails
    pub fn encode(&self, waveform: &Waveform, format: AudioFormat) -> Result<Vec<u8>> {
        match self.capabilities.encoder_for(format) {
            Some(EncoderKind::NativeWav) => encode_wav(waveform, self.wav_encoding),
            Some(EncoderKind::Ffmpeg) => self.encode_with_ffmpeg(waveform, format),
            None => Err(VoiceFxError::Encode {
                format: format.to_string(),
                reason: "no available encoder supports this format".to_string(),
            }),
        }
    }

    /// Convert a waveform to `target_rate`
    pub fn resample(&self, waveform: &Waveform, target_rate: u32) -> Result<Waveform> {
        resample(waveform, target_rate)
    }

    fn attempt_decode(
        &self,
        (kind, available): (DecoderKind, bool),
        bytes: &[u8],
        format: AudioFormat,
    ) -> Result<Waveform> {
        if !available {
            return Err(VoiceFxError::UnsupportedFormat {
                format: format!("{} (decoder not available)", format),
            });
        }
        debug!("Decoding {} bytes of {} with {}", bytes.len(), format, kind.name());
        match kind {
            DecoderKind::Symphonia => decode_with_symphonia(bytes, format),
            DecoderKind::Ffmpeg => self.decode_with_ffmpeg(bytes, format),
        }
    }

    fn decode_with_ffmpeg(&self, bytes: &[u8], format: AudioFormat) -> Result<Waveform> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join(format!("input.{}", format.extension()));
        let output = dir.path().join("decoded.wav");
        std::fs::write(&input, bytes)?;

        run_ffmpeg(
            &self.capabilities.ffmpeg_binary,
            &[
                OsStr::new("-i"),
                input.as_os_str(),
                OsStr::new("-c:a"),
                OsStr::new("pcm_f32le"),
                output.as_os_str(),
            ],
        )
        .map_err(|reason| VoiceFxError::InvalidWaveform { reason })?;

        decode_wav(&std::fs::read(&output)?)
    }

    fn encode_with_ffmpeg(&self, waveform: &Waveform, format: AudioFormat) -> Result<Vec<u8>> {
        let encode_err = |reason: String| VoiceFxError::Encode {
            format: format.to_string(),
            reason,
        };

        let dir = tempfile::tempdir()?;
        let intermediate = dir.path().join("intermediate.wav");
        let output = dir.path().join(format!("output.{}", format.extension()));
        std::fs::write(&intermediate, encode_wav(waveform, WavEncoding::Pcm16)?)?;

        let mut args: Vec<&OsStr> = vec![OsStr::new("-i"), intermediate.as_os_str()];
        args.extend(ffmpeg_codec_args(format).iter().map(OsStr::new));
        args.push(output.as_os_str());

        run_ffmpeg(&self.capabilities.ffmpeg_binary, &args).map_err(encode_err)?;
        read_output(&output).map_err(|e| encode_err(e.to_string()))
    }
}

// ============================================================================
// WAV
// ============================================================================

/// Write a waveform as a mono WAV file in memory
pub fn encode_wav(waveform: &Waveform, encoding: WavEncoding) -> Result<Vec<u8>> {
    let encode_err = |e: hound::Error| VoiceFxError::Encode {
        format: AudioFormat::Wav.to_string(),
        reason: e.to_string(),
    };

    let spec = WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate(),
        bits_per_sample: match encoding {
            WavEncoding::Pcm16 => 16,
            WavEncoding::Float32 => 32,
        },
        sample_format: match encoding {
            WavEncoding::Pcm16 => SampleFormat::Int,
            WavEncoding::Float32 => SampleFormat::Float,
        },
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + waveform.len() * 4));
    {
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(encode_err)?;
        match encoding {
            WavEncoding::Pcm16 => {
                for &sample in waveform.samples() {
                    writer.write_sample(to_pcm16(sample)).map_err(encode_err)?;
                }
            }
            WavEncoding::Float32 => {
                for &sample in waveform.samples() {
                    writer.write_sample(sample).map_err(encode_err)?;
                }
            }
        }
        writer.finalize().map_err(encode_err)?;
    }

    Ok(cursor.into_inner())
}

/// Read an in-memory WAV file into a mono waveform
pub fn decode_wav(bytes: &[u8]) -> Result<Waveform> {
    let reader = WavReader::new(Cursor::new(bytes)).map_err(|e| VoiceFxError::InvalidWaveform {
        reason: format!("Failed to open WAV data: {}", e),
    })?;

    let spec = reader.spec();
    let samples = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    Waveform::from_interleaved(&samples, spec.channels as usize, spec.sample_rate)
}

/// Quantize a float sample to 16-bit PCM
fn to_pcm16(sample: f32) -> i16 {
    (sample * 32768.0).round().clamp(-32768.0, 32767.0) as i16
}

/// Read samples from a WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let read_err = |e: hound::Error| VoiceFxError::InvalidWaveform {
        reason: format!("Failed to read {}-bit samples: {}", bits_per_sample, e),
    };

    match sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(read_err),
        SampleFormat::Int => {
            if !(8..=32).contains(&bits_per_sample) {
                return Err(VoiceFxError::UnsupportedFormat {
                    format: format!("{}-bit integer audio", bits_per_sample),
                });
            }
            let scale = 1.0 / (1u64 << (bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(read_err)
        }
    }
}

// ============================================================================
// Symphonia
// ============================================================================

fn decode_with_symphonia(bytes: &[u8], format: AudioFormat) -> Result<Waveform> {
    let invalid = |reason: String| VoiceFxError::InvalidWaveform { reason };

    let source = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(source), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(format.extension());

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| invalid(e.to_string()))?;
    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| invalid("no audio track found".to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| invalid("unknown sample rate".to_string()))?;
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| invalid(e.to_string()))?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                warn!("Error reading packet: {}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("Skipping corrupt packet: {}", e);
                continue;
            }
            Err(e) => return Err(invalid(e.to_string())),
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            channels = spec.channels.count();
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            interleaved
                .try_reserve(buf.samples().len())
                .map_err(|e| VoiceFxError::Resource {
                    details: format!("decoded audio too large: {}", e),
                })?;
            interleaved.extend_from_slice(buf.samples());
        }
    }

    if channels == 0 {
        return Err(invalid("unknown channel layout".to_string()));
    }

    Waveform::from_interleaved(&interleaved, channels, sample_rate)
}

// ============================================================================
// External transcoder
// ============================================================================

/// Codec arguments for each compressed output format
fn ffmpeg_codec_args(format: AudioFormat) -> &'static [&'static str] {
    match format {
        AudioFormat::Mp3 => &["-c:a", "libmp3lame", "-q:a", "2"],
        AudioFormat::Ogg => &["-c:a", "libvorbis", "-q:a", "5"],
        AudioFormat::Flac => &["-c:a", "flac"],
        AudioFormat::Wav => &["-c:a", "pcm_s16le"],
        AudioFormat::M4a => &["-c:a", "aac", "-b:a", "192k"],
    }
}

/// Run the transcoder with quiet, overwrite-enabled flags
fn run_ffmpeg(binary: &str, args: &[&OsStr]) -> std::result::Result<(), String> {
    let output = Command::new(binary)
        .args(["-hide_banner", "-loglevel", "error", "-y"])
        .args(args)
        .output()
        .map_err(|e| format!("failed to run {}: {}", binary, e))?;

    if output.status.success() {
        Ok(())
    } else {
        Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
    }
}

fn read_output(path: &Path) -> std::io::Result<Vec<u8>> {
    std::fs::read(path)
}

// ============================================================================
// Resampling
// ============================================================================

/// Produce a new waveform at `target_rate` using windowed-sinc interpolation
///
/// Returns a copy of the input if it is already at the target rate.
pub fn resample(waveform: &Waveform, target_rate: u32) -> Result<Waveform> {
    if target_rate == 0 {
        return Err(VoiceFxError::InvalidWaveform {
            reason: "target sample rate must be positive".to_string(),
        });
    }
    if waveform.sample_rate() == target_rate {
        return Ok(waveform.clone());
    }

    let ratio = target_rate as f64 / waveform.sample_rate() as f64;
    let samples = resample_samples(waveform.samples(), ratio)?;
    Waveform::new(samples, target_rate)
}

/// Resample raw samples by `ratio` (output rate / input rate)
///
/// The output has exactly `round(len * ratio)` samples, aligned with the
/// input (the resampler's group delay is removed).
pub(crate) fn resample_samples(samples: &[f32], ratio: f64) -> Result<Vec<f32>> {
    let resample_err = |reason: String| VoiceFxError::Resample { reason };

    let expected = (samples.len() as f64 * ratio).round() as usize;
    if samples.is_empty() || expected == 0 {
        return Ok(vec![0.0; expected]);
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, samples.len(), 1)
        .map_err(|e| resample_err(e.to_string()))?;
    let delay = resampler.output_delay();

    let mut output = resampler
        .process(&[samples], None)
        .map_err(|e| resample_err(e.to_string()))?
        .into_iter()
        .next()
        .ok_or_else(|| resample_err("resampler returned no channels".to_string()))?;

    let mut flushes = 0;
    while output.len() < expected + delay && flushes < MAX_RESAMPLER_FLUSHES {
        let tail = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| resample_err(e.to_string()))?;
        match tail.into_iter().next() {
            Some(channel) if !channel.is_empty() => output.extend(channel),
            _ => break,
        }
        flushes += 1;
    }

    let mut aligned: Vec<f32> = output.into_iter().skip(delay).take(expected).collect();
    aligned.resize(expected, 0.0);
    Ok(aligned)
}

// ============================================================================
// Tests
// ============================================================================
