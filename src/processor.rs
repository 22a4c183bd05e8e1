//! Voice effects processor
//!
//! The request-level entry point: decode the input, check the requested
//! effects, run the pipeline, and encode the result. The processor is
//! ordinary blocking code; callers running inside an async runtime should
//! offload it (see `process_async` behind the `async-bridge` feature).

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;

use crate::engine::{
    AudioCodec, AudioFormat, AudioMetadata, AudioValidation, CodecCapabilities, Waveform,
    INPUT_FORMATS, OUTPUT_FORMATS,
};
use crate::error::{Result, VoiceFxError};
use crate::pipeline::{
    EffectConfig, EffectPipeline, ParameterValidator, PipelineOutput, PipelineReport,
    PresetCatalog,
};
use crate::settings::{ProcessorSettings, PREVIEW_LIMIT_RANGE};
use crate::store::{AudioStore, StoredAudio};

/// Which effects to apply
#[derive(Debug, Clone, PartialEq)]
pub enum EffectSelection {
    /// Explicit configuration; range-checked before use
    Config(EffectConfig),
    /// Named preset; already validated by the catalog
    Preset(String),
}

impl From<EffectConfig> for EffectSelection {
    fn from(config: EffectConfig) -> Self {
        EffectSelection::Config(config)
    }
}

/// Encoded output of one request
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedAudio {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
    /// Description of the decoded input
    pub input: AudioMetadata,
    /// Description of the encoded output
    pub output: AudioMetadata,
    pub report: PipelineReport,
    pub processed_at: DateTime<Utc>,
}

/// Formats the processor accepts and can currently produce
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportedFormats {
    pub input: Vec<AudioFormat>,
    pub output: Vec<AudioFormat>,
    /// Output formats with an available encoder on this system
    pub writable: Vec<AudioFormat>,
}

/// Decode → validate → apply → encode
#[derive(Debug)]
pub struct VoiceEffectsProcessor {
    codec: AudioCodec,
    presets: PresetCatalog,
    validator: ParameterValidator,
    settings: ProcessorSettings,
}

impl VoiceEffectsProcessor {
    /// Create a processor, probing the system for optional codec engines
    ///
    /// # Errors
    /// * `InvalidSettings` - If the settings fail validation
    pub fn new(settings: ProcessorSettings) -> Result<Self> {
        let capabilities = CodecCapabilities::detect_with_binary(&settings.ffmpeg_binary);
        Self::with_capabilities(settings, capabilities)
    }

    /// Create a processor over a fixed capability table
    pub fn with_capabilities(
        settings: ProcessorSettings,
        capabilities: CodecCapabilities,
    ) -> Result<Self> {
        settings.validate()?;
        info!(
            "Voice effects processor ready (ffmpeg: {}, writable: {:?})",
            capabilities.ffmpeg,
            capabilities.writable_formats()
        );
        Ok(Self {
            codec: AudioCodec::new(capabilities).with_wav_encoding(settings.wav_encoding),
            presets: PresetCatalog::builtin()?,
            validator: ParameterValidator,
            settings,
        })
    }

    pub fn settings(&self) -> &ProcessorSettings {
        &self.settings
    }

    pub fn codec(&self) -> &AudioCodec {
        &self.codec
    }

    pub fn presets(&self) -> &PresetCatalog {
        &self.presets
    }

    /// Input, output and currently writable formats
    pub fn supported_formats(&self) -> SupportedFormats {
        SupportedFormats {
            input: INPUT_FORMATS.to_vec(),
            output: OUTPUT_FORMATS.to_vec(),
            writable: self.codec.capabilities().writable_formats(),
        }
    }

    /// Turn a selection into a checked configuration
    ///
    /// # Errors
    /// * `UnknownPreset` - If a preset name is not in the catalog
    /// * `ParameterRange` - If an explicit configuration is out of range
    pub fn resolve(&self, selection: &EffectSelection) -> Result<EffectConfig> {
        match selection {
            EffectSelection::Preset(name) => self.presets.config(name),
            EffectSelection::Config(config) => {
                self.validator.check(config)?;
                Ok(config.clone())
            }
        }
    }

    /// Apply effects to encoded audio
    ///
    /// # Arguments
    /// * `bytes` - Encoded input audio
    /// * `declared_extension` - Extension or filename of the input
    /// * `selection` - Effects to apply
    /// * `output_format` - Target format; the configured default if `None`
    ///
    /// # Errors
    /// * `UnsupportedFormat` - If the output format cannot be produced at all
    /// * `Resource` - If the input exceeds the size or duration limits
    /// * `Decode`, `ParameterRange`, `UnknownPreset`, `Encode`
    pub fn process(
        &self,
        bytes: &[u8],
        declared_extension: &str,
        selection: &EffectSelection,
        output_format: Option<AudioFormat>,
    ) -> Result<ProcessedAudio> {
        let format = self.output_format(output_format)?;
        let waveform = self.decode_checked(bytes, declared_extension)?;
        let config = self.resolve(selection)?;

        let output = EffectPipeline::from_config(&config).run(&waveform);
        info!("Effects {}", output.report.summary());

        self.finish(&waveform, output, format, bytes, declared_extension)
    }

    /// Apply effects to the opening seconds of the input and return WAV
    ///
    /// # Arguments
    /// * `duration_limit` - Seconds to keep, within 5..=60; the configured
    ///   preview length if `None`
    pub fn preview(
        &self,
        bytes: &[u8],
        declared_extension: &str,
        selection: &EffectSelection,
        duration_limit: Option<f64>,
    ) -> Result<ProcessedAudio> {
        let limit = duration_limit.unwrap_or(self.settings.preview_max_seconds);
        if !PREVIEW_LIMIT_RANGE.contains(&limit) {
            return Err(VoiceFxError::ParameterRange {
                field: "duration_limit",
                value: limit as f32,
                min: *PREVIEW_LIMIT_RANGE.start() as f32,
                max: *PREVIEW_LIMIT_RANGE.end() as f32,
            });
        }

        let waveform = self.decode_checked(bytes, declared_extension)?;
        let config = self.resolve(selection)?;

        let clip = waveform.truncated(limit);
        debug!(
            "Preview of {:.2}s from {:.2}s input",
            clip.duration_secs(),
            waveform.duration_secs()
        );

        let output = EffectPipeline::from_config(&config).run(&clip);
        info!("Preview effects {}", output.report.summary());

        self.finish(&waveform, output, AudioFormat::Wav, bytes, declared_extension)
    }

    /// Run the enhancement pass over encoded audio
    pub fn enhance(
        &self,
        bytes: &[u8],
        declared_extension: &str,
        output_format: Option<AudioFormat>,
    ) -> Result<ProcessedAudio> {
        let format = self.output_format(output_format)?;
        let waveform = self.decode_checked(bytes, declared_extension)?;

        let output = self.enhance_waveform(&waveform);
        info!("Enhancement {}", output.report.summary());

        self.finish(&waveform, output, format, bytes, declared_extension)
    }

    /// Run the enhancement pass over an in-memory waveform
    ///
    /// Used for audio that never went through the codec, such as generated speech.
    pub fn enhance_waveform(&self, waveform: &Waveform) -> PipelineOutput {
        EffectPipeline::enhancement(&self.settings.enhance).run(waveform)
    }

    /// Decode and describe the input without processing it
    pub fn audio_info(&self, bytes: &[u8], declared_extension: &str) -> Result<AudioMetadata> {
        let format = AudioFormat::resolve(declared_extension, bytes)?;
        let waveform = self.codec.decode(bytes, declared_extension)?;
        Ok(AudioMetadata::describe(&waveform, format, bytes))
    }

    /// Decode the input and run the upload checks on it
    pub fn validate_audio(&self, bytes: &[u8], declared_extension: &str) -> Result<AudioValidation> {
        let waveform = self.codec.decode(bytes, declared_extension)?;
        Ok(waveform.validate(self.settings.max_duration_seconds))
    }

    /// Keep a processed result in `store` and return its id
    pub fn store_result(&self, store: &dyn AudioStore, processed: &ProcessedAudio) -> Result<String> {
        store.put(StoredAudio {
            bytes: processed.bytes.clone(),
            format: processed.format,
            metadata: processed.output.clone(),
            created_at: processed.processed_at,
        })
    }

    fn output_format(&self, requested: Option<AudioFormat>) -> Result<AudioFormat> {
        let format = requested.unwrap_or(self.settings.default_output_format);
        if format.is_output_format() {
            Ok(format)
        } else {
            Err(VoiceFxError::UnsupportedFormat {
                format: format!("{} (output)", format),
            })
        }
    }

    fn decode_checked(&self, bytes: &[u8], declared_extension: &str) -> Result<Waveform> {
        if bytes.len() > self.settings.max_input_bytes {
            return Err(VoiceFxError::Resource {
                details: format!(
                    "input is {} bytes, limit is {}",
                    bytes.len(),
                    self.settings.max_input_bytes
                ),
            });
        }

        let waveform = self.codec.decode(bytes, declared_extension)?;
        if waveform.duration_secs() > self.settings.max_duration_seconds {
            return Err(VoiceFxError::Resource {
                details: format!(
                    "input is {:.1}s long, limit is {:.1}s",
                    waveform.duration_secs(),
                    self.settings.max_duration_seconds
                ),
            });
        }

        debug!(
            "Decoded {} samples at {} Hz ({:.2}s)",
            waveform.len(),
            waveform.sample_rate(),
            waveform.duration_secs()
        );
        Ok(waveform)
    }

    fn finish(
        &self,
        input: &Waveform,
        output: PipelineOutput,
        format: AudioFormat,
        input_bytes: &[u8],
        declared_extension: &str,
    ) -> Result<ProcessedAudio> {
        let input_format = AudioFormat::resolve(declared_extension, input_bytes)?;
        let encoded = self.codec.encode(&output.waveform, format)?;

        Ok(ProcessedAudio {
            input: AudioMetadata::describe(input, input_format, input_bytes),
            output: AudioMetadata::describe(&output.waveform, format, &encoded),
            bytes: encoded,
            format,
            report: output.report,
            processed_at: Utc::now(),
        })
    }
}

#[cfg(feature = "async-bridge")]
impl VoiceEffectsProcessor {
    /// Run [`process`](Self::process) on the blocking thread pool
    pub async fn process_async(
        self: std::sync::Arc<Self>,
        bytes: Vec<u8>,
        declared_extension: String,
        selection: EffectSelection,
        output_format: Option<AudioFormat>,
    ) -> Result<ProcessedAudio> {
        tokio::task::spawn_blocking(move || {
            self.process(&bytes, &declared_extension, &selection, output_format)
        })
        .await
        .map_err(task_failure)?
    }
}

/// A processing task that panicked or was cancelled
#[cfg(feature = "async-bridge")]
fn task_failure(e: tokio::task::JoinError) -> VoiceFxError {
    VoiceFxError::Resource {
        details: format!("processing task failed: {}", e),
    }
}
