//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use walkdir::WalkDir;

use crate::cli::EffectArgs;
use crate::engine::AudioFormat;
use crate::error::{Result, VoiceFxError};
use crate::pipeline::EffectConfig;
use crate::processor::{EffectSelection, ProcessedAudio, VoiceEffectsProcessor};

/// Resolve the effect flags into a selection
pub fn effect_selection(args: &EffectArgs) -> Result<EffectSelection> {
    if let Some(name) = &args.preset {
        return Ok(EffectSelection::Preset(name.clone()));
    }
    if let Some(path) = &args.effects {
        let content = fs::read_to_string(path).map_err(|e| VoiceFxError::FileRead {
            path: path.clone(),
            source: e,
        })?;
        let config: EffectConfig = serde_json::from_str(&content)?;
        return Ok(EffectSelection::Config(config));
    }
    Ok(EffectSelection::Config(args.to_config()))
}

/// Pick the output format from an explicit flag or the output file extension
pub fn output_format(flag: Option<&str>, output: &Path) -> Result<Option<AudioFormat>> {
    if let Some(name) = flag {
        return name.parse().map(Some);
    }
    Ok(output
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ext.parse().ok()))
}

/// Apply effects to one file.
pub fn apply(
    processor: &VoiceEffectsProcessor,
    input: &Path,
    output: &Path,
    effects: &EffectArgs,
    format: Option<&str>,
    json: bool,
) -> Result<()> {
    info!("Applying effects: {} -> {}", input.display(), output.display());

    let selection = effect_selection(effects)?;
    let format = output_format(format, output)?;
    let bytes = read_input(input)?;

    let processed = processor.process(&bytes, &extension_of(input), &selection, format)?;
    write_output(output, &processed)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&processed)?);
    } else {
        print_result(output, &processed);
    }
    Ok(())
}

/// Preview effects on the opening seconds of a file.
pub fn preview(
    processor: &VoiceEffectsProcessor,
    input: &Path,
    output: &Path,
    effects: &EffectArgs,
    duration: Option<f64>,
) -> Result<()> {
    info!("Previewing effects on: {}", input.display());

    let selection = effect_selection(effects)?;
    let bytes = read_input(input)?;

    let processed = processor.preview(&bytes, &extension_of(input), &selection, duration)?;
    write_output(output, &processed)?;
    print_result(output, &processed);
    Ok(())
}

/// Run the enhancement pass on one file.
pub fn enhance(
    processor: &VoiceEffectsProcessor,
    input: &Path,
    output: &Path,
    format: Option<&str>,
) -> Result<()> {
    info!("Enhancing: {}", input.display());

    let format = output_format(format, output)?;
    let bytes = read_input(input)?;

    let processed = processor.enhance(&bytes, &extension_of(input), format)?;
    write_output(output, &processed)?;
    print_result(output, &processed);
    Ok(())
}

/// Print metadata and upload checks for a file.
pub fn info(processor: &VoiceEffectsProcessor, input: &Path) -> Result<()> {
    let bytes = read_input(input)?;
    let ext = extension_of(input);

    let metadata = processor.audio_info(&bytes, &ext)?;
    let validation = processor.validate_audio(&bytes, &ext)?;

    println!("File:        {}", input.display());
    println!("Format:      {}", metadata.format);
    println!("Duration:    {:.3}s", metadata.duration_seconds);
    println!("Sample rate: {} Hz", metadata.sample_rate);
    println!("Samples:     {}", metadata.num_samples);
    println!("Peak:        {:.4}", metadata.peak);
    println!("RMS:         {:.4}", metadata.rms);
    println!("Size:        {} bytes", metadata.byte_size);
    println!("SHA-256:     {}", metadata.checksum);

    if validation.is_valid() {
        println!("Checks:      passed");
    } else {
        println!("Checks:      failed ({})", validation.failed_checks().join(", "));
    }
    Ok(())
}

/// List presets.
pub fn list_presets(processor: &VoiceEffectsProcessor) -> Result<()> {
    println!("Available presets:");
    println!("{:-<60}", "");
    for preset in processor.presets().iter() {
        let stages: Vec<&str> = preset
            .config
            .enabled_stages()
            .iter()
            .map(|s| s.name())
            .collect();
        println!("{:<14} {}", preset.name, preset.display_name);
        println!("{:<14} {}", "", preset.description);
        println!("{:<14} stages: {}", "", stages.join(" -> "));
    }
    Ok(())
}

/// List formats and codec engines.
pub fn list_formats(processor: &VoiceEffectsProcessor) -> Result<()> {
    let formats = processor.supported_formats();
    let join = |list: &[AudioFormat]| {
        list.iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    println!("Input formats:    {}", join(formats.input.as_slice()));
    println!("Output formats:   {}", join(formats.output.as_slice()));
    println!("Writable now:     {}", join(formats.writable.as_slice()));

    let capabilities = processor.codec().capabilities();
    println!(
        "Transcoder:       {} ({})",
        capabilities.ffmpeg_binary,
        if capabilities.ffmpeg { "available" } else { "not found" }
    );
    Ok(())
}

/// Summary of a batch run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
}

/// Apply effects to every supported file under a directory.
pub fn batch(
    processor: &VoiceEffectsProcessor,
    input_dir: &Path,
    output_dir: &Path,
    effects: &EffectArgs,
    format: Option<&str>,
    recursive: bool,
) -> Result<BatchSummary> {
    info!(
        "Batch processing {} -> {}",
        input_dir.display(),
        output_dir.display()
    );

    let selection = effect_selection(effects)?;
    let format = match format {
        Some(name) => name.parse()?,
        None => processor.settings().default_output_format,
    };

    fs::create_dir_all(output_dir).map_err(|e| VoiceFxError::FileWrite {
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    let mut summary = BatchSummary::default();
    for input in collect_audio_files(input_dir, recursive) {
        let output = batch_output_path(input_dir, output_dir, &input, format);
        let result = read_input(&input).and_then(|bytes| {
            let processed =
                processor.process(&bytes, &extension_of(&input), &selection, Some(format))?;
            if let Some(parent) = output.parent() {
                fs::create_dir_all(parent).map_err(|e| VoiceFxError::FileWrite {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
            write_output(&output, &processed)
        });

        match result {
            Ok(()) => {
                println!("  ok      {}", output.display());
                summary.processed += 1;
            }
            Err(e) => {
                warn!("Failed to process {}: {}", input.display(), e);
                println!("  failed  {} ({})", input.display(), e.error_code());
                summary.failed += 1;
            }
        }
    }

    println!(
        "Processed {} file(s), {} failed",
        summary.processed, summary.failed
    );
    Ok(summary)
}

/// Files under `dir` whose extension is a supported input format
fn collect_audio_files(dir: &Path, recursive: bool) -> Vec<PathBuf> {
    let walker = WalkDir::new(dir).sort_by_file_name();
    let walker = if recursive { walker } else { walker.max_depth(1) };

    walker
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| AudioFormat::from_extension(ext).is_ok())
                .unwrap_or(false)
        })
        .collect()
}

/// Mirror `input`'s position under `input_dir` into `output_dir`
fn batch_output_path(input_dir: &Path, output_dir: &Path, input: &Path, format: AudioFormat) -> PathBuf {
    let relative = input.strip_prefix(input_dir).unwrap_or(input);
    output_dir.join(relative).with_extension(format.extension())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_string()
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| VoiceFxError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_output(path: &Path, processed: &ProcessedAudio) -> Result<()> {
    fs::write(path, &processed.bytes).map_err(|e| VoiceFxError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

fn print_result(output: &Path, processed: &ProcessedAudio) {
    println!(
        "Wrote {} ({}, {:.2}s, {} bytes)",
        output.display(),
        processed.format,
        processed.output.duration_seconds,
        processed.output.byte_size
    );
    let applied = processed.report.applied();
    if !applied.is_empty() {
        println!("Applied: {}", applied.join(", "));
    }
    for (stage, reason) in processed.report.skipped() {
        println!("Skipped: {} ({})", stage, reason);
    }
}
