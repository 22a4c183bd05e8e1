//! VoiceFX CLI
//!
//! Command-line interface for the voice effects pipeline.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{debug, info};

use voicefx::cli::commands;
use voicefx::cli::{Cli, Commands};
use voicefx::{ProcessorSettings, VoiceEffectsProcessor};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("VoiceFX v{}", env!("CARGO_PKG_VERSION"));

    let Some(command) = cli.command else {
        println!("VoiceFX v{}", env!("CARGO_PKG_VERSION"));
        println!("Use --help for available commands");
        return Ok(());
    };

    let settings = match &cli.config {
        Some(path) => ProcessorSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => ProcessorSettings::default(),
    };
    debug!("Settings: {:?}", settings);

    let processor = VoiceEffectsProcessor::new(settings).context("starting processor")?;
    handle_command(&processor, command)
}

fn handle_command(processor: &VoiceEffectsProcessor, cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Apply {
            input,
            output,
            effects,
            format,
            json,
        } => commands::apply(processor, &input, &output, &effects, format.as_deref(), json)
            .with_context(|| format!("applying effects to {}", input.display()))?,
        Commands::Preview {
            input,
            output,
            effects,
            duration,
        } => commands::preview(processor, &input, &output, &effects, duration)
            .with_context(|| format!("previewing {}", input.display()))?,
        Commands::Enhance {
            input,
            output,
            format,
        } => commands::enhance(processor, &input, &output, format.as_deref())
            .with_context(|| format!("enhancing {}", input.display()))?,
        Commands::Info { input } => commands::info(processor, &input)
            .with_context(|| format!("reading {}", input.display()))?,
        Commands::Presets => commands::list_presets(processor)?,
        Commands::Formats => commands::list_formats(processor)?,
        Commands::Batch {
            input_dir,
            output_dir,
            effects,
            format,
            recursive,
        } => {
            let summary = commands::batch(
                processor,
                &input_dir,
                &output_dir,
                &effects,
                format.as_deref(),
                recursive,
            )?;
            if summary.failed > 0 {
                anyhow::bail!("{} file(s) failed", summary.failed);
            }
        }
    }
    Ok(())
}
