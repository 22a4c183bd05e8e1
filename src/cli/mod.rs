//! CLI Module
//!
//! Command-line interface for the VoiceFX effects pipeline.

pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::pipeline::{EchoParams, EffectConfig, ReverbParams, RobotParams};

/// VoiceFX - voice effects and enhancement for audio files
#[derive(Parser, Debug)]
#[command(name = "voicefx")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply effects to an audio file
    #[command(name = "apply")]
    Apply {
        /// Input audio file
        input: PathBuf,

        /// Output audio file; its extension picks the format unless --format is given
        output: PathBuf,

        #[command(flatten)]
        effects: EffectArgs,

        /// Output format (wav, mp3, ogg, flac)
        #[arg(short, long)]
        format: Option<String>,

        /// Print the stage report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply effects to the first seconds of a file and write WAV
    #[command(name = "preview")]
    Preview {
        /// Input audio file
        input: PathBuf,

        /// Output WAV file
        output: PathBuf,

        #[command(flatten)]
        effects: EffectArgs,

        /// Seconds to keep (5-60)
        #[arg(short, long)]
        duration: Option<f64>,
    },

    /// Run noise reduction, compression and pre-emphasis
    #[command(name = "enhance")]
    Enhance {
        /// Input audio file
        input: PathBuf,

        /// Output audio file
        output: PathBuf,

        /// Output format (wav, mp3, ogg, flac)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Show metadata and validation checks for an audio file
    #[command(name = "info")]
    Info {
        /// Input audio file
        input: PathBuf,
    },

    /// List the built-in presets
    #[command(name = "presets")]
    Presets,

    /// List supported formats and available codec engines
    #[command(name = "formats")]
    Formats,

    /// Apply effects to every audio file in a directory
    #[command(name = "batch")]
    Batch {
        /// Directory to scan
        input_dir: PathBuf,

        /// Directory for processed files
        output_dir: PathBuf,

        #[command(flatten)]
        effects: EffectArgs,

        /// Output format (wav, mp3, ogg, flac)
        #[arg(short, long)]
        format: Option<String>,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,
    },
}

/// Effect selection shared by the processing commands
#[derive(Args, Debug, Clone, Default)]
pub struct EffectArgs {
    /// Named preset (overrides individual effect flags)
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Effect configuration file (JSON)
    #[arg(long, conflicts_with = "preset")]
    pub effects: Option<PathBuf>,

    /// Pitch shift in semitones (-12 to 12)
    #[arg(long, allow_hyphen_values = true)]
    pub pitch: Option<f32>,

    /// Speed factor (0.25 to 4.0)
    #[arg(long)]
    pub speed: Option<f32>,

    /// Robot voice intensity (0 to 1)
    #[arg(long)]
    pub robot: Option<f32>,

    /// Echo delay in seconds (0.1 to 2.0)
    #[arg(long)]
    pub echo_delay: Option<f32>,

    /// Echo decay (0.1 to 0.9)
    #[arg(long)]
    pub echo_decay: Option<f32>,

    /// Reverb room size (0.1 to 1.0)
    #[arg(long)]
    pub reverb_room: Option<f32>,

    /// Reverb damping (0.1 to 1.0)
    #[arg(long)]
    pub reverb_damping: Option<f32>,

    /// Peak-normalize the result
    #[arg(short, long)]
    pub normalize: bool,
}

impl EffectArgs {
    /// Build a configuration from the individual effect flags
    ///
    /// Giving either echo flag enables echo with the other at its default;
    /// the same holds for reverb.
    pub fn to_config(&self) -> EffectConfig {
        let echo = (self.echo_delay.is_some() || self.echo_decay.is_some()).then(|| {
            let defaults = EchoParams::default();
            EchoParams {
                enabled: true,
                delay_s: self.echo_delay.unwrap_or(defaults.delay_s),
                decay: self.echo_decay.unwrap_or(defaults.decay),
            }
        });

        let reverb = (self.reverb_room.is_some() || self.reverb_damping.is_some()).then(|| {
            let defaults = ReverbParams::default();
            ReverbParams {
                enabled: true,
                room_size: self.reverb_room.unwrap_or(defaults.room_size),
                damping: self.reverb_damping.unwrap_or(defaults.damping),
            }
        });

        EffectConfig {
            pitch_shift_semitones: self.pitch,
            speed_factor: self.speed,
            robot: self.robot.map(|intensity| RobotParams {
                enabled: true,
                intensity,
            }),
            echo,
            reverb,
            normalize: self.normalize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_effect_flags_to_config() {
        let cli = Cli::parse_from([
            "voicefx", "apply", "in.wav", "out.wav", "--pitch", "-3", "--echo-delay", "0.4",
            "--normalize",
        ]);
        let Some(Commands::Apply { effects, .. }) = cli.command else {
            panic!("expected apply command");
        };

        let config = effects.to_config();
        assert_eq!(config.pitch_shift_semitones, Some(-3.0));
        assert_eq!(
            config.echo,
            Some(EchoParams {
                enabled: true,
                delay_s: 0.4,
                decay: 0.5,
            })
        );
        assert!(config.reverb.is_none());
        assert!(config.normalize);
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["voicefx", "presets", "--verbose", "--config", "fx.json"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("fx.json")));
    }
}
