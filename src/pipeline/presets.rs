//! Named effect presets
//!
//! Each preset is validated once when the catalog is built, so a preset
//! configuration can be applied without re-checking it.

use serde::Serialize;

use crate::error::{Result, VoiceFxError};
use crate::pipeline::config::{EffectConfig, DEFAULT_REVERB_DAMPING};
use crate::pipeline::validate::ParameterValidator;

/// A named, pre-validated effect configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preset {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub config: EffectConfig,
}

/// Lookup table of presets
#[derive(Debug, Clone)]
pub struct PresetCatalog {
    presets: Vec<Preset>,
}

impl PresetCatalog {
    /// Build a catalog, validating every preset
    ///
    /// # Errors
    /// * `ParameterRange` - If any preset carries an out-of-range value
    pub fn from_presets(presets: Vec<Preset>) -> Result<Self> {
        let validator = ParameterValidator;
        for preset in &presets {
            validator.check(&preset.config)?;
        }
        Ok(Self { presets })
    }

    /// The built-in voice presets
    pub fn builtin() -> Result<Self> {
        Self::from_presets(builtin_presets())
    }

    /// Find a preset by name (case-insensitive)
    ///
    /// # Errors
    /// * `UnknownPreset` - If no preset has this name
    pub fn get(&self, name: &str) -> Result<&Preset> {
        let wanted = name.trim();
        self.presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| VoiceFxError::UnknownPreset {
                name: name.to_string(),
            })
    }

    /// Expand a preset name into its configuration
    pub fn config(&self, name: &str) -> Result<EffectConfig> {
        self.get(name).map(|p| p.config.clone())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.presets.iter().map(|p| p.name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset {
            name: "chipmunk",
            display_name: "Chipmunk Voice",
            description: "High-pitched, fast voice like a chipmunk",
            config: EffectConfig::new()
                .with_pitch_shift(8.0)
                .with_speed(1.3)
                .with_normalize(true),
        },
        Preset {
            name: "darth_vader",
            display_name: "Deep Dark Voice",
            description: "Low, menacing voice with reverb",
            config: EffectConfig::new()
                .with_pitch_shift(-6.0)
                .with_speed(0.9)
                .with_reverb(0.8, 0.3)
                .with_normalize(true),
        },
        Preset {
            name: "robot",
            display_name: "Robot Voice",
            description: "Metallic, robotic voice effect",
            config: EffectConfig::new()
                .with_robot(0.7)
                .with_pitch_shift(-2.0)
                .with_normalize(true),
        },
        Preset {
            name: "echo_chamber",
            display_name: "Echo Chamber",
            description: "Voice with strong echo effect",
            config: EffectConfig::new()
                .with_echo(0.4, 0.6)
                .with_reverb(0.9, DEFAULT_REVERB_DAMPING)
                .with_normalize(true),
        },
        Preset {
            name: "slow_motion",
            display_name: "Slow Motion",
            description: "Slow, deep voice effect",
            config: EffectConfig::new()
                .with_speed(0.7)
                .with_pitch_shift(-3.0)
                .with_normalize(true),
        },
        Preset {
            name: "helium",
            display_name: "Helium Voice",
            description: "High-pitched helium balloon voice",
            config: EffectConfig::new()
                .with_pitch_shift(6.0)
                .with_speed(1.1)
                .with_normalize(true),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::config::ReverbParams;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = PresetCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), 6);
        assert_eq!(
            catalog.names(),
            vec!["chipmunk", "darth_vader", "robot", "echo_chamber", "slow_motion", "helium"]
        );
    }

    #[test]
    fn test_chipmunk_expansion() {
        let catalog = PresetCatalog::builtin().unwrap();
        let config = catalog.config("chipmunk").unwrap();
        assert_eq!(
            config,
            EffectConfig {
                pitch_shift_semitones: Some(8.0),
                speed_factor: Some(1.3),
                normalize: true,
                ..EffectConfig::default()
            }
        );
    }

    #[test]
    fn test_echo_chamber_uses_default_damping() {
        let catalog = PresetCatalog::builtin().unwrap();
        let config = catalog.config("echo_chamber").unwrap();
        assert_eq!(
            config.reverb,
            Some(ReverbParams {
                enabled: true,
                room_size: 0.9,
                damping: 0.5,
            })
        );
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = PresetCatalog::builtin().unwrap();
        assert_eq!(catalog.get(" Helium ").unwrap().name, "helium");
    }

    #[test]
    fn test_unknown_preset() {
        let catalog = PresetCatalog::builtin().unwrap();
        let err = catalog.get("banshee").unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_PRESET");
    }

    #[test]
    fn test_invalid_preset_rejected_at_construction() {
        let bad = Preset {
            name: "broken",
            display_name: "Broken",
            description: "Out of range",
            config: EffectConfig::new().with_pitch_shift(24.0),
        };
        assert!(PresetCatalog::from_presets(vec![bad]).is_err());
    }
}
