//! Integration Tests
//!
//! End-to-end tests for the effects pipeline.

use approx::assert_relative_eq;
use pretty_assertions::assert_eq;

use voicefx::dsp::{Echo, Effect, Normalize, PitchShift, RobotVoice, SpeedChange, TARGET_PEAK};
use voicefx::pipeline::{validate, EchoParams, EffectConfig, PresetCatalog};
use voicefx::{apply_effects, EffectStage, StageOutcome, VoiceFxError, Waveform};

/// Helper to build a two-tone test signal
fn create_voice_like(duration_secs: f32, sample_rate: u32) -> Waveform {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let samples = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            0.4 * (2.0 * std::f32::consts::PI * 180.0 * t).sin()
                + 0.2 * (2.0 * std::f32::consts::PI * 720.0 * t).sin()
        })
        .collect();
    Waveform::new(samples, sample_rate).unwrap()
}

// === Identity Properties ===

#[test]
fn test_identity_settings_return_input() {
    let wave = create_voice_like(0.5, 16000);

    assert_eq!(PitchShift::new(0.0).apply(&wave).unwrap(), wave);
    assert_eq!(SpeedChange::new(1.0).apply(&wave).unwrap(), wave);
    assert_eq!(RobotVoice::new(0.0).apply(&wave).unwrap(), wave);
}

#[test]
fn test_identity_config_runs_no_stages() {
    let wave = create_voice_like(0.5, 16000);
    let config = EffectConfig::new().with_pitch_shift(0.0).with_speed(1.0);

    let output = apply_effects(&wave, &config);
    assert_eq!(output.waveform, wave);
    assert!(output.report.stages.is_empty());
}

// === Normalize ===

#[test]
fn test_normalize_idempotent() {
    let wave = create_voice_like(0.25, 16000);

    let once = Normalize.apply(&wave).unwrap();
    let twice = Normalize.apply(&once).unwrap();

    assert_eq!(once.peak(), TARGET_PEAK);
    assert_eq!(twice, once);
}

// === Echo ===

#[test]
fn test_echo_scenario_at_22050() {
    let wave = Waveform::sine(440.0, 1.0, 22050).unwrap();
    let echo = Echo::new(0.3, 0.5);

    let output = echo.apply(&wave).unwrap();
    let x = wave.samples();
    let y = output.samples();

    assert_eq!(y.len(), 22050);
    assert_eq!(echo.delay_samples(22050), 6615);
    assert_relative_eq!(y[6615], x[6615] + 0.5 * x[0]);
    assert_eq!(&y[..6615], &x[..6615]);
}

#[test]
fn test_echo_recurrence_holds_everywhere() {
    let wave = create_voice_like(0.5, 8000);
    let output = Echo::new(0.1, 0.7).apply(&wave).unwrap();
    let x = wave.samples();
    let y = output.samples();
    let d = 800;

    for n in d..x.len() {
        assert_relative_eq!(y[n], x[n] + 0.7 * x[n - d], epsilon = 1e-6);
    }
}

// === Presets ===

#[test]
fn test_chipmunk_preset_expansion() {
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
    assert_eq!(
        config.enabled_stages(),
        vec![
            EffectStage::PitchShift,
            EffectStage::SpeedChange,
            EffectStage::Normalize
        ]
    );
}

#[test]
fn test_chipmunk_shortens_audio() {
    let catalog = PresetCatalog::builtin().unwrap();
    let wave = create_voice_like(1.0, 16000);

    let output = apply_effects(&wave, &catalog.config("chipmunk").unwrap());

    assert!(output.report.all_applied());
    assert_eq!(output.waveform.len(), 12308);
    assert_relative_eq!(output.waveform.peak(), TARGET_PEAK, epsilon = 1e-6);
}

#[test]
fn test_every_preset_runs() {
    let catalog = PresetCatalog::builtin().unwrap();
    let wave = create_voice_like(1.0, 16000);

    for preset in catalog.iter() {
        let output = apply_effects(&wave, &preset.config);
        assert!(
            output.report.all_applied(),
            "preset {} skipped stages: {:?}",
            preset.name,
            output.report.skipped()
        );
        assert!(output.waveform.is_finite());
    }
}

#[test]
fn test_unknown_preset() {
    let catalog = PresetCatalog::builtin().unwrap();
    assert!(matches!(
        catalog.config("kazoo"),
        Err(VoiceFxError::UnknownPreset { .. })
    ));
}

// === Validation ===

#[test]
fn test_pitch_boundary_validation() {
    let err = validate(&EffectConfig::new().with_pitch_shift(13.0)).unwrap_err();
    assert!(matches!(
        err,
        VoiceFxError::ParameterRange {
            field: "pitch_shift_semitones",
            ..
        }
    ));
    assert!(validate(&EffectConfig::new().with_pitch_shift(12.0)).is_ok());
}

#[test]
fn test_disabled_echo_still_validated() {
    let config = EffectConfig {
        echo: Some(EchoParams {
            enabled: false,
            delay_s: 5.0,
            decay: 0.5,
        }),
        ..EffectConfig::default()
    };
    assert!(matches!(
        validate(&config),
        Err(VoiceFxError::ParameterRange {
            field: "echo.delay_s",
            ..
        })
    ));
}

// === Stage Isolation ===

#[test]
fn test_failed_pitch_shift_is_skipped() {
    // Less than one hop of signal
    let wave = Waveform::sine(220.0, 0.04, 8000).unwrap();
    let config = EffectConfig::new()
        .with_pitch_shift(5.0)
        .with_echo(0.01, 0.5)
        .with_reverb(0.5, 0.5)
        .with_normalize(true);

    let output = apply_effects(&wave, &config);

    assert_eq!(output.report.applied(), vec!["echo", "reverb", "normalize"]);
    let skipped = output.report.skipped();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].0, "pitch_shift");
    assert!(matches!(
        output.report.outcome(EffectStage::PitchShift),
        Some(StageOutcome::Skipped { .. })
    ));

    assert_eq!(output.waveform.len(), wave.len());
    assert_relative_eq!(output.waveform.peak(), TARGET_PEAK, epsilon = 1e-6);
}

#[test]
fn test_all_stages_skipped_returns_input() {
    let wave = Waveform::sine(220.0, 0.04, 8000).unwrap();
    let config = EffectConfig::new().with_pitch_shift(3.0).with_speed(2.0);

    let output = apply_effects(&wave, &config);

    assert!(output.report.applied().is_empty());
    assert_eq!(output.report.skipped().len(), 2);
    assert_eq!(output.waveform, wave);
}

#[test]
fn test_short_clip_keeps_requested_effects() {
    // Under one 2048-sample window but well above the degenerate floor
    let wave = create_voice_like(0.2, 8000);
    let config = EffectConfig::new().with_pitch_shift(4.0).with_speed(1.5);

    let output = apply_effects(&wave, &config);

    assert_eq!(output.report.applied(), vec!["pitch_shift", "speed_change"]);
    assert!(output.report.skipped().is_empty());
    assert_eq!(output.waveform.len(), 1067);
    assert!(output.waveform.is_finite());
}

#[test]
fn test_report_serializes() {
    let wave = create_voice_like(0.5, 16000);
    let output = apply_effects(&wave, &EffectConfig::new().with_robot(0.5));

    let json = serde_json::to_value(&output.report).unwrap();
    let stage = &json["stages"][0];
    assert_eq!(stage["stage"], "robot");
    assert_eq!(stage["status"], "applied");
    assert_eq!(stage["params"]["intensity"], 0.5);
}
