//! Per-stage outcomes
//!
//! Every stage the pipeline attempts leaves one [`StageReport`], so callers
//! can see which effects actually reached the output.

use serde::Serialize;
use serde_json::Value;

use crate::dsp::EffectStage;
use crate::engine::Waveform;

/// Result of attempting one stage
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageOutcome {
    Applied,
    /// The stage failed; its input was passed through unchanged
    Skipped { reason: String },
}

impl StageOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, StageOutcome::Applied)
    }
}

/// Outcome of one stage with the parameters it ran with
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: EffectStage,
    #[serde(flatten)]
    pub outcome: StageOutcome,
    pub params: Value,
    pub elapsed_ms: f64,
}

/// Ordered record of every stage attempted in one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineReport {
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, report: StageReport) {
        self.stages.push(report);
    }

    /// Names of the stages that were applied, in execution order
    pub fn applied(&self) -> Vec<&'static str> {
        self.stages
            .iter()
            .filter(|s| s.outcome.is_applied())
            .map(|s| s.stage.name())
            .collect()
    }

    /// Names and reasons of the stages that were skipped
    pub fn skipped(&self) -> Vec<(&'static str, &str)> {
        self.stages
            .iter()
            .filter_map(|s| match &s.outcome {
                StageOutcome::Skipped { reason } => Some((s.stage.name(), reason.as_str())),
                StageOutcome::Applied => None,
            })
            .collect()
    }

    /// Outcome recorded for `stage`, if it was attempted
    pub fn outcome(&self, stage: EffectStage) -> Option<&StageOutcome> {
        self.stages.iter().find(|s| s.stage == stage).map(|s| &s.outcome)
    }

    /// True if no stage was skipped
    pub fn all_applied(&self) -> bool {
        self.stages.iter().all(|s| s.outcome.is_applied())
    }

    /// Total time spent in stages
    pub fn total_ms(&self) -> f64 {
        self.stages.iter().map(|s| s.elapsed_ms).sum()
    }

    /// Append the stages of a later pass
    pub fn extend(&mut self, other: PipelineReport) {
        self.stages.extend(other.stages);
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        let skipped = self.skipped();
        if skipped.is_empty() {
            format!("applied [{}]", self.applied().join(", "))
        } else {
            let names: Vec<&str> = skipped.iter().map(|(name, _)| *name).collect();
            format!(
                "applied [{}], skipped [{}]",
                self.applied().join(", "),
                names.join(", ")
            )
        }
    }
}

/// Waveform produced by a pipeline run together with its report
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub waveform: Waveform,
    pub report: PipelineReport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stage(stage: EffectStage, outcome: StageOutcome) -> StageReport {
        StageReport {
            stage,
            outcome,
            params: json!({}),
            elapsed_ms: 1.5,
        }
    }

    #[test]
    fn test_applied_and_skipped_lists() {
        let mut report = PipelineReport::new();
        report.record(stage(
            EffectStage::PitchShift,
            StageOutcome::Skipped {
                reason: "too short".to_string(),
            },
        ));
        report.record(stage(EffectStage::Echo, StageOutcome::Applied));
        report.record(stage(EffectStage::Normalize, StageOutcome::Applied));

        assert_eq!(report.applied(), vec!["echo", "normalize"]);
        assert_eq!(report.skipped(), vec![("pitch_shift", "too short")]);
        assert!(!report.all_applied());
        assert_eq!(report.total_ms(), 4.5);
        assert_eq!(
            report.summary(),
            "applied [echo, normalize], skipped [pitch_shift]"
        );
    }

    #[test]
    fn test_serialized_shape() {
        let report = stage(
            EffectStage::Reverb,
            StageOutcome::Skipped {
                reason: "bad".to_string(),
            },
        );
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["stage"], "reverb");
        assert_eq!(value["status"], "skipped");
        assert_eq!(value["reason"], "bad");
    }
}
