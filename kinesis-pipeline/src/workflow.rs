//! The fixed sequence of prompt stages that turns a motion capture into a plan.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::motion::MotionCapture;
use crate::prompts;
use crate::providers::{PromptTemplate, TextGenerator};

pub const SUMMARY_REPORT_FILE: &str = "exercise_summary.md";
pub const IMPLEMENTATION_REPORT_FILE: &str = "game_implementation.md";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    AnalyzeData,
    SuggestExercises,
    DesignGame,
    PlanRoutine,
    WriteSummary,
    WriteImplementation,
}

impl Stage {
    /// Execution order.
    pub const ALL: [Stage; 6] = [
        Stage::AnalyzeData,
        Stage::SuggestExercises,
        Stage::DesignGame,
        Stage::PlanRoutine,
        Stage::WriteSummary,
        Stage::WriteImplementation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::AnalyzeData => "analyze_data",
            Stage::SuggestExercises => "suggest_exercises",
            Stage::DesignGame => "design_game",
            Stage::PlanRoutine => "plan_routine",
            Stage::WriteSummary => "write_summary",
            Stage::WriteImplementation => "write_implementation",
        }
    }

    pub fn template(&self) -> PromptTemplate {
        PromptTemplate::new(match self {
            Stage::AnalyzeData => prompts::DATA_ANALYST,
            Stage::SuggestExercises => prompts::PHYSIOTHERAPIST,
            Stage::DesignGame => prompts::GAME_DESIGNER,
            Stage::PlanRoutine => prompts::ROUTINE_PLANNER,
            Stage::WriteSummary => prompts::REPORT_WRITER,
            Stage::WriteImplementation => prompts::IMPLEMENTATION_WRITER,
        })
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Text produced by every stage of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanOutput {
    pub analysis: String,
    pub exercise_suggestions: String,
    pub game_design: String,
    pub exercise_routine: String,
    pub exercise_summary: String,
    pub game_implementation: String,
}

impl PlanOutput {
    /// Variables available to prompts once the stages before them have run.
    fn variables<'a>(&'a self, motion_data: &'a str) -> HashMap<&'static str, &'a str> {
        HashMap::from([
            ("motion_data", motion_data),
            ("analysis", self.analysis.as_str()),
            ("exercise_suggestions", self.exercise_suggestions.as_str()),
            ("game_design", self.game_design.as_str()),
            ("exercise_routine", self.exercise_routine.as_str()),
        ])
    }

    fn slot(&mut self, stage: Stage) -> &mut String {
        match stage {
            Stage::AnalyzeData => &mut self.analysis,
            Stage::SuggestExercises => &mut self.exercise_suggestions,
            Stage::DesignGame => &mut self.game_design,
            Stage::PlanRoutine => &mut self.exercise_routine,
            Stage::WriteSummary => &mut self.exercise_summary,
            Stage::WriteImplementation => &mut self.game_implementation,
        }
    }

    /// Writes `exercise_summary.md` and `game_implementation.md` into `dir`.
    pub fn write_reports(&self, dir: &Path) -> PipelineResult<Vec<PathBuf>> {
        fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
        let mut written = Vec::with_capacity(2);
        for (file_name, body) in [
            (SUMMARY_REPORT_FILE, &self.exercise_summary),
            (IMPLEMENTATION_REPORT_FILE, &self.game_implementation),
        ] {
            let path = dir.join(file_name);
            fs::write(&path, body).map_err(|e| PipelineError::io(&path, e))?;
            written.push(path);
        }
        info!(dir = ?dir, "Wrote plan reports");
        Ok(written)
    }
}

/// Runs the stages in order against a text generator.
pub struct Workflow<'a> {
    generator: &'a dyn TextGenerator,
    sample_stride: usize,
}

impl<'a> Workflow<'a> {
    pub fn new(generator: &'a dyn TextGenerator, sample_stride: usize) -> Self {
        Workflow { generator, sample_stride }
    }

    /// Downsamples the capture and runs every stage on it.
    pub async fn process_motion(&self, capture: &MotionCapture) -> PipelineResult<PlanOutput> {
        let reduced = capture.downsample(self.sample_stride)?;
        info!(
            samples = capture.sample_count(),
            kept = reduced.sample_count(),
            stride = self.sample_stride,
            "Prepared motion data"
        );
        self.run(&reduced.to_prompt_json()?).await
    }

    /// Runs every stage on already serialised motion data.
    ///
    /// A failing stage stops the run; later stages are not attempted.
    pub async fn run(&self, motion_data: &str) -> PipelineResult<PlanOutput> {
        let mut output = PlanOutput::default();
        for stage in Stage::ALL {
            let text = self
                .run_stage(stage, &output, motion_data)
                .await
                .map_err(|e| {
                    warn!(stage = %stage, error = %e, "Stage failed, halting workflow");
                    PipelineError::Stage { stage, source: Box::new(e) }
                })?;
            *output.slot(stage) = text;
        }
        Ok(output)
    }

    async fn run_stage(&self, stage: Stage, output: &PlanOutput, motion_data: &str) -> PipelineResult<String> {
        let prompt = stage.template().render(&output.variables(motion_data))?;
        info!(stage = %stage, prompt_len = prompt.len(), "Running stage");
        self.generator.generate(&prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_and_names() {
        let names: Vec<&str> = Stage::ALL.iter().map(Stage::name).collect();
        assert_eq!(
            names,
            vec!["analyze_data", "suggest_exercises", "design_game", "plan_routine", "write_summary", "write_implementation"]
        );
    }

    #[test]
    fn test_stage_templates_only_use_earlier_outputs() {
        let mut available = vec!["motion_data"];
        let produced = ["analysis", "exercise_suggestions", "game_design", "exercise_routine", "exercise_summary", "game_implementation"];
        for (stage, output_name) in Stage::ALL.iter().zip(produced) {
            for variable in stage.template().variables() {
                assert!(available.iter().any(|a| *a == variable), "{} uses {} before it exists", stage, variable);
            }
            available.push(output_name);
        }
    }

    #[test]
    fn test_write_reports() {
        let dir = tempfile::tempdir().unwrap();
        let output = PlanOutput {
            exercise_summary: "# Summary".to_string(),
            game_implementation: "# Implementation".to_string(),
            ..Default::default()
        };
        let written = output.write_reports(&dir.path().join("reports")).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(fs::read_to_string(dir.path().join("reports").join(SUMMARY_REPORT_FILE)).unwrap(), "# Summary");
        assert_eq!(
            fs::read_to_string(dir.path().join("reports").join(IMPLEMENTATION_REPORT_FILE)).unwrap(),
            "# Implementation"
        );
    }
}
