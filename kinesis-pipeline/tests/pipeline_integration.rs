use async_trait::async_trait;
use chrono::NaiveDateTime;
use ndarray::arr1;
use std::fs;
use std::sync::Mutex;
use tempfile::tempdir;

use kinesis_core::SimilarityStore;
use kinesis_pipeline::documents::{describe_sample, sample_from_document};
use kinesis_pipeline::imu::{self, Axes, Orientation};
use kinesis_pipeline::ingest::{embedding_store, ingest_features, ingest_samples};
use kinesis_pipeline::retrieval::retrieve;
use kinesis_pipeline::{
    Analysis, Embedder, ImuSample, MotionCapture, ParseMode, PipelineConfig, PipelineError, PipelineResult,
    QueryPlanner, RagAgent, Stage, TextGenerator, Workflow, FEATURE_DIMENSION,
};

const EMBEDDING_DIM: usize = 10;

/// Counts each decimal digit in the text. Identical texts embed identically.
struct DigitCountEmbedder;

#[async_trait]
impl Embedder for DigitCountEmbedder {
    async fn embed(&self, text: &str) -> PipelineResult<Vec<f32>> {
        let mut counts = vec![0.0f32; EMBEDDING_DIM];
        for digit in text.chars().filter_map(|c| c.to_digit(10)) {
            counts[digit as usize] += 1.0;
        }
        Ok(counts)
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// Records every prompt and answers with the scripted reply for that call,
/// or `output <n>` once the script runs out. Optionally fails on call `fail_on`.
struct ScriptedGenerator {
    prompts: Mutex<Vec<String>>,
    replies: Vec<String>,
    fail_on: Option<usize>,
}

impl ScriptedGenerator {
    fn new() -> Self {
        Self::with_replies(&[])
    }

    fn with_replies(replies: &[&str]) -> Self {
        ScriptedGenerator {
            prompts: Mutex::new(Vec::new()),
            replies: replies.iter().map(|r| r.to_string()).collect(),
            fail_on: None,
        }
    }

    fn failing_on(call: usize) -> Self {
        ScriptedGenerator { fail_on: Some(call), ..Self::new() }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> PipelineResult<String> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt.to_string());
        let call = prompts.len();
        if self.fail_on == Some(call) {
            return Err(PipelineError::Provider("model unavailable".to_string()));
        }
        Ok(self.replies.get(call - 1).cloned().unwrap_or_else(|| format!("output {}", call)))
    }
}

fn sample(pitch: f64, roll: f64, gyro_x: f64) -> ImuSample {
    ImuSample {
        pos: Orientation { pitch, roll, yaw: 0.0 },
        gyro: Axes { x: gyro_x, y: 0.0, z: 0.0 },
        compass: Axes { x: 1.0, y: 2.0, z: 3.0 },
        temp: 30.0,
    }
}

fn capture(samples_per_hand: usize) -> MotionCapture {
    let timestamp = NaiveDateTime::parse_from_str("2025-01-14T08:37:04", "%Y-%m-%dT%H:%M:%S").unwrap();
    MotionCapture::new(
        timestamp,
        (0..samples_per_hand).map(|i| sample(i as f64, 0.0, 0.0)).collect(),
        (0..samples_per_hand).map(|i| sample(-(i as f64), 0.0, 0.0)).collect(),
    )
}

#[tokio::test]
async fn test_workflow_runs_stages_in_order_and_threads_outputs() {
    let generator = ScriptedGenerator::new();
    let workflow = Workflow::new(&generator, 1);

    let output = workflow.run("[motion]").await.unwrap();

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), Stage::ALL.len());
    assert!(prompts[0].contains("[motion]"));
    // Suggestions are based on the analysis.
    assert!(prompts[1].contains("output 1"));
    // Game design is based on the suggestions.
    assert!(prompts[2].contains("output 2"));
    // The routine planner sees analysis, suggestions and design.
    assert!(prompts[3].contains("output 1") && prompts[3].contains("output 2") && prompts[3].contains("output 3"));
    // The report writer also sees the routine.
    assert!(prompts[4].contains("output 4"));
    // Implementation guide uses game design and routine.
    assert!(prompts[5].contains("output 3") && prompts[5].contains("output 4"));

    assert_eq!(output.analysis, "output 1");
    assert_eq!(output.exercise_suggestions, "output 2");
    assert_eq!(output.game_design, "output 3");
    assert_eq!(output.exercise_routine, "output 4");
    assert_eq!(output.exercise_summary, "output 5");
    assert_eq!(output.game_implementation, "output 6");
}

#[tokio::test]
async fn test_workflow_halts_on_failing_stage() {
    let generator = ScriptedGenerator::failing_on(3);
    let workflow = Workflow::new(&generator, 1);

    let err = workflow.run("[motion]").await.unwrap_err();
    match err {
        PipelineError::Stage { stage, source } => {
            assert_eq!(stage, Stage::DesignGame);
            assert!(matches!(*source, PipelineError::Provider(_)));
        }
        other => panic!("Expected Stage error, got {:?}", other),
    }
    assert_eq!(generator.prompts().len(), 3, "later stages must not run");
}

#[tokio::test]
async fn test_process_motion_downsamples_before_prompting() {
    let generator = ScriptedGenerator::new();
    let workflow = Workflow::new(&generator, 10);
    let capture = capture(25);

    workflow.process_motion(&capture).await.unwrap();

    let reduced = capture.downsample(10).unwrap();
    assert_eq!(reduced.left_hand.len(), 3);
    let first_prompt = &generator.prompts()[0];
    assert!(first_prompt.contains(&reduced.to_prompt_json().unwrap()));
    assert!(!first_prompt.contains(&capture.to_prompt_json().unwrap()));
}

#[tokio::test]
async fn test_process_motion_rejects_zero_stride() {
    let generator = ScriptedGenerator::new();
    let workflow = Workflow::new(&generator, 0);

    let result = workflow.process_motion(&capture(5)).await;
    assert!(matches!(result, Err(PipelineError::InvalidArgument(_))));
    assert!(generator.prompts().is_empty());
}

#[tokio::test]
async fn test_ingest_then_retrieve_exact_description() {
    let embedder = DigitCountEmbedder;
    let mut store = SimilarityStore::with_dimension(EMBEDDING_DIM).unwrap();
    let samples = vec![sample(10.0, 1.0, 0.5), sample(-45.0, 3.0, 2.0), sample(88.5, -7.0, 9.0)];

    let added = ingest_samples(&mut store, &samples, &embedder).await.unwrap();
    assert_eq!(added, 3);
    assert_eq!(store.len(), 3);
    assert_eq!(store.document_count(), 3);

    let query = describe_sample(1, &samples[1]);
    let hits = retrieve(&store, &embedder, &query, 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].index, 1);
    assert_eq!(hits[0].distance, 0.0);
    let document = hits[0].document.as_ref().unwrap();
    assert_eq!(sample_from_document(document), Some(samples[1]));
}

#[tokio::test]
async fn test_ingest_samples_rejects_embedder_of_wrong_width() {
    let embedder = DigitCountEmbedder;
    let mut store = SimilarityStore::with_dimension(EMBEDDING_DIM + 1).unwrap();

    let result = ingest_samples(&mut store, &[sample(0.0, 0.0, 0.0)], &embedder).await;
    assert!(matches!(result, Err(PipelineError::Store(_))));
    assert!(!store.is_initialized());
}

#[tokio::test]
async fn test_rag_agent_grounds_answer_in_context() {
    let embedder = DigitCountEmbedder;
    let generator = ScriptedGenerator::new();
    let mut store = SimilarityStore::with_dimension(EMBEDDING_DIM).unwrap();
    ingest_samples(&mut store, &[sample(12.0, 0.0, 0.25), sample(-30.0, 5.0, 1.5)], &embedder)
        .await
        .unwrap();

    let agent = RagAgent::new(&store, &embedder, &generator, 1);
    let analysis = agent.answer("Is the left hand drifting?").await.unwrap();

    assert_eq!(analysis.analysis, "output 1");
    assert!(analysis.source_data.starts_with("Motion Pattern 1:\n"));
    assert!(!analysis.source_data.contains("Motion Pattern 2"));
    let prompt = &generator.prompts()[0];
    assert!(prompt.contains(&analysis.source_data));
    assert!(prompt.contains("Is the left hand drifting?"));
}

const PLANNER_REPLY: &str = "- **Main Query**: How do both hands move?
- **Sub-Queries**:
  1. [What is the pitch range of the left hand?]
  2. [How fast does the right hand rotate?]
- **Additional Notes**: none";

#[tokio::test]
async fn test_query_planner_extracts_sub_queries() {
    let generator = ScriptedGenerator::with_replies(&[PLANNER_REPLY]);
    let planner = QueryPlanner::new(&generator);

    let sub_queries = planner.decompose("How do both hands move?").await.unwrap();

    assert_eq!(
        sub_queries,
        vec!["What is the pitch range of the left hand?", "How fast does the right hand rotate?"]
    );
    assert!(generator.prompts()[0].contains("How do both hands move?"));
}

#[tokio::test]
async fn test_query_planner_falls_back_to_original_query() {
    let generator = ScriptedGenerator::with_replies(&["I cannot split this."]);
    let planner = QueryPlanner::new(&generator);

    assert_eq!(planner.decompose("Is the motion smooth?").await.unwrap(), vec!["Is the motion smooth?"]);
}

#[tokio::test]
async fn test_query_planner_synthesize_prompt_contains_every_analysis() {
    let generator = ScriptedGenerator::with_replies(&["combined view"]);
    let planner = QueryPlanner::new(&generator);
    let sub_results = vec![
        Analysis { analysis: "left hand peaks at 80 degrees".to_string(), source_data: String::new() },
        Analysis { analysis: "right hand lags by 0.2s".to_string(), source_data: String::new() },
    ];

    let synthesis = planner.synthesize(&sub_results).await.unwrap();

    assert_eq!(synthesis.synthesized_analysis, "combined view");
    assert_eq!(synthesis.sub_results, sub_results);
    let prompt = &generator.prompts()[0];
    assert!(prompt.contains("Analysis 1:\nleft hand peaks at 80 degrees"));
    assert!(prompt.contains("Analysis 2:\nright hand lags by 0.2s"));
}

#[tokio::test]
async fn test_query_planner_synthesize_requires_results() {
    let generator = ScriptedGenerator::new();
    let planner = QueryPlanner::new(&generator);

    assert!(matches!(planner.synthesize(&[]).await, Err(PipelineError::InvalidArgument(_))));
    assert!(generator.prompts().is_empty());
}

#[tokio::test]
async fn test_query_planner_answers_each_sub_query() {
    let embedder = DigitCountEmbedder;
    let mut store = SimilarityStore::with_dimension(EMBEDDING_DIM).unwrap();
    ingest_samples(&mut store, &[sample(12.0, 0.0, 0.25), sample(-30.0, 5.0, 1.5)], &embedder)
        .await
        .unwrap();
    let generator = ScriptedGenerator::with_replies(&[PLANNER_REPLY]);
    let agent = RagAgent::new(&store, &embedder, &generator, 1);
    let planner = QueryPlanner::new(&generator);

    let synthesis = planner.answer(&agent, "How do both hands move?").await.unwrap();

    // Decompose, one answer per sub-query, then the synthesis.
    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 4);
    assert!(prompts[1].contains("What is the pitch range of the left hand?"));
    assert!(prompts[2].contains("How fast does the right hand rotate?"));
    assert_eq!(synthesis.sub_results.len(), 2);
    assert_eq!(synthesis.sub_results[0].analysis, "output 2");
    assert_eq!(synthesis.sub_results[1].analysis, "output 3");
    assert!(prompts[3].contains("output 2") && prompts[3].contains("output 3"));
    assert_eq!(synthesis.synthesized_analysis, "output 4");
}

#[test]
fn test_embedding_store_uses_configured_dimension() {
    let config = PipelineConfig { dimension: EMBEDDING_DIM, ..PipelineConfig::default() };
    let store = embedding_store(&config, &DigitCountEmbedder).unwrap();
    assert_eq!(store.dimension(), EMBEDDING_DIM);
    assert!(!store.is_initialized());

    let mismatched = PipelineConfig::default();
    assert!(matches!(
        embedding_store(&mismatched, &DigitCountEmbedder),
        Err(PipelineError::Configuration(_))
    ));
}

#[tokio::test]
async fn test_process_motion_from_recorded_files() {
    let data_dir = tempdir().unwrap();
    let record = r#"{"pos":{"pitch":10.0,"roll":0.0,"yaw":0.0},"gyro":{"x":0.0,"y":0.0,"z":0.0},"compass":{"x":0.0,"y":0.0,"z":0.0},"temp":30.0}"#;
    let left = data_dir.path().join("left_updown.js");
    let right = data_dir.path().join("right_updown.js");
    fs::write(&left, format!("data=[\n{}\n]", record)).unwrap();
    fs::write(&right, format!("data=[\n{}\n,{}\n]", record, record)).unwrap();

    let capture = MotionCapture::from_files(&left, &right, ParseMode::Strict).unwrap();
    assert_eq!(capture.sample_count(), 3);

    let generator = ScriptedGenerator::new();
    let output = Workflow::new(&generator, 1).process_motion(&capture).await.unwrap();
    assert_eq!(output.game_implementation, "output 6");
    assert!(generator.prompts()[0].contains("\"pitch\":10.0"));
}

#[tokio::test]
async fn test_retrieve_from_empty_store_is_not_initialized() {
    let embedder = DigitCountEmbedder;
    let store = SimilarityStore::with_dimension(EMBEDDING_DIM).unwrap();

    let result = retrieve(&store, &embedder, "anything", 3).await;
    assert!(matches!(result, Err(PipelineError::Store(kinesis_core::KinesisError::NotInitialized))));
}

#[test]
fn test_directory_index_save_open_round_trip() {
    let data_dir = tempdir().unwrap();
    let first = r#"{"pos":{"pitch":10.0,"roll":0.0,"yaw":0.0},"gyro":{"x":0.0,"y":0.0,"z":0.0},"compass":{"x":0.0,"y":0.0,"z":0.0},"temp":30.0}"#;
    let second = r#"{"pos":{"pitch":50.0,"roll":0.0,"yaw":0.0},"gyro":{"x":1.0,"y":0.0,"z":0.0},"compass":{"x":0.0,"y":0.0,"z":0.0},"temp":30.0}"#;
    let third = r#"{"pos":{"pitch":90.0,"roll":0.0,"yaw":0.0},"gyro":{"x":2.0,"y":0.0,"z":0.0},"compass":{"x":0.0,"y":0.0,"z":0.0},"temp":30.0}"#;
    fs::write(data_dir.path().join("a_left.js"), format!("var data = [\n{}\n,{}\n];\n", first, second)).unwrap();
    fs::write(data_dir.path().join("b_right.js"), format!("var data = [\n{}\nnot json\n];\n", third)).unwrap();
    fs::write(data_dir.path().join("notes.txt"), "ignored").unwrap();

    let report = imu::load_directory(data_dir.path(), ParseMode::Lenient).unwrap();
    assert_eq!(report.samples.len(), 3);
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(report.skipped[0].line, 3);

    let mut store = SimilarityStore::with_dimension(FEATURE_DIMENSION).unwrap();
    ingest_features(&mut store, &report.samples).unwrap();
    let store_dir = tempdir().unwrap();
    let base = store_dir.path().join("vectors").join("imu_vectors");
    store.save(&base).unwrap();

    let reopened = SimilarityStore::open(&base).unwrap();
    assert_eq!(reopened.dimension(), FEATURE_DIMENSION);
    assert_eq!(reopened.len(), 3);
    assert_eq!(reopened.document_count(), 3);

    let query = arr1(&report.samples[2].features());
    let hits = reopened.search(query.view(), 3).unwrap();
    let order: Vec<usize> = hits.iter().map(|h| h.index).collect();
    assert_eq!(order, vec![2, 1, 0]);
    let nearest = sample_from_document(hits[0].document.as_ref().unwrap()).unwrap();
    assert_eq!(nearest.pos.pitch, 90.0);
}

#[test]
fn test_strict_directory_load_fails_on_bad_record() {
    let data_dir = tempdir().unwrap();
    fs::write(data_dir.path().join("bad.js"), "[\n{\"pos\": 1}\n]").unwrap();

    let result = imu::load_directory(data_dir.path(), ParseMode::Strict);
    assert!(matches!(result, Err(PipelineError::MalformedLine { line: 2, .. })));
}
