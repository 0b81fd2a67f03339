pub mod config;
pub mod documents;
pub mod error;
pub mod imu;
pub mod ingest;
pub mod motion;
pub mod prompts;
pub mod providers;
pub mod retrieval;
pub mod workflow;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use imu::{ImuSample, ParseMode, ParseReport, FEATURE_DIMENSION};
pub use motion::MotionCapture;
pub use providers::{Embedder, PromptTemplate, TextGenerator};
pub use retrieval::{Analysis, QueryPlanner, RagAgent, Synthesis};
pub use workflow::{PlanOutput, Stage, Workflow};
