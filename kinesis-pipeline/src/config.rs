//! Pipeline configuration, read from `KINESIS_*` environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use kinesis_core::DEFAULT_DIMENSION;

use crate::error::{PipelineError, PipelineResult};
use crate::imu::ParseMode;

pub const ENV_DATA_PATH: &str = "KINESIS_DATA_PATH";
pub const ENV_STORE_PATH: &str = "KINESIS_STORE_PATH";
pub const ENV_DIMENSION: &str = "KINESIS_DIMENSION";
pub const ENV_SAMPLE_STRIDE: &str = "KINESIS_SAMPLE_STRIDE";
pub const ENV_TOP_K: &str = "KINESIS_TOP_K";
pub const ENV_STRICT_PARSE: &str = "KINESIS_STRICT_PARSE";

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Directory holding the recorded `*.js` IMU files.
    pub data_path: PathBuf,
    /// Base path of the saved store (`<store_path>.idx` / `<store_path>.docs`).
    pub store_path: PathBuf,
    pub dimension: usize,
    /// Keep every n-th sample per hand before prompting.
    pub sample_stride: usize,
    pub top_k: usize,
    pub parse_mode: ParseMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            data_path: PathBuf::from("./imu-data"),
            store_path: PathBuf::from("./vector_store/imu_vectors"),
            dimension: DEFAULT_DIMENSION,
            sample_stride: 10,
            top_k: kinesis_core::DEFAULT_SEARCH_K,
            parse_mode: ParseMode::Lenient,
        }
    }
}

impl PipelineConfig {
    /// Builds a configuration from the process environment, falling back to defaults.
    pub fn from_env() -> PipelineResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> PipelineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            data_path: lookup(ENV_DATA_PATH).map(PathBuf::from).unwrap_or(defaults.data_path),
            store_path: lookup(ENV_STORE_PATH).map(PathBuf::from).unwrap_or(defaults.store_path),
            dimension: parse_var(&lookup, ENV_DIMENSION)?.unwrap_or(defaults.dimension),
            sample_stride: parse_var(&lookup, ENV_SAMPLE_STRIDE)?.unwrap_or(defaults.sample_stride),
            top_k: parse_var(&lookup, ENV_TOP_K)?.unwrap_or(defaults.top_k),
            parse_mode: match parse_var::<bool, _>(&lookup, ENV_STRICT_PARSE)? {
                Some(true) => ParseMode::Strict,
                Some(false) => ParseMode::Lenient,
                None => defaults.parse_mode,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.dimension == 0 {
            return Err(PipelineError::Configuration(format!("{} must be greater than 0", ENV_DIMENSION)));
        }
        if self.sample_stride == 0 {
            return Err(PipelineError::Configuration(format!("{} must be greater than 0", ENV_SAMPLE_STRIDE)));
        }
        if self.top_k == 0 {
            return Err(PipelineError::Configuration(format!("{} must be greater than 0", ENV_TOP_K)));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> PipelineResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| PipelineError::Configuration(format!("invalid value {:?} for {}: {}", raw, key, e))),
    }
}
