use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{PipelineError, PipelineResult};
use crate::imu::{self, ImuSample, ParseMode};

/// Recordings of both hands taken during one exercise session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionCapture {
    pub timestamp: NaiveDateTime,
    pub left_hand: Vec<ImuSample>,
    pub right_hand: Vec<ImuSample>,
}

impl MotionCapture {
    pub fn new(timestamp: NaiveDateTime, left_hand: Vec<ImuSample>, right_hand: Vec<ImuSample>) -> Self {
        MotionCapture { timestamp, left_hand, right_hand }
    }

    /// Loads one recording per hand, stamped with the current UTC time.
    pub fn from_files(left: &Path, right: &Path, mode: ParseMode) -> PipelineResult<MotionCapture> {
        let left_hand = imu::load_file(left, mode)?.samples;
        let right_hand = imu::load_file(right, mode)?.samples;
        info!(left = left_hand.len(), right = right_hand.len(), "Loaded motion capture");
        Ok(MotionCapture::new(Utc::now().naive_utc(), left_hand, right_hand))
    }

    /// Keeps every `stride`-th sample of each hand, starting with the first.
    pub fn downsample(&self, stride: usize) -> PipelineResult<MotionCapture> {
        if stride == 0 {
            return Err(PipelineError::InvalidArgument("sample stride must be greater than 0".to_string()));
        }
        Ok(MotionCapture {
            timestamp: self.timestamp,
            left_hand: self.left_hand.iter().step_by(stride).copied().collect(),
            right_hand: self.right_hand.iter().step_by(stride).copied().collect(),
        })
    }

    pub fn sample_count(&self) -> usize {
        self.left_hand.len() + self.right_hand.len()
    }

    /// Compact JSON handed to the analysis prompt.
    pub fn to_prompt_json(&self) -> PipelineResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
