//! Reader for recorded controller IMU files.
//!
//! Recordings are JavaScript literals of the form
//!
//! ```text
//! data=[
//! {"pos":{"pitch":1.2,"roll":0.4,"yaw":88.0},"gyro":{"x":0.1,"y":0.0,"z":-0.2},"compass":{"x":12,"y":-3,"z":40},"temp":31.5}
//! ,{"pos":...}
//! ]
//! ```
//!
//! with one JSON record per line. Lines that fail to parse are either reported
//! and skipped (`ParseMode::Lenient`) or abort the read (`ParseMode::Strict`).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{PipelineError, PipelineResult};

/// Number of numeric fields in a sample, see [`ImuSample::features`].
pub const FEATURE_DIMENSION: usize = 10;

const SOURCE_EXTENSION: &str = "js";

/// Controller orientation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

/// A three-axis reading (gyroscope or compass).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axes {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One IMU reading from a hand controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImuSample {
    pub pos: Orientation,
    pub gyro: Axes,
    pub compass: Axes,
    pub temp: f64,
}

impl ImuSample {
    /// Flattens the sample into `[pitch, roll, yaw, gyro x/y/z, compass x/y/z, temp]`.
    pub fn features(&self) -> [f32; FEATURE_DIMENSION] {
        [
            self.pos.pitch as f32,
            self.pos.roll as f32,
            self.pos.yaw as f32,
            self.gyro.x as f32,
            self.gyro.y as f32,
            self.gyro.z as f32,
            self.compass.x as f32,
            self.compass.y as f32,
            self.compass.z as f32,
            self.temp as f32,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// Skip malformed lines and record them in the report.
    #[default]
    Lenient,
    /// Fail on the first malformed line.
    Strict,
}

/// A line that could not be parsed as a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLine {
    pub source: Option<PathBuf>,
    /// 1-based line number within the source text.
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport {
    pub samples: Vec<ImuSample>,
    pub skipped: Vec<SkippedLine>,
}

impl ParseReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    fn merge(&mut self, other: ParseReport) {
        self.samples.extend(other.samples);
        self.skipped.extend(other.skipped);
    }
}

/// Parses the text of one recording.
pub fn parse_samples(content: &str, mode: ParseMode) -> PipelineResult<ParseReport> {
    let start = content.find('[');
    let end = content.rfind(']');
    let (start, end) = match (start, end) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => return Err(PipelineError::MalformedSource("could not find a [...] array".to_string())),
    };

    // Line number of the opening bracket; body line i sits on first_line + i.
    let first_line = content[..start].matches('\n').count() + 1;
    let mut report = ParseReport::default();

    for (offset, raw) in content[start + 1..end].split('\n').enumerate() {
        let line = strip_separators(raw);
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<ImuSample>(line) {
            Ok(sample) => report.samples.push(sample),
            Err(e) => {
                let line_number = first_line + offset;
                if mode == ParseMode::Strict {
                    return Err(PipelineError::MalformedLine { line: line_number, reason: e.to_string() });
                }
                debug!(line = line_number, error = %e, "Skipping malformed IMU record");
                report.skipped.push(SkippedLine { source: None, line: line_number, reason: e.to_string() });
            }
        }
    }
    Ok(report)
}

fn strip_separators(raw: &str) -> &str {
    let mut line = raw.trim();
    if let Some(rest) = line.strip_prefix(',') {
        line = rest.trim_start();
    }
    if let Some(rest) = line.strip_suffix(',') {
        line = rest.trim_end();
    }
    line
}

/// Reads and parses a single recording file.
pub fn load_file(path: &Path, mode: ParseMode) -> PipelineResult<ParseReport> {
    let content = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    let mut report = parse_samples(&content, mode)?;
    for skipped in &mut report.skipped {
        skipped.source = Some(path.to_path_buf());
    }
    if report.skipped_count() > 0 {
        warn!(path = ?path, skipped = report.skipped_count(), parsed = report.samples.len(), "Skipped malformed IMU records");
    }
    debug!(path = ?path, samples = report.samples.len(), "Loaded IMU recording");
    Ok(report)
}

/// Reads every `*.js` recording in `dir`, in file name order.
pub fn load_directory(dir: &Path, mode: ParseMode) -> PipelineResult<ParseReport> {
    let entries = fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| PipelineError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut report = ParseReport::default();
    for path in &paths {
        report.merge(load_file(path, mode)?);
    }
    info!(dir = ?dir, files = paths.len(), samples = report.samples.len(), skipped = report.skipped_count(), "Loaded IMU directory");
    Ok(report)
}
