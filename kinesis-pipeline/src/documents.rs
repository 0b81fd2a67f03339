use kinesis_core::Document;
use serde_json::{json, Value};

use crate::error::PipelineResult;
use crate::imu::ImuSample;

/// Renders a sample as the text that gets embedded.
pub fn describe_sample(position: usize, sample: &ImuSample) -> String {
    format!(
        "Motion data point {}:\n\
         Position: Pitch={:.2}°, Roll={:.2}°, Yaw={:.2}°\n\
         Gyroscope: X={:.2}, Y={:.2}, Z={:.2}\n\
         Compass: X={:.2}, Y={:.2}, Z={:.2}\n\
         Temperature: {:.2}°C",
        position,
        sample.pos.pitch,
        sample.pos.roll,
        sample.pos.yaw,
        sample.gyro.x,
        sample.gyro.y,
        sample.gyro.z,
        sample.compass.x,
        sample.compass.y,
        sample.compass.z,
        sample.temp,
    )
}

/// Payload stored next to a sample's vector: `{ "raw_data": <sample>, "timestamp": position }`.
pub fn sample_document(position: usize, sample: &ImuSample) -> PipelineResult<Document> {
    let mut document = Document::new();
    document.insert("raw_data".to_string(), serde_json::to_value(sample)?);
    document.insert("timestamp".to_string(), json!(position));
    Ok(document)
}

/// Recovers the sample from a payload built by [`sample_document`].
pub fn sample_from_document(document: &Document) -> Option<ImuSample> {
    document
        .get("raw_data")
        .cloned()
        .and_then(|raw: Value| serde_json::from_value(raw).ok())
}
