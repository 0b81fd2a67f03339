//! Loading parsed samples into a similarity store.

use kinesis_core::{batch_from_rows, KinesisError, SimilarityStore};
use tracing::{debug, info};

use crate::config::{PipelineConfig, ENV_DIMENSION};
use crate::documents::{describe_sample, sample_document};
use crate::error::{PipelineError, PipelineResult};
use crate::imu::{ImuSample, FEATURE_DIMENSION};
use crate::providers::Embedder;

/// Creates an empty store sized for `config.dimension`, which must match what `embedder` produces.
pub fn embedding_store(config: &PipelineConfig, embedder: &dyn Embedder) -> PipelineResult<SimilarityStore> {
    if config.dimension != embedder.dimension() {
        return Err(PipelineError::Configuration(format!(
            "{} is {} but the embedder produces {} components",
            ENV_DIMENSION,
            config.dimension,
            embedder.dimension()
        )));
    }
    Ok(SimilarityStore::with_dimension(config.dimension)?)
}

/// Embeds each sample's text description and appends it to `store`.
///
/// Every vector gets a `sample_document` payload keyed by its store position.
/// Returns the number of vectors added.
pub async fn ingest_samples(
    store: &mut SimilarityStore,
    samples: &[ImuSample],
    embedder: &dyn Embedder,
) -> PipelineResult<usize> {
    if samples.is_empty() {
        return Ok(0);
    }
    if embedder.dimension() != store.dimension() {
        return Err(PipelineError::Store(KinesisError::ShapeMismatch {
            expected: store.dimension(),
            actual: vec![embedder.dimension()],
        }));
    }

    let first_position = store.len();
    let mut rows = Vec::with_capacity(samples.len());
    let mut documents = Vec::with_capacity(samples.len());
    for (offset, sample) in samples.iter().enumerate() {
        let position = first_position + offset;
        let text = describe_sample(position, sample);
        rows.push(embedder.embed(&text).await?);
        documents.push(sample_document(position, sample)?);
        debug!(position, "Embedded sample");
    }

    let batch = batch_from_rows(&rows, store.dimension())?;
    store.add_vectors(batch.view(), Some(documents))?;
    info!(added = samples.len(), total = store.len(), "Ingested samples");
    Ok(samples.len())
}

/// Appends the raw numeric features of each sample, without any provider.
///
/// The store must be configured for `FEATURE_DIMENSION` components.
pub fn ingest_features(store: &mut SimilarityStore, samples: &[ImuSample]) -> PipelineResult<usize> {
    if store.dimension() != FEATURE_DIMENSION {
        return Err(PipelineError::Store(KinesisError::ShapeMismatch {
            expected: store.dimension(),
            actual: vec![samples.len(), FEATURE_DIMENSION],
        }));
    }
    if samples.is_empty() {
        return Ok(0);
    }

    let first_position = store.len();
    let rows: Vec<Vec<f32>> = samples.iter().map(|s| s.features().to_vec()).collect();
    let documents = samples
        .iter()
        .enumerate()
        .map(|(offset, sample)| sample_document(first_position + offset, sample))
        .collect::<PipelineResult<Vec<_>>>()?;

    let batch = batch_from_rows(&rows, FEATURE_DIMENSION)?;
    store.add_vectors(batch.view(), Some(documents))?;
    info!(added = samples.len(), total = store.len(), "Ingested sample features");
    Ok(samples.len())
}
