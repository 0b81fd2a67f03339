use crate::config::StoreConfig;
use crate::error::{KinesisError, KinesisResult};
use crate::index::{FlatIndex, Index};
use crate::storage::document_file::{self, DocumentMap};
use crate::storage::{index_file, with_suffix, DOCUMENTS_FILE_SUFFIX, INDEX_FILE_SUFFIX};
use crate::vector::{as_batch, as_query, Document};

use ndarray::{ArrayView1, ArrayView2, ArrayViewD};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Number of neighbours returned when callers have no preference.
pub const DEFAULT_SEARCH_K: usize = 5;

/// A single search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Squared Euclidean distance to the query.
    pub distance: f32,
    /// Insertion position of the stored vector.
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
}

/// Append-only similarity store: an exact L2 index plus a position-keyed document map.
///
/// A freshly constructed store has no index at all; the first `create_index` or
/// `add_vectors` call creates one. Positions are insertion order and are never
/// reused. The store is not thread-safe; mutation takes `&mut self`.
#[derive(Debug)]
pub struct SimilarityStore {
    config: StoreConfig,
    index: Option<FlatIndex>,
    documents: DocumentMap,
}

impl SimilarityStore {
    /// Creates an empty store for vectors of `config.dimension` components.
    pub fn new(config: StoreConfig) -> KinesisResult<Self> {
        config.validate()?;
        debug!(dimension = config.dimension, "Creating similarity store");
        Ok(SimilarityStore {
            config,
            index: None,
            documents: DocumentMap::new(),
        })
    }

    pub fn with_dimension(dimension: usize) -> KinesisResult<Self> {
        Self::new(StoreConfig::new(dimension))
    }

    /// Opens a saved store, adopting the dimension recorded in `<path>.idx`.
    pub fn open(path: impl AsRef<Path>) -> KinesisResult<Self> {
        let index_path = with_suffix(path.as_ref(), INDEX_FILE_SUFFIX);
        let contents = index_file::read(&index_path)?;
        let mut store = Self::new(StoreConfig::new(contents.dimension))?;
        store.load(path)?;
        Ok(store)
    }

    pub fn config(&self) -> StoreConfig {
        self.config
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Whether an index exists. A store whose index holds zero vectors is still initialized.
    pub fn is_initialized(&self) -> bool {
        self.index.is_some()
    }

    /// Total vector count, 0 when uninitialized.
    pub fn len(&self) -> usize {
        self.index.as_ref().map_or(0, |index| index.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Replaces the index and document map with `embeddings` and `documents`.
    ///
    /// Row `i` is associated with `documents[i]`. When documents are given there
    /// must be exactly one per row. Nothing is modified if validation fails.
    pub fn create_index(
        &mut self,
        embeddings: ArrayView2<f32>,
        documents: Option<Vec<Document>>,
    ) -> KinesisResult<()> {
        self.check_batch(embeddings, documents.as_deref())?;

        let mut index = FlatIndex::new(self.config.dimension)?;
        index.add(embeddings)?;
        self.index = Some(index);
        self.documents.clear();
        if let Some(documents) = documents {
            self.documents.extend(documents.into_iter().enumerate());
        }
        info!(vectors = embeddings.nrows(), documents = self.documents.len(), "Created index");
        Ok(())
    }

    /// Appends `embeddings` to the index, creating it if none exists yet.
    ///
    /// New documents are keyed by the position their vector receives.
    pub fn add_vectors(
        &mut self,
        embeddings: ArrayView2<f32>,
        documents: Option<Vec<Document>>,
    ) -> KinesisResult<()> {
        if self.index.is_none() {
            return self.create_index(embeddings, documents);
        }
        self.check_batch(embeddings, documents.as_deref())?;

        let index = self.index.as_mut().ok_or(KinesisError::NotInitialized)?;
        let first_position = index.len();
        index.add(embeddings)?;
        if let Some(documents) = documents {
            self.documents
                .extend(documents.into_iter().enumerate().map(|(i, doc)| (first_position + i, doc)));
        }
        debug!(added = embeddings.nrows(), total = index.len(), "Appended vectors");
        Ok(())
    }

    /// Returns up to `k` stored vectors closest to `query`, ascending by squared L2 distance.
    ///
    /// Equal distances are ordered by ascending position.
    pub fn search(&self, query: ArrayView1<f32>, k: usize) -> KinesisResult<Vec<SearchHit>> {
        let index = self.index.as_ref().ok_or(KinesisError::NotInitialized)?;
        let neighbors = index.search(query, k)?;
        Ok(neighbors
            .into_iter()
            .map(|n| SearchHit {
                distance: n.distance,
                index: n.position,
                document: self.documents.get(&n.position).cloned(),
            })
            .collect())
    }

    /// Like [`create_index`](Self::create_index) for an array of unknown rank.
    ///
    /// Anything other than an `(n, dimension)` array is `ShapeMismatch`.
    pub fn create_index_array(
        &mut self,
        embeddings: ArrayViewD<f32>,
        documents: Option<Vec<Document>>,
    ) -> KinesisResult<()> {
        let batch = as_batch(embeddings, self.config.dimension)?;
        self.create_index(batch, documents)
    }

    pub fn add_vectors_array(
        &mut self,
        embeddings: ArrayViewD<f32>,
        documents: Option<Vec<Document>>,
    ) -> KinesisResult<()> {
        let batch = as_batch(embeddings, self.config.dimension)?;
        self.add_vectors(batch, documents)
    }

    /// Searches with a query of unknown rank: a 1-D vector or a single-row matrix.
    pub fn search_array(&self, query: ArrayViewD<f32>, k: usize) -> KinesisResult<Vec<SearchHit>> {
        if !self.is_initialized() {
            return Err(KinesisError::NotInitialized);
        }
        let query = as_query(query, self.config.dimension)?;
        self.search(query, k)
    }

    /// Searches every row of `queries`, returning one hit list per row.
    pub fn search_batch(&self, queries: ArrayView2<f32>, k: usize) -> KinesisResult<Vec<Vec<SearchHit>>> {
        if !self.is_initialized() {
            return Err(KinesisError::NotInitialized);
        }
        if queries.ncols() != self.config.dimension {
            return Err(KinesisError::ShapeMismatch {
                expected: self.config.dimension,
                actual: queries.shape().to_vec(),
            });
        }
        queries.rows().into_iter().map(|row| self.search(row, k)).collect()
    }

    pub fn get_document(&self, position: usize) -> Option<&Document> {
        self.documents.get(&position)
    }

    pub fn get_vector(&self, position: usize) -> Option<ArrayView1<'_, f32>> {
        self.index.as_ref().and_then(|index| index.vector(position))
    }

    /// Writes `<path>.idx` and `<path>.docs`, creating parent directories and
    /// replacing any existing files.
    pub fn save(&self, path: impl AsRef<Path>) -> KinesisResult<()> {
        let index = self.index.as_ref().ok_or(KinesisError::NotInitialized)?;
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| KinesisError::io(parent, e))?;
        }

        let index_path = with_suffix(path, INDEX_FILE_SUFFIX);
        index_file::write(&index_path, index.dimensions(), index.as_slice(), self.config.sync_on_save)?;
        let documents_path = with_suffix(path, DOCUMENTS_FILE_SUFFIX);
        document_file::write(&documents_path, &self.documents, self.config.sync_on_save)?;

        info!(path = ?path, vectors = index.len(), documents = self.documents.len(), "Saved similarity store");
        Ok(())
    }

    /// Replaces the in-memory state with the store saved at `path`.
    ///
    /// The document map is always reset: a missing `<path>.docs` yields an index
    /// without documents. On error the current state is left untouched.
    pub fn load(&mut self, path: impl AsRef<Path>) -> KinesisResult<()> {
        let path = path.as_ref();
        let index_path = with_suffix(path, INDEX_FILE_SUFFIX);
        let contents = index_file::read(&index_path)?;
        if contents.dimension != self.config.dimension {
            return Err(KinesisError::IncompatibleIndex {
                expected: self.config.dimension,
                actual: contents.dimension,
            });
        }
        let index = FlatIndex::from_parts(contents.dimension, contents.data)?;

        let documents_path = with_suffix(path, DOCUMENTS_FILE_SUFFIX);
        let documents = match document_file::read_if_exists(&documents_path)? {
            Some(documents) => documents,
            None => {
                warn!(path = ?documents_path, "Document map not found, loading index without documents");
                DocumentMap::new()
            }
        };
        if let Some((&last, _)) = documents.iter().next_back() {
            if last >= index.len() {
                warn!(position = last, vectors = index.len(), "Document map references positions beyond the index");
            }
        }

        info!(path = ?path, vectors = index.len(), documents = documents.len(), "Loaded similarity store");
        self.index = Some(index);
        self.documents = documents;
        Ok(())
    }

    fn check_batch(&self, embeddings: ArrayView2<f32>, documents: Option<&[Document]>) -> KinesisResult<()> {
        Self::check_batch_shape(self.config.dimension, embeddings, documents)
    }

    fn check_batch_shape(
        dimension: usize,
        embeddings: ArrayView2<f32>,
        documents: Option<&[Document]>,
    ) -> KinesisResult<()> {
        if embeddings.ncols() != dimension {
            return Err(KinesisError::ShapeMismatch {
                expected: dimension,
                actual: embeddings.shape().to_vec(),
            });
        }
        if let Some(documents) = documents {
            if documents.len() != embeddings.nrows() {
                return Err(KinesisError::DocumentCountMismatch {
                    vectors: embeddings.nrows(),
                    documents: documents.len(),
                });
            }
        }
        Ok(())
    }
}
