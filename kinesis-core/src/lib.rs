pub mod config;
pub mod distance;
pub mod error;
pub mod index;
pub mod storage;
pub mod store;
pub mod vector;

// Re-export key types/traits for easier use
pub use config::{StoreConfig, DEFAULT_DIMENSION};
pub use error::{KinesisError, KinesisResult};
pub use index::{FlatIndex, Index, Neighbor};
pub use store::{SearchHit, SimilarityStore, DEFAULT_SEARCH_K};
pub use vector::{as_batch, as_query, batch_from_rows, Document, Embedding};
