use serde::{Serialize, Deserialize};
use crate::error::{KinesisResult, KinesisError};

/// Embedding width produced by the hosted text-embedding model the pipeline was built around.
pub const DEFAULT_DIMENSION: usize = 1536;

/// Configuration parameters for a similarity store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Number of components every stored and queried vector must have.
    pub dimension: usize,
    /// Whether `save` calls `sync_all` on both artifacts before renaming them into place.
    pub sync_on_save: bool,
}

impl StoreConfig {
    /// Creates a configuration for vectors of `dimension` components.
    pub fn new(dimension: usize) -> Self {
        StoreConfig {
            dimension,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> KinesisResult<()> {
        if self.dimension == 0 {
            return Err(KinesisError::Configuration("dimension must be greater than 0".to_string()));
        }
        if self.dimension > u32::MAX as usize {
            return Err(KinesisError::Configuration(format!(
                "dimension {} does not fit the index file header",
                self.dimension
            )));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            dimension: DEFAULT_DIMENSION,
            sync_on_save: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.dimension, 1536);
        assert!(config.sync_on_save);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let config = StoreConfig::new(0);
        assert!(matches!(config.validate(), Err(KinesisError::Configuration(_))));
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = StoreConfig { dimension: 10, sync_on_save: false };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: StoreConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
