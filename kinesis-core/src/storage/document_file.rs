use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

use crate::error::{KinesisError, KinesisResult};
use crate::vector::Document;

/// Position-keyed document map as persisted in `.docs` files.
pub type DocumentMap = BTreeMap<usize, Document>;

pub fn write(path: &Path, documents: &DocumentMap, sync: bool) -> KinesisResult<()> {
    let bytes = serde_json::to_vec(documents)
        .map_err(|e| KinesisError::Serialization(format!("Failed to serialize document map: {}", e)))?;
    super::write_atomically(path, &bytes, sync)
}

/// Reads a document map, returning `Ok(None)` when the file does not exist.
pub fn read_if_exists(path: &Path) -> KinesisResult<Option<DocumentMap>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = ?path, "No document map found");
            return Ok(None);
        }
        Err(e) => return Err(KinesisError::io(path, e)),
    };
    let documents: DocumentMap = serde_json::from_slice(&bytes).map_err(|e| {
        KinesisError::Deserialization(format!("Failed to deserialize document map from {:?}: {}", path, e))
    })?;
    Ok(Some(documents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_nested_documents_survive_write_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("imu.docs");
        let mut documents = DocumentMap::new();
        documents.insert(0, doc(json!({ "raw_data": { "pos": { "pitch": 1.5 } }, "timestamp": 0 })));
        documents.insert(7, doc(json!({ "tags": ["left", "up"] })));

        write(&path, &documents, false).unwrap();
        let loaded = read_if_exists(&path).unwrap().unwrap();
        assert_eq!(loaded, documents);
    }

    #[test]
    fn test_keys_are_positions_in_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keys.docs");
        let mut documents = DocumentMap::new();
        documents.insert(12, doc(json!({ "id": "a" })));
        write(&path, &documents, false).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, r#"{"12":{"id":"a"}}"#);
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempdir().unwrap();
        assert!(read_if_exists(&dir.path().join("absent.docs")).unwrap().is_none());
    }

    #[test]
    fn test_corrupted_file_is_deserialization_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.docs");
        fs::write(&path, "this is not a document map").unwrap();
        assert!(matches!(read_if_exists(&path), Err(KinesisError::Deserialization(_))));
    }
}
