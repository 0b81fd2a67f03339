//! Persistence for the similarity store: a checksummed binary index file and a JSON document map.

pub mod document_file;
pub mod index_file;

use crate::error::{KinesisError, KinesisResult};
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub(crate) const INDEX_FILE_SUFFIX: &str = ".idx";
pub(crate) const DOCUMENTS_FILE_SUFFIX: &str = ".docs";
const TEMP_FILE_SUFFIX: &str = ".tmp";

/// Appends `suffix` to the final path component, so `data/imu` becomes `data/imu.idx`.
pub(crate) fn with_suffix(base_path: &Path, suffix: &str) -> PathBuf {
    let mut file_name: OsString = base_path.file_name().unwrap_or_default().to_os_string();
    file_name.push(suffix);
    base_path.with_file_name(file_name)
}

/// Writes `bytes` to a temporary sibling of `path` and renames it over `path`.
///
/// A crash mid-write leaves the previous artifact untouched. On error the
/// temporary file is removed.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8], sync: bool) -> KinesisResult<()> {
    let temp_path = with_suffix(path, TEMP_FILE_SUFFIX);
    let result = write_and_rename(&temp_path, path, bytes, sync);
    if result.is_err() && temp_path.exists() {
        if let Err(e) = fs::remove_file(&temp_path) {
            warn!(path = ?temp_path, error = %e, "Failed to remove temporary artifact");
        }
    }
    result?;
    debug!(path = ?path, bytes = bytes.len(), "Wrote artifact");
    Ok(())
}

fn write_and_rename(temp_path: &Path, path: &Path, bytes: &[u8], sync: bool) -> KinesisResult<()> {
    let mut file = fs::File::create(temp_path).map_err(|e| KinesisError::io(temp_path, e))?;
    file.write_all(bytes).map_err(|e| KinesisError::io(temp_path, e))?;
    if sync {
        file.sync_all().map_err(|e| KinesisError::io(temp_path, e))?;
    }
    drop(file);
    fs::rename(temp_path, path).map_err(|e| KinesisError::io(temp_path, e))
}
