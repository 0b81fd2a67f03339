use byteorder::{ByteOrder, LittleEndian};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{KinesisError, KinesisResult};

const INDEX_FILE_MAGIC: &[u8; 6] = b"KNSIDX";
const CURRENT_VERSION: u16 = 1;

/// Magic (6) + version (2) + dimension (4) + vector count (8).
const HEADER_LEN: usize = 20;
/// Trailing CRC32-C over header and vector data.
const CRC_LEN: usize = 4;

/// Vector geometry read back from an `.idx` file.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexFileContents {
    pub dimension: usize,
    /// Row-major `count * dimension` components.
    pub data: Vec<f32>,
}

impl IndexFileContents {
    pub fn vector_count(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }
}

/// Encodes a row-major vector buffer into the `.idx` byte layout.
pub fn encode(dimension: usize, data: &[f32]) -> KinesisResult<Vec<u8>> {
    if dimension == 0 || data.len() % dimension != 0 {
        return Err(KinesisError::Serialization(format!(
            "{} components do not form rows of dimension {}",
            data.len(),
            dimension
        )));
    }
    let dimension_u32 = u32::try_from(dimension)
        .map_err(|_| KinesisError::Serialization(format!("dimension {} exceeds u32", dimension)))?;
    let count = (data.len() / dimension) as u64;

    let payload_len = data.len() * std::mem::size_of::<f32>();
    let mut bytes = vec![0u8; HEADER_LEN + payload_len + CRC_LEN];
    bytes[0..6].copy_from_slice(INDEX_FILE_MAGIC);
    LittleEndian::write_u16(&mut bytes[6..8], CURRENT_VERSION);
    LittleEndian::write_u32(&mut bytes[8..12], dimension_u32);
    LittleEndian::write_u64(&mut bytes[12..HEADER_LEN], count);
    LittleEndian::write_f32_into(data, &mut bytes[HEADER_LEN..HEADER_LEN + payload_len]);

    let crc = crc32c::crc32c(&bytes[..HEADER_LEN + payload_len]);
    LittleEndian::write_u32(&mut bytes[HEADER_LEN + payload_len..], crc);
    Ok(bytes)
}

/// Decodes and verifies an `.idx` byte buffer.
pub fn decode(bytes: &[u8]) -> KinesisResult<IndexFileContents> {
    if bytes.len() < HEADER_LEN + CRC_LEN {
        return Err(KinesisError::Corrupted(format!("file too short ({} bytes)", bytes.len())));
    }
    if &bytes[0..6] != INDEX_FILE_MAGIC {
        return Err(KinesisError::Corrupted("invalid magic number".to_string()));
    }
    let version = LittleEndian::read_u16(&bytes[6..8]);
    if version > CURRENT_VERSION {
        return Err(KinesisError::Corrupted(format!(
            "unsupported format version {} (expected <= {})",
            version, CURRENT_VERSION
        )));
    }
    let dimension = LittleEndian::read_u32(&bytes[8..12]) as usize;
    let count = LittleEndian::read_u64(&bytes[12..HEADER_LEN]);
    if dimension == 0 {
        return Err(KinesisError::Corrupted("dimension is 0".to_string()));
    }

    let payload_len = usize::try_from(count)
        .ok()
        .and_then(|c| c.checked_mul(dimension))
        .and_then(|n| n.checked_mul(std::mem::size_of::<f32>()))
        .ok_or_else(|| KinesisError::Corrupted(format!("vector count {} overflows", count)))?;
    let expected_len = HEADER_LEN + payload_len + CRC_LEN;
    if bytes.len() != expected_len {
        return Err(KinesisError::Corrupted(format!(
            "expected {} bytes for {} vectors of dimension {}, found {}",
            expected_len,
            count,
            dimension,
            bytes.len()
        )));
    }

    let stored_crc = LittleEndian::read_u32(&bytes[HEADER_LEN + payload_len..]);
    let calculated_crc = crc32c::crc32c(&bytes[..HEADER_LEN + payload_len]);
    if stored_crc != calculated_crc {
        return Err(KinesisError::Corrupted(format!(
            "checksum mismatch (stored {:#010x}, calculated {:#010x})",
            stored_crc, calculated_crc
        )));
    }

    let mut data = vec![0f32; payload_len / std::mem::size_of::<f32>()];
    LittleEndian::read_f32_into(&bytes[HEADER_LEN..HEADER_LEN + payload_len], &mut data);
    Ok(IndexFileContents { dimension, data })
}

pub fn write(path: &Path, dimension: usize, data: &[f32], sync: bool) -> KinesisResult<()> {
    let bytes = encode(dimension, data)?;
    super::write_atomically(path, &bytes, sync)
}

pub fn read(path: &Path) -> KinesisResult<IndexFileContents> {
    let bytes = fs::read(path).map_err(|e| KinesisError::io(path, e))?;
    let contents = decode(&bytes)?;
    debug!(path = ?path, dimension = contents.dimension, vectors = contents.vector_count(), "Read index file");
    Ok(contents)
}
