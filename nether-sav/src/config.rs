//! Codec tuning knobs
//!
//! Only affects how output is chunked, batched and compressed; any valid
//! configuration decodes to the same object graph.

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_CHUNK_SIZE, SavError, error::Result};

/// Smallest chunk size accepted by [`CodecConfig::validate`]
pub const MIN_CHUNK_SIZE: usize = 64;

/// Encoder configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Uncompressed bytes per chunk (default: 131072)
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,
    /// pathNames requested from the provider per batch (default: 5000)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// zlib level, 0-9 (default: 6)
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,
}

fn default_max_chunk_size() -> usize {
    DEFAULT_MAX_CHUNK_SIZE
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_compression_level() -> u32 {
    6
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            batch_size: default_batch_size(),
            compression_level: default_compression_level(),
        }
    }
}

impl CodecConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size < MIN_CHUNK_SIZE {
            return Err(SavError::InvalidConfig(format!(
                "max_chunk_size {} is below {MIN_CHUNK_SIZE}",
                self.max_chunk_size
            )));
        }
        if u32::try_from(self.max_chunk_size).is_err() {
            return Err(SavError::InvalidConfig(format!(
                "max_chunk_size {} does not fit a chunk header",
                self.max_chunk_size
            )));
        }
        if self.batch_size == 0 {
            return Err(SavError::InvalidConfig("batch_size must be positive".into()));
        }
        if self.compression_level > 9 {
            return Err(SavError::InvalidConfig(format!(
                "compression_level {} is outside 0-9",
                self.compression_level
            )));
        }
        Ok(())
    }

    pub fn compression(&self) -> flate2::Compression {
        flate2::Compression::new(self.compression_level)
    }
}
