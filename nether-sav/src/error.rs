//! Error types for save decoding and encoding

use std::io;

/// Errors that can occur when decoding or encoding a save stream
#[derive(Debug, thiserror::Error)]
pub enum SavError {
    /// IO error while reading or writing the stream
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Declared lengths, counts or markers disagree with the decoded bytes
    #[error("corrupt data: {0}")]
    CorruptData(String),

    /// Property type tag outside the known set of kinds
    #[error("unsupported property type '{0}'")]
    UnsupportedProperty(String),

    /// Element/key/value kind not supported inside a container property
    #[error("unsupported {container} element type '{kind}' in property '{property}'")]
    UnsupportedElement {
        container: &'static str,
        kind: String,
        property: String,
    },

    /// Chunk container header is malformed
    #[error("invalid chunk header: {0}")]
    InvalidChunk(String),

    /// zlib inflate/deflate failure
    #[error("compression error: {0}")]
    Compression(String),

    /// External data provider failed; the whole session is aborted
    #[error("data provider failed: {0}")]
    Provider(String),

    /// Provider reply does not match the requested pathNames
    #[error("object '{0}' missing from provider response")]
    MissingObject(String),

    /// Codec configuration out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SavError {
    /// Build a `CorruptData` error for a declared length that disagrees with the decoded span
    pub fn length_mismatch(context: &str, declared: u64, actual: u64) -> Self {
        Self::CorruptData(format!(
            "{context}: declared {declared} bytes but decoded {actual}"
        ))
    }

    /// True for errors that indicate malformed input rather than an IO or provider failure
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            Self::CorruptData(_)
                | Self::UnsupportedProperty(_)
                | Self::UnsupportedElement { .. }
                | Self::InvalidChunk(_)
        )
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SavError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_mismatch_message() {
        let err = SavError::length_mismatch("IntProperty 'mCount'", 4, 8);
        assert!(err.is_corrupt());
        assert_eq!(
            err.to_string(),
            "corrupt data: IntProperty 'mCount': declared 4 bytes but decoded 8"
        );
    }

    #[test]
    fn test_io_is_not_corrupt() {
        let err: SavError = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(!err.is_corrupt());
    }
}
