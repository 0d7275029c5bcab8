use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the corpus or answering a question.
///
/// Load-time variants abort startup. `DimensionMismatch` and `InvalidTopK`
/// abort a single call; they indicate misconfiguration rather than bad input.
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Required artifact not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Corrupt artifact {}: {message}", path.display())]
    CorruptArtifact { path: PathBuf, message: String },

    #[error("Unsupported index type {fourcc:?} in {}", path.display())]
    UnsupportedIndex { path: PathBuf, fourcc: String },

    #[error("Embedding dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("top-k must be at least 1")]
    InvalidTopK,
}

impl RagError {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CorruptArtifact {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_artifact() {
        let err = RagError::NotFound {
            path: PathBuf::from("/tmp/faiss_index.bin"),
        };
        assert_eq!(
            err.to_string(),
            "Required artifact not found: /tmp/faiss_index.bin"
        );

        let err = RagError::corrupt("/tmp/chunks.json", "3 vectors but 2 chunks");
        assert_eq!(
            err.to_string(),
            "Corrupt artifact /tmp/chunks.json: 3 vectors but 2 chunks"
        );
    }

    #[test]
    fn io_failure_keeps_its_source() {
        let err = RagError::Io {
            path: PathBuf::from("/srv/vector_store/faiss_index.bin"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(
            err.to_string()
                .starts_with("Failed to read /srv/vector_store/faiss_index.bin: ")
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn dimension_mismatch_message() {
        let err = RagError::DimensionMismatch {
            expected: 384,
            actual: 768,
        };
        assert_eq!(
            err.to_string(),
            "Embedding dimension mismatch: index expects 384, got 768"
        );
    }
}
