use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::chunks::{ChunkFormat, parse_chunks};
use super::index::FlatIndex;
use super::read_artifact;
use crate::error::RagError;

/// Read-only pairing of the vector index and its chunk texts.
///
/// Position `i` of the index corresponds to `chunks[i]`. Built once at
/// startup and never mutated afterwards.
#[derive(Debug)]
pub struct CorpusStore {
    index: FlatIndex,
    chunks: Vec<String>,
    fingerprint: String,
}

impl CorpusStore {
    /// Load the index and chunk artifacts from disk.
    ///
    /// Fails with [`RagError::NotFound`] when either path is not a regular
    /// file, [`RagError::Io`] when it cannot be read, and
    /// [`RagError::CorruptArtifact`] when the contents are malformed or the
    /// two disagree in length.
    pub fn load(index_path: &Path, chunks_path: &Path) -> Result<Self, RagError> {
        debug!(index = %index_path.display(), "Loading vector index");
        let index_bytes = read_artifact(index_path)?;
        let index = FlatIndex::from_bytes(&index_bytes, index_path)?;

        debug!(chunks = %chunks_path.display(), "Loading chunk texts");
        let chunk_bytes = read_artifact(chunks_path)?;
        let chunks = parse_chunks(&chunk_bytes, ChunkFormat::from_path(chunks_path), chunks_path)?;

        if index.len() != chunks.len() {
            return Err(RagError::corrupt(
                chunks_path,
                format!(
                    "index holds {} vectors but {} chunks were loaded",
                    index.len(),
                    chunks.len()
                ),
            ));
        }

        let fingerprint = fingerprint(&index_bytes, &chunk_bytes);
        info!(
            vectors = index.len(),
            dimension = index.dimension(),
            metric = %index.metric(),
            fingerprint = %fingerprint,
            "Corpus loaded"
        );

        Ok(Self {
            index,
            chunks,
            fingerprint,
        })
    }

    /// Build a store from in-memory parts, applying the same length check as
    /// [`CorpusStore::load`].
    pub fn from_parts(index: FlatIndex, chunks: Vec<String>) -> Result<Self, RagError> {
        if index.len() != chunks.len() {
            return Err(RagError::corrupt(
                "<memory>",
                format!(
                    "index holds {} vectors but {} chunks were given",
                    index.len(),
                    chunks.len()
                ),
            ));
        }
        let chunk_bytes = serde_json::to_vec(&chunks)
            .map_err(|e| RagError::corrupt("<memory>", e.to_string()))?;
        let fingerprint = fingerprint(&index.to_bytes(), &chunk_bytes);
        Ok(Self {
            index,
            chunks,
            fingerprint,
        })
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    /// Chunk text at an index position, or `None` for sentinels and
    /// out-of-range positions.
    pub fn chunk(&self, position: i64) -> Option<&str> {
        usize::try_from(position)
            .ok()
            .and_then(|i| self.chunks.get(i))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    /// Hex SHA-256 over the index and chunk artifacts.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

fn fingerprint(index_bytes: &[u8], chunk_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(index_bytes);
    hasher.update(chunk_bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::index::Metric;
    use creditrust_test_util::corpus::{write_chunks_csv, write_chunks_json};

    fn write_index(dir: &Path, vectors: &[&[f32]]) -> std::path::PathBuf {
        let mut index = FlatIndex::new(2, Metric::L2);
        for v in vectors {
            index.add(v).unwrap();
        }
        let path = dir.join("faiss_index.bin");
        index.write(&path).unwrap();
        path
    }

    #[test]
    fn load_pairs_index_and_chunks() {
        let tmp = tempfile::tempdir().unwrap();
        let index_path = write_index(tmp.path(), &[&[0.0, 1.0], &[1.0, 0.0]]);
        let chunks_path = write_chunks_json(tmp.path(), &["first", "second"]);

        let store = CorpusStore::load(&index_path, &chunks_path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.dimension(), 2);
        assert_eq!(store.chunk(1), Some("second"));
        assert_eq!(store.fingerprint().len(), 64);
    }

    #[test]
    fn load_reads_csv_chunks() {
        let tmp = tempfile::tempdir().unwrap();
        let index_path = write_index(tmp.path(), &[&[0.0, 1.0]]);
        let chunks_path = write_chunks_csv(tmp.path(), &["only, with comma"]);

        let store = CorpusStore::load(&index_path, &chunks_path).unwrap();
        assert_eq!(store.chunks(), &["only, with comma".to_string()]);
    }

    #[test]
    fn missing_index_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let chunks_path = write_chunks_json(tmp.path(), &["a"]);
        let missing = tmp.path().join("faiss_index.bin");

        let err = CorpusStore::load(&missing, &chunks_path).unwrap_err();
        assert!(matches!(err, RagError::NotFound { path } if path == missing));
    }

    #[test]
    fn missing_chunks_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let index_path = write_index(tmp.path(), &[&[0.0, 1.0]]);
        let missing = tmp.path().join("text_chunks.json");

        let err = CorpusStore::load(&index_path, &missing).unwrap_err();
        assert!(matches!(err, RagError::NotFound { path } if path == missing));
    }

    #[test]
    fn directory_in_place_of_index_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let chunks_path = write_chunks_json(tmp.path(), &["a"]);
        let dir = tmp.path().join("faiss_index.bin");
        std::fs::create_dir(&dir).unwrap();

        let err = CorpusStore::load(&dir, &chunks_path).unwrap_err();
        assert!(matches!(err, RagError::NotFound { path } if path == dir));
    }

    #[test]
    fn length_mismatch_is_corrupt() {
        let tmp = tempfile::tempdir().unwrap();
        let index_path = write_index(tmp.path(), &[&[0.0, 1.0], &[1.0, 0.0]]);
        let chunks_path = write_chunks_json(tmp.path(), &["only one"]);

        let err = CorpusStore::load(&index_path, &chunks_path).unwrap_err();
        assert!(matches!(err, RagError::CorruptArtifact { .. }));
        assert!(err.to_string().contains("2 vectors but 1 chunks"));
    }

    #[test]
    fn chunk_lookup_ignores_sentinels_and_out_of_range() {
        let mut index = FlatIndex::new(1, Metric::L2);
        index.add(&[0.0]).unwrap();
        let store = CorpusStore::from_parts(index, vec!["a".to_string()]).unwrap();
        assert_eq!(store.chunk(0), Some("a"));
        assert_eq!(store.chunk(-1), None);
        assert_eq!(store.chunk(1), None);
    }

    #[test]
    fn from_parts_rejects_mismatch() {
        let index = FlatIndex::new(3, Metric::L2);
        assert!(CorpusStore::from_parts(index, vec!["orphan".to_string()]).is_err());
    }

    #[test]
    fn fingerprint_changes_with_content() {
        let build = |text: &str| {
            let mut index = FlatIndex::new(1, Metric::L2);
            index.add(&[0.0]).unwrap();
            CorpusStore::from_parts(index, vec![text.to_string()]).unwrap()
        };
        assert_eq!(build("a").fingerprint(), build("a").fingerprint());
        assert_ne!(build("a").fingerprint(), build("b").fingerprint());
    }
}
