use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::error::RagError;

/// Position reported for an empty result slot, as FAISS does.
pub const NO_NEIGHBOR: i64 = -1;

/// FAISS metric type codes stored in the index header.
const FAISS_METRIC_INNER_PRODUCT: i32 = 0;
const FAISS_METRIC_L2: i32 = 1;

/// Placeholder FAISS writes twice into every index header.
const FAISS_HEADER_DUMMY: i64 = 1 << 20;

/// Distance metric the index was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Squared Euclidean distance.
    L2,
    /// Inner product, reported as `1 - ip` so that smaller is nearer.
    InnerProduct,
}

impl Metric {
    fn fourcc(self) -> &'static [u8; 4] {
        match self {
            Self::L2 => b"IxF2",
            Self::InnerProduct => b"IxFI",
        }
    }

    fn faiss_code(self) -> i32 {
        match self {
            Self::L2 => FAISS_METRIC_L2,
            Self::InnerProduct => FAISS_METRIC_INNER_PRODUCT,
        }
    }

    fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
            Self::InnerProduct => 1.0 - a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>(),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::L2 => f.write_str("l2"),
            Self::InnerProduct => f.write_str("inner_product"),
        }
    }
}

/// Raw result of a k-nearest-neighbour search.
///
/// Always holds exactly `k` slots, nearest first. Slots beyond the number of
/// stored vectors carry [`NO_NEIGHBOR`] and an infinite distance.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub distances: Vec<f32>,
    pub positions: Vec<i64>,
}

/// Exhaustive (flat) vector index, byte-compatible with FAISS `IndexFlatL2`
/// and `IndexFlatIP` files.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    metric: Metric,
    vectors: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dimension: usize, metric: Metric) -> Self {
        Self {
            dimension,
            metric,
            vectors: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.vectors.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a vector at the next position.
    pub fn add(&mut self, vector: &[f32]) -> Result<(), RagError> {
        if vector.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.vectors.extend_from_slice(vector);
        Ok(())
    }

    /// Decode a FAISS flat index. `path` is only used for error messages.
    pub fn from_bytes(bytes: &[u8], path: &Path) -> Result<Self, RagError> {
        let mut reader = ByteReader::new(bytes, path);

        let fourcc = reader.take(4)?;
        let declared = match fourcc {
            b"IxF2" => Some(Metric::L2),
            b"IxFI" => Some(Metric::InnerProduct),
            b"IxFl" => None,
            other => {
                return Err(RagError::UnsupportedIndex {
                    path: path.to_path_buf(),
                    fourcc: String::from_utf8_lossy(other).into_owned(),
                });
            }
        };

        let d = reader.i32()?;
        let ntotal = reader.i64()?;
        let _dummy = reader.i64()?;
        let _dummy = reader.i64()?;
        let _is_trained = reader.u8()?;
        let metric_code = reader.i32()?;

        let metric = match metric_code {
            FAISS_METRIC_INNER_PRODUCT => Metric::InnerProduct,
            FAISS_METRIC_L2 => Metric::L2,
            other => {
                return Err(RagError::UnsupportedIndex {
                    path: path.to_path_buf(),
                    fourcc: format!("{} (metric {other})", String::from_utf8_lossy(fourcc)),
                });
            }
        };
        if declared.is_some_and(|m| m != metric) {
            return Err(RagError::corrupt(
                path,
                format!("header metric {metric} disagrees with index type"),
            ));
        }

        let dimension = usize::try_from(d)
            .map_err(|_| RagError::corrupt(path, format!("negative dimension {d}")))?;
        let count = usize::try_from(ntotal)
            .map_err(|_| RagError::corrupt(path, format!("negative vector count {ntotal}")))?;

        let float_count = reader.u64()?;
        let expected = dimension
            .checked_mul(count)
            .ok_or_else(|| RagError::corrupt(path, "vector payload size overflows"))?;
        if usize::try_from(float_count).ok() != Some(expected) {
            return Err(RagError::corrupt(
                path,
                format!("expected {expected} floats for {count}x{dimension}, found {float_count}"),
            ));
        }
        let vectors = reader.f32s(expected)?;

        if !reader.is_exhausted() {
            return Err(RagError::corrupt(path, "trailing bytes after vector payload"));
        }

        Ok(Self {
            dimension,
            metric,
            vectors,
        })
    }

    /// Encode in the FAISS flat index layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + 33 + 8 + self.vectors.len() * 4);
        out.extend_from_slice(self.metric.fourcc());
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        {
            out.extend_from_slice(&(self.dimension as i32).to_le_bytes());
            out.extend_from_slice(&(self.len() as i64).to_le_bytes());
        }
        out.extend_from_slice(&FAISS_HEADER_DUMMY.to_le_bytes());
        out.extend_from_slice(&FAISS_HEADER_DUMMY.to_le_bytes());
        out.push(1);
        out.extend_from_slice(&self.metric.faiss_code().to_le_bytes());
        out.extend_from_slice(&(self.vectors.len() as u64).to_le_bytes());
        for value in &self.vectors {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }

    /// Write the index to `path` in the FAISS flat layout.
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        fs::write(path, self.to_bytes())
            .with_context(|| format!("Failed to write index to {}", path.display()))
    }

    /// Find the `k` nearest stored vectors to `query`.
    pub fn search(&self, query: &[f32], k: usize) -> Result<SearchOutcome, RagError> {
        if k == 0 {
            return Err(RagError::InvalidTopK);
        }
        if query.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(f32, usize)> = self
            .vectors
            .chunks_exact(self.dimension.max(1))
            .enumerate()
            .map(|(pos, vector)| (self.metric.distance(query, vector), pos))
            .collect();

        let by_distance =
            |a: &(f32, usize), b: &(f32, usize)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1));
        if scored.len() > k {
            scored.select_nth_unstable_by(k - 1, by_distance);
            scored.truncate(k);
        }
        scored.sort_by(by_distance);

        let mut distances = Vec::with_capacity(k);
        let mut positions = Vec::with_capacity(k);
        for (distance, pos) in scored {
            distances.push(distance);
            positions.push(i64::try_from(pos).unwrap_or(NO_NEIGHBOR));
        }
        distances.resize(k, f32::INFINITY);
        positions.resize(k, NO_NEIGHBOR);

        Ok(SearchOutcome {
            distances,
            positions,
        })
    }
}

/// Little-endian cursor over an index file.
struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    path: PathBuf,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8], path: &Path) -> Self {
        Self {
            bytes,
            pos: 0,
            path: path.to_path_buf(),
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], RagError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                RagError::corrupt(
                    &self.path,
                    format!("unexpected end of file at byte {}", self.pos),
                )
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], RagError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    fn u8(&mut self) -> Result<u8, RagError> {
        Ok(self.array::<1>()?[0])
    }

    fn i32(&mut self) -> Result<i32, RagError> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    fn i64(&mut self) -> Result<i64, RagError> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64, RagError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn f32s(&mut self, count: usize) -> Result<Vec<f32>, RagError> {
        let len = count
            .checked_mul(4)
            .ok_or_else(|| RagError::corrupt(&self.path, "vector payload size overflows"))?;
        Ok(self
            .take(len)?
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }

    fn is_exhausted(&self) -> bool {
        self.pos == self.bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(metric: Metric, vectors: &[&[f32]]) -> FlatIndex {
        let mut index = FlatIndex::new(vectors[0].len(), metric);
        for v in vectors {
            index.add(v).unwrap();
        }
        index
    }

    #[test]
    fn search_orders_by_ascending_l2_distance() {
        let index = index_of(Metric::L2, &[&[0.0, 0.0], &[3.0, 0.0], &[1.0, 0.0]]);
        let outcome = index.search(&[0.0, 0.0], 3).unwrap();
        assert_eq!(outcome.positions, vec![0, 2, 1]);
        assert_eq!(outcome.distances, vec![0.0, 1.0, 9.0]);
    }

    #[test]
    fn search_truncates_to_k() {
        let index = index_of(Metric::L2, &[&[5.0], &[1.0], &[2.0], &[4.0]]);
        let outcome = index.search(&[0.0], 2).unwrap();
        assert_eq!(outcome.positions, vec![1, 2]);
        assert_eq!(outcome.distances, vec![1.0, 4.0]);
    }

    #[test]
    fn search_pads_missing_slots_with_sentinel() {
        let index = index_of(Metric::L2, &[&[1.0, 1.0]]);
        let outcome = index.search(&[1.0, 1.0], 3).unwrap();
        assert_eq!(outcome.positions, vec![0, NO_NEIGHBOR, NO_NEIGHBOR]);
        assert_eq!(outcome.distances[0], 0.0);
        assert!(outcome.distances[1].is_infinite());
        assert!(outcome.distances[2].is_infinite());
    }

    #[test]
    fn search_on_empty_index_returns_only_sentinels() {
        let index = FlatIndex::new(4, Metric::L2);
        let outcome = index.search(&[0.0; 4], 2).unwrap();
        assert_eq!(outcome.positions, vec![NO_NEIGHBOR, NO_NEIGHBOR]);
    }

    #[test]
    fn inner_product_reports_one_minus_similarity() {
        let index = index_of(Metric::InnerProduct, &[&[0.0, 1.0], &[1.0, 0.0]]);
        let outcome = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(outcome.positions, vec![1, 0]);
        assert_eq!(outcome.distances, vec![0.0, 1.0]);
    }

    #[test]
    fn search_rejects_wrong_dimension() {
        let index = index_of(Metric::L2, &[&[1.0, 2.0, 3.0]]);
        let err = index.search(&[1.0, 2.0], 1).unwrap_err();
        assert!(matches!(
            err,
            RagError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn search_rejects_zero_k() {
        let index = index_of(Metric::L2, &[&[1.0]]);
        assert!(matches!(
            index.search(&[1.0], 0).unwrap_err(),
            RagError::InvalidTopK
        ));
    }

    #[test]
    fn add_rejects_wrong_dimension() {
        let mut index = FlatIndex::new(2, Metric::L2);
        assert!(index.add(&[1.0]).is_err());
        assert!(index.is_empty());
    }

    #[test]
    fn faiss_layout_is_read_back() {
        let index = index_of(Metric::InnerProduct, &[&[0.5, -0.5], &[0.25, 1.0]]);
        let bytes = index.to_bytes();
        assert_eq!(&bytes[..4], b"IxFI");

        let decoded = FlatIndex::from_bytes(&bytes, Path::new("mem")).unwrap();
        assert_eq!(decoded.dimension(), 2);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded.metric(), Metric::InnerProduct);
        assert_eq!(decoded.vectors, index.vectors);
    }

    #[test]
    fn generic_flat_header_uses_metric_code() {
        let mut bytes = index_of(Metric::L2, &[&[1.0]]).to_bytes();
        bytes[..4].copy_from_slice(b"IxFl");
        let decoded = FlatIndex::from_bytes(&bytes, Path::new("mem")).unwrap();
        assert_eq!(decoded.metric(), Metric::L2);
    }

    #[test]
    fn unknown_index_type_is_unsupported() {
        let mut bytes = index_of(Metric::L2, &[&[1.0]]).to_bytes();
        bytes[..4].copy_from_slice(b"IHNf");
        let err = FlatIndex::from_bytes(&bytes, Path::new("mem")).unwrap_err();
        assert!(matches!(err, RagError::UnsupportedIndex { fourcc, .. } if fourcc == "IHNf"));
    }

    #[test]
    fn truncated_payload_is_corrupt() {
        let bytes = index_of(Metric::L2, &[&[1.0, 2.0], &[3.0, 4.0]]).to_bytes();
        let err = FlatIndex::from_bytes(&bytes[..bytes.len() - 3], Path::new("mem")).unwrap_err();
        assert!(matches!(err, RagError::CorruptArtifact { .. }));
    }

    #[test]
    fn trailing_bytes_are_corrupt() {
        let mut bytes = index_of(Metric::L2, &[&[1.0]]).to_bytes();
        bytes.push(0);
        let err = FlatIndex::from_bytes(&bytes, Path::new("mem")).unwrap_err();
        assert!(matches!(err, RagError::CorruptArtifact { .. }));
    }

    #[test]
    fn metric_disagreeing_with_fourcc_is_corrupt() {
        let mut bytes = index_of(Metric::L2, &[&[1.0]]).to_bytes();
        bytes[..4].copy_from_slice(b"IxFI");
        let err = FlatIndex::from_bytes(&bytes, Path::new("mem")).unwrap_err();
        assert!(matches!(err, RagError::CorruptArtifact { .. }));
    }

    #[test]
    fn write_then_read_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("faiss_index.bin");
        let index = index_of(Metric::L2, &[&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]]);
        index.write(&path).unwrap();

        let loaded = FlatIndex::from_bytes(&fs::read(&path).unwrap(), &path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.search(&[0.0, 1.0, 0.0], 1).unwrap().positions, vec![1]);
    }
}
