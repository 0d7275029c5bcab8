use tracing::debug;

use crate::corpus::store::CorpusStore;
use crate::error::RagError;

/// A chunk returned by nearest-neighbour search.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk<'a> {
    /// Position of the chunk in the corpus.
    pub position: usize,
    pub text: &'a str,
    /// Distance reported by the index; smaller is nearer.
    pub distance: f32,
}

/// Maps nearest-neighbour positions back to chunk texts.
pub struct Retriever<'a> {
    corpus: &'a CorpusStore,
}

impl<'a> Retriever<'a> {
    pub fn new(corpus: &'a CorpusStore) -> Self {
        Self { corpus }
    }

    /// Return up to `k` chunks nearest to `query`, nearest first.
    ///
    /// The index is asked for at most as many neighbours as it holds, so any
    /// `k` is accepted. Sentinel and out-of-range positions are dropped; the
    /// result may be shorter than `k` and is empty (not an error) for an
    /// empty corpus.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk<'a>>, RagError> {
        if k == 0 {
            return Err(RagError::InvalidTopK);
        }
        let limit = k.min(self.corpus.len());
        if limit == 0 {
            debug!(k = k, "Nearest-neighbour search over empty corpus");
            return Ok(Vec::new());
        }
        let outcome = self.corpus.index().search(query, limit)?;

        let chunks: Vec<_> = outcome
            .positions
            .iter()
            .zip(&outcome.distances)
            .filter_map(|(&position, &distance)| {
                let text = self.corpus.chunk(position)?;
                Some(RetrievedChunk {
                    position: usize::try_from(position).ok()?,
                    text,
                    distance,
                })
            })
            .collect();

        debug!(
            k = k,
            returned = chunks.len(),
            dropped = limit - chunks.len(),
            "Nearest-neighbour search"
        );

        Ok(chunks)
    }
}
