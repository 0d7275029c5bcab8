pub mod embedder;

/// Converts text into a fixed-dimension vector.
///
/// Implementations must be deterministic for a fixed model and safe to share
/// between threads once loaded.
pub trait TextEmbedder: Send + Sync {
    /// Embed a single text.
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    /// Length of every vector returned by [`TextEmbedder::embed`].
    fn dimension(&self) -> usize;

    /// Identifier of the underlying model.
    fn model_id(&self) -> &str;
}
