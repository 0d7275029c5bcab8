use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use fastembed::{
    InitOptionsUserDefined, Pooling, TextEmbedding, TokenizerFiles, UserDefinedEmbeddingModel,
};

use super::TextEmbedder;

/// Files fetched from a sentence-transformers Hugging Face repository, as
/// `(remote path, local name)`.
pub const MODEL_FILES: &[(&str, &str)] = &[
    ("onnx/model.onnx", "model.onnx"),
    ("tokenizer.json", "tokenizer.json"),
    ("config.json", "config.json"),
    ("special_tokens_map.json", "special_tokens_map.json"),
    ("tokenizer_config.json", "tokenizer_config.json"),
];

/// Wrapper around fastembed's `TextEmbedding` model.
/// Loads a sentence-transformers ONNX export (all-MiniLM-L6-v2 by default)
/// from disk with mean pooling.
///
/// The model sits behind a mutex so one loaded instance can serve concurrent
/// callers.
pub struct Embedder {
    model: Mutex<TextEmbedding>,
    model_id: String,
    dimension: usize,
}

impl Embedder {
    /// Create a new embedder by loading `model_id` (a Hugging Face repository
    /// id such as `sentence-transformers/all-MiniLM-L6-v2`) from disk.
    ///
    /// Expected files in `model_cache_dir/<repository name>/`:
    ///   - `model.onnx`
    ///   - `tokenizer.json`
    ///   - `config.json`
    ///   - `special_tokens_map.json`
    ///   - `tokenizer_config.json`
    ///
    /// If the model files are not found, returns an error instructing the user
    /// to run `creditrust model download`.
    pub fn new(model_cache_dir: &Path, model_id: &str) -> anyhow::Result<Self> {
        let base = Self::model_dir(model_cache_dir, model_id);

        let onnx_bytes = fs::read(base.join("model.onnx")).with_context(|| {
            format!(
                "Model not found at {}. Run 'creditrust model download' first.",
                base.display()
            )
        })?;

        let tokenizer_files = TokenizerFiles {
            tokenizer_file: fs::read(base.join("tokenizer.json"))
                .context("Missing tokenizer.json")?,
            config_file: fs::read(base.join("config.json")).context("Missing config.json")?,
            special_tokens_map_file: fs::read(base.join("special_tokens_map.json"))
                .context("Missing special_tokens_map.json")?,
            tokenizer_config_file: fs::read(base.join("tokenizer_config.json"))
                .context("Missing tokenizer_config.json")?,
        };

        let user_model =
            UserDefinedEmbeddingModel::new(onnx_bytes, tokenizer_files).with_pooling(Pooling::Mean);

        let mut model =
            TextEmbedding::try_new_from_user_defined(user_model, InitOptionsUserDefined::default())
                .with_context(|| format!("Failed to initialize {model_id} model"))?;

        // The ONNX export does not declare its output width; measure it once.
        let dimension = model
            .embed(vec!["dimension probe".to_string()], None)
            .context("Failed to run embedding model")?
            .first()
            .map_or(0, Vec::len);

        Ok(Self {
            model: Mutex::new(model),
            model_id: model_id.to_string(),
            dimension,
        })
    }

    /// Directory holding the files of `model_id` inside `model_cache_dir`,
    /// named after the last segment of the repository id.
    pub fn model_dir(model_cache_dir: &Path, model_id: &str) -> PathBuf {
        let name = model_id.rsplit('/').next().unwrap_or(model_id);
        model_cache_dir.join(name)
    }

    /// Whether every file of `model_id` is present in `model_cache_dir`.
    pub fn is_downloaded(model_cache_dir: &Path, model_id: &str) -> bool {
        let base = Self::model_dir(model_cache_dir, model_id);
        MODEL_FILES.iter().all(|(_, local)| base.join(local).exists())
    }

    /// Embed a batch of text strings and return their vector representations.
    pub fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        let owned: Vec<String> = texts.iter().map(|s| (*s).to_string()).collect();
        let mut model = self
            .model
            .lock()
            .map_err(|_| anyhow::anyhow!("Embedding model lock poisoned"))?;
        let embeddings = model.embed(owned, None).context("Failed to embed texts")?;
        Ok(embeddings)
    }
}

impl TextEmbedder for Embedder {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .context("Embedding model returned no vector")
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
