use std::sync::{Arc, Mutex};

use anyhow::Context;
use tracing::info;

use crate::corpus::store::CorpusStore;
use crate::embedding::TextEmbedder;
use crate::embedding::embedder::Embedder;
use crate::generation::Generate;
use crate::generation::completion::CompletionClient;
use crate::pipeline::answer::AnswerPipeline;
use crate::settings::{PipelineConfig, Settings};

/// A value built at most once, on first use.
///
/// Concurrent first callers wait for the one in-flight load instead of
/// starting their own. A failed load leaves the cell empty.
pub struct LoadOnce<T> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T> LoadOnce<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub fn preloaded(value: T) -> Self {
        Self {
            slot: Mutex::new(Some(Arc::new(value))),
        }
    }

    pub fn get_or_try_load<F>(&self, load: F) -> anyhow::Result<Arc<T>>
    where
        F: FnOnce() -> anyhow::Result<T>,
    {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("Model loading lock poisoned"))?;
        if let Some(value) = slot.as_ref() {
            return Ok(Arc::clone(value));
        }
        let value = Arc::new(load()?);
        *slot = Some(Arc::clone(&value));
        Ok(value)
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.lock().is_ok_and(|slot| slot.is_some())
    }
}

impl<T> Default for LoadOnce<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Expensive, read-only state shared by every pipeline: the corpus and the
/// loaded models.
pub struct SharedModels {
    pub corpus: Arc<CorpusStore>,
    pub embedder: Arc<dyn TextEmbedder>,
    pub generator: Arc<dyn Generate>,
}

impl SharedModels {
    /// Load the corpus artifacts named by `settings`, the `embedding_model`
    /// from the local model cache, and the generator client.
    pub fn load(settings: &Settings, embedding_model: &str) -> anyhow::Result<Self> {
        let corpus = CorpusStore::load(&settings.paths.index, &settings.paths.chunks)?;
        let embedder = Embedder::new(&settings.paths.model_dir, embedding_model)?;

        let endpoint = settings.generator.endpoint_url()?;
        let generator = CompletionClient::new(endpoint)
            .with_api_key(settings.generator.api_key())
            .with_timeout(settings.generator.timeout());

        info!(
            chunks = corpus.len(),
            embedding_model,
            generator = %generator.endpoint(),
            "Models loaded"
        );

        Ok(Self {
            corpus: Arc::new(corpus),
            embedder: Arc::new(embedder),
            generator: Arc::new(generator),
        })
    }
}

/// Process-wide context handed to every command: settings plus lazily loaded
/// models.
pub struct Runtime {
    pub settings: Settings,
    models: LoadOnce<SharedModels>,
}

impl Runtime {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            models: LoadOnce::new(),
        }
    }

    /// Runtime whose models are already in memory.
    pub fn with_models(settings: Settings, models: SharedModels) -> Self {
        Self {
            settings,
            models: LoadOnce::preloaded(models),
        }
    }

    /// Shared models, loading them on first use with `embedding_model`.
    pub fn models(&self, embedding_model: &str) -> anyhow::Result<Arc<SharedModels>> {
        self.models
            .get_or_try_load(|| SharedModels::load(&self.settings, embedding_model))
            .context("Failed to load corpus and models")
    }

    /// Build the answer pipeline for a named profile.
    pub fn pipeline(&self, profile: &str) -> anyhow::Result<AnswerPipeline> {
        let config = self.settings.profile(profile)?;
        self.pipeline_for(config)
    }

    /// Build an answer pipeline from an explicit configuration.
    ///
    /// The first pipeline decides which embedding model is loaded; later
    /// configurations must use the same one.
    pub fn pipeline_for(&self, config: PipelineConfig) -> anyhow::Result<AnswerPipeline> {
        let models = self.models(&config.embedding_model)?;
        let loaded = models.embedder.model_id();
        if loaded != config.embedding_model {
            anyhow::bail!(
                "Embedding model {} requested but {loaded} is already loaded",
                config.embedding_model
            );
        }
        let pipeline = AnswerPipeline::new(
            Arc::clone(&models.corpus),
            Arc::clone(&models.embedder),
            Arc::clone(&models.generator),
            config,
        )?;
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::RagError;
    use crate::test_util::{HashingEmbedder, ScriptedGenerator, corpus_from_texts};

    #[test]
    fn load_once_runs_loader_once_under_contention() {
        let cell: LoadOnce<usize> = LoadOnce::new();
        let loads = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let value = cell
                        .get_or_try_load(|| {
                            loads.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(std::time::Duration::from_millis(10));
                            Ok(42)
                        })
                        .unwrap();
                    assert_eq!(*value, 42);
                });
            }
        });

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(cell.is_loaded());
    }

    #[test]
    fn failed_load_leaves_cell_empty() {
        let cell: LoadOnce<String> = LoadOnce::new();
        assert!(cell.get_or_try_load(|| anyhow::bail!("disk on fire")).is_err());
        assert!(!cell.is_loaded());

        let value = cell.get_or_try_load(|| Ok("second try".to_string())).unwrap();
        assert_eq!(value.as_str(), "second try");
    }

    #[test]
    fn missing_artifacts_abort_loading() {
        let tmp = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.paths.index = tmp.path().join("faiss_index.bin");
        settings.paths.chunks = tmp.path().join("text_chunks.json");

        let runtime = Runtime::new(settings);
        let err = runtime.pipeline("chat").err().unwrap();
        let rag = err.downcast_ref::<RagError>().unwrap();
        assert!(matches!(rag, RagError::NotFound { .. }));
    }

    fn runtime() -> Runtime {
        let embedder = HashingEmbedder::default();
        let corpus = corpus_from_texts(&embedder, &["Card charged twice", "Loan approved late"]);
        Runtime::with_models(
            Settings::default(),
            SharedModels {
                corpus: Arc::new(corpus),
                embedder: Arc::new(embedder),
                generator: Arc::new(ScriptedGenerator::echo()),
            },
        )
    }

    #[test]
    fn pipelines_share_loaded_models() {
        let runtime = runtime();
        let chat = runtime.pipeline("chat").unwrap();
        let concise = runtime.pipeline("concise").unwrap();

        assert!(std::ptr::eq(chat.corpus(), concise.corpus()));
        assert_eq!(chat.config().top_k, 5);
        assert_eq!(concise.config().generation_model, "facebook/bart-large-cnn");
    }

    #[test]
    fn profile_with_other_embedding_model_is_rejected() {
        let settings = Settings::from_toml(
            "[profiles.multilingual]\nembedding_model = \"intfloat/multilingual-e5-small\"\n",
            std::path::Path::new("/tmp"),
        )
        .unwrap();
        let embedder = HashingEmbedder::default();
        let corpus = corpus_from_texts(&embedder, &["Card charged twice"]);
        let runtime = Runtime::with_models(
            settings,
            SharedModels {
                corpus: Arc::new(corpus),
                embedder: Arc::new(embedder),
                generator: Arc::new(ScriptedGenerator::echo()),
            },
        );

        let err = runtime.pipeline("multilingual").err().unwrap();
        assert!(err.to_string().contains("intfloat/multilingual-e5-small"));
        assert!(runtime.pipeline("chat").is_ok());
    }

    #[test]
    fn unknown_profile_fails_before_loading() {
        let runtime = Runtime::new(Settings::default());
        let err = runtime.pipeline("nope").err().unwrap();
        assert!(err.to_string().starts_with("Unknown profile 'nope'"));
        assert!(!runtime.models.is_loaded());
    }
}
