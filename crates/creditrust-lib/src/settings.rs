use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::config::{
    APP_DIR_NAME, DEFAULT_CHUNK_SEPARATOR, DEFAULT_CONTEXT_BUDGET, DEFAULT_EMBEDDING_MODEL,
    DEFAULT_GENERATION_MODEL, DEFAULT_MAX_NEW_TOKENS, DEFAULT_TOP_K,
};
use crate::error::RagError;
use crate::generation::{AnswerExtraction, SamplingMode};
use crate::pipeline::prompt::PromptTemplate;

/// Name of the profile used when none is requested.
pub const DEFAULT_PROFILE: &str = "chat";

/// Names of the built-in profiles.
pub const BUILTIN_PROFILES: &[&str] = &["chat", "analyst", "concise"];

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080/v1/completions";

/// Everything that parameterises one answer pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub embedding_model: String,
    pub generation_model: String,
    pub template: PromptTemplate,
    pub top_k: usize,
    /// Maximum characters of context given to the generator.
    pub context_budget: usize,
    pub chunk_separator: String,
    pub max_new_tokens: u32,
    pub sampling: SamplingMode,
    pub extraction: AnswerExtraction,
}

impl PipelineConfig {
    /// Chat assistant: sampled generation, answer split off the echoed prompt.
    pub fn chat() -> Self {
        Self {
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            template: PromptTemplate::Chat,
            top_k: DEFAULT_TOP_K,
            context_budget: DEFAULT_CONTEXT_BUDGET,
            chunk_separator: DEFAULT_CHUNK_SEPARATOR.to_string(),
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
            sampling: SamplingMode::Stochastic,
            extraction: AnswerExtraction::SplitOnMarker,
        }
    }

    /// Batch analyst: paragraph-separated excerpts, echoed prompt stripped.
    pub fn analyst() -> Self {
        Self {
            template: PromptTemplate::Analyst,
            chunk_separator: "\n\n".to_string(),
            extraction: AnswerExtraction::StripPrompt,
            ..Self::chat()
        }
    }

    /// Concise answers from a text-to-text model, decoded greedily.
    pub fn concise() -> Self {
        Self {
            generation_model: "facebook/bart-large-cnn".to_string(),
            template: PromptTemplate::Concise,
            sampling: SamplingMode::Deterministic,
            extraction: AnswerExtraction::Continuation,
            ..Self::chat()
        }
    }

    /// Built-in profile by name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "chat" => Some(Self::chat()),
            "analyst" => Some(Self::analyst()),
            "concise" => Some(Self::concise()),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), RagError> {
        if self.top_k == 0 {
            return Err(RagError::InvalidTopK);
        }
        Ok(())
    }

    fn apply(mut self, overrides: &ProfileOverrides) -> Self {
        if let Some(v) = &overrides.embedding_model {
            self.embedding_model.clone_from(v);
        }
        if let Some(v) = &overrides.generation_model {
            self.generation_model.clone_from(v);
        }
        if let Some(v) = overrides.template {
            self.template = v;
        }
        if let Some(v) = overrides.top_k {
            self.top_k = v;
        }
        if let Some(v) = overrides.context_budget {
            self.context_budget = v;
        }
        if let Some(v) = &overrides.chunk_separator {
            self.chunk_separator.clone_from(v);
        }
        if let Some(v) = overrides.max_new_tokens {
            self.max_new_tokens = v;
        }
        if let Some(v) = overrides.sampling {
            self.sampling = v;
        }
        if let Some(v) = overrides.extraction {
            self.extraction = v;
        }
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::chat()
    }
}

/// A `[profiles.<name>]` table. Unset fields fall back to the built-in
/// profile of the same name, then to `base`, then to `chat`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileOverrides {
    pub base: Option<String>,
    pub embedding_model: Option<String>,
    pub generation_model: Option<String>,
    pub template: Option<PromptTemplate>,
    pub top_k: Option<usize>,
    pub context_budget: Option<usize>,
    pub chunk_separator: Option<String>,
    pub max_new_tokens: Option<u32>,
    pub sampling: Option<SamplingMode>,
    pub extraction: Option<AnswerExtraction>,
}

/// Locations of the corpus artifacts and the embedding model cache.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathSettings {
    pub index: PathBuf,
    pub chunks: PathBuf,
    pub model_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            index: PathBuf::from("vector_store/faiss_index.bin"),
            chunks: PathBuf::from("vector_store/text_chunks.json"),
            model_dir: app_dir().join("models"),
        }
    }
}

/// Where and how to reach the generation model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorSettings {
    /// OpenAI-compatible completions URL.
    pub endpoint: String,
    /// Environment variable holding a bearer token, if the server needs one.
    pub api_key_env: Option<String>,
    /// Request timeout; unset means wait indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key_env: None,
            timeout_secs: None,
        }
    }
}

impl GeneratorSettings {
    pub fn endpoint_url(&self) -> anyhow::Result<Url> {
        Url::parse(&self.endpoint)
            .with_context(|| format!("Invalid generator endpoint: {}", self.endpoint))
    }

    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Application settings, read from TOML.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub paths: PathSettings,
    pub generator: GeneratorSettings,
    pub profiles: BTreeMap<String, ProfileOverrides>,
}

/// `~/.creditrust`, or `.creditrust` in the working directory when there is
/// no home directory.
pub fn app_dir() -> PathBuf {
    dirs::home_dir().map_or_else(|| PathBuf::from(APP_DIR_NAME), |home| home.join(APP_DIR_NAME))
}

impl Settings {
    /// Default location of the settings file.
    pub fn default_path() -> PathBuf {
        app_dir().join("config.toml")
    }

    /// Parse settings from TOML text. Relative artifact paths are resolved
    /// against `base_dir`.
    pub fn from_toml(text: &str, base_dir: &Path) -> anyhow::Result<Self> {
        let mut settings: Self = toml::from_str(text).context("Failed to parse settings")?;
        for path in [
            &mut settings.paths.index,
            &mut settings.paths.chunks,
            &mut settings.paths.model_dir,
        ] {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        }
        Ok(settings)
    }

    /// Read a settings file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml(&text, base_dir)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }

    /// Use `explicit` if given, else the default settings file if it exists,
    /// else built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let default_path = Self::default_path();
        if default_path.is_file() {
            debug!(path = %default_path.display(), "Using default settings file");
            return Self::load(&default_path);
        }
        debug!("No settings file found, using defaults");
        Ok(Self::default())
    }

    /// Resolve a profile by name, applying any overrides from the settings
    /// file.
    pub fn profile(&self, name: &str) -> anyhow::Result<PipelineConfig> {
        let overrides = self.profiles.get(name);
        let base = match PipelineConfig::builtin(name) {
            Some(config) => config,
            None => {
                let Some(overrides) = overrides else {
                    anyhow::bail!(
                        "Unknown profile '{name}'. Available: {}",
                        self.profile_names().join(", ")
                    );
                };
                let base_name = overrides.base.as_deref().unwrap_or(DEFAULT_PROFILE);
                PipelineConfig::builtin(base_name).with_context(|| {
                    format!("Profile '{name}' has unknown base '{base_name}'")
                })?
            }
        };
        let config = match overrides {
            Some(overrides) => base.apply(overrides),
            None => base,
        };
        config.validate()?;
        Ok(config)
    }

    /// Built-in profiles followed by any extra profiles from the settings
    /// file.
    pub fn profile_names(&self) -> Vec<String> {
        let mut names: Vec<String> = BUILTIN_PROFILES.iter().map(|n| (*n).to_string()).collect();
        for name in self.profiles.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }
}
