//! Text generation: the seam the answer pipeline calls after building a
//! prompt, plus extraction of the answer from whatever the model returns.

pub mod completion;

use serde::Deserialize;
use thiserror::Error;

use crate::config::ANSWER_MARKER;

/// Error raised inside a generator invocation. Never retried; the pipeline
/// turns it into a visible warning answer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct GenerationFailure {
    message: String,
}

impl GenerationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Whether the generator samples or decodes greedily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    #[default]
    Stochastic,
    Deterministic,
}

/// How the answer is cut out of the raw generator output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerExtraction {
    /// Keep the text after the last `Answer:` marker.
    #[default]
    SplitOnMarker,
    /// Drop the prompt when the model echoes it back.
    StripPrompt,
    /// The output is already only the continuation.
    Continuation,
}

/// Per-call generation parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Generation model identifier understood by the backend.
    pub model: String,
    pub max_new_tokens: u32,
    pub sampling: SamplingMode,
}

/// A pretrained sequence model producing a continuation of a prompt.
pub trait Generate: Send + Sync {
    fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerationFailure>;
}

/// Cut the final answer out of raw generator output, trimmed of surrounding
/// whitespace.
pub fn extract_answer(generated: &str, prompt: &str, extraction: AnswerExtraction) -> String {
    let answer = match extraction {
        AnswerExtraction::SplitOnMarker => generated.rsplit(ANSWER_MARKER).next().unwrap_or(generated),
        AnswerExtraction::StripPrompt => generated.strip_prefix(prompt).unwrap_or(generated),
        AnswerExtraction::Continuation => generated,
    };
    answer.trim().to_string()
}
