use std::sync::Arc;

use tracing::{debug, info, warn};

use super::context::assemble_context;
use super::retriever::Retriever;
use crate::config::{GENERATION_WARNING_PREFIX, NO_CONTEXT_ANSWER};
use crate::corpus::store::CorpusStore;
use crate::embedding::TextEmbedder;
use crate::error::RagError;
use crate::generation::{Generate, GenerationOptions, extract_answer};
use crate::settings::PipelineConfig;

/// How an answer was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The generator produced the answer from retrieved context.
    Generated,
    /// Retrieval found nothing; the canned answer was returned.
    NoContext,
    /// The generator failed; the answer is a warning message.
    GenerationFailed,
}

/// Final output of one question.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    /// Full texts of the retrieved chunks, nearest first, before the context
    /// was truncated for the generator.
    pub sources: Vec<String>,
    pub outcome: AnswerOutcome,
}

impl Answer {
    fn no_context() -> Self {
        Self {
            text: NO_CONTEXT_ANSWER.to_string(),
            sources: Vec::new(),
            outcome: AnswerOutcome::NoContext,
        }
    }

    /// Split into `(answer, sources)`.
    pub fn into_parts(self) -> (String, Vec<String>) {
        (self.text, self.sources)
    }
}

/// Retrieval-augmented answering over a loaded corpus.
///
/// Immutable once built; every call works only on call-local values, so one
/// pipeline can serve concurrent callers.
#[derive(Clone)]
pub struct AnswerPipeline {
    corpus: Arc<CorpusStore>,
    embedder: Arc<dyn TextEmbedder>,
    generator: Arc<dyn Generate>,
    config: PipelineConfig,
}

impl AnswerPipeline {
    /// Assemble a pipeline, checking that the embedder and the index agree on
    /// dimension and that the configuration is usable.
    pub fn new(
        corpus: Arc<CorpusStore>,
        embedder: Arc<dyn TextEmbedder>,
        generator: Arc<dyn Generate>,
        config: PipelineConfig,
    ) -> Result<Self, RagError> {
        config.validate()?;
        if embedder.dimension() != corpus.dimension() {
            return Err(RagError::DimensionMismatch {
                expected: corpus.dimension(),
                actual: embedder.dimension(),
            });
        }
        Ok(Self {
            corpus,
            embedder,
            generator,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn corpus(&self) -> &CorpusStore {
        &self.corpus
    }

    /// Answer `question` from the corpus.
    ///
    /// Embedding failures and dimension mismatches propagate. An empty
    /// retrieval short-circuits to a canned answer without calling the
    /// generator, and a generator failure becomes a warning answer.
    pub fn answer(&self, question: &str) -> anyhow::Result<Answer> {
        debug!(question_len = question.len(), "EMBEDDING");
        let query = self.embedder.embed(question)?;

        debug!(top_k = self.config.top_k, "RETRIEVING");
        let retrieved = Retriever::new(&self.corpus).search(&query, self.config.top_k)?;

        if retrieved.is_empty() {
            info!("NO_CONTEXT: retrieval returned no chunks");
            return Ok(Answer::no_context());
        }

        for (rank, chunk) in retrieved.iter().enumerate() {
            debug!(
                rank = rank + 1,
                position = chunk.position,
                distance = chunk.distance,
                "Retrieved chunk"
            );
        }

        let sources: Vec<&str> = retrieved.iter().map(|c| c.text).collect();
        let context = assemble_context(
            &sources,
            &self.config.chunk_separator,
            self.config.context_budget,
        );
        debug!(
            chunks = sources.len(),
            context_chars = context.chars().count(),
            budget = self.config.context_budget,
            "ASSEMBLING"
        );

        let prompt = self.config.template.build(&context, question);
        debug!(prompt_len = prompt.len(), template = ?self.config.template, "PROMPTING");

        let options = GenerationOptions {
            model: self.config.generation_model.clone(),
            max_new_tokens: self.config.max_new_tokens,
            sampling: self.config.sampling,
        };
        debug!(model = %options.model, "GENERATING");
        let (text, outcome) = match self.generator.generate(&prompt, &options) {
            Ok(generated) => (
                extract_answer(&generated, &prompt, self.config.extraction),
                AnswerOutcome::Generated,
            ),
            Err(failure) => {
                warn!(error = %failure, "Generation failed");
                (
                    format!("{GENERATION_WARNING_PREFIX} {failure}"),
                    AnswerOutcome::GenerationFailed,
                )
            }
        };

        info!(
            sources = sources.len(),
            answer_len = text.len(),
            outcome = ?outcome,
            "DONE"
        );

        Ok(Answer {
            text,
            sources: sources.into_iter().map(str::to_string).collect(),
            outcome,
        })
    }
}
