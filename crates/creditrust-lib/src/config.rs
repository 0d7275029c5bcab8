/// Embedding dimension for all-MiniLM-L6-v2.
pub const EMBEDDING_DIMENSION: usize = 384;

/// Hugging Face identifier of the default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Identifier of the default generation model served by the completions
/// endpoint.
pub const DEFAULT_GENERATION_MODEL: &str = "gpt2";

/// Default number of top-k chunks handed to the context assembler.
pub const DEFAULT_TOP_K: usize = 5;

/// Maximum number of characters of assembled context passed to the
/// generator. Longer context is cut at this many characters, possibly
/// mid-chunk.
pub const DEFAULT_CONTEXT_BUDGET: usize = 1500;

/// Maximum number of tokens the generator may produce per answer.
pub const DEFAULT_MAX_NEW_TOKENS: u32 = 150;

/// Separator placed between retrieved chunks when assembling context.
pub const DEFAULT_CHUNK_SEPARATOR: &str = "\n";

/// Marker the generator continues from. Also used to split an echoed prompt
/// off the generated text.
pub const ANSWER_MARKER: &str = "Answer:";

/// Answer returned when retrieval finds nothing to ground a response on.
pub const NO_CONTEXT_ANSWER: &str = "I don't have enough information to answer that question.";

/// Prefix of the answer returned when the generator fails.
pub const GENERATION_WARNING_PREFIX: &str = "⚠️ Error generating response:";

/// Number of retrieved sources recorded per row of a batch evaluation.
pub const EVAL_TOP_SOURCES: usize = 2;

/// Default output path of a batch evaluation run.
pub const DEFAULT_EVAL_OUTPUT: &str = "rag_evaluation_results.csv";

/// Name of the application home directory under `$HOME`.
pub const APP_DIR_NAME: &str = ".creditrust";
