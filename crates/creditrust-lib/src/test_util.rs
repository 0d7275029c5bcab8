//! Deterministic stand-ins for the embedding and generation models, so the
//! pipeline can be exercised without downloading anything.

use std::sync::Mutex;

use crate::config::DEFAULT_EMBEDDING_MODEL;
use crate::corpus::index::{FlatIndex, Metric};
use crate::corpus::store::CorpusStore;
use crate::embedding::TextEmbedder;
use crate::generation::{Generate, GenerationFailure, GenerationOptions};

/// Dimension of [`HashingEmbedder`] vectors.
pub const HASHING_DIMENSION: usize = 256;

/// Embeds text as an L2-normalised bag of hashed character trigrams.
///
/// Words sharing stems ("charge", "charged") land close together, which is
/// enough to make nearest-neighbour ordering meaningful in tests.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(HASHING_DIMENSION)
    }
}

impl TextEmbedder for HashingEmbedder {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];
        let lowered = text.to_lowercase();
        for word in lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let padded: Vec<char> = format!(" {word} ").chars().collect();
            for trigram in padded.windows(3) {
                let bucket = fnv1a(trigram) % self.dimension as u64;
                vector[usize::try_from(bucket).unwrap()] += 1.0;
            }
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    /// Reports the default model id so built-in profiles accept it.
    fn model_id(&self) -> &str {
        DEFAULT_EMBEDDING_MODEL
    }
}

fn fnv1a(chars: &[char]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for ch in chars {
        let mut buf = [0u8; 4];
        for byte in ch.encode_utf8(&mut buf).bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
    }
    hash
}

/// Build an L2 corpus whose vectors come from `embedder`.
pub fn corpus_from_texts(embedder: &dyn TextEmbedder, texts: &[&str]) -> CorpusStore {
    let mut index = FlatIndex::new(embedder.dimension(), Metric::L2);
    for text in texts {
        index.add(&embedder.embed(text).unwrap()).unwrap();
    }
    CorpusStore::from_parts(index, texts.iter().map(|t| (*t).to_string()).collect()).unwrap()
}

#[derive(Debug, Clone)]
enum Script {
    /// Return the prompt followed by a suffix, like a causal LM echoing its
    /// input.
    Echo(String),
    Fail(String),
}

#[derive(Debug, Default)]
struct Calls {
    prompts: Vec<String>,
    options: Vec<GenerationOptions>,
}

/// Generator that follows a fixed script and records every call.
#[derive(Debug)]
pub struct ScriptedGenerator {
    script: Script,
    calls: Mutex<Calls>,
}

impl ScriptedGenerator {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            calls: Mutex::new(Calls::default()),
        }
    }

    /// Echo the prompt followed by a canned answer.
    pub fn echo() -> Self {
        Self::echo_with(" Customers describe repeated charges.")
    }

    /// Echo the prompt followed by `suffix`.
    pub fn echo_with(suffix: &str) -> Self {
        Self::with_script(Script::Echo(suffix.to_string()))
    }

    /// Fail every call with `message`.
    pub fn failing(message: &str) -> Self {
        Self::with_script(Script::Fail(message.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().prompts.len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.calls.lock().unwrap().prompts.last().cloned()
    }

    pub fn last_options(&self) -> Option<GenerationOptions> {
        self.calls.lock().unwrap().options.last().cloned()
    }
}

impl Generate for ScriptedGenerator {
    fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerationFailure> {
        {
            let mut calls = self.calls.lock().unwrap();
            calls.prompts.push(prompt.to_string());
            calls.options.push(options.clone());
        }
        match &self.script {
            Script::Echo(suffix) => Ok(format!("{prompt}{suffix}")),
            Script::Fail(message) => Err(GenerationFailure::new(message.clone())),
        }
    }
}
