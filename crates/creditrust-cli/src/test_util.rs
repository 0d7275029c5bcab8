use std::sync::Arc;

use creditrust_lib::corpus::index::{FlatIndex, Metric};
use creditrust_lib::corpus::store::CorpusStore;
use creditrust_lib::generation::Generate;
use creditrust_lib::runtime::{Runtime, SharedModels};
use creditrust_lib::settings::Settings;
use creditrust_lib::test_util::{
    HASHING_DIMENSION, HashingEmbedder, ScriptedGenerator, corpus_from_texts,
};

/// Complaint excerpts shared by the command tests.
pub const COMPLAINTS: &[&str] = &[
    "Card charged twice",
    "Card charged twice again",
    "Loan approved late",
];

/// A [`Runtime`] whose models are the hashing embedder over `texts` and
/// `generator`.
pub fn runtime_with(texts: &[&str], generator: Arc<dyn Generate>) -> Runtime {
    let embedder = HashingEmbedder::default();
    let corpus = corpus_from_texts(&embedder, texts);
    Runtime::with_models(
        Settings::default(),
        SharedModels {
            corpus: Arc::new(corpus),
            embedder: Arc::new(embedder),
            generator,
        },
    )
}

/// A [`Runtime`] over [`COMPLAINTS`] with an echoing generator.
pub fn runtime_with_complaints() -> (Runtime, Arc<ScriptedGenerator>) {
    let generator = Arc::new(ScriptedGenerator::echo());
    let runtime = runtime_with(COMPLAINTS, Arc::clone(&generator) as Arc<dyn Generate>);
    (runtime, generator)
}

/// A [`Runtime`] over an empty corpus.
pub fn runtime_with_empty_corpus() -> (Runtime, Arc<ScriptedGenerator>) {
    let generator = Arc::new(ScriptedGenerator::echo());
    let corpus = CorpusStore::from_parts(FlatIndex::new(HASHING_DIMENSION, Metric::L2), Vec::new())
        .unwrap();
    let runtime = Runtime::with_models(
        Settings::default(),
        SharedModels {
            corpus: Arc::new(corpus),
            embedder: Arc::new(HashingEmbedder::default()),
            generator: Arc::clone(&generator) as Arc<dyn Generate>,
        },
    );
    (runtime, generator)
}
