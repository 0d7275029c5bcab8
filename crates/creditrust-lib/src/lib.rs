pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod eval;
pub mod generation;
pub mod output;
pub mod pipeline;
pub mod runtime;
pub mod settings;
pub mod transcript;

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;
