pub mod answer;
pub mod context;
pub mod prompt;
pub mod retriever;
