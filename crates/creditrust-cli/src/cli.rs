use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use creditrust_lib::config::{DEFAULT_EMBEDDING_MODEL, DEFAULT_EVAL_OUTPUT};
use creditrust_lib::settings::DEFAULT_PROFILE;

#[derive(Parser, Debug)]
#[command(
    name = "creditrust",
    about = "Answer questions about customer complaints from a local complaint index"
)]
pub struct Cli {
    /// Settings file. Defaults to ~/.creditrust/config.toml when present.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log as JSON lines instead of human-readable text.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Append JSON log lines to this file instead of stderr.
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer a single question.
    Ask {
        /// The question to answer.
        question: String,
        /// Pipeline profile to use.
        #[arg(long, default_value = DEFAULT_PROFILE)]
        profile: String,
        /// Number of complaint excerpts to retrieve.
        #[arg(long)]
        top_k: Option<usize>,
        /// Print the retrieved excerpts after the answer.
        #[arg(long)]
        show_sources: bool,
    },

    /// Interactive question-and-answer session on stdin.
    Chat {
        #[arg(long, default_value = DEFAULT_PROFILE)]
        profile: String,
        #[arg(long)]
        show_sources: bool,
        /// Save the conversation as JSON lines on exit.
        #[arg(long, value_name = "PATH")]
        save: Option<PathBuf>,
    },

    /// Answer a batch of questions and write a CSV sheet for review.
    Eval {
        /// Newline-delimited questions. Defaults to the built-in samples.
        #[arg(long, value_name = "PATH")]
        questions: Option<PathBuf>,
        /// Where to write the results.
        #[arg(long, value_name = "PATH", default_value = DEFAULT_EVAL_OUTPUT)]
        output: PathBuf,
        #[arg(long, default_value = "analyst")]
        profile: String,
    },

    /// Manage the embedding model.
    Model {
        #[command(subcommand)]
        model_command: ModelCommand,
    },

    /// Inspect the corpus artifacts.
    Corpus {
        #[command(subcommand)]
        corpus_command: CorpusCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ModelCommand {
    /// Download the embedding model files from Hugging Face.
    Download {
        /// Hugging Face repository of the model.
        #[arg(long, default_value = DEFAULT_EMBEDDING_MODEL)]
        model: String,
        /// Force re-download even if files already exist.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CorpusCommand {
    /// Print size, dimension, metric and fingerprint of the corpus.
    Info,
}
