pub mod cli;
pub mod commands;
pub mod logging;

#[cfg(test)]
pub mod test_util;

use std::io::{BufRead, Write};

use clap::Parser;

use creditrust_lib::output::ConsoleIO;
use creditrust_lib::runtime::Runtime;
use creditrust_lib::settings::Settings;

use cli::{Cli, Command, CorpusCommand, ModelCommand};
use logging::LogOptions;

/// Process entry point: parse args (exiting on `--help` or usage errors),
/// set up logging, load settings and dispatch.
pub fn run<IN, OUT, ERR>(args: &[&str], io: &mut dyn ConsoleIO<IN, OUT, ERR>) -> anyhow::Result<()>
where
    IN: BufRead,
    OUT: Write,
    ERR: Write,
{
    let cli = Cli::parse_from(args);
    logging::init(&LogOptions {
        verbose: cli.verbose,
        json: cli.log_json,
        file: cli.log_file.clone(),
    })?;
    let settings = Settings::discover(cli.config.as_deref())?;
    let runtime = Runtime::new(settings);
    dispatch(cli, &runtime, io)
}

/// Parse args and dispatch against an already-built runtime.
pub fn try_run<IN, OUT, ERR>(
    args: &[&str],
    runtime: &Runtime,
    io: &mut dyn ConsoleIO<IN, OUT, ERR>,
) -> anyhow::Result<()>
where
    IN: BufRead,
    OUT: Write,
    ERR: Write,
{
    let cli = Cli::try_parse_from(args)?;
    dispatch(cli, runtime, io)
}

fn dispatch<IN, OUT, ERR>(
    cli: Cli,
    runtime: &Runtime,
    io: &mut dyn ConsoleIO<IN, OUT, ERR>,
) -> anyhow::Result<()>
where
    IN: BufRead,
    OUT: Write,
    ERR: Write,
{
    match cli.command {
        Command::Ask {
            question,
            profile,
            top_k,
            show_sources,
        } => commands::ask::run_ask(&question, &profile, top_k, show_sources, runtime, io),
        Command::Chat {
            profile,
            show_sources,
            save,
        } => commands::chat::run_chat(&profile, show_sources, save.as_deref(), runtime, io),
        Command::Eval {
            questions,
            output,
            profile,
        } => commands::eval::run_eval(questions.as_deref(), &output, &profile, runtime, io),
        Command::Model { model_command } => match model_command {
            ModelCommand::Download { model, force } => {
                commands::model::run_model_download(&model, force, runtime, io)
            }
        },
        Command::Corpus { corpus_command } => match corpus_command {
            CorpusCommand::Info => commands::corpus::run_corpus_info(runtime, io),
        },
    }
}
