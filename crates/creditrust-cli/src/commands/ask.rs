use std::io::{BufRead, Write};

use creditrust_lib::output::ConsoleIO;
use creditrust_lib::runtime::Runtime;

use super::write_sources;

/// Run the `creditrust ask` command.
pub fn run_ask<IN, OUT, ERR>(
    question: &str,
    profile: &str,
    top_k: Option<usize>,
    show_sources: bool,
    runtime: &Runtime,
    io: &mut dyn ConsoleIO<IN, OUT, ERR>,
) -> anyhow::Result<()>
where
    IN: BufRead,
    OUT: Write,
    ERR: Write,
{
    let question = question.trim();
    if question.is_empty() {
        anyhow::bail!("Question must not be empty.");
    }

    let mut config = runtime.settings.profile(profile)?;
    if let Some(k) = top_k {
        config.top_k = k;
    }
    let pipeline = runtime.pipeline_for(config)?;
    let answer = pipeline.answer(question)?;

    writeln!(io.stdout(), "{}", answer.text)?;
    if show_sources {
        writeln!(io.stdout())?;
        write_sources(io.stdout(), &answer)?;
    }
    Ok(())
}
