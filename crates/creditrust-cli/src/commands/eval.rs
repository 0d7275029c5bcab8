use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use anyhow::Context;

use creditrust_lib::eval::{read_questions, run_evaluation, sample_questions, write_csv};
use creditrust_lib::output::ConsoleIO;
use creditrust_lib::runtime::Runtime;

/// Run the `creditrust eval` command.
pub fn run_eval<IN, OUT, ERR>(
    questions: Option<&Path>,
    output: &Path,
    profile: &str,
    runtime: &Runtime,
    io: &mut dyn ConsoleIO<IN, OUT, ERR>,
) -> anyhow::Result<()>
where
    IN: BufRead,
    OUT: Write,
    ERR: Write,
{
    let questions = match questions {
        Some(path) => read_questions(path)?,
        None => sample_questions(),
    };
    if questions.is_empty() {
        anyhow::bail!("No questions to evaluate.");
    }

    let pipeline = runtime.pipeline(profile)?;
    writeln!(
        io.stderr(),
        "Running evaluation on {} questions...",
        questions.len()
    )?;
    let rows = run_evaluation(&pipeline, &questions)?;

    for row in &rows {
        writeln!(io.stdout(), "Question: {}", row.question)?;
        writeln!(io.stdout(), "Answer: {}", row.answer)?;
        writeln!(io.stdout())?;
    }

    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    write_csv(&rows, BufWriter::new(file))?;
    writeln!(
        io.stdout(),
        "Evaluation results saved to {}",
        output.display()
    )?;
    Ok(())
}
