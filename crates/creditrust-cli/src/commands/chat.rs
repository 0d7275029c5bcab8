use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use tracing::{debug, warn};

use creditrust_lib::output::ConsoleIO;
use creditrust_lib::runtime::Runtime;
use creditrust_lib::transcript::Transcript;

use super::write_sources;

const PROMPT: &str = "> ";

/// Run the `creditrust chat` command: read questions line by line until
/// `/quit` or end of input. A question that fails is reported on stderr and
/// left out of the transcript; the session goes on.
pub fn run_chat<IN, OUT, ERR>(
    profile: &str,
    show_sources: bool,
    save: Option<&Path>,
    runtime: &Runtime,
    io: &mut dyn ConsoleIO<IN, OUT, ERR>,
) -> anyhow::Result<()>
where
    IN: BufRead,
    OUT: Write,
    ERR: Write,
{
    let pipeline = runtime.pipeline(profile)?;
    let mut transcript = Transcript::new();

    writeln!(
        io.stderr(),
        "Ask about customer complaints. /clear resets the conversation, /quit exits."
    )?;

    loop {
        write!(io.stdout(), "{PROMPT}")?;
        io.stdout().flush()?;

        let Some(line) = io.read_line()? else {
            writeln!(io.stdout())?;
            break;
        };
        let question = line.trim();

        match question {
            "" => {}
            "/quit" | "/exit" => break,
            "/clear" => {
                transcript.clear();
                writeln!(io.stdout(), "Conversation cleared.")?;
            }
            _ => match pipeline.answer(question) {
                Ok(answer) => {
                    writeln!(io.stdout(), "{}", answer.text)?;
                    if show_sources {
                        write_sources(io.stdout(), &answer)?;
                    }
                    transcript.push_user(question);
                    transcript.push_assistant(answer.text);
                }
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "Question failed; session continues");
                    writeln!(io.stderr(), "Error: {err:#}")?;
                }
            },
        }
    }

    debug!(turns = transcript.len(), "Chat session ended");
    if let Some(path) = save {
        let file = File::create(path)
            .with_context(|| format!("Failed to create transcript file {}", path.display()))?;
        transcript.write_jsonl(BufWriter::new(file))?;
        writeln!(
            io.stderr(),
            "Saved {} turns to {}",
            transcript.len(),
            path.display()
        )?;
    }
    Ok(())
}
