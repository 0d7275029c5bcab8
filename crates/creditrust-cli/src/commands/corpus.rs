use std::io::{BufRead, Write};

use creditrust_lib::corpus::store::CorpusStore;
use creditrust_lib::output::ConsoleIO;
use creditrust_lib::runtime::Runtime;

/// Run the `creditrust corpus info` command. Only the corpus artifacts are
/// read; no model is loaded.
pub fn run_corpus_info<IN, OUT, ERR>(
    runtime: &Runtime,
    io: &mut dyn ConsoleIO<IN, OUT, ERR>,
) -> anyhow::Result<()>
where
    IN: BufRead,
    OUT: Write,
    ERR: Write,
{
    let paths = &runtime.settings.paths;
    let corpus = CorpusStore::load(&paths.index, &paths.chunks)?;

    let out = io.stdout();
    writeln!(out, "Index:       {}", paths.index.display())?;
    writeln!(out, "Chunks:      {}", paths.chunks.display())?;
    writeln!(out, "Vectors:     {}", corpus.len())?;
    writeln!(out, "Dimension:   {}", corpus.dimension())?;
    writeln!(out, "Metric:      {}", corpus.index().metric())?;
    writeln!(out, "Fingerprint: {}", corpus.fingerprint())?;
    Ok(())
}
