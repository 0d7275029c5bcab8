pub mod ask;
pub mod chat;
pub mod corpus;
pub mod eval;
pub mod model;

use std::io::Write;

use creditrust_lib::pipeline::answer::Answer;

/// Print numbered source excerpts, `Chunk 1: ...` onwards.
fn write_sources<W: Write + ?Sized>(out: &mut W, answer: &Answer) -> std::io::Result<()> {
    if answer.sources.is_empty() {
        return Ok(());
    }
    writeln!(out, "Retrieved context:")?;
    for (i, source) in answer.sources.iter().enumerate() {
        writeln!(out, "Chunk {}: {source}", i + 1)?;
    }
    Ok(())
}
