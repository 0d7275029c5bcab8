use std::io::Write;
use std::path::{Path, PathBuf};

/// Write `chunks` as a JSON array to `text_chunks.json` in `dir`.
///
/// Returns the path to the created file.
pub fn write_chunks_json(dir: &Path, chunks: &[&str]) -> PathBuf {
    let path = dir.join("text_chunks.json");
    let json = serde_json::to_string(chunks).unwrap();
    std::fs::write(&path, json).unwrap();
    path
}

/// Write `chunks` as a `chunked_metadata.csv` file in `dir`, with an id
/// column ahead of the `chunk_text` column.
///
/// Returns the path to the created file.
pub fn write_chunks_csv(dir: &Path, chunks: &[&str]) -> PathBuf {
    let path = dir.join("chunked_metadata.csv");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "complaint_id,chunk_text").unwrap();
    for (i, chunk) in chunks.iter().enumerate() {
        writeln!(f, "{i},\"{}\"", chunk.replace('"', "\"\"")).unwrap();
    }
    path
}

/// Write a newline-delimited question file named `questions.txt` in `dir`.
///
/// Returns the path to the created file.
pub fn write_questions(dir: &Path, questions: &[&str]) -> PathBuf {
    let path = dir.join("questions.txt");
    let mut f = std::fs::File::create(&path).unwrap();
    for question in questions {
        writeln!(f, "{question}").unwrap();
    }
    path
}
