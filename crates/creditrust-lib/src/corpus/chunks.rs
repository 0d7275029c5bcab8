use std::path::Path;

use crate::error::RagError;

/// Column holding chunk text in tabular chunk artifacts.
pub const CHUNK_TEXT_COLUMN: &str = "chunk_text";

/// On-disk layout of the chunk sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkFormat {
    /// A JSON array of strings.
    Json,
    /// A CSV file with a `chunk_text` column.
    Csv,
}

impl ChunkFormat {
    /// Pick the format from the file extension. Anything that is not `.csv`
    /// is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Json,
        }
    }
}

/// Parse a chunk sequence. `path` is only used for error messages.
pub fn parse_chunks(bytes: &[u8], format: ChunkFormat, path: &Path) -> Result<Vec<String>, RagError> {
    match format {
        ChunkFormat::Json => serde_json::from_slice::<Vec<String>>(bytes)
            .map_err(|e| RagError::corrupt(path, format!("expected a JSON array of strings: {e}"))),
        ChunkFormat::Csv => parse_csv(bytes, path),
    }
}

fn parse_csv(bytes: &[u8], path: &Path) -> Result<Vec<String>, RagError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers = reader
        .headers()
        .map_err(|e| RagError::corrupt(path, e.to_string()))?;
    let column = headers
        .iter()
        .position(|h| h == CHUNK_TEXT_COLUMN)
        .ok_or_else(|| RagError::corrupt(path, format!("missing `{CHUNK_TEXT_COLUMN}` column")))?;

    reader
        .records()
        .enumerate()
        .map(|(row, record)| {
            let record = record.map_err(|e| RagError::corrupt(path, e.to_string()))?;
            record.get(column).map(str::to_string).ok_or_else(|| {
                RagError::corrupt(path, format!("row {} has no `{CHUNK_TEXT_COLUMN}` value", row + 1))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(ChunkFormat::from_path(Path::new("a/text_chunks.json")), ChunkFormat::Json);
        assert_eq!(ChunkFormat::from_path(Path::new("chunked_metadata.CSV")), ChunkFormat::Csv);
        assert_eq!(ChunkFormat::from_path(Path::new("chunks")), ChunkFormat::Json);
    }

    #[test]
    fn parse_json_array() {
        let chunks = parse_chunks(
            br#"["Card charged twice", "Loan approved late"]"#,
            ChunkFormat::Json,
            Path::new("chunks.json"),
        )
        .unwrap();
        assert_eq!(chunks, vec!["Card charged twice", "Loan approved late"]);
    }

    #[test]
    fn parse_json_rejects_non_string_entries() {
        let err = parse_chunks(br#"[1, 2]"#, ChunkFormat::Json, Path::new("chunks.json"))
            .unwrap_err();
        assert!(matches!(err, RagError::CorruptArtifact { .. }));
    }

    #[test]
    fn parse_csv_selects_chunk_text_column() {
        let csv = "complaint_id,product,chunk_text\n\
                   1,Credit card,\"Charged twice, no refund\"\n\
                   2,Personal loan,Loan approved late\n";
        let chunks = parse_chunks(csv.as_bytes(), ChunkFormat::Csv, Path::new("m.csv")).unwrap();
        assert_eq!(chunks, vec!["Charged twice, no refund", "Loan approved late"]);
    }

    #[test]
    fn parse_csv_without_column_is_corrupt() {
        let err = parse_chunks(b"id,text\n1,hello\n", ChunkFormat::Csv, Path::new("m.csv"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Corrupt artifact m.csv: missing `chunk_text` column"
        );
    }

    #[test]
    fn parse_empty_json_array() {
        let chunks = parse_chunks(b"[]", ChunkFormat::Json, Path::new("chunks.json")).unwrap();
        assert!(chunks.is_empty());
    }
}
