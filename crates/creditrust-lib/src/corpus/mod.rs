//! The immutable corpus: a nearest-neighbour index over chunk embeddings and
//! the chunk texts aligned with it, position for position.

pub mod chunks;
pub mod index;
pub mod store;

use std::fs;
use std::path::Path;

use crate::error::RagError;

/// Read an artifact file. Anything that is not a regular file counts as
/// missing; other read failures are I/O errors, never corruption.
pub(crate) fn read_artifact(path: &Path) -> Result<Vec<u8>, RagError> {
    if !path.is_file() {
        return Err(RagError::NotFound {
            path: path.to_path_buf(),
        });
    }
    fs::read(path).map_err(|source| RagError::Io {
        path: path.to_path_buf(),
        source,
    })
}
