use std::path::PathBuf;

/// Return the embedding model cache directory for tests.
///
/// Checks `CREDITRUST_MODEL_DIR` first, falling back to `~/.creditrust/models/`.
pub fn model_dir() -> PathBuf {
    std::env::var("CREDITRUST_MODEL_DIR").map_or_else(
        |_| {
            dirs::home_dir()
                .expect("home dir")
                .join(".creditrust")
                .join("models")
        },
        PathBuf::from,
    )
}
