use std::fs::{self, File};
use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::Context;
use sha2::{Digest, Sha256};

use creditrust_lib::embedding::embedder::{Embedder, MODEL_FILES};
use creditrust_lib::output::ConsoleIO;
use creditrust_lib::runtime::Runtime;

/// Run the `creditrust model download` command.
pub fn run_model_download<IN, OUT, ERR>(
    model: &str,
    force: bool,
    runtime: &Runtime,
    io: &mut dyn ConsoleIO<IN, OUT, ERR>,
) -> anyhow::Result<()>
where
    IN: BufRead,
    OUT: Write,
    ERR: Write,
{
    let cache_dir = &runtime.settings.paths.model_dir;
    let model_dir = Embedder::model_dir(cache_dir, model);

    if force && model_dir.exists() {
        writeln!(io.stderr(), "Removing existing model files...")?;
        fs::remove_dir_all(&model_dir)?;
    }

    if !force && Embedder::is_downloaded(cache_dir, model) {
        writeln!(
            io.stdout(),
            "Model already downloaded at {}",
            model_dir.display()
        )?;
        return Ok(());
    }

    fs::create_dir_all(&model_dir)
        .with_context(|| format!("Failed to create {}", model_dir.display()))?;

    writeln!(io.stderr(), "Downloading {model}...")?;
    let api = hf_hub::api::sync::Api::new()?;
    let repo = api.model(model.to_string());

    for (remote_path, local_name) in MODEL_FILES {
        let dest = model_dir.join(local_name);
        if dest.exists() {
            writeln!(io.stderr(), "  {local_name} (cached)")?;
            continue;
        }
        let cached = repo
            .get(remote_path)
            .with_context(|| format!("Failed to download {remote_path} from {model}"))?;
        fs::copy(&cached, &dest)?;
        writeln!(io.stderr(), "  {local_name} sha256:{}", sha256_file(&dest)?)?;
    }

    writeln!(io.stdout(), "Model downloaded to {}", model_dir.display())?;
    Ok(())
}

fn sha256_file(path: &Path) -> anyhow::Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}
