// Model download helper for the local ONNX classifier.
//
// Fetches the quantized model and its tokenizer from a HuggingFace repo
// (the configured preset, unless CIVILITY_MODEL_URL points elsewhere).
// Files land in a platform-appropriate directory, one subdirectory per
// preset (~/.local/share/civility/models/multilingual/ on Linux), so they
// persist across runs and switching presets never mixes files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// Local file names inside the model directory. The remote model path varies
// by repo; it is always saved as MODEL_FILE.
pub const MODEL_FILE: &str = "model_quantized.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Returns the default directory for storing a preset's model files.
pub fn default_model_dir(preset: &str) -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("civility")
        .join("models")
        .join(preset)
}

/// Check whether both required model files exist.
pub fn model_files_present(dir: &Path) -> bool {
    dir.join(MODEL_FILE).exists() && dir.join(TOKENIZER_FILE).exists()
}

/// Total size of the model files on disk, if present.
pub fn model_size_bytes(dir: &Path) -> Option<u64> {
    let model = std::fs::metadata(dir.join(MODEL_FILE)).ok()?;
    let tokenizer = std::fs::metadata(dir.join(TOKENIZER_FILE)).ok()?;
    Some(model.len() + tokenizer.len())
}

/// Download the toxicity model into `dir` from `base_url`. `remote_model`
/// is the ONNX file's path inside the repo.
///
/// Skips files that already exist. Shows a progress bar for the model.
pub async fn download_model(dir: &Path, base_url: &str, remote_model: &str) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create model directory: {}", dir.display()))?;

    let base_url = base_url.trim_end_matches('/');
    println!("\nToxicity model ({}):", base_url);

    let remote_model = remote_model.trim_start_matches('/');
    for (remote, file, show_progress) in [
        (TOKENIZER_FILE, TOKENIZER_FILE, false),
        (remote_model, MODEL_FILE, true),
    ] {
        let dest = dir.join(file);
        if dest.exists() {
            info!(file, "Model file already exists, skipping");
            println!("  {} (already exists)", file);
            continue;
        }
        println!("  Downloading {}...", remote);
        download_file(&format!("{}/{}", base_url, remote), &dest, show_progress).await?;
    }

    Ok(())
}

/// Download a single file from a URL to a local path.
async fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let client = reqwest::Client::new();
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let pb = if show_progress {
        Some(progress_bar(response.content_length())?)
    } else {
        None
    };

    // Write to a temp name first so an interrupted download never looks
    // like a complete model file.
    let partial = dest.with_extension("part");
    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await.context("Failed to read response body")? {
        bytes.extend_from_slice(&chunk);
        if let Some(ref pb) = pb {
            pb.set_position(bytes.len() as u64);
        }
    }

    std::fs::write(&partial, &bytes)
        .with_context(|| format!("Failed to write {}", partial.display()))?;
    std::fs::rename(&partial, dest)
        .with_context(|| format!("Failed to move download into {}", dest.display()))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!(bytes = bytes.len(), "Downloaded {} to {}", url, dest.display());
    Ok(())
}

fn progress_bar(total_size: Option<u64>) -> Result<ProgressBar> {
    let pb = match total_size {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .context("Invalid progress bar template")?
                    .progress_chars("=> "),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("    {spinner} {bytes}")
                    .context("Invalid progress spinner template")?,
            );
            pb
        }
    };
    Ok(pb)
}
