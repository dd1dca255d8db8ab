// Model download helper for ONNX models.
//
// Downloads two models from HuggingFace:
// 1. bert-base-NER: named-entity tagging (~110MB quantized)
// 2. all-MiniLM-L6-v2: token embeddings for concept matching (~90MB)
//
// Files are stored in a platform-appropriate directory
// (~/.local/share/redactor/models/ on Linux) so they persist across runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// HuggingFace repo for the NER model.
///
/// bert-base-NER uses CoNLL labels (PER, LOC, ORG, MISC) and never tags
/// dates, so DATE relies on the date patterns. Any token-classification repo
/// with OntoNotes labels (PERSON, DATE, GPE) and the same file layout can be
/// set through `REDACTOR_NER_MODEL_URL` to add model-tagged dates.
pub const DEFAULT_NER_URL: &str = "https://huggingface.co/Xenova/bert-base-NER/resolve/main";

/// HuggingFace repo for the embedding model.
pub const DEFAULT_EMBEDDING_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";

/// A file to fetch: path in the remote repo, name on disk, and whether it's
/// large enough to deserve a progress bar.
struct ModelFile {
    remote: &'static str,
    local: &'static str,
    large: bool,
}

const NER_FILES: &[ModelFile] = &[
    ModelFile {
        remote: "config.json",
        local: "config.json",
        large: false,
    },
    ModelFile {
        remote: "tokenizer.json",
        local: "tokenizer.json",
        large: false,
    },
    ModelFile {
        remote: "onnx/model_quantized.onnx",
        local: "model.onnx",
        large: true,
    },
];

const EMBEDDING_FILES: &[ModelFile] = &[
    ModelFile {
        remote: "tokenizer.json",
        local: "tokenizer.json",
        large: false,
    },
    ModelFile {
        remote: "onnx/model.onnx",
        local: "model.onnx",
        large: true,
    },
];

/// Returns the default directory for storing model files.
/// Uses the platform data directory: ~/.local/share/redactor/models/ on Linux.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("redactor")
        .join("models")
}

/// Subdirectory within the model dir for the NER model.
pub fn ner_model_dir(base: &Path) -> PathBuf {
    base.join("ner")
}

/// Subdirectory within the model dir for the embedding model.
pub fn embedding_model_dir(base: &Path) -> PathBuf {
    base.join("all-MiniLM-L6-v2")
}

/// Check whether every NER model file exists.
pub fn ner_files_present(base: &Path) -> bool {
    files_present(&ner_model_dir(base), NER_FILES)
}

/// Check whether every embedding model file exists.
pub fn embedding_files_present(base: &Path) -> bool {
    files_present(&embedding_model_dir(base), EMBEDDING_FILES)
}

fn files_present(dir: &Path, files: &[ModelFile]) -> bool {
    files.iter().all(|f| dir.join(f.local).exists())
}

/// Download the NER model into `<base>/ner/`. Skips files that already exist.
pub async fn download_ner_model(base: &Path, repo_url: &str) -> Result<()> {
    eprintln!("\nNER model (bert-base-NER):");
    download_files(&ner_model_dir(base), repo_url, NER_FILES).await
}

/// Download the embedding model into `<base>/all-MiniLM-L6-v2/`.
pub async fn download_embedding_model(base: &Path, repo_url: &str) -> Result<()> {
    eprintln!("\nEmbedding model (all-MiniLM-L6-v2):");
    download_files(&embedding_model_dir(base), repo_url, EMBEDDING_FILES).await
}

async fn download_files(dir: &Path, repo_url: &str, files: &[ModelFile]) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create model directory: {}", dir.display()))?;

    for file in files {
        let dest = dir.join(file.local);
        if dest.exists() {
            info!(file = file.local, "Model file already exists, skipping");
            eprintln!("  {} (already exists)", file.local);
            continue;
        }
        eprintln!("  Downloading {}...", file.remote);
        download_file(
            &format!("{}/{}", repo_url.trim_end_matches('/'), file.remote),
            &dest,
            file.large,
        )
        .await?;
    }

    Ok(())
}

/// Download a single file from a URL to a local path.
/// If `show_progress` is true, display a progress bar.
async fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let total_size = response.content_length();

    let pb = if show_progress {
        let pb = if let Some(size) = total_size {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .expect("valid template")
                    .progress_chars("=> "),
            );
            pb
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("    {spinner} {bytes}")
                    .expect("valid template"),
            );
            pb
        };
        Some(pb)
    } else {
        None
    };

    let bytes = response
        .bytes()
        .await
        .context("Failed to read response body")?;

    if let Some(ref pb) = pb {
        pb.set_position(bytes.len() as u64);
    }

    // A partial file must never sit under the final name.
    let partial = dest.with_extension("part");
    std::fs::write(&partial, &bytes)
        .with_context(|| format!("Failed to write {}", partial.display()))?;
    std::fs::rename(&partial, dest)
        .with_context(|| format!("Failed to move {} into place", dest.display()))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!("Downloaded {} to {}", url, dest.display());
    Ok(())
}
