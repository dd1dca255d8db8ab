// Batch driver: expand input globs and censor files one at a time.
//
// A failure on one file is logged and collected; the rest of the batch
// still runs.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::file::{process_file, FileReport};
use crate::censor::{CategorySet, CensorRequest};
use crate::models::ModelProvider;
use crate::stats::Stats;

/// One CLI invocation's worth of work.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub patterns: Vec<String>,
    pub output_dir: PathBuf,
    pub categories: CategorySet,
    pub concepts: Vec<String>,
}

/// A file that couldn't be censored.
#[derive(Debug)]
pub struct FileFailure {
    pub input: PathBuf,
    pub error: anyhow::Error,
}

/// Results of a batch, in processing order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub processed: Vec<FileReport>,
    pub failed: Vec<FileFailure>,
}

/// Expand glob patterns into file paths, in the order glob yields them.
///
/// Patterns that are invalid or match nothing contribute no files.
/// Directories and unreadable entries are skipped.
pub fn expand_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for pattern in patterns {
        let paths = match glob::glob(pattern) {
            Ok(paths) => paths,
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Invalid input pattern");
                continue;
            }
        };

        let before = files.len();
        for entry in paths {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(path) => debug!(path = %path.display(), "Skipping non-file match"),
                Err(e) => warn!(error = %e, "Unreadable glob match"),
            }
        }

        if files.len() == before {
            warn!(pattern = %pattern, "Input pattern matched no files");
        }
    }
    files
}

/// Censor every file the batch's patterns match.
///
/// Creates the output directory if needed; that is the only error this
/// returns. Per-file errors land in `BatchOutcome::failed`.
pub async fn run(
    batch: &BatchRequest,
    models: &dyn ModelProvider,
    stats: &mut Stats,
) -> Result<BatchOutcome> {
    std::fs::create_dir_all(&batch.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            batch.output_dir.display()
        )
    })?;

    let inputs = expand_inputs(&batch.patterns);
    info!(files = inputs.len(), "Expanded input patterns");

    let mut outcome = BatchOutcome::default();
    for input in inputs {
        let request = CensorRequest {
            input: input.clone(),
            output_dir: batch.output_dir.clone(),
            categories: batch.categories,
            concepts: batch.concepts.clone(),
        };

        match process_file(&request, models, stats).await {
            Ok(report) => outcome.processed.push(report),
            Err(error) => {
                let message = format!("{error:#}");
                warn!(input = %input.display(), error = %message, "Failed to process file");
                outcome.failed.push(FileFailure { input, error });
            }
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_inputs_skips_dirs_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::create_dir(dir.path().join("sub.txt")).unwrap();

        let patterns = vec![
            format!("{}/*.txt", dir.path().display()),
            format!("{}/*.none", dir.path().display()),
            "[".to_string(),
        ];
        let mut files = expand_inputs(&patterns);
        files.sort();
        assert_eq!(
            files,
            vec![dir.path().join("a.txt"), dir.path().join("b.txt")]
        );
    }
}
