// Run statistics: per-category counters and the list of censored files.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::censor::Category;

/// Where the final report goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsDestination {
    Stdout,
    Stderr,
    File(PathBuf),
}

impl FromStr for StatsDestination {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "stdout" => StatsDestination::Stdout,
            "stderr" => StatsDestination::Stderr,
            path => StatsDestination::File(PathBuf::from(path)),
        })
    }
}

/// Counters for one invocation.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    total_files: usize,
    terms: [usize; Category::COUNT],
    censored_files: Vec<PathBuf>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` censored terms to a category.
    pub fn record(&mut self, category: Category, count: usize) {
        self.terms[category.index()] += count;
    }

    /// Count a processed file and remember where its censored copy went.
    pub fn record_file(&mut self, output: &Path) {
        self.total_files += 1;
        self.censored_files.push(output.to_path_buf());
    }

    pub fn total_files(&self) -> usize {
        self.total_files
    }

    pub fn count(&self, category: Category) -> usize {
        self.terms[category.index()]
    }

    pub fn censored_files(&self) -> &[PathBuf] {
        &self.censored_files
    }

    /// The report text, in its fixed layout.
    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing to a String can't fail
        let _ = writeln!(out, "Total processed files: {}", self.total_files);
        let _ = writeln!(out);
        let _ = writeln!(out, "Censored Terms:");
        for category in Category::ALL {
            let _ = writeln!(out, "{}: {}", category.report_name(), self.count(category));
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Censored Files:");
        for file in &self.censored_files {
            let _ = writeln!(out, "File: {}", file.display());
        }
        out
    }

    /// Write the report to its destination.
    pub fn finalize(&self, destination: &StatsDestination) -> Result<()> {
        let report = self.render();
        match destination {
            StatsDestination::Stdout => {
                let mut stdout = std::io::stdout().lock();
                stdout
                    .write_all(report.as_bytes())
                    .context("Failed to write stats to stdout")?;
                stdout.flush().context("Failed to flush stdout")?;
            }
            StatsDestination::Stderr => {
                std::io::stderr()
                    .lock()
                    .write_all(report.as_bytes())
                    .context("Failed to write stats to stderr")?;
            }
            StatsDestination::File(path) => {
                std::fs::write(path, report)
                    .with_context(|| format!("Failed to write stats to {}", path.display()))?;
            }
        }
        Ok(())
    }
}
