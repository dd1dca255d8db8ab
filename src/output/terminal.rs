// Colored terminal output for per-file results.
//
// Everything here goes to stderr: stdout is reserved for `--stats stdout`.

use colored::Colorize;

use crate::pipeline::{BatchOutcome, FileFailure, FileReport};

/// One line per censored file.
pub fn display_file_report(report: &FileReport) {
    let breakdown: Vec<String> = report
        .counts
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(category, n)| format!("{} {}", n, category.report_name().to_lowercase()))
        .collect();
    let detail = if breakdown.is_empty() {
        "nothing censored".dimmed().to_string()
    } else {
        breakdown.join(", ")
    };
    eprintln!(
        "  {} {} -> {}  ({})",
        "✓".green(),
        report.input.display(),
        report.output.display(),
        detail
    );
}

/// One line per failed file, with the full error chain.
pub fn display_failure(failure: &FileFailure) {
    eprintln!(
        "  {} Error processing file {}: {}",
        "✗".red(),
        failure.input.display(),
        format!("{:#}", failure.error).red()
    );
}

/// Per-file lines followed by a one-line summary.
pub fn display_outcome(outcome: &BatchOutcome) {
    for report in &outcome.processed {
        display_file_report(report);
    }
    for failure in &outcome.failed {
        display_failure(failure);
    }

    if outcome.processed.is_empty() && outcome.failed.is_empty() {
        eprintln!("{}", "No input files matched.".yellow());
        return;
    }

    let terms: usize = outcome.processed.iter().map(FileReport::total_terms).sum();
    let summary = format!(
        "Censored {} file(s), {} term(s).",
        outcome.processed.len(),
        terms
    );
    if outcome.failed.is_empty() {
        eprintln!("\n{}", summary.bold());
    } else {
        eprintln!(
            "\n{} {}",
            summary.bold(),
            format!("{} file(s) failed.", outcome.failed.len()).red()
        );
    }
}
