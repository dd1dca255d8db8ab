use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use redactor::censor::{Category, CategorySet};
use redactor::config::Config;
use redactor::models::OnnxModels;
use redactor::pipeline::{self, BatchRequest};
use redactor::stats::{Stats, StatsDestination};

/// Redactor: censor sensitive information in plain-text documents.
///
/// Writes a `<name>.censored` copy of every input file with names, dates,
/// phone numbers, addresses, or concept sentences blocked out.
#[derive(Parser, Debug)]
#[command(name = "redactor", version, about)]
struct Cli {
    /// Input files, as one or more glob patterns
    #[arg(long, num_args = 1.., required = true, value_name = "GLOB")]
    input: Vec<String>,

    /// Output directory for censored files (created if missing)
    #[arg(long, value_name = "DIR")]
    output: PathBuf,

    /// Censor person names (and email local-parts)
    #[arg(long)]
    names: bool,

    /// Censor dates
    #[arg(long)]
    dates: bool,

    /// Censor phone numbers
    #[arg(long)]
    phones: bool,

    /// Censor addresses and locations
    #[arg(long)]
    address: bool,

    /// Censor every sentence about this concept (repeatable)
    #[arg(long = "concept", value_name = "PHRASE")]
    concepts: Vec<String>,

    /// Where to write statistics: stdout, stderr, or a file path
    #[arg(long, default_value = "stderr", value_name = "DEST")]
    stats: StatsDestination,

    /// Directory holding the ONNX models (overrides REDACTOR_MODEL_DIR)
    #[arg(long, value_name = "DIR")]
    model_dir: Option<PathBuf>,

    /// Never download missing models
    #[arg(long)]
    offline: bool,
}

impl Cli {
    fn categories(&self) -> CategorySet {
        let mut set = CategorySet::empty();
        for (enabled, category) in [
            (self.names, Category::Person),
            (self.dates, Category::Date),
            (self.phones, Category::Phone),
            (self.address, Category::Address),
            (!self.concepts.is_empty(), Category::Concept),
        ] {
            if enabled {
                set.insert(category);
            }
        }
        set
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Structured logging on stderr so `--stats stdout` stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("redactor=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(dir) = &cli.model_dir {
        config.model_dir = dir.clone();
    }
    if cli.offline {
        config.offline = true;
    }

    let categories = cli.categories();
    if categories.is_empty() {
        warn!("No categories selected, censored copies will match their inputs");
    }
    let models = OnnxModels::new(&config);

    let enabled: Vec<String> = categories.iter().map(|c| c.to_string()).collect();
    info!(
        categories = %enabled.join(","),
        concepts = cli.concepts.len(),
        model_dir = %models.model_dir().display(),
        "Starting redaction"
    );

    let batch = BatchRequest {
        patterns: cli.input.clone(),
        output_dir: cli.output.clone(),
        categories,
        concepts: cli.concepts.clone(),
    };

    let mut stats = Stats::new();

    let outcome = pipeline::run(&batch, &models, &mut stats).await?;
    redactor::output::terminal::display_outcome(&outcome);

    stats.finalize(&cli.stats)?;

    Ok(())
}
