// Single-file pipeline: read → detect → censor → write → record.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::censor::{self, Category, CategorySet, CensorRequest, EntitySpan};
use crate::concepts::ConceptMatcher;
use crate::models::ModelProvider;
use crate::stats::Stats;
use crate::{detect, entities};

/// What happened to one input file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Spans found per enabled category, in report order.
    pub counts: Vec<(Category, usize)>,
}

impl FileReport {
    pub fn total_terms(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }
}

/// Censor one file and record it in `stats`.
///
/// Stats are only touched once the censored copy is on disk, so a failed
/// file leaves no trace in the report.
pub async fn process_file(
    request: &CensorRequest,
    models: &dyn ModelProvider,
    stats: &mut Stats,
) -> Result<FileReport> {
    let text = std::fs::read_to_string(&request.input)
        .with_context(|| format!("Failed to read {}", request.input.display()))?;

    let spans = collect_spans(&text, &request.categories, &request.concepts, models).await?;
    let censored = censor::censor(&text, &spans);

    let output = request.output_path()?;
    std::fs::write(&output, &censored)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let counts = count_by_category(&spans, &request.categories);
    for &(category, count) in &counts {
        stats.record(category, count);
    }
    stats.record_file(&output);

    info!(
        input = %request.input.display(),
        output = %output.display(),
        spans = spans.len(),
        "Censored file"
    );

    Ok(FileReport {
        input: request.input.clone(),
        output,
        counts,
    })
}

/// Run every enabled detector over `text` and return the spans in
/// redaction order.
pub async fn collect_spans(
    text: &str,
    categories: &CategorySet,
    concepts: &[String],
    models: &dyn ModelProvider,
) -> Result<Vec<EntitySpan>> {
    let mut spans = Vec::new();

    if categories.contains(Category::Concept) && concepts.iter().any(|c| !c.trim().is_empty()) {
        let embedder = models.embedder().await?;
        let matcher = ConceptMatcher::new(embedder.as_ref(), concepts).await?;
        let sentences = matcher.matching_sentences(text).await?;
        debug!(sentences = sentences.len(), "Concept sentences found");
        spans.extend(
            sentences
                .into_iter()
                .map(|s| EntitySpan::new(Category::Concept, s)),
        );
    }

    if categories.needs_entity_model() {
        let tagger = models.tagger().await?;
        let tagged = tagger.tag(text).await?;
        debug!(entities = tagged.len(), "Model entities found");
        spans.extend(entities::entity_spans(&tagged, categories));
    }

    spans.extend(detect::pattern_spans(text, categories));

    Ok(censor::order_spans(spans))
}

/// Count spans per enabled category. Disabled categories are left out.
pub fn count_by_category(spans: &[EntitySpan], categories: &CategorySet) -> Vec<(Category, usize)> {
    categories
        .iter()
        .map(|category| {
            let n = spans.iter().filter(|s| s.category == category).count();
            (category, n)
        })
        .collect()
}
