// End-to-end tests for the censoring pipeline.
//
// The NER model and the embedder are replaced with in-memory fakes so these
// run without model files or network access. File I/O goes through
// temporary directories.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use redactor::censor::{blocks_for, Category, CategorySet, CensorRequest};
use redactor::concepts::traits::{TokenEmbedder, TokenEmbedding};
use redactor::entities::traits::{EntityLabel, EntityTagger, TaggedEntity};
use redactor::models::ModelProvider;
use redactor::pipeline::{self, process_file, BatchRequest};
use redactor::stats::{Stats, StatsDestination};

// ============================================================
// Fakes
// ============================================================

/// Tags every occurrence of a fixed list of strings.
struct DictionaryTagger {
    entries: Vec<(&'static str, EntityLabel)>,
}

#[async_trait]
impl EntityTagger for DictionaryTagger {
    async fn tag(&self, text: &str) -> Result<Vec<TaggedEntity>> {
        let mut entities = Vec::new();
        for &(needle, label) in &self.entries {
            for (start, found) in text.match_indices(needle) {
                entities.push(TaggedEntity {
                    label,
                    text: found.to_string(),
                    start,
                    end: start + found.len(),
                });
            }
        }
        entities.sort_by_key(|e| e.start);
        Ok(entities)
    }
}

/// Maps known words onto fixed axes so similarity is either 1.0 or 0.0.
struct AxisEmbedder;

fn axis(word: &str) -> Vec<f64> {
    let cleaned: String = word
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    let mut v = vec![0.0; 3];
    let i = match cleaned.as_str() {
        "university" | "college" => 0,
        "hospital" | "clinic" => 1,
        _ => 2,
    };
    v[i] = 1.0;
    v
}

#[async_trait]
impl TokenEmbedder for AxisEmbedder {
    async fn embed_phrases(&self, phrases: &[String]) -> Result<Vec<Vec<f64>>> {
        Ok(phrases
            .iter()
            .map(|p| axis(p.split_whitespace().next().unwrap_or("")))
            .collect())
    }

    async fn embed_tokens(&self, sentence: &str) -> Result<Vec<TokenEmbedding>> {
        Ok(sentence
            .split_whitespace()
            .filter(|w| w.chars().any(char::is_alphanumeric))
            .map(|w| TokenEmbedding {
                text: w.to_string(),
                vector: axis(w),
            })
            .collect())
    }
}

struct FakeModels {
    tagger: Arc<dyn EntityTagger>,
    embedder: Arc<dyn TokenEmbedder>,
    tagger_calls: AtomicUsize,
    embedder_calls: AtomicUsize,
}

impl FakeModels {
    fn new(entries: Vec<(&'static str, EntityLabel)>) -> Self {
        Self {
            tagger: Arc::new(DictionaryTagger { entries }),
            embedder: Arc::new(AxisEmbedder),
            tagger_calls: AtomicUsize::new(0),
            embedder_calls: AtomicUsize::new(0),
        }
    }

    fn people() -> Self {
        Self::new(vec![
            ("John", EntityLabel::Person),
            ("Jane", EntityLabel::Person),
            ("Gainesville", EntityLabel::Location),
            ("Florida", EntityLabel::Location),
            ("15th August", EntityLabel::Date),
            ("25th July", EntityLabel::Date),
        ])
    }
}

#[async_trait]
impl ModelProvider for FakeModels {
    async fn tagger(&self) -> Result<Arc<dyn EntityTagger>> {
        self.tagger_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.tagger))
    }

    async fn embedder(&self) -> Result<Arc<dyn TokenEmbedder>> {
        self.embedder_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.embedder))
    }
}

/// Models that can never be initialized.
struct UnavailableModels;

#[async_trait]
impl ModelProvider for UnavailableModels {
    async fn tagger(&self) -> Result<Arc<dyn EntityTagger>> {
        anyhow::bail!("NER model unavailable")
    }

    async fn embedder(&self) -> Result<Arc<dyn TokenEmbedder>> {
        anyhow::bail!("embedding model unavailable")
    }
}

// ============================================================
// Helpers
// ============================================================

fn categories(list: &[Category]) -> CategorySet {
    list.iter().copied().collect()
}

fn write_input(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

async fn censor_text(
    text: &str,
    set: CategorySet,
    concepts: &[&str],
    models: &dyn ModelProvider,
) -> String {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let input = write_input(input_dir.path(), "doc.txt", text);
    let request = CensorRequest {
        input,
        output_dir: output_dir.path().to_path_buf(),
        categories: set,
        concepts: concepts.iter().map(|c| c.to_string()).collect(),
    };
    let mut stats = Stats::new();
    let report = process_file(&request, models, &mut stats).await.unwrap();
    std::fs::read_to_string(report.output).unwrap()
}

// ============================================================
// Scenarios
// ============================================================

#[tokio::test]
async fn phone_number_is_blocked_with_punctuation_kept() {
    let text = "John's phone number is 555-222-1234.";
    let out = censor_text(text, categories(&[Category::Phone]), &[], &FakeModels::people()).await;
    assert_eq!(out, "John's phone number is ████████████.");
    assert_eq!(out.chars().count(), text.chars().count());
}

#[tokio::test]
async fn every_phone_number_is_removed() {
    let text = "John's phone number is 555-222-1234. Jane's phone number is 555-665-5678. Please contact them.";
    let out = censor_text(text, categories(&[Category::Phone]), &[], &FakeModels::people()).await;
    assert!(!out.contains("555-222-1234"));
    assert!(!out.contains("555-665-5678"));
    // Names are untouched when PERSON is off
    assert!(out.contains("John's"));
}

#[tokio::test]
async fn birthday_dates_are_removed() {
    let text = "John's birthday is on 15th August. Jane's birthday is on 25th July.";
    let out = censor_text(text, categories(&[Category::Date]), &[], &FakeModels::people()).await;
    assert!(!out.contains("15th August"));
    assert!(!out.contains("25th July"));
    assert!(out.contains("John's birthday is on "));
}

#[tokio::test]
async fn regex_alone_removes_day_month_dates() {
    // A tagger without DATE labels, like the default CoNLL model
    let models = FakeModels::new(vec![("John", EntityLabel::Person)]);
    let out = censor_text(
        "John's birthday is on 15th August.",
        categories(&[Category::Date]),
        &[],
        &models,
    )
    .await;
    assert_eq!(out, "John's birthday is on ███████████.");
}

#[tokio::test]
async fn names_are_removed() {
    let text = "John's phone number is 555-222-1234. Jane's phone number is 555-665-5678.";
    let out = censor_text(text, categories(&[Category::Person]), &[], &FakeModels::people()).await;
    assert!(!out.contains("John"));
    assert!(!out.contains("Jane"));
    assert!(out.contains("555-222-1234"));
}

#[tokio::test]
async fn email_local_part_is_removed_with_names() {
    let out = censor_text(
        "Write to jdoe42@example.com soon.",
        categories(&[Category::Person]),
        &[],
        &FakeModels::new(vec![]),
    )
    .await;
    assert_eq!(out, "Write to ██████@example.com soon.");
}

#[tokio::test]
async fn street_address_and_locations_are_removed() {
    let text = "This is the official address of Reitz Union - 655 Reitz Union Dr, Gainesville, Florida 32611";
    let out = censor_text(text, categories(&[Category::Address]), &[], &FakeModels::people()).await;
    assert!(!out.contains("655 Reitz Union Dr"));
    assert!(!out.contains("Gainesville"));
    assert!(!out.contains("Florida"));
    assert_eq!(out.chars().count(), text.chars().count());
}

#[tokio::test]
async fn concept_sentence_is_blocked_entirely() {
    let first = "I was admitted to the University of Florida last year.";
    let text = format!("{first} The weather was nice.");
    let out = censor_text(
        &text,
        categories(&[Category::Concept]),
        &["University"],
        &FakeModels::people(),
    )
    .await;
    assert_eq!(out, format!("{} The weather was nice.", blocks_for(first)));
}

#[tokio::test]
async fn concept_after_address_leaves_address_sentence() {
    let text = "I live at 12 Oak St. The University of Florida is great.";
    let out = censor_text(
        text,
        categories(&[Category::Concept]),
        &["University"],
        &FakeModels::people(),
    )
    .await;
    assert_eq!(
        out,
        format!(
            "I live at 12 Oak St. {}",
            blocks_for("The University of Florida is great.")
        )
    );
}

#[tokio::test]
async fn concept_matches_semantic_neighbour() {
    // "College" sits on the same axis as "University" in the fake embedder
    let text = "She teaches at a college downtown. Nothing else.";
    let out = censor_text(
        text,
        categories(&[Category::Concept]),
        &["University"],
        &FakeModels::people(),
    )
    .await;
    assert!(out.starts_with(&blocks_for("She teaches at a college downtown.")));
    assert!(out.ends_with("Nothing else."));
}

// ============================================================
// Properties
// ============================================================

#[tokio::test]
async fn censoring_twice_changes_nothing() {
    let models = FakeModels::people();
    let all = categories(&Category::ALL);
    let text = "John met Jane on 2024-07-28 at 12 Oak St.\nCall 555.222.1234 or mail jane@x.org. \
                The University of Florida sent a letter in March 2023.";
    let once = censor_text(text, all, &["University"], &models).await;
    let twice = censor_text(&once, all, &["University"], &models).await;
    assert_eq!(once, twice);
    assert_eq!(once.chars().count(), text.chars().count());
}

#[tokio::test]
async fn output_length_matches_input_for_multibyte_text() {
    let text = "Zoë called 555 222 1234 from Florida on 1 Jan 2020 - café closed.";
    let out = censor_text(text, categories(&Category::ALL), &["clinic"], &FakeModels::people()).await;
    assert_eq!(out.chars().count(), text.chars().count());
    assert_eq!(out.lines().count(), text.lines().count());
}

#[tokio::test]
async fn phone_only_never_loads_a_model() {
    let models = FakeModels::people();
    censor_text("555-222-1234", categories(&[Category::Phone]), &[], &models).await;
    assert_eq!(models.tagger_calls.load(Ordering::SeqCst), 0);
    assert_eq!(models.embedder_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn concept_category_without_phrases_skips_embedder() {
    let models = FakeModels::people();
    let text = "The University is big.";
    let out = censor_text(text, categories(&[Category::Concept]), &[], &models).await;
    assert_eq!(out, text);
    assert_eq!(models.embedder_calls.load(Ordering::SeqCst), 0);
}

// ============================================================
// Stats
// ============================================================

#[tokio::test]
async fn disabled_categories_read_zero() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        "a.txt",
        "John was born on 15th August. Call 555-222-1234 or 555-665-5678.",
    );
    let request = CensorRequest {
        input,
        output_dir: dir.path().join("out"),
        categories: categories(&[Category::Phone]),
        concepts: vec![],
    };
    std::fs::create_dir_all(&request.output_dir).unwrap();

    let mut stats = Stats::new();
    process_file(&request, &FakeModels::people(), &mut stats)
        .await
        .unwrap();

    assert_eq!(stats.total_files(), 1);
    assert_eq!(stats.count(Category::Phone), 2);
    assert_eq!(stats.count(Category::Person), 0);
    assert_eq!(stats.count(Category::Date), 0);
    assert_eq!(stats.count(Category::Address), 0);
    assert_eq!(stats.count(Category::Concept), 0);
}

#[tokio::test]
async fn stats_report_lists_outputs() {
    let dir = tempfile::tempdir().unwrap();
    write_input(dir.path(), "one.txt", "Jane called.");
    write_input(dir.path(), "two.txt", "John called.");
    let output_dir = dir.path().join("censored");

    let batch = BatchRequest {
        patterns: vec![format!("{}/*.txt", dir.path().display())],
        output_dir: output_dir.clone(),
        categories: categories(&[Category::Person]),
        concepts: vec![],
    };
    let mut stats = Stats::new();
    let outcome = pipeline::run(&batch, &FakeModels::people(), &mut stats)
        .await
        .unwrap();
    assert_eq!(outcome.processed.len(), 2);
    assert!(outcome.failed.is_empty());

    let report_path = dir.path().join("stats.txt");
    stats
        .finalize(&StatsDestination::File(report_path.clone()))
        .unwrap();
    let report = std::fs::read_to_string(report_path).unwrap();

    assert!(report.starts_with("Total processed files: 2\n\nCensored Terms:\nNames: 2\n"));
    assert!(report.contains("\nCensored Files:\n"));
    assert!(report.contains(&format!("File: {}", output_dir.join("one.txt.censored").display())));
    assert!(report.contains(&format!("File: {}", output_dir.join("two.txt.censored").display())));
}

// ============================================================
// Batch behavior and failures
// ============================================================

#[tokio::test]
async fn batch_creates_output_dir_and_names_files() {
    let dir = tempfile::tempdir().unwrap();
    write_input(dir.path(), "letter.md", "Call 555-222-1234");
    let output_dir = dir.path().join("nested").join("out");

    let batch = BatchRequest {
        patterns: vec![format!("{}/*.md", dir.path().display())],
        output_dir: output_dir.clone(),
        categories: categories(&[Category::Phone]),
        concepts: vec![],
    };
    let mut stats = Stats::new();
    pipeline::run(&batch, &FakeModels::people(), &mut stats)
        .await
        .unwrap();

    let written = std::fs::read_to_string(output_dir.join("letter.md.censored")).unwrap();
    assert_eq!(written, "Call ████████████");
}

#[tokio::test]
async fn unreadable_file_does_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    write_input(dir.path(), "good.txt", "Call 555-222-1234");
    std::fs::write(dir.path().join("bad.txt"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

    let batch = BatchRequest {
        patterns: vec![
            format!("{}/bad.txt", dir.path().display()),
            format!("{}/good.txt", dir.path().display()),
        ],
        output_dir: dir.path().join("out"),
        categories: categories(&[Category::Phone]),
        concepts: vec![],
    };
    let mut stats = Stats::new();
    let outcome = pipeline::run(&batch, &FakeModels::people(), &mut stats)
        .await
        .unwrap();

    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].input, dir.path().join("bad.txt"));
    assert_eq!(outcome.processed.len(), 1);
    assert_eq!(stats.total_files(), 1);
    assert_eq!(stats.count(Category::Phone), 1);
}

#[tokio::test]
async fn unavailable_model_fails_each_file_without_stats() {
    let dir = tempfile::tempdir().unwrap();
    write_input(dir.path(), "a.txt", "John called.");
    write_input(dir.path(), "b.txt", "Jane called.");

    let batch = BatchRequest {
        patterns: vec![format!("{}/*.txt", dir.path().display())],
        output_dir: dir.path().join("out"),
        categories: categories(&[Category::Person]),
        concepts: vec![],
    };
    let mut stats = Stats::new();
    let outcome = pipeline::run(&batch, &UnavailableModels, &mut stats)
        .await
        .unwrap();

    assert_eq!(outcome.failed.len(), 2);
    assert!(outcome.processed.is_empty());
    assert_eq!(stats.total_files(), 0);
    assert!(format!("{:#}", outcome.failed[0].error).contains("NER model unavailable"));
    assert!(!dir.path().join("out").join("a.txt.censored").exists());
}

#[tokio::test]
async fn unavailable_model_is_irrelevant_for_phones() {
    let dir = tempfile::tempdir().unwrap();
    write_input(dir.path(), "a.txt", "555-222-1234");

    let batch = BatchRequest {
        patterns: vec![format!("{}/a.txt", dir.path().display())],
        output_dir: dir.path().join("out"),
        categories: categories(&[Category::Phone]),
        concepts: vec![],
    };
    let mut stats = Stats::new();
    let outcome = pipeline::run(&batch, &UnavailableModels, &mut stats)
        .await
        .unwrap();
    assert_eq!(outcome.processed.len(), 1);
}

#[tokio::test]
async fn pattern_with_no_matches_yields_empty_batch() {
    let dir = tempfile::tempdir().unwrap();
    let batch = BatchRequest {
        patterns: vec![format!("{}/*.nothing", dir.path().display())],
        output_dir: dir.path().join("out"),
        categories: categories(&[Category::Phone]),
        concepts: vec![],
    };
    let mut stats = Stats::new();
    let outcome = pipeline::run(&batch, &FakeModels::people(), &mut stats)
        .await
        .unwrap();
    assert!(outcome.processed.is_empty());
    assert!(outcome.failed.is_empty());
    assert_eq!(stats.total_files(), 0);
}
