// Concept matching: redact whole sentences that talk about a concept.
//
// Each concept phrase is embedded once. Every word of every sentence is then
// compared against each concept; the first word that scores above
// SIMILARITY_THRESHOLD marks the whole sentence for redaction.

pub mod embeddings;
pub mod traits;

use anyhow::Result;
use tracing::debug;

use crate::detect::sentences;
use embeddings::cosine_similarity;
use traits::TokenEmbedder;

/// Similarity a word must exceed for its sentence to count as a match.
pub const SIMILARITY_THRESHOLD: f64 = 0.75;

/// Concept phrases embedded and ready to compare against documents.
pub struct ConceptMatcher<'a> {
    embedder: &'a dyn TokenEmbedder,
    concepts: Vec<(String, Vec<f64>)>,
}

impl<'a> ConceptMatcher<'a> {
    /// Embed each concept phrase once. Blank phrases are ignored.
    pub async fn new(embedder: &'a dyn TokenEmbedder, phrases: &[String]) -> Result<Self> {
        let phrases: Vec<String> = phrases
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        let vectors = embedder.embed_phrases(&phrases).await?;
        if vectors.len() != phrases.len() {
            anyhow::bail!(
                "Embedder returned {} vectors for {} concept phrases",
                vectors.len(),
                phrases.len()
            );
        }
        Ok(Self {
            embedder,
            concepts: phrases.into_iter().zip(vectors).collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Sentences of `text` that mention any concept, in document order.
    pub async fn matching_sentences<'t>(&self, text: &'t str) -> Result<Vec<&'t str>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let mut matched = Vec::new();
        for sentence in sentences::split(text) {
            let tokens = self.embedder.embed_tokens(sentence.text).await?;
            let hit = tokens.iter().find_map(|token| {
                self.concepts
                    .iter()
                    .find(|(_, concept)| cosine_similarity(&token.vector, concept) > SIMILARITY_THRESHOLD)
                    .map(|(phrase, _)| (token.text.as_str(), phrase.as_str()))
            });
            if let Some((token, concept)) = hit {
                debug!(
                    token,
                    concept,
                    sentence = %crate::output::truncate_chars(sentence.text, 60),
                    "Concept matched sentence"
                );
                matched.push(sentence.text);
            }
        }
        Ok(matched)
    }
}
