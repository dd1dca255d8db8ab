// Token embedder trait: the seam between concept matching and the model.

use anyhow::Result;
use async_trait::async_trait;

/// One word of a sentence and its contextual embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenEmbedding {
    pub text: String,
    pub vector: Vec<f64>,
}

/// Trait for embedding models used by the concept matcher.
#[async_trait]
pub trait TokenEmbedder: Send + Sync {
    /// One pooled vector per phrase, in input order.
    async fn embed_phrases(&self, phrases: &[String]) -> Result<Vec<Vec<f64>>>;

    /// One vector per word of `sentence`. Punctuation-only words are skipped.
    async fn embed_tokens(&self, sentence: &str) -> Result<Vec<TokenEmbedding>>;
}
