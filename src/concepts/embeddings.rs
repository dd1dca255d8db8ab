// Token and phrase embeddings using all-MiniLM-L6-v2.
//
// Concept phrases are mean-pooled into a single 384-dimensional vector, the
// same pooling the model was trained with. Sentence tokens keep their
// contextual vectors from the last hidden state, one per word (sub-word
// pieces are averaged), so a single word can be compared against a whole
// phrase.
//
// The model runs locally via ONNX with no API calls.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Encoding, Tokenizer, TruncationParams};
use tracing::debug;

use super::traits::{TokenEmbedder, TokenEmbedding};

/// Embedding dimension for all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: usize = 384;

/// Token embedder backed by a local ONNX sentence-transformer.
///
/// Arc<Mutex<Session>> for thread safety, Arc<Tokenizer> for shared
/// ownership across spawn_blocking.
pub struct OnnxTokenEmbedder {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
}

impl OnnxTokenEmbedder {
    /// Load the embedding model and tokenizer from the given directory.
    ///
    /// Expects `model.onnx` and `tokenizer.json` in the directory.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !model_path.exists() {
            anyhow::bail!("Embedding model not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Embedding tokenizer not found: {}", tokenizer_path.display());
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| {
                format!(
                    "Failed to load embedding model from {}",
                    model_path.display()
                )
            })?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load embedding tokenizer: {}", e))?;
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: 512,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure embedding tokenizer: {}", e))?;

        debug!("Loaded embedding model from {}", model_dir.display());

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
        })
    }
}

#[async_trait]
impl TokenEmbedder for OnnxTokenEmbedder {
    async fn embed_phrases(&self, phrases: &[String]) -> Result<Vec<Vec<f64>>> {
        if phrases.is_empty() {
            return Ok(Vec::new());
        }

        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let phrases = phrases.to_vec();

        tokio::task::spawn_blocking(move || {
            let (encodings, hidden, max_len) = run_model(&session, &tokenizer, &phrases)?;
            Ok(encodings
                .iter()
                .enumerate()
                .map(|(i, enc)| mean_pool(&hidden, i, max_len, enc.get_attention_mask()))
                .collect())
        })
        .await
        .context("spawn_blocking panicked")?
    }

    async fn embed_tokens(&self, sentence: &str) -> Result<Vec<TokenEmbedding>> {
        if sentence.trim().is_empty() {
            return Ok(Vec::new());
        }

        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let sentence = sentence.to_string();

        tokio::task::spawn_blocking(move || {
            let (encodings, hidden, _max_len) =
                run_model(&session, &tokenizer, std::slice::from_ref(&sentence))?;
            Ok(word_vectors(&sentence, &encodings[0], &hidden))
        })
        .await
        .context("spawn_blocking panicked")?
    }
}

/// Tokenize and run the model. Returns the encodings, the flat last hidden
/// state `[batch, max_len, EMBEDDING_DIM]`, and `max_len`.
fn run_model(
    session: &Arc<Mutex<Session>>,
    tokenizer: &Arc<Tokenizer>,
    texts: &[String],
) -> Result<(Vec<Encoding>, Vec<f32>, usize)> {
    let encodings: Vec<_> = texts
        .iter()
        .map(|t| {
            tokenizer
                .encode(t.as_str(), true)
                .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
        })
        .collect::<Result<Vec<_>>>()?;

    let batch_size = encodings.len();
    let max_len = encodings
        .iter()
        .map(|e| e.get_ids().len())
        .max()
        .unwrap_or(0);

    if max_len == 0 {
        return Ok((encodings, Vec::new(), 0));
    }

    // BERT inputs: token IDs (pad with 0), attention mask (0 for padding),
    // token_type_ids (all zeros for single-sentence input)
    let mut input_ids_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
    let mut attention_mask_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
    let mut token_type_ids_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);

    for enc in &encodings {
        let ids = enc.get_ids();
        let mask = enc.get_attention_mask();
        let seq_len = ids.len();

        input_ids_flat.extend(ids.iter().map(|&id| id as i64));
        attention_mask_flat.extend(mask.iter().map(|&m| m as i64));
        token_type_ids_flat.extend(std::iter::repeat_n(0i64, seq_len));

        let pad_len = max_len - seq_len;
        input_ids_flat.extend(std::iter::repeat_n(0i64, pad_len));
        attention_mask_flat.extend(std::iter::repeat_n(0i64, pad_len));
        token_type_ids_flat.extend(std::iter::repeat_n(0i64, pad_len));
    }

    let shape = [batch_size as i64, max_len as i64];

    let input_ids_tensor =
        Tensor::from_array((shape, input_ids_flat)).context("Failed to create input_ids tensor")?;
    let attention_mask_tensor = Tensor::from_array((shape, attention_mask_flat))
        .context("Failed to create attention_mask tensor")?;
    let token_type_ids_tensor = Tensor::from_array((shape, token_type_ids_flat))
        .context("Failed to create token_type_ids tensor")?;

    let hidden_states = {
        let mut session = session
            .lock()
            .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

        let outputs = session
            .run(ort::inputs! {
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "token_type_ids" => token_type_ids_tensor
            })
            .context("Embedding ONNX inference failed")?;

        let (_shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract embedding output tensor")?;

        data.to_vec()
    };

    if hidden_states.len() != batch_size * max_len * EMBEDDING_DIM {
        anyhow::bail!(
            "Embedding model returned {} values, expected {}",
            hidden_states.len(),
            batch_size * max_len * EMBEDDING_DIM
        );
    }

    debug!(batch_size, max_len, "Computed token embeddings");

    Ok((encodings, hidden_states, max_len))
}

/// Vector for token `j` of sequence `i`.
fn token_vector(hidden: &[f32], i: usize, j: usize, max_len: usize) -> &[f32] {
    let offset = (i * max_len + j) * EMBEDDING_DIM;
    &hidden[offset..offset + EMBEDDING_DIM]
}

/// Mean pooling: average token embeddings weighted by the attention mask.
fn mean_pool(hidden: &[f32], i: usize, max_len: usize, mask: &[u32]) -> Vec<f64> {
    let mut sum = vec![0.0_f64; EMBEDDING_DIM];
    let mut mask_sum = 0.0_f64;

    for (j, &m) in mask.iter().enumerate() {
        if m == 0 {
            continue;
        }
        mask_sum += m as f64;
        for (acc, &val) in sum.iter_mut().zip(token_vector(hidden, i, j, max_len)) {
            *acc += val as f64 * m as f64;
        }
    }

    if mask_sum > 0.0 {
        for val in &mut sum {
            *val /= mask_sum;
        }
    }
    sum
}

/// Group sub-word vectors of a single encoded sentence into per-word vectors.
fn word_vectors(sentence: &str, enc: &Encoding, hidden: &[f32]) -> Vec<TokenEmbedding> {
    let max_len = enc.get_ids().len();
    let mut words: Vec<(u32, usize, usize, Vec<Vec<f64>>)> = Vec::new();

    for (j, (&word_id, &(start, end))) in enc
        .get_word_ids()
        .iter()
        .zip(enc.get_offsets())
        .enumerate()
    {
        let Some(word) = word_id else {
            continue;
        };
        let vector: Vec<f64> = token_vector(hidden, 0, j, max_len)
            .iter()
            .map(|&v| v as f64)
            .collect();
        match words.last_mut() {
            Some((last, _, last_end, pieces)) if *last == word => {
                *last_end = end;
                pieces.push(vector);
            }
            _ => words.push((word, start, end, vec![vector])),
        }
    }

    words
        .into_iter()
        .filter_map(|(_, start, end, pieces)| {
            let text = sentence.get(start..end)?;
            text.chars().any(char::is_alphanumeric).then(|| TokenEmbedding {
                text: text.to_string(),
                vector: mean_embedding(&pieces),
            })
        })
        .collect()
}

/// Compute the mean of multiple embedding vectors.
pub fn mean_embedding(embeddings: &[Vec<f64>]) -> Vec<f64> {
    if embeddings.is_empty() {
        return vec![0.0; EMBEDDING_DIM];
    }

    let n = embeddings.len() as f64;
    let mut mean = vec![0.0_f64; EMBEDDING_DIM];

    for emb in embeddings {
        for (i, &val) in emb.iter().enumerate() {
            if i < EMBEDDING_DIM {
                mean[i] += val;
            }
        }
    }

    for val in &mut mean {
        *val /= n;
    }

    mean
}

/// Cosine similarity between two embedding vectors, clamped to 0.0..=1.0.
/// Mismatched or empty vectors score 0.0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    let denom = mag_a * mag_b;
    if denom < f64::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(0.0, 1.0)
    }
}
