// Local ONNX named-entity tagger.
//
// Runs a BERT token-classification model (default: bert-base-NER) entirely
// on the local CPU. The label vocabulary comes from the model's config.json
// so OntoNotes-style models (PERSON/DATE/GPE) can be dropped in without code
// changes.
//
// Documents are tagged sentence by sentence: BERT accepts at most 512
// tokens, and a sentence is the natural unit an entity never crosses.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::debug;

use super::traits::{EntityLabel, EntityTagger, TaggedEntity};
use crate::detect::sentences;

/// BERT's maximum sequence length, special tokens included.
const MAX_SEQUENCE_LEN: usize = 512;

/// Sentences per forward pass.
const BATCH_SIZE: usize = 16;

/// The part of a HuggingFace config.json we need.
#[derive(Debug, Deserialize)]
struct ModelConfig {
    id2label: HashMap<String, String>,
}

/// Local ONNX-based entity tagger. Session and tokenizer sit behind Arc so
/// inference can move to spawn_blocking.
pub struct OnnxEntityTagger {
    // ort::Session::run takes &mut self
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    labels: Arc<Vec<String>>,
}

impl OnnxEntityTagger {
    /// Load the model, tokenizer, and label vocabulary from `model_dir`.
    ///
    /// Expects `model.onnx`, `tokenizer.json`, and `config.json`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let config_path = model_dir.join("config.json");

        for path in [&model_path, &tokenizer_path, &config_path] {
            if !path.exists() {
                anyhow::bail!("NER model file not found: {}", path.display());
            }
        }

        let config_json = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let labels = parse_label_vocabulary(&config_json)?;

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load NER model from {}", model_path.display()))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load NER tokenizer: {}", e))?;
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LEN,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure NER tokenizer truncation: {}", e))?;

        debug!(
            labels = labels.len(),
            "Loaded ONNX NER model from {}",
            model_dir.display()
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            labels: Arc::new(labels),
        })
    }
}

#[async_trait]
impl EntityTagger for OnnxEntityTagger {
    async fn tag(&self, text: &str) -> Result<Vec<TaggedEntity>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let labels = Arc::clone(&self.labels);
        let text = text.to_string();

        tokio::task::spawn_blocking(move || tag_sync(&session, &tokenizer, &labels, &text))
            .await
            .context("spawn_blocking panicked")?
    }
}

/// Read `id2label` from a config.json into an id-indexed label list.
pub fn parse_label_vocabulary(config_json: &str) -> Result<Vec<String>> {
    let config: ModelConfig =
        serde_json::from_str(config_json).context("Failed to parse NER model config.json")?;

    if config.id2label.is_empty() {
        anyhow::bail!("NER model config.json has an empty id2label map");
    }

    let mut labels = vec![String::new(); config.id2label.len()];
    for (id, label) in config.id2label {
        let index: usize = id
            .parse()
            .with_context(|| format!("Invalid label id in config.json: {id}"))?;
        let Some(slot) = labels.get_mut(index) else {
            anyhow::bail!("Label id {index} out of range in config.json");
        };
        *slot = label;
    }
    Ok(labels)
}

/// Synchronous tagging: split into sentences, run them in batches, then decode.
fn tag_sync(
    session: &Arc<Mutex<Session>>,
    tokenizer: &Arc<Tokenizer>,
    labels: &[String],
    text: &str,
) -> Result<Vec<TaggedEntity>> {
    let sentences = sentences::split(text);
    let num_labels = labels.len();
    let mut entities = Vec::new();

    for chunk in sentences.chunks(BATCH_SIZE) {
        let encodings: Vec<_> = chunk
            .iter()
            .map(|s| {
                tokenizer
                    .encode(s.text, true)
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
            continue;
        }

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

            // Pad to max_len (BERT pad token id = 0)
            let pad_len = max_len - seq_len;
            input_ids_flat.extend(std::iter::repeat_n(0i64, pad_len));
            attention_mask_flat.extend(std::iter::repeat_n(0i64, pad_len));
            token_type_ids_flat.extend(std::iter::repeat_n(0i64, pad_len));
        }

        let shape = [batch_size as i64, max_len as i64];

        let input_ids_tensor = Tensor::from_array((shape, input_ids_flat))
            .context("Failed to create input_ids tensor")?;
        let attention_mask_tensor = Tensor::from_array((shape, attention_mask_flat))
            .context("Failed to create attention_mask tensor")?;
        let token_type_ids_tensor = Tensor::from_array((shape, token_type_ids_flat))
            .context("Failed to create token_type_ids tensor")?;

        // Output is logits: [batch, seq_len, num_labels]
        let logits = {
            let mut session = session
                .lock()
                .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

            let outputs = session
                .run(ort::inputs! {
                    "input_ids" => input_ids_tensor,
                    "attention_mask" => attention_mask_tensor,
                    "token_type_ids" => token_type_ids_tensor
                })
                .context("NER ONNX inference failed")?;

            let (_shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .context("Failed to extract NER output tensor")?;

            data.to_vec()
        };

        if logits.len() != batch_size * max_len * num_labels {
            anyhow::bail!(
                "NER model returned {} logits, expected {} ({} labels in config.json)",
                logits.len(),
                batch_size * max_len * num_labels,
                num_labels
            );
        }

        for (i, (sentence, enc)) in chunk.iter().zip(&encodings).enumerate() {
            let predictions: Vec<TokenPrediction<'_>> = enc
                .get_word_ids()
                .iter()
                .zip(enc.get_offsets())
                .enumerate()
                .map(|(j, (&word_id, &offsets))| {
                    let offset = (i * max_len + j) * num_labels;
                    let row = &logits[offset..offset + num_labels];
                    TokenPrediction {
                        label: labels[argmax(row)].as_str(),
                        word_id,
                        offsets,
                    }
                })
                .collect();

            entities.extend(decode_entities(text, sentence.start, &predictions));
        }
    }

    debug!(
        sentences = sentences.len(),
        entities = entities.len(),
        "Tagged document"
    );

    Ok(entities)
}

/// One token's predicted label, with its word index and byte offsets
/// relative to the tagged sentence.
#[derive(Debug, Clone, Copy)]
pub struct TokenPrediction<'a> {
    pub label: &'a str,
    /// `None` for special tokens like [CLS] and [SEP].
    pub word_id: Option<u32>,
    pub offsets: (usize, usize),
}

/// Group token predictions into entities.
///
/// A word's label is the label of its first sub-word token. `B-`/`S-` always
/// opens a new entity, `I-`/`E-` continues an entity of the same kind (or
/// opens one), `O` closes. `base` is the sentence's offset into `source`.
pub fn decode_entities(
    source: &str,
    base: usize,
    tokens: &[TokenPrediction<'_>],
) -> Vec<TaggedEntity> {
    let mut entities = Vec::new();
    let mut current: Option<(&str, usize, usize)> = None;
    let mut last_word: Option<u32> = None;

    for token in tokens {
        let Some(word) = token.word_id else {
            continue;
        };
        let (start, end) = token.offsets;
        if start == end {
            continue;
        }

        if last_word == Some(word) {
            if let Some((_, _, current_end)) = current.as_mut() {
                *current_end = end;
            }
            continue;
        }
        last_word = Some(word);

        let (prefix, kind) = split_tag(token.label);
        match kind {
            None => close_entity(&mut current, source, base, &mut entities),
            Some(kind) => {
                let continues = !matches!(prefix, Some('B') | Some('S'))
                    && matches!(current, Some((open, _, _)) if open == kind);
                if continues {
                    if let Some((_, _, current_end)) = current.as_mut() {
                        *current_end = end;
                    }
                } else {
                    close_entity(&mut current, source, base, &mut entities);
                    current = Some((kind, start, end));
                }
            }
        }
    }
    close_entity(&mut current, source, base, &mut entities);
    entities
}

/// Split "B-PER" into (Some('B'), Some("PER")); "O" has no kind.
fn split_tag(tag: &str) -> (Option<char>, Option<&str>) {
    if tag.is_empty() || tag == "O" {
        return (None, None);
    }
    let bytes = tag.as_bytes();
    if bytes.len() > 2 && bytes[1] == b'-' {
        (Some(bytes[0] as char), Some(&tag[2..]))
    } else {
        (None, Some(tag))
    }
}

fn close_entity(
    current: &mut Option<(&str, usize, usize)>,
    source: &str,
    base: usize,
    entities: &mut Vec<TaggedEntity>,
) {
    let Some((kind, start, end)) = current.take() else {
        return;
    };
    let (start, end) = (base + start, base + end);
    if let Some(text) = source.get(start..end) {
        entities.push(TaggedEntity {
            label: EntityLabel::from_model_label(kind),
            text: text.to_string(),
            start,
            end,
        });
    }
}

fn argmax(row: &[f32]) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &v)| {
            if v > best.1 {
                (i, v)
            } else {
                best
            }
        })
        .0
}
