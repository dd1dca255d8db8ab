// Model lifecycle: load each model once per process, fetching it on first miss.
//
// The ModelProvider trait hands the pipeline shared handles to the tagger
// and the embedder. OnnxModels loads them lazily from the model directory;
// when loading fails and downloads are allowed, it fetches the model files
// and tries exactly once more. A failed attempt leaves the cache empty, so
// the next file gets its own attempt.

pub mod download;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::concepts::embeddings::OnnxTokenEmbedder;
use crate::concepts::traits::TokenEmbedder;
use crate::config::Config;
use crate::entities::onnx::OnnxEntityTagger;
use crate::entities::traits::EntityTagger;

/// Source of the models the pipeline needs.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// The named-entity tagger, initialized on first call.
    async fn tagger(&self) -> Result<Arc<dyn EntityTagger>>;

    /// The token embedder, initialized on first call.
    async fn embedder(&self) -> Result<Arc<dyn TokenEmbedder>>;
}

/// Process-wide cache of the local ONNX models.
pub struct OnnxModels {
    model_dir: PathBuf,
    ner_url: String,
    embedding_url: String,
    auto_download: bool,
    tagger: OnceCell<Arc<dyn EntityTagger>>,
    embedder: OnceCell<Arc<dyn TokenEmbedder>>,
}

impl OnnxModels {
    pub fn new(config: &Config) -> Self {
        Self {
            model_dir: config.model_dir.clone(),
            ner_url: config.ner_model_url.clone(),
            embedding_url: config.embedding_model_url.clone(),
            auto_download: !config.offline,
            tagger: OnceCell::new(),
            embedder: OnceCell::new(),
        }
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    async fn init_tagger(&self) -> Result<Arc<dyn EntityTagger>> {
        let dir = download::ner_model_dir(&self.model_dir);
        match OnnxEntityTagger::load(&dir) {
            Ok(tagger) => Ok(Arc::new(tagger)),
            Err(e) if self.auto_download => {
                warn!(error = %e, "NER model unavailable, downloading");
                download::download_ner_model(&self.model_dir, &self.ner_url)
                    .await
                    .context("Failed to download NER model")?;
                let tagger = OnnxEntityTagger::load(&dir)?;
                info!("Loaded NER model after download");
                Ok(Arc::new(tagger))
            }
            Err(e) if !download::ner_files_present(&self.model_dir) => Err(e.context(format!(
                "NER model files missing from {} and downloads are disabled",
                dir.display()
            ))),
            Err(e) => Err(e.context("NER model unavailable and downloads are disabled")),
        }
    }

    async fn init_embedder(&self) -> Result<Arc<dyn TokenEmbedder>> {
        let dir = download::embedding_model_dir(&self.model_dir);
        match OnnxTokenEmbedder::load(&dir) {
            Ok(embedder) => Ok(Arc::new(embedder)),
            Err(e) if self.auto_download => {
                warn!(error = %e, "Embedding model unavailable, downloading");
                download::download_embedding_model(&self.model_dir, &self.embedding_url)
                    .await
                    .context("Failed to download embedding model")?;
                let embedder = OnnxTokenEmbedder::load(&dir)?;
                info!("Loaded embedding model after download");
                Ok(Arc::new(embedder))
            }
            Err(e) if !download::embedding_files_present(&self.model_dir) => {
                Err(e.context(format!(
                    "Embedding model files missing from {} and downloads are disabled",
                    dir.display()
                )))
            }
            Err(e) => Err(e.context("Embedding model unavailable and downloads are disabled")),
        }
    }
}

#[async_trait]
impl ModelProvider for OnnxModels {
    async fn tagger(&self) -> Result<Arc<dyn EntityTagger>> {
        self.tagger
            .get_or_try_init(|| self.init_tagger())
            .await
            .map(Arc::clone)
    }

    async fn embedder(&self) -> Result<Arc<dyn TokenEmbedder>> {
        self.embedder
            .get_or_try_init(|| self.init_embedder())
            .await
            .map(Arc::clone)
    }
}
