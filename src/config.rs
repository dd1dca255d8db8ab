use std::env;
use std::path::PathBuf;

use anyhow::Result;

use crate::models::download;

/// Configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. CLI flags
/// override these values in main.rs.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory containing the ONNX model files
    pub model_dir: PathBuf,
    /// Base URL of the NER model repository
    pub ner_model_url: String,
    /// Base URL of the embedding model repository
    pub embedding_model_url: String,
    /// Never download missing models (REDACTOR_OFFLINE=1)
    pub offline: bool,
}

impl Config {
    /// Load configuration from environment variables. Everything has a default.
    pub fn load() -> Result<Self> {
        let model_dir = env::var("REDACTOR_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| download::default_model_dir());

        let offline = match env::var("REDACTOR_OFFLINE") {
            Ok(value) => parse_flag(&value)?,
            Err(_) => false,
        };

        Ok(Self {
            model_dir,
            ner_model_url: env::var("REDACTOR_NER_MODEL_URL")
                .unwrap_or_else(|_| download::DEFAULT_NER_URL.to_string()),
            embedding_model_url: env::var("REDACTOR_EMBEDDING_MODEL_URL")
                .unwrap_or_else(|_| download::DEFAULT_EMBEDDING_URL.to_string()),
            offline,
        })
    }
}

/// Parse a boolean environment flag.
fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("REDACTOR_OFFLINE must be true or false, got {other:?}"),
    }
}
