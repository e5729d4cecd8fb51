use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::embedding::hash::DEFAULT_DIMENSION;

const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    Hash,
    Remote,
    Minilm,
}

impl FromStr for EmbeddingBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hash" => Ok(Self::Hash),
            "remote" => Ok(Self::Remote),
            "minilm" => Ok(Self::Minilm),
            other => bail!("EMBEDDING_BACKEND must be 'hash', 'remote' or 'minilm', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if a variable is present but malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub embedding_backend: EmbeddingBackend,
    pub embedding_dimension: usize,
    pub embedding_url: Option<String>,
    pub embedding_model: String,
    /// Hugging Face revision of `embedding_model` loaded by the minilm backend.
    pub embedding_revision: String,
    pub embedding_api_key: Option<String>,
    /// JSON file overriding the built-in skills vocabulary and section headings.
    pub parser_config_path: Option<PathBuf>,
    pub bulk_max_concurrency: usize,
    pub bulk_item_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            embedding_backend: EmbeddingBackend::Hash,
            embedding_dimension: DEFAULT_DIMENSION,
            embedding_url: None,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_revision: "main".to_string(),
            embedding_api_key: None,
            parser_config_path: None,
            bulk_max_concurrency: 4,
            bulk_item_timeout: Duration::from_secs(30),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let config = Config {
            port: parse_or(&get, "PORT", defaults.port)?,
            rust_log: get("RUST_LOG").unwrap_or(defaults.rust_log),
            embedding_backend: parse_or(&get, "EMBEDDING_BACKEND", defaults.embedding_backend)?,
            embedding_dimension: parse_or(&get, "EMBEDDING_DIMENSION", defaults.embedding_dimension)?,
            embedding_url: get("EMBEDDING_URL"),
            embedding_model: get("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            embedding_revision: get("EMBEDDING_REVISION").unwrap_or(defaults.embedding_revision),
            embedding_api_key: get("EMBEDDING_API_KEY"),
            parser_config_path: get("SCREENER_PARSER_CONFIG").map(PathBuf::from),
            bulk_max_concurrency: parse_or(&get, "BULK_MAX_CONCURRENCY", defaults.bulk_max_concurrency)?,
            bulk_item_timeout: Duration::from_secs(parse_or(
                &get,
                "BULK_ITEM_TIMEOUT_SECS",
                defaults.bulk_item_timeout.as_secs(),
            )?),
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
        };

        if config.embedding_backend == EmbeddingBackend::Remote && config.embedding_url.is_none() {
            bail!("Required environment variable 'EMBEDDING_URL' is not set (EMBEDDING_BACKEND=remote)");
        }
        if config.bulk_max_concurrency == 0 {
            bail!("BULK_MAX_CONCURRENCY must be at least 1");
        }
        Ok(config)
    }
}

fn parse_or<T>(get: impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.embedding_backend, EmbeddingBackend::Hash);
        assert_eq!(config.embedding_dimension, 384);
        assert_eq!(config.bulk_item_timeout, Duration::from_secs(30));
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert!(config.parser_config_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("PORT", "9000"),
            ("EMBEDDING_BACKEND", "Remote"),
            ("EMBEDDING_URL", "http://localhost:8000/v1/embeddings"),
            ("BULK_MAX_CONCURRENCY", "8"),
            ("SCREENER_PARSER_CONFIG", "/etc/screener/parser.json"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.embedding_backend, EmbeddingBackend::Remote);
        assert_eq!(config.bulk_max_concurrency, 8);
        assert_eq!(
            config.parser_config_path,
            Some(PathBuf::from("/etc/screener/parser.json"))
        );
    }

    #[test]
    fn test_minilm_backend_needs_no_url() {
        let config = load(&[("EMBEDDING_BACKEND", "minilm"), ("EMBEDDING_REVISION", "v1.0")]).unwrap();
        assert_eq!(config.embedding_backend, EmbeddingBackend::Minilm);
        assert_eq!(config.embedding_model, "sentence-transformers/all-MiniLM-L6-v2");
        assert_eq!(config.embedding_revision, "v1.0");
        assert!(config.embedding_url.is_none());
    }

    #[test]
    fn test_remote_requires_url() {
        let err = load(&[("EMBEDDING_BACKEND", "remote")]).unwrap_err();
        assert!(err.to_string().contains("EMBEDDING_URL"));
    }

    #[test]
    fn test_malformed_values_rejected() {
        assert!(load(&[("PORT", "eighty")]).is_err());
        assert!(load(&[("EMBEDDING_BACKEND", "onnx")]).is_err());
        assert!(load(&[("BULK_MAX_CONCURRENCY", "0")]).is_err());
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = load(&[("PORT", "  "), ("EMBEDDING_API_KEY", "")]).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.embedding_api_key.is_none());
    }
}
