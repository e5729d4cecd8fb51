use std::sync::Arc;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use hf_hub::{api::sync::Api, Repo, RepoType};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::{l2_normalize, Embedder, EmbeddingError};

/// Sentence-transformers truncates MiniLM inputs at 256 word pieces.
const MAX_SEQUENCE_TOKENS: usize = 256;

#[derive(Debug, Clone)]
pub struct MiniLmEmbedderConfig {
    /// Hugging Face model id, e.g. "sentence-transformers/all-MiniLM-L6-v2".
    pub model: String,
    pub revision: String,
    /// Expected output dimension; loading fails if the model disagrees.
    pub dimension: Option<usize>,
}

/// In-process BERT sentence encoder (MiniLM family) on the CPU.
///
/// Token vectors from the last hidden layer are mean-pooled over the attention mask and
/// L2-normalized, which is what sentence-transformers does for these checkpoints.
pub struct MiniLmEmbedder {
    inner: Arc<Encoder>,
    version: String,
    dimension: usize,
}

struct Encoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl MiniLmEmbedder {
    /// Fetches config, tokenizer and weights through the Hugging Face cache and builds the model.
    ///
    /// Blocking: downloads on first use and memory-maps the weights.
    pub fn load(config: MiniLmEmbedderConfig) -> Result<Self, EmbeddingError> {
        let api = Api::new().map_err(model_error)?;
        let repo = api.repo(Repo::with_revision(
            config.model.clone(),
            RepoType::Model,
            config.revision.clone(),
        ));
        let config_path = repo.get("config.json").map_err(model_error)?;
        let tokenizer_path = repo.get("tokenizer.json").map_err(model_error)?;
        let weights_path = repo.get("model.safetensors").map_err(model_error)?;
        debug!("MiniLM files cached at {}", weights_path.display());

        let bert_config: BertConfig = serde_json::from_str(
            &std::fs::read_to_string(&config_path).map_err(model_error)?,
        )
        .map_err(model_error)?;

        if let Some(expected) = config.dimension {
            if expected != bert_config.hidden_size {
                return Err(EmbeddingError::DimensionMismatch {
                    expected,
                    actual: bert_config.hidden_size,
                });
            }
        }

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(model_error)?;
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_TOKENS,
                ..Default::default()
            }))
            .map_err(model_error)?;

        let device = Device::Cpu;
        // Safety: the safetensors file lives in the hub cache and is not modified while mapped.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device) }
            .map_err(model_error)?;
        let model = BertModel::load(vb, &bert_config).map_err(model_error)?;

        info!(
            "Loaded {}@{} ({} dims)",
            config.model, config.revision, bert_config.hidden_size
        );

        Ok(Self {
            inner: Arc::new(Encoder {
                model,
                tokenizer,
                device,
            }),
            version: format!("{}@{}", config.model, config.revision),
            dimension: bert_config.hidden_size,
        })
    }
}

impl Encoder {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let encoding = self.tokenizer.encode(text, true).map_err(model_error)?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(model_error)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(model_error)?;
        let token_type_ids = input_ids.zeros_like().map_err(model_error)?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(model_error)?;

        let mut vector = mean_pool(&hidden, &attention_mask)
            .and_then(|pooled| pooled.squeeze(0))
            .and_then(|pooled| pooled.to_vec1::<f32>())
            .map_err(model_error)?;
        l2_normalize(&mut vector);
        Ok(vector)
    }
}

/// Averages `hidden` (batch, tokens, dim) over the positions where `mask` (batch, tokens) is 1.
fn mean_pool(hidden: &Tensor, mask: &Tensor) -> candle_core::Result<Tensor> {
    let mask = mask.to_dtype(DType::F32)?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.maximum(1e-9)?;
    summed.broadcast_div(&counts)
}

fn model_error(e: impl std::fmt::Display) -> EmbeddingError {
    EmbeddingError::Model(e.to_string())
}

#[async_trait]
impl Embedder for MiniLmEmbedder {
    fn name(&self) -> &'static str {
        "minilm"
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let encoder = Arc::clone(&self.inner);
        let text = text.to_string();
        tokio::task::spawn_blocking(move || encoder.encode(&text))
            .await
            .map_err(|e| EmbeddingError::Unusable(format!("encoder task failed: {e}")))?
    }
}
