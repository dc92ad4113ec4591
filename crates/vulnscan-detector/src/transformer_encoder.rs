//! Transformer text encoder using the Candle framework.
//!
//! Runs a BERT-family encoder over the tokenized snippet and reduces the
//! hidden states to one vector with masked average pooling over all
//! non-padding tokens.
//!
//! # Feature Gate
//!
//! This module is only available when the `transformer` feature is enabled.

use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::{Tokenizer, TruncationParams};
use vulnscan_core::{Result, VulnScanError};

use crate::encoder::TextEncoder;

/// Average the hidden states of one sequence over its attended tokens.
///
/// `hidden_states` is `[1, seq_len, hidden]` and `attention_mask` holds one
/// entry per token. The mean is taken as a single `[1, 1, seq_len]` weight
/// row times the hidden states, giving a `[hidden]` vector. A sequence with
/// no attended tokens pools to zeros.
fn attended_mean(hidden_states: &Tensor, attention_mask: &[u32]) -> candle_core::Result<Tensor> {
    let attended = attention_mask.iter().filter(|&&m| m != 0).count().max(1);
    let weights: Vec<f32> = attention_mask
        .iter()
        .map(|&m| if m == 0 { 0.0 } else { 1.0 / attended as f32 })
        .collect();
    let weights = Tensor::from_vec(
        weights,
        (1, 1, attention_mask.len()),
        hidden_states.device(),
    )?
    .to_dtype(hidden_states.dtype())?;
    weights
        .matmul(&hidden_states.contiguous()?)?
        .squeeze(0)?
        .squeeze(0)
}

/// Load a tokenizer that never pads and cuts input at `max_seq_len` tokens.
fn load_tokenizer(path: &Path, max_seq_len: usize) -> Result<Tokenizer> {
    let mut tokenizer = Tokenizer::from_file(path).map_err(|e| {
        VulnScanError::Config(format!("Failed to load tokenizer {}: {e}", path.display()))
    })?;
    tokenizer.with_padding(None);
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_seq_len,
            ..Default::default()
        }))
        .map_err(|e| VulnScanError::Config(format!("Invalid truncation settings: {e}")))?;
    Ok(tokenizer)
}

/// BERT-family encoder with mean pooling.
pub struct TransformerEncoder {
    tokenizer: Tokenizer,
    model: BertModel,
    device: Device,
    dim: usize,
}

impl TransformerEncoder {
    /// Load from a directory holding `config.json`, `tokenizer.json` and
    /// `model.safetensors`.
    ///
    /// # Errors
    ///
    /// Returns [`VulnScanError::Config`] if any file is missing or invalid.
    pub fn from_dir(dir: &Path, max_seq_len: usize, device: &Device) -> Result<Self> {
        Self::from_files(
            &dir.join("config.json"),
            &dir.join("tokenizer.json"),
            &dir.join("model.safetensors"),
            max_seq_len,
            device,
        )
    }

    /// Download the encoder files from the HuggingFace Hub and load them.
    ///
    /// # Errors
    ///
    /// Returns [`VulnScanError::Config`] if the download or load fails.
    pub async fn from_hub(
        model_id: &str,
        cache_dir: Option<&Path>,
        max_seq_len: usize,
        device: &Device,
    ) -> Result<Self> {
        use hf_hub::api::tokio::{Api, ApiBuilder};

        let api = match cache_dir {
            Some(dir) => ApiBuilder::new().with_cache_dir(dir.to_path_buf()).build(),
            None => Api::new(),
        }
        .map_err(|e| VulnScanError::Config(format!("Failed to create HF API client: {e}")))?;

        let repo = api.model(model_id.to_string());
        let mut files: Vec<PathBuf> = Vec::with_capacity(3);
        for name in ["config.json", "tokenizer.json", "model.safetensors"] {
            let path = repo.get(name).await.map_err(|e| {
                VulnScanError::Config(format!("Failed to download {name} for {model_id}: {e}"))
            })?;
            files.push(path);
        }

        Self::from_files(&files[0], &files[1], &files[2], max_seq_len, device)
    }

    /// Load from explicit file paths.
    ///
    /// # Errors
    ///
    /// Returns [`VulnScanError::Config`] if any file is missing or invalid.
    pub fn from_files(
        config_path: &Path,
        tokenizer_path: &Path,
        weights_path: &Path,
        max_seq_len: usize,
        device: &Device,
    ) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path).map_err(|e| {
            VulnScanError::Config(format!(
                "Failed to read encoder config {}: {e}",
                config_path.display()
            ))
        })?;
        let config: BertConfig = serde_json::from_str(&config_str)
            .map_err(|e| VulnScanError::Config(format!("Invalid encoder config: {e}")))?;

        let tokenizer = load_tokenizer(tokenizer_path, max_seq_len)?;

        // SAFETY: memory-mapping safetensors is the standard candle pattern.
        // The file is read-only and remains valid for the lifetime of VarBuilder.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device).map_err(
                |e| VulnScanError::Config(format!("Failed to load encoder weights: {e}")),
            )?
        };
        let model = BertModel::load(vb, &config)
            .map_err(|e| VulnScanError::Config(format!("Failed to build encoder model: {e}")))?;

        tracing::info!(
            weights = %weights_path.display(),
            hidden_size = config.hidden_size,
            max_seq_len,
            "Transformer encoder loaded"
        );

        Ok(Self {
            tokenizer,
            model,
            device: device.clone(),
            dim: config.hidden_size,
        })
    }

    fn embed(&self, code: &str) -> Result<Tensor> {
        let encoding = self
            .tokenizer
            .encode(code, true)
            .map_err(|e| VulnScanError::Inference(format!("Tokenization failed: {e}")))?;

        let to_tensor = |values: &[u32]| {
            Tensor::new(values, &self.device)
                .and_then(|t| t.unsqueeze(0))
                .map_err(|e| VulnScanError::Inference(format!("Tensor creation failed: {e}")))
        };
        let input_ids = to_tensor(encoding.get_ids())?;
        let token_type_ids = to_tensor(encoding.get_type_ids())?;
        let attention_mask = to_tensor(encoding.get_attention_mask())?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(|e| VulnScanError::Inference(format!("Encoder forward failed: {e}")))?;

        attended_mean(&hidden, encoding.get_attention_mask())
            .map_err(|e| VulnScanError::Inference(format!("Pooling failed: {e}")))
    }
}

impl TextEncoder for TransformerEncoder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn encode(&self, code: &str) -> Result<Vec<f32>> {
        self.embed(code)?
            .to_dtype(DType::F32)
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(|e| VulnScanError::Inference(format!("Failed to read embedding: {e}")))
    }

    fn name(&self) -> &'static str {
        "transformer"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
