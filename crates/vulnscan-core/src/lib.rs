//! Core types, configuration, and errors for VulnScan
//!
//! This crate contains the foundational types shared by the detector and the
//! HTTP service: the classification label, the prediction result returned to
//! callers, the configuration tree loaded at startup, and the error taxonomy.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Maximum accepted source length, in characters.
pub const MAX_CODE_CHARS: usize = 100_000;

// ---------------------------------------------------------------------------
// Classification types
// ---------------------------------------------------------------------------

/// Discrete classifier output.
///
/// Class index 0 is `Safe`, class index 1 is `Vulnerable`, matching the
/// column order of the classification head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// No vulnerability predicted.
    #[serde(rename = "SAFE")]
    Safe,
    /// Vulnerability predicted.
    #[serde(rename = "VULN")]
    Vulnerable,
}

impl Label {
    /// Class index of this label in the logits vector.
    #[must_use]
    pub fn class_index(self) -> usize {
        match self {
            Self::Safe => 0,
            Self::Vulnerable => 1,
        }
    }

    /// Wire representation (`"SAFE"` or `"VULN"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Vulnerable => "VULN",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label and confidence for a single classified snippet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Winning class.
    pub label: Label,
    /// Probability of the winning class, in `[0, 1]`.
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// Configuration types
// ---------------------------------------------------------------------------

/// Top-level configuration for the VulnScan service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VulnScanConfig {
    /// Address and port to bind the HTTP server to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_request_size_bytes")]
    pub max_request_size_bytes: usize,
    /// Origins allowed by the CORS layer. Empty means no CORS headers.
    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,
    /// Detector artifacts and runtime options.
    #[serde(default)]
    pub model: DetectorConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_max_request_size_bytes() -> usize {
    // Worst case: MAX_CODE_CHARS four-byte characters, JSON-escaped, plus envelope.
    2 * 1024 * 1024
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5284".to_string(),
        "http://localhost:5000".to_string(),
        "http://127.0.0.1:5284".to_string(),
        "http://127.0.0.1:5000".to_string(),
    ]
}

impl Default for VulnScanConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_request_size_bytes: default_max_request_size_bytes(),
            cors_allowed_origins: default_cors_origins(),
            model: DetectorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Paths and options for loading the detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Hybrid classifier checkpoint (`.safetensors`, `.pt`, `.pth` or `.bin`).
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: PathBuf,
    /// Optional JSON scaler artifact. When absent, features are not scaled.
    #[serde(default)]
    pub scaler_path: Option<PathBuf>,
    /// Text encoder configuration.
    #[serde(default)]
    pub encoder: EncoderConfig,
    /// Compute device.
    #[serde(default)]
    pub device: DeviceKind,
}

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from("model/hybrid_classifier.safetensors")
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            checkpoint_path: default_checkpoint_path(),
            scaler_path: None,
            encoder: EncoderConfig::default(),
            device: DeviceKind::default(),
        }
    }
}

/// Which text encoder produces the pooled embedding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderKind {
    /// Deterministic zero vector (degraded mode, no encoder model needed).
    #[default]
    Zero,
    /// Transformer encoder with masked mean pooling.
    Transformer,
}

/// Text encoder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Encoder implementation.
    #[serde(default)]
    pub kind: EncoderKind,
    /// Pooled embedding dimension produced by the encoder. A transformer
    /// encoder uses its model's hidden size instead.
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
    /// Local directory containing `config.json`, `tokenizer.json` and
    /// `model.safetensors`. Takes precedence over `model_id`.
    #[serde(default)]
    pub model_dir: Option<PathBuf>,
    /// HuggingFace model ID to download when `model_dir` is not set.
    #[serde(default)]
    pub model_id: Option<String>,
    /// Optional cache directory for downloaded models.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Maximum number of tokens fed to the encoder.
    #[serde(default = "default_max_seq_len")]
    pub max_seq_len: usize,
}

fn default_embedding_dim() -> usize {
    768
}

fn default_max_seq_len() -> usize {
    256
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            kind: EncoderKind::default(),
            embedding_dim: default_embedding_dim(),
            model_dir: None,
            model_id: None,
            cache_dir: None,
            max_seq_len: default_max_seq_len(),
        }
    }
}

/// Requested compute device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Always run on the CPU.
    #[default]
    Cpu,
    /// CUDA device 0, falling back to CPU.
    Cuda,
    /// Metal device 0, falling back to CPU.
    Metal,
    /// Best available: CUDA, then Metal, then CPU.
    Auto,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format: `text` (human-readable) or `json` (structured).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Core error types.
#[derive(thiserror::Error, Debug)]
pub enum VulnScanError {
    /// Bad, empty or oversized input. The caller's fault.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Parameter/schema mismatch or missing artifact. The operator's fault.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The numeric pipeline produced an unusable result.
    #[error("Inference error: {0}")]
    Inference(String),

    /// Serialization / deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Artifact I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VulnScanError {
    /// Returns `true` for errors caused by the request rather than the server.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Convenience alias for `std::result::Result<T, VulnScanError>`.
pub type Result<T> = std::result::Result<T, VulnScanError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
