//! End-to-end vulnerability detector.
//!
//! [`VulnerabilityDetector`] owns the loaded classifier, the optional feature
//! scaler and the text encoder, and turns one source snippet into one
//! [`PredictionResult`]:
//!
//! ```text
//! validate → extract_features → normalize ─┐
//!          → encoder.encode ───────────────┴→ classifier.forward → decide
//! ```
//!
//! Every component is immutable after construction, so one detector can be
//! shared across threads behind an `Arc`.

use std::sync::OnceLock;

use candle_core::Device;
use vulnscan_core::{
    DetectorConfig, EncoderConfig, EncoderKind, PredictionResult, Result, VulnScanError,
    MAX_CODE_CHARS,
};

use crate::decision::decide;
use crate::device::select_device;
use crate::encoder::{TextEncoder, ZeroEncoder};
use crate::feature_extraction::{describe_features, extract_features, FEATURE_DIM};
use crate::hybrid_classifier::HybridClassifier;
use crate::scaler::{normalize, FeatureScaler};

/// Reject input that must not reach the numeric pipeline.
///
/// # Errors
///
/// Returns [`VulnScanError::Validation`] if `code` is empty or whitespace
/// only, or longer than [`MAX_CODE_CHARS`] characters.
pub fn validate_source(code: &str) -> Result<()> {
    if code.trim().is_empty() {
        return Err(VulnScanError::Validation(
            "Source code must not be empty".to_string(),
        ));
    }
    let chars = code.chars().count();
    if chars > MAX_CODE_CHARS {
        return Err(VulnScanError::Validation(format!(
            "Source code has {chars} characters, maximum is {MAX_CODE_CHARS}"
        )));
    }
    Ok(())
}

/// Loaded vulnerability detection pipeline.
pub struct VulnerabilityDetector {
    classifier: HybridClassifier,
    scaler: Option<FeatureScaler>,
    encoder: Box<dyn TextEncoder>,
    /// Outcome of the first-use dimension check; `Some` holds the failure.
    dims_verified: OnceLock<Option<String>>,
}

impl VulnerabilityDetector {
    /// Assemble a detector from loaded components.
    ///
    /// # Errors
    ///
    /// Returns [`VulnScanError::Config`] if the classifier, the feature
    /// schema, the scaler and the encoder disagree on any dimension.
    pub fn new(
        classifier: HybridClassifier,
        scaler: Option<FeatureScaler>,
        encoder: Box<dyn TextEncoder>,
    ) -> Result<Self> {
        check_dims(&classifier, scaler.as_ref(), encoder.as_ref())?;
        tracing::info!(
            encoder = encoder.name(),
            scaler = scaler.as_ref().map_or("none", FeatureScaler::kind),
            feature_dim = FEATURE_DIM,
            "Vulnerability detector ready"
        );
        Ok(Self {
            classifier,
            scaler,
            encoder,
            dims_verified: OnceLock::new(),
        })
    }

    /// Load every artifact named in `config`.
    ///
    /// The checkpoint is read first so a missing model fails before any
    /// encoder download starts.
    ///
    /// # Errors
    ///
    /// Returns [`VulnScanError::Config`] if an artifact is missing, invalid
    /// or incompatible with the others.
    pub async fn from_config(config: &DetectorConfig) -> Result<Self> {
        let device = select_device(config.device);
        let classifier = HybridClassifier::load(&config.checkpoint_path, &device)?;
        let scaler = config
            .scaler_path
            .as_deref()
            .map(FeatureScaler::load)
            .transpose()?;
        if scaler.is_none() {
            tracing::warn!("No feature scaler configured, using raw feature values");
        }
        let encoder = build_encoder(&config.encoder, &device).await?;
        Self::new(classifier, scaler, encoder)
    }

    /// Classify one source snippet.
    ///
    /// # Errors
    ///
    /// - [`VulnScanError::Validation`] for empty or oversized input.
    /// - [`VulnScanError::Config`] if the loaded components disagree.
    /// - [`VulnScanError::Inference`] if any intermediate value is not finite.
    pub fn predict(&self, code: &str) -> Result<PredictionResult> {
        validate_source(code)?;
        self.verify_dims()?;

        let raw = extract_features(code);
        if tracing::enabled!(tracing::Level::TRACE) {
            tracing::trace!(features = ?describe_features(&raw), "Extracted features");
        }
        let features = normalize(raw, self.scaler.as_ref())?;
        ensure_finite("Scaled features", &features)?;

        let embedding = self.encoder.encode(code)?;
        if embedding.len() != self.classifier.dims().embedding_dim {
            return Err(VulnScanError::Inference(format!(
                "Encoder returned {} values, expected {}",
                embedding.len(),
                self.classifier.dims().embedding_dim
            )));
        }
        ensure_finite("Embedding", &embedding)?;

        let logits = self.classifier.forward(&embedding, &features)?;
        let result = decide(&logits)?;

        tracing::debug!(
            code_bytes = code.len(),
            label = %result.label,
            confidence = result.confidence,
            "Prediction complete"
        );
        Ok(result)
    }

    /// Name of the active text encoder.
    pub fn encoder_name(&self) -> &'static str {
        self.encoder.name()
    }

    /// Kind of the active feature scaler, if any.
    pub fn scaler_kind(&self) -> Option<&'static str> {
        self.scaler.as_ref().map(FeatureScaler::kind)
    }

    /// The loaded classifier.
    pub fn classifier(&self) -> &HybridClassifier {
        &self.classifier
    }

    fn verify_dims(&self) -> Result<()> {
        let failure = self.dims_verified.get_or_init(|| {
            check_dims(&self.classifier, self.scaler.as_ref(), self.encoder.as_ref())
                .err()
                .map(|e| e.to_string())
        });
        match failure {
            None => Ok(()),
            Some(msg) => Err(VulnScanError::Config(msg.clone())),
        }
    }
}

fn check_dims(
    classifier: &HybridClassifier,
    scaler: Option<&FeatureScaler>,
    encoder: &dyn TextEncoder,
) -> Result<()> {
    classifier.dims().check(encoder.dim(), FEATURE_DIM)?;
    if let Some(scaler) = scaler {
        if scaler.dim() != FEATURE_DIM {
            return Err(VulnScanError::Config(format!(
                "Scaler has {} parameters but the feature schema has {FEATURE_DIM}",
                scaler.dim()
            )));
        }
    }
    Ok(())
}

fn ensure_finite(stage: &str, values: &[f32]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        None => Ok(()),
        Some(index) => Err(VulnScanError::Inference(format!(
            "{stage}: non-finite value at index {index}"
        ))),
    }
}

async fn build_encoder(config: &EncoderConfig, device: &Device) -> Result<Box<dyn TextEncoder>> {
    match config.kind {
        EncoderKind::Zero => {
            tracing::info!(
                embedding_dim = config.embedding_dim,
                "Using zero text encoder"
            );
            Ok(Box::new(ZeroEncoder::new(config.embedding_dim)))
        }
        EncoderKind::Transformer => build_transformer(config, device).await,
    }
}

#[cfg(feature = "transformer")]
async fn build_transformer(
    config: &EncoderConfig,
    device: &Device,
) -> Result<Box<dyn TextEncoder>> {
    use crate::transformer_encoder::TransformerEncoder;

    let encoder = if let Some(dir) = &config.model_dir {
        TransformerEncoder::from_dir(dir, config.max_seq_len, device)?
    } else if let Some(model_id) = &config.model_id {
        TransformerEncoder::from_hub(
            model_id,
            config.cache_dir.as_deref(),
            config.max_seq_len,
            device,
        )
        .await?
    } else {
        return Err(VulnScanError::Config(
            "Transformer encoder requires model_dir or model_id".to_string(),
        ));
    };
    embedding_dim_matches(config.embedding_dim, encoder.dim());
    Ok(Box::new(encoder))
}

/// The loaded model's hidden size wins over `embedding_dim`; warn when the
/// two disagree.
#[cfg(feature = "transformer")]
fn embedding_dim_matches(configured: usize, loaded: usize) -> bool {
    if configured == loaded {
        return true;
    }
    tracing::warn!(
        configured,
        loaded,
        "Configured embedding_dim differs from the transformer hidden size; using the hidden size"
    );
    false
}

#[cfg(not(feature = "transformer"))]
async fn build_transformer(
    _config: &EncoderConfig,
    _device: &Device,
) -> Result<Box<dyn TextEncoder>> {
    Err(VulnScanError::Config(
        "Transformer encoder requested but this build lacks the `transformer` feature".to_string(),
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hybrid_classifier::ModelDims;
    use crate::scaler::ScalerParams;

    fn dims(embedding_dim: usize, feature_dim: usize) -> ModelDims {
        ModelDims {
            embedding_dim,
            feature_dim,
            hidden_dim: 16,
        }
    }

    fn detector() -> VulnerabilityDetector {
        let classifier = HybridClassifier::new_random(dims(32, FEATURE_DIM), &Device::Cpu).unwrap();
        VulnerabilityDetector::new(classifier, None, Box::new(ZeroEncoder::new(32))).unwrap()
    }

    struct NanEncoder;

    impl TextEncoder for NanEncoder {
        fn dim(&self) -> usize {
            32
        }
        fn encode(&self, _code: &str) -> Result<Vec<f32>> {
            Ok(vec![f32::NAN; 32])
        }
        fn name(&self) -> &'static str {
            "nan"
        }
    }

    #[test]
    fn test_validate_source() {
        assert!(validate_source("int x;").is_ok());
        assert!(matches!(validate_source(""), Err(VulnScanError::Validation(_))));
        assert!(matches!(
            validate_source(" \n\t  "),
            Err(VulnScanError::Validation(_))
        ));
        assert!(validate_source(&"a".repeat(MAX_CODE_CHARS)).is_ok());
        assert!(matches!(
            validate_source(&"a".repeat(MAX_CODE_CHARS + 1)),
            Err(VulnScanError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_counts_chars_not_bytes() {
        // 3 bytes per char in UTF-8.
        assert!(validate_source(&"€".repeat(MAX_CODE_CHARS)).is_ok());
    }

    #[test]
    fn test_predict_returns_well_formed_result() {
        let result = detector()
            .predict("char buf[8]; strcpy(buf, input);")
            .unwrap();
        assert!((0.5..=1.0).contains(&result.confidence));
    }

    #[test]
    fn test_predict_is_deterministic() {
        let detector = detector();
        let code = "void f(char *p) { free(p); free(p); }";
        assert_eq!(detector.predict(code).unwrap(), detector.predict(code).unwrap());
    }

    #[test]
    fn test_predict_rejects_blank_input() {
        assert!(matches!(
            detector().predict("   \n"),
            Err(VulnScanError::Validation(_))
        ));
    }

    #[test]
    fn test_feature_dim_mismatch_is_config_error() {
        let classifier = HybridClassifier::new_random(dims(32, 14), &Device::Cpu).unwrap();
        let result = VulnerabilityDetector::new(classifier, None, Box::new(ZeroEncoder::new(32)));
        assert!(matches!(result, Err(VulnScanError::Config(_))));
    }

    #[test]
    fn test_encoder_dim_mismatch_is_config_error() {
        let classifier = HybridClassifier::new_random(dims(32, FEATURE_DIM), &Device::Cpu).unwrap();
        let result = VulnerabilityDetector::new(classifier, None, Box::new(ZeroEncoder::new(768)));
        assert!(matches!(result, Err(VulnScanError::Config(_))));
    }

    #[test]
    fn test_scaler_dim_mismatch_is_config_error() {
        let classifier = HybridClassifier::new_random(dims(32, FEATURE_DIM), &Device::Cpu).unwrap();
        let scaler = FeatureScaler::new(ScalerParams::Standard {
            mean: vec![0.0; 14],
            scale: vec![1.0; 14],
        })
        .unwrap();
        let result =
            VulnerabilityDetector::new(classifier, Some(scaler), Box::new(ZeroEncoder::new(32)));
        assert!(matches!(result, Err(VulnScanError::Config(_))));
    }

    #[test]
    fn test_non_finite_embedding_is_inference_error() {
        let classifier = HybridClassifier::new_random(dims(32, FEATURE_DIM), &Device::Cpu).unwrap();
        let detector = VulnerabilityDetector::new(classifier, None, Box::new(NanEncoder)).unwrap();
        assert!(matches!(
            detector.predict("int main() { return 0; }"),
            Err(VulnScanError::Inference(_))
        ));
    }

    #[test]
    fn test_accessors() {
        let detector = detector();
        assert_eq!(detector.encoder_name(), "zero");
        assert_eq!(detector.scaler_kind(), None);
        assert_eq!(detector.classifier().dims().feature_dim, FEATURE_DIM);
    }

    #[cfg(feature = "transformer")]
    #[test]
    fn test_embedding_dim_mismatch_is_reported() {
        assert!(embedding_dim_matches(768, 768));
        assert!(!embedding_dim_matches(768, 384));
    }

    #[cfg(feature = "transformer")]
    #[tokio::test]
    async fn test_transformer_without_source_is_config_error() {
        let config = EncoderConfig {
            kind: EncoderKind::Transformer,
            model_dir: None,
            model_id: None,
            ..EncoderConfig::default()
        };
        let result = build_encoder(&config, &Device::Cpu).await;
        assert!(matches!(result, Err(VulnScanError::Config(_))));
    }

    #[cfg(not(feature = "transformer"))]
    #[tokio::test]
    async fn test_transformer_without_feature_is_config_error() {
        let config = EncoderConfig {
            kind: EncoderKind::Transformer,
            ..EncoderConfig::default()
        };
        let result = build_encoder(&config, &Device::Cpu).await;
        assert!(matches!(result, Err(VulnScanError::Config(_))));
    }

    #[tokio::test]
    async fn test_from_config_missing_checkpoint_fails() {
        let config = DetectorConfig {
            checkpoint_path: "/nonexistent/hybrid.safetensors".into(),
            ..DetectorConfig::default()
        };
        assert!(matches!(
            VulnerabilityDetector::from_config(&config).await,
            Err(VulnScanError::Config(_))
        ));
    }
}
