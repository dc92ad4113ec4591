//! Two-branch hybrid classifier for vulnerability detection.
//!
//! Projects the pooled text embedding and the lexical feature vector into a
//! shared hidden space, concatenates the two projections, and maps them to
//! 2-class (safe/vulnerable) logits.
//!
//! # Architecture
//!
//! ```text
//! embedding (D) → text_proj: Linear(D, H) → ReLU ─┐
//!                                                 ├─ concat (2H) → classifier: Linear(2H, 2)
//! features  (N) → feat_proj: Linear(N, H) → ReLU ─┘
//! ```
//!
//! D, N and H are read from the checkpoint's weight shapes. Callers validate
//! them once against the encoder and the feature schema with
//! [`ModelDims::check`].
//!
//! # Checkpoints
//!
//! Both safetensors and PyTorch pickle checkpoints are accepted. Parameters
//! wrapped in a `state_dict` (or `model_state_dict`, `model`, `module`)
//! container are unwrapped. Unknown tensors are skipped and reported; a
//! missing bias is zero-filled with a warning; a missing weight or a shape
//! disagreement is a configuration error.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use vulnscan_core::{Result, VulnScanError};

use crate::decision::NUM_CLASSES;

/// Checkpoint name of the text projection layer.
pub const TEXT_PROJ: &str = "text_proj";
/// Checkpoint name of the feature projection layer.
pub const FEAT_PROJ: &str = "feat_proj";
/// Checkpoint name of the classification head.
pub const CLASSIFIER: &str = "classifier";

/// Hidden size used by the published checkpoints.
pub const DEFAULT_HIDDEN_DIM: usize = 128;

const COMPONENTS: [&str; 3] = [TEXT_PROJ, FEAT_PROJ, CLASSIFIER];

/// Container keys that training scripts commonly wrap parameters in.
const WRAPPER_KEYS: [&str; 4] = ["state_dict", "model_state_dict", "model", "module"];

/// Layer dimensions of a loaded classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelDims {
    /// Pooled embedding size (D).
    pub embedding_dim: usize,
    /// Lexical feature count (N).
    pub feature_dim: usize,
    /// Shared hidden size (H).
    pub hidden_dim: usize,
}

impl ModelDims {
    /// Verify the loaded parameters against what the encoder and the feature
    /// extractor actually produce.
    ///
    /// # Errors
    ///
    /// Returns [`VulnScanError::Config`] naming every disagreeing dimension.
    pub fn check(&self, embedding_dim: usize, feature_dim: usize) -> Result<()> {
        let mut problems = Vec::new();
        if self.embedding_dim != embedding_dim {
            problems.push(format!(
                "{TEXT_PROJ} expects a {}-dim embedding but the encoder produces {embedding_dim}",
                self.embedding_dim
            ));
        }
        if self.feature_dim != feature_dim {
            problems.push(format!(
                "{FEAT_PROJ} expects {} features but the feature schema has {feature_dim}",
                self.feature_dim
            ));
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(VulnScanError::Config(format!(
                "Incompatible classifier parameters: {}",
                problems.join("; ")
            )))
        }
    }
}

/// Hybrid text + feature classifier.
///
/// Immutable after construction; safe to share across threads.
pub struct HybridClassifier {
    text_proj: candle_nn::Linear,
    feat_proj: candle_nn::Linear,
    classifier: candle_nn::Linear,
    dims: ModelDims,
    device: Device,
}

impl HybridClassifier {
    /// Create a classifier with random weights.
    ///
    /// Suitable for architecture validation and tests. For production, use
    /// [`HybridClassifier::load`] with trained weights.
    pub fn new_random(dims: ModelDims, device: &Device) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);

        let build = |in_dim, out_dim, name: &str| {
            candle_nn::linear(in_dim, out_dim, vb.pp(name)).map_err(|e| {
                VulnScanError::Config(format!("Failed to create {name}: {e}"))
            })
        };
        let text_proj = build(dims.embedding_dim, dims.hidden_dim, TEXT_PROJ)?;
        let feat_proj = build(dims.feature_dim, dims.hidden_dim, FEAT_PROJ)?;
        let classifier = build(dims.hidden_dim * 2, NUM_CLASSES, CLASSIFIER)?;

        Ok(Self {
            text_proj,
            feat_proj,
            classifier,
            dims,
            device: device.clone(),
        })
    }

    /// Load a classifier checkpoint.
    ///
    /// `.safetensors` files are read directly; `.pt`, `.pth` and `.bin`
    /// files are read as PyTorch pickles.
    ///
    /// # Errors
    ///
    /// Returns [`VulnScanError::Config`] if the file cannot be read or the
    /// weights are incompatible with the architecture.
    pub fn load(path: &Path, device: &Device) -> Result<Self> {
        let tensors = read_checkpoint(path, device)?;
        let classifier = Self::from_tensors(tensors, device)?;
        tracing::info!(
            path = %path.display(),
            embedding_dim = classifier.dims.embedding_dim,
            feature_dim = classifier.dims.feature_dim,
            hidden_dim = classifier.dims.hidden_dim,
            "Hybrid classifier loaded"
        );
        Ok(classifier)
    }

    /// Build a classifier from named tensors.
    ///
    /// Expects `text_proj.weight`, `feat_proj.weight`, `classifier.weight`
    /// and their biases, optionally under one container prefix.
    pub fn from_tensors(tensors: HashMap<String, Tensor>, device: &Device) -> Result<Self> {
        let mut tensors = unwrap_container(tensors);

        let expected: HashSet<String> = COMPONENTS
            .iter()
            .flat_map(|c| [format!("{c}.weight"), format!("{c}.bias")])
            .collect();
        let mut unexpected: Vec<&String> =
            tensors.keys().filter(|k| !expected.contains(*k)).collect();
        if !unexpected.is_empty() {
            unexpected.sort();
            tracing::warn!(
                count = unexpected.len(),
                keys = ?unexpected,
                "Skipping unexpected checkpoint entries"
            );
        }

        let missing: Vec<String> = COMPONENTS
            .iter()
            .map(|c| format!("{c}.weight"))
            .filter(|k| !tensors.contains_key(k))
            .collect();
        if !missing.is_empty() {
            return Err(VulnScanError::Config(format!(
                "Checkpoint is missing required tensors: {}",
                missing.join(", ")
            )));
        }

        let mut take_weight = |name: &str| -> Result<(Tensor, usize, usize)> {
            let key = format!("{name}.weight");
            let weight = tensors
                .remove(&key)
                .ok_or_else(|| VulnScanError::Config(format!("Missing {key}")))?;
            let weight = prepare(weight, device, &key)?;
            let (out_dim, in_dim) = weight.dims2().map_err(|e| {
                VulnScanError::Config(format!("{key} must be a 2-D matrix: {e}"))
            })?;
            Ok((weight, out_dim, in_dim))
        };
        let (text_w, hidden_dim, embedding_dim) = take_weight(TEXT_PROJ)?;
        let (feat_w, feat_hidden, feature_dim) = take_weight(FEAT_PROJ)?;
        let (cls_w, num_classes, fused_dim) = take_weight(CLASSIFIER)?;

        if feat_hidden != hidden_dim {
            return Err(VulnScanError::Config(format!(
                "{FEAT_PROJ} projects to {feat_hidden} but {TEXT_PROJ} projects to {hidden_dim}"
            )));
        }
        if fused_dim != hidden_dim * 2 {
            return Err(VulnScanError::Config(format!(
                "{CLASSIFIER} expects {fused_dim} inputs but the fused vector has {}",
                hidden_dim * 2
            )));
        }
        if num_classes != NUM_CLASSES {
            return Err(VulnScanError::Config(format!(
                "{CLASSIFIER} produces {num_classes} classes, expected {NUM_CLASSES}"
            )));
        }

        let text_b = take_bias(&mut tensors, TEXT_PROJ, hidden_dim, device)?;
        let feat_b = take_bias(&mut tensors, FEAT_PROJ, hidden_dim, device)?;
        let cls_b = take_bias(&mut tensors, CLASSIFIER, NUM_CLASSES, device)?;

        Ok(Self {
            text_proj: candle_nn::Linear::new(text_w, Some(text_b)),
            feat_proj: candle_nn::Linear::new(feat_w, Some(feat_b)),
            classifier: candle_nn::Linear::new(cls_w, Some(cls_b)),
            dims: ModelDims {
                embedding_dim,
                feature_dim,
                hidden_dim,
            },
            device: device.clone(),
        })
    }

    /// Layer dimensions of this classifier.
    #[must_use]
    pub fn dims(&self) -> ModelDims {
        self.dims
    }

    /// Run a forward pass and return the raw `[safe, vulnerable]` logits.
    ///
    /// # Errors
    ///
    /// Returns [`VulnScanError::Config`] if the inputs do not match
    /// [`HybridClassifier::dims`], or [`VulnScanError::Inference`] if a
    /// tensor operation fails.
    pub fn forward(&self, embedding: &[f32], features: &[f32]) -> Result<[f32; NUM_CLASSES]> {
        if embedding.len() != self.dims.embedding_dim {
            return Err(VulnScanError::Config(format!(
                "Embedding has {} values, classifier expects {}",
                embedding.len(),
                self.dims.embedding_dim
            )));
        }
        if features.len() != self.dims.feature_dim {
            return Err(VulnScanError::Config(format!(
                "Feature vector has {} values, classifier expects {}",
                features.len(),
                self.dims.feature_dim
            )));
        }

        let inference_err = |stage: &str, e: candle_core::Error| {
            VulnScanError::Inference(format!("{stage} failed: {e}"))
        };

        let embedding = Tensor::from_slice(embedding, (1, self.dims.embedding_dim), &self.device)
            .map_err(|e| inference_err("Embedding tensor creation", e))?;
        let features = Tensor::from_slice(features, (1, self.dims.feature_dim), &self.device)
            .map_err(|e| inference_err("Feature tensor creation", e))?;

        let text_h = candle_nn::Module::forward(&self.text_proj, &embedding)
            .and_then(|t| t.relu())
            .map_err(|e| inference_err("text_proj forward", e))?;
        let feat_h = candle_nn::Module::forward(&self.feat_proj, &features)
            .and_then(|t| t.relu())
            .map_err(|e| inference_err("feat_proj forward", e))?;

        let fused = Tensor::cat(&[&text_h, &feat_h], 1)
            .map_err(|e| inference_err("Fusion concat", e))?;

        let logits: Vec<f32> = candle_nn::Module::forward(&self.classifier, &fused)
            .and_then(|t| t.squeeze(0))
            .and_then(|t| t.to_vec1())
            .map_err(|e| inference_err("classifier forward", e))?;

        match logits.as_slice() {
            [safe, vulnerable] => Ok([*safe, *vulnerable]),
            other => Err(VulnScanError::Inference(format!(
                "Classifier returned {} logits",
                other.len()
            ))),
        }
    }
}

/// Read every tensor of a checkpoint file onto `device`.
fn read_checkpoint(path: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "safetensors" => candle_core::safetensors::load(path, device).map_err(|e| {
            VulnScanError::Config(format!(
                "Failed to load checkpoint {}: {e}",
                path.display()
            ))
        }),
        "pt" | "pth" | "bin" => read_pickle(path, device),
        other => Err(VulnScanError::Config(format!(
            "Unsupported checkpoint format '{other}' for {}",
            path.display()
        ))),
    }
}

/// Read a PyTorch pickle, descending into a wrapper dict when the top level
/// holds no classifier tensors.
fn read_pickle(path: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let load = |key: Option<&str>| {
        candle_core::pickle::read_all_with_key(path, key).map_err(|e| {
            VulnScanError::Config(format!(
                "Failed to load checkpoint {}: {e}",
                path.display()
            ))
        })
    };

    let mut entries = load(None)?;
    if !has_components(entries.iter().map(|(k, _)| k.as_str())) {
        for key in WRAPPER_KEYS {
            if let Ok(nested) = load(Some(key)) {
                if has_components(nested.iter().map(|(k, _)| k.as_str())) {
                    tracing::debug!(key, "Unwrapped nested checkpoint container");
                    entries = nested;
                    break;
                }
            }
        }
    }

    entries
        .into_iter()
        .map(|(name, tensor)| {
            tensor
                .to_device(device)
                .map(|t| (name, t))
                .map_err(|e| VulnScanError::Config(format!("Failed to move tensor: {e}")))
        })
        .collect()
}

fn has_components<'a>(mut keys: impl Iterator<Item = &'a str>) -> bool {
    keys.any(|k| COMPONENTS.iter().any(|c| k.starts_with(&format!("{c}."))))
}

/// Strip a wrapper prefix such as `state_dict.` when the classifier
/// components are only found under it.
fn unwrap_container(tensors: HashMap<String, Tensor>) -> HashMap<String, Tensor> {
    if has_components(tensors.keys().map(String::as_str)) {
        return tensors;
    }

    for wrapper in WRAPPER_KEYS {
        let prefix = format!("{wrapper}.");
        let stripped = tensors
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix));
        if has_components(stripped) {
            tracing::debug!(wrapper, "Unwrapped prefixed checkpoint container");
            return tensors
                .into_iter()
                .map(|(k, t)| match k.strip_prefix(&prefix) {
                    Some(inner) => (inner.to_string(), t),
                    None => (k, t),
                })
                .collect();
        }
    }
    tensors
}

fn prepare(tensor: Tensor, device: &Device, name: &str) -> Result<Tensor> {
    tensor
        .to_dtype(DType::F32)
        .and_then(|t| t.to_device(device))
        .map_err(|e| VulnScanError::Config(format!("Failed to prepare {name}: {e}")))
}

fn take_bias(
    tensors: &mut HashMap<String, Tensor>,
    name: &str,
    out_dim: usize,
    device: &Device,
) -> Result<Tensor> {
    let key = format!("{name}.bias");
    match tensors.remove(&key) {
        Some(bias) => {
            let bias = prepare(bias, device, &key)?;
            let len = bias
                .dims1()
                .map_err(|e| VulnScanError::Config(format!("{key} must be a vector: {e}")))?;
            if len != out_dim {
                return Err(VulnScanError::Config(format!(
                    "{key} has {len} entries, expected {out_dim}"
                )));
            }
            Ok(bias)
        }
        None => {
            tracing::warn!(key = %key, "Checkpoint has no bias, using zeros");
            Tensor::zeros(out_dim, DType::F32, device)
                .map_err(|e| VulnScanError::Config(format!("Failed to create {key}: {e}")))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const DIMS: ModelDims = ModelDims {
        embedding_dim: 8,
        feature_dim: 5,
        hidden_dim: 4,
    };

    fn tensor(shape: &[usize], value: f32) -> Tensor {
        let n: usize = shape.iter().product();
        Tensor::from_vec(vec![value; n], shape, &Device::Cpu).unwrap()
    }

    fn full_tensors(prefix: &str) -> HashMap<String, Tensor> {
        let mut map = HashMap::new();
        map.insert(format!("{prefix}text_proj.weight"), tensor(&[4, 8], 0.1));
        map.insert(format!("{prefix}text_proj.bias"), tensor(&[4], 0.0));
        map.insert(format!("{prefix}feat_proj.weight"), tensor(&[4, 5], 0.1));
        map.insert(format!("{prefix}feat_proj.bias"), tensor(&[4], 0.0));
        map.insert(format!("{prefix}classifier.weight"), tensor(&[2, 8], 0.1));
        map.insert(format!("{prefix}classifier.bias"), tensor(&[2], 0.0));
        map
    }

    #[test]
    fn test_new_random_creates_classifier() {
        let classifier = HybridClassifier::new_random(DIMS, &Device::Cpu).unwrap();
        assert_eq!(classifier.dims(), DIMS);
    }

    #[test]
    fn test_forward_with_random_weights() {
        let classifier = HybridClassifier::new_random(DIMS, &Device::Cpu).unwrap();
        let logits = classifier.forward(&[0.0; 8], &[1.0; 5]).unwrap();
        assert!(logits.iter().all(|l| l.is_finite()));
    }

    #[test]
    fn test_forward_known_weights() {
        let mut tensors = full_tensors("");
        // Push the vulnerable logit up by one.
        tensors.insert(
            "classifier.bias".to_string(),
            Tensor::new(&[0.0_f32, 1.0], &Device::Cpu).unwrap(),
        );
        let classifier = HybridClassifier::from_tensors(tensors, &Device::Cpu).unwrap();

        // text_h = relu(0.1 * 8 * 1.0) = 0.8 per unit; feat_h = relu(0.1 * 5 * 2.0) = 1.0
        // logits = 0.1 * (4 * 0.8 + 4 * 1.0) + bias = 0.72 + bias
        let logits = classifier.forward(&[1.0; 8], &[2.0; 5]).unwrap();
        assert!((logits[0] - 0.72).abs() < 1e-5);
        assert!((logits[1] - 1.72).abs() < 1e-5);
    }

    #[test]
    fn test_relu_clamps_negative_projections() {
        let classifier = HybridClassifier::from_tensors(full_tensors(""), &Device::Cpu).unwrap();
        let logits = classifier.forward(&[-1.0; 8], &[-1.0; 5]).unwrap();
        assert_eq!(logits, [0.0, 0.0]);
    }

    #[test]
    fn test_dims_inferred_from_shapes() {
        let classifier = HybridClassifier::from_tensors(full_tensors(""), &Device::Cpu).unwrap();
        assert_eq!(classifier.dims(), DIMS);
    }

    #[test]
    fn test_prefixed_container_is_unwrapped() {
        for prefix in ["state_dict.", "model_state_dict.", "module."] {
            let classifier =
                HybridClassifier::from_tensors(full_tensors(prefix), &Device::Cpu).unwrap();
            assert_eq!(classifier.dims(), DIMS, "prefix {prefix}");
        }
    }

    #[test]
    fn test_unexpected_entries_are_skipped() {
        let mut tensors = full_tensors("");
        tensors.insert("encoder.layer.0.weight".to_string(), tensor(&[3, 3], 1.0));
        tensors.insert("num_batches_tracked".to_string(), tensor(&[1], 0.0));
        assert!(HybridClassifier::from_tensors(tensors, &Device::Cpu).is_ok());
    }

    #[test]
    fn test_missing_bias_is_zero_filled() {
        let mut tensors = full_tensors("");
        tensors.remove("classifier.bias");
        let classifier = HybridClassifier::from_tensors(tensors, &Device::Cpu).unwrap();
        let logits = classifier.forward(&[1.0; 8], &[2.0; 5]).unwrap();
        assert!((logits[0] - 0.72).abs() < 1e-5);
    }

    #[test]
    fn test_missing_weight_is_reported() {
        let mut tensors = full_tensors("");
        tensors.remove("feat_proj.weight");
        tensors.remove("classifier.weight");
        let err = HybridClassifier::from_tensors(tensors, &Device::Cpu)
            .err()
            .unwrap();
        let msg = err.to_string();
        assert!(msg.contains("feat_proj.weight"));
        assert!(msg.contains("classifier.weight"));
        assert!(matches!(err, VulnScanError::Config(_)));
    }

    #[test]
    fn test_hidden_mismatch_is_rejected() {
        let mut tensors = full_tensors("");
        tensors.insert("feat_proj.weight".to_string(), tensor(&[3, 5], 0.1));
        tensors.insert("feat_proj.bias".to_string(), tensor(&[3], 0.0));
        assert!(matches!(
            HybridClassifier::from_tensors(tensors, &Device::Cpu),
            Err(VulnScanError::Config(_))
        ));
    }

    #[test]
    fn test_classifier_input_mismatch_is_rejected() {
        let mut tensors = full_tensors("");
        tensors.insert("classifier.weight".to_string(), tensor(&[2, 6], 0.1));
        assert!(HybridClassifier::from_tensors(tensors, &Device::Cpu).is_err());
    }

    #[test]
    fn test_wrong_class_count_is_rejected() {
        let mut tensors = full_tensors("");
        tensors.insert("classifier.weight".to_string(), tensor(&[3, 8], 0.1));
        tensors.insert("classifier.bias".to_string(), tensor(&[3], 0.0));
        assert!(HybridClassifier::from_tensors(tensors, &Device::Cpu).is_err());
    }

    #[test]
    fn test_bias_length_mismatch_is_rejected() {
        let mut tensors = full_tensors("");
        tensors.insert("text_proj.bias".to_string(), tensor(&[7], 0.0));
        assert!(HybridClassifier::from_tensors(tensors, &Device::Cpu).is_err());
    }

    #[test]
    fn test_dims_check_detects_feature_schema_mismatch() {
        let dims = ModelDims {
            embedding_dim: 768,
            feature_dim: 19,
            hidden_dim: DEFAULT_HIDDEN_DIM,
        };
        assert!(dims.check(768, 19).is_ok());
        let err = dims.check(768, 14).unwrap_err();
        assert!(matches!(err, VulnScanError::Config(_)));
        assert!(err.to_string().contains("19 features"));
    }

    #[test]
    fn test_dims_check_detects_embedding_mismatch() {
        let dims = ModelDims {
            embedding_dim: 768,
            feature_dim: 19,
            hidden_dim: DEFAULT_HIDDEN_DIM,
        };
        assert!(dims.check(384, 19).is_err());
    }

    #[test]
    fn test_forward_rejects_wrong_input_lengths() {
        let classifier = HybridClassifier::new_random(DIMS, &Device::Cpu).unwrap();
        assert!(matches!(
            classifier.forward(&[0.0; 7], &[0.0; 5]),
            Err(VulnScanError::Config(_))
        ));
        assert!(matches!(
            classifier.forward(&[0.0; 8], &[0.0; 4]),
            Err(VulnScanError::Config(_))
        ));
    }

    #[test]
    fn test_load_safetensors_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hybrid.safetensors");
        candle_core::safetensors::save(&full_tensors("state_dict."), &path).unwrap();

        let classifier = HybridClassifier::load(&path, &Device::Cpu).unwrap();
        assert_eq!(classifier.dims(), DIMS);
    }

    fn fixture(name: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    /// Both fixtures hold the weights of `full_tensors` with a
    /// `classifier.bias` of `[0.0, 1.0]`.
    fn assert_fixture_classifier(classifier: &HybridClassifier) {
        assert_eq!(classifier.dims(), DIMS);
        let logits = classifier.forward(&[1.0; 8], &[2.0; 5]).unwrap();
        assert!((logits[0] - 0.72).abs() < 1e-5, "{logits:?}");
        assert!((logits[1] - 1.72).abs() < 1e-5, "{logits:?}");
    }

    #[test]
    fn test_load_pickle_flat() {
        let classifier = HybridClassifier::load(&fixture("hybrid_flat.pt"), &Device::Cpu).unwrap();
        assert_fixture_classifier(&classifier);
    }

    #[test]
    fn test_load_pickle_nested_state_dict() {
        // {"epoch": 3, "state_dict": {...}}, as written by a training loop.
        let classifier =
            HybridClassifier::load(&fixture("hybrid_nested.pt"), &Device::Cpu).unwrap();
        assert_fixture_classifier(&classifier);
    }

    #[test]
    fn test_load_pickle_accepts_pth_and_bin_extensions() {
        let dir = tempfile::tempdir().unwrap();
        for ext in ["pth", "bin", "PT"] {
            let path = dir.path().join(format!("hybrid.{ext}"));
            std::fs::copy(fixture("hybrid_nested.pt"), &path).unwrap();
            let classifier = HybridClassifier::load(&path, &Device::Cpu).unwrap();
            assert_fixture_classifier(&classifier);
        }
    }

    #[test]
    fn test_load_corrupt_pickle_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pt");
        std::fs::write(&path, b"not a zip archive").unwrap();
        assert!(matches!(
            HybridClassifier::load(&path, &Device::Cpu),
            Err(VulnScanError::Config(_))
        ));
    }

    #[test]
    fn test_load_nonexistent_path_fails() {
        let result = HybridClassifier::load(
            Path::new("/nonexistent/hybrid.safetensors"),
            &Device::Cpu,
        );
        assert!(matches!(result, Err(VulnScanError::Config(_))));
    }

    #[test]
    fn test_load_unsupported_extension_fails() {
        let result = HybridClassifier::load(Path::new("/tmp/model.onnx"), &Device::Cpu);
        let err = result.err().unwrap();
        assert!(err.to_string().contains("Unsupported checkpoint format"));
    }
}
