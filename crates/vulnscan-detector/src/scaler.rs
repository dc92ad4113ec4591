//! Pre-fit feature scaling.
//!
//! The training pipeline fits a scaler on the raw lexical features and
//! exports its parameters as JSON, using the scikit-learn attribute names so
//! an exported `StandardScaler` or `MinMaxScaler` maps directly:
//!
//! ```json
//! { "kind": "standard", "mean": [0.1, 2.0], "scale": [1.5, 0.5] }
//! { "kind": "min_max",  "min": [0.0, -0.2], "scale": [0.01, 0.1] }
//! ```
//!
//! Scaling is optional: with no scaler the raw features pass through.

use std::path::Path;

use serde::{Deserialize, Serialize};
use vulnscan_core::{Result, VulnScanError};

/// Serialized scaler parameters, one entry per feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerParams {
    /// `(x - mean) / scale`.
    Standard {
        /// Per-feature mean.
        mean: Vec<f32>,
        /// Per-feature standard deviation.
        scale: Vec<f32>,
    },
    /// `x * scale + min`.
    MinMax {
        /// Per-feature additive offset (`min_` in scikit-learn).
        min: Vec<f32>,
        /// Per-feature multiplicative factor.
        scale: Vec<f32>,
    },
}

/// Immutable, validated feature scaler.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureScaler {
    params: ScalerParams,
    dim: usize,
}

impl FeatureScaler {
    /// Validate parameters and build a scaler.
    ///
    /// # Errors
    ///
    /// Returns [`VulnScanError::Config`] if the vectors are empty, differ in
    /// length, or contain non-finite values.
    pub fn new(params: ScalerParams) -> Result<Self> {
        let (name_a, a, name_b, b) = match &params {
            ScalerParams::Standard { mean, scale } => ("mean", mean, "scale", scale),
            ScalerParams::MinMax { min, scale } => ("min", min, "scale", scale),
        };

        if a.is_empty() {
            return Err(VulnScanError::Config(
                "Scaler parameters must not be empty".to_string(),
            ));
        }
        if a.len() != b.len() {
            return Err(VulnScanError::Config(format!(
                "Scaler {name_a} has {} entries but {name_b} has {}",
                a.len(),
                b.len()
            )));
        }
        if let Some(idx) = a.iter().chain(b.iter()).position(|v| !v.is_finite()) {
            return Err(VulnScanError::Config(format!(
                "Scaler contains a non-finite value at flat index {idx}"
            )));
        }

        let dim = a.len();
        Ok(Self { params, dim })
    }

    /// Load a scaler from a JSON artifact.
    ///
    /// # Errors
    ///
    /// Returns [`VulnScanError::Io`] if the file cannot be read,
    /// [`VulnScanError::Serialization`] if it is not valid scaler JSON, and
    /// [`VulnScanError::Config`] if the parameters fail validation.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("failed to read scaler file {}: {e}", path.display()),
            )
        })?;
        let params: ScalerParams = serde_json::from_str(&contents)?;
        let scaler = Self::new(params)?;
        tracing::info!(
            path = %path.display(),
            kind = scaler.kind(),
            dim = scaler.dim(),
            "Feature scaler loaded"
        );
        Ok(scaler)
    }

    /// Number of features this scaler was fit on.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Short name of the transform, for logs and health output.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self.params {
            ScalerParams::Standard { .. } => "standard",
            ScalerParams::MinMax { .. } => "min_max",
        }
    }

    /// Apply the transform to a feature vector.
    ///
    /// # Errors
    ///
    /// Returns [`VulnScanError::Config`] when `features.len()` differs from
    /// the fitted dimension.
    pub fn transform(&self, features: &[f32]) -> Result<Vec<f32>> {
        if features.len() != self.dim {
            return Err(VulnScanError::Config(format!(
                "Scaler was fit on {} features but received {}",
                self.dim,
                features.len()
            )));
        }

        let scaled = match &self.params {
            ScalerParams::Standard { mean, scale } => features
                .iter()
                .zip(mean.iter().zip(scale.iter()))
                .map(|(x, (m, s))| {
                    // Constant features are exported with a zero scale.
                    let s = if *s == 0.0 { 1.0 } else { *s };
                    (x - m) / s
                })
                .collect(),
            ScalerParams::MinMax { min, scale } => features
                .iter()
                .zip(min.iter().zip(scale.iter()))
                .map(|(x, (m, s))| x * s + m)
                .collect(),
        };
        Ok(scaled)
    }
}

/// Scale `features` when a scaler is configured, otherwise return them as-is.
///
/// # Errors
///
/// Propagates [`FeatureScaler::transform`] dimension errors.
pub fn normalize(features: Vec<f32>, scaler: Option<&FeatureScaler>) -> Result<Vec<f32>> {
    match scaler {
        Some(s) => s.transform(&features),
        None => Ok(features),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn standard(mean: Vec<f32>, scale: Vec<f32>) -> FeatureScaler {
        FeatureScaler::new(ScalerParams::Standard { mean, scale }).unwrap()
    }

    #[test]
    fn test_identity_without_scaler() {
        let features = vec![1.0, 2.0, 3.0];
        assert_eq!(normalize(features.clone(), None).unwrap(), features);
    }

    #[test]
    fn test_standard_transform() {
        let scaler = standard(vec![1.0, 10.0], vec![2.0, 5.0]);
        let out = scaler.transform(&[3.0, 0.0]).unwrap();
        assert!((out[0] - 1.0).abs() < 1e-6);
        assert!((out[1] + 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_standard_zero_scale_is_treated_as_one() {
        let scaler = standard(vec![1.0], vec![0.0]);
        let out = scaler.transform(&[4.0]).unwrap();
        assert!((out[0] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_min_max_transform() {
        let scaler = FeatureScaler::new(ScalerParams::MinMax {
            min: vec![-0.5, 0.0],
            scale: vec![0.5, 0.25],
        })
        .unwrap();
        let out = scaler.transform(&[1.0, 4.0]).unwrap();
        assert!(out[0].abs() < 1e-6);
        assert!((out[1] - 1.0).abs() < 1e-6);
        assert_eq!(scaler.kind(), "min_max");
    }

    #[test]
    fn test_dimension_mismatch_is_config_error() {
        let scaler = standard(vec![0.0; 19], vec![1.0; 19]);
        let err = scaler.transform(&[0.0; 14]).unwrap_err();
        assert!(matches!(err, VulnScanError::Config(_)));
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        let err = FeatureScaler::new(ScalerParams::Standard {
            mean: vec![0.0; 3],
            scale: vec![1.0; 2],
        })
        .unwrap_err();
        assert!(err.to_string().contains("mean has 3 entries"));
    }

    #[test]
    fn test_new_rejects_non_finite() {
        let result = FeatureScaler::new(ScalerParams::MinMax {
            min: vec![0.0, f32::NAN],
            scale: vec![1.0, 1.0],
        });
        assert!(matches!(result, Err(VulnScanError::Config(_))));
    }

    #[test]
    fn test_new_rejects_empty() {
        let result = FeatureScaler::new(ScalerParams::Standard {
            mean: vec![],
            scale: vec![],
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_json() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(br#"{"kind": "standard", "mean": [0.0, 1.0], "scale": [1.0, 2.0]}"#)
            .unwrap();
        let scaler = FeatureScaler::load(f.path()).unwrap();
        assert_eq!(scaler.dim(), 2);
        assert_eq!(scaler.kind(), "standard");
    }

    #[test]
    fn test_load_invalid_json() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(br#"{"kind": "robust", "center": [0.0]}"#).unwrap();
        let result = FeatureScaler::load(f.path());
        assert!(matches!(result, Err(VulnScanError::Serialization(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = FeatureScaler::load(Path::new("/nonexistent/scaler.json")).unwrap_err();
        match &err {
            VulnScanError::Io(io) => assert_eq!(io.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected Io error, got {other:?}"),
        }
        assert!(err.to_string().contains("/nonexistent/scaler.json"));
        assert!(!err.is_client_error());
    }
}
