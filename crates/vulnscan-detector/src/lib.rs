//! Vulnerability detection for C/C++ source snippets.
//!
//! The pipeline combines two signals:
//!
//! - [`feature_extraction`]: a fixed, ordered vector of lexical features
//!   (dangerous API calls, allocation counts, pointer syntax, size metrics)
//!   computed on comment-stripped, whitespace-normalized text.
//! - [`encoder`]: a pooled text embedding. The default [`ZeroEncoder`] emits
//!   a zero vector; the `transformer` feature adds a BERT-family encoder.
//!
//! Both feed [`HybridClassifier`], whose logits are turned into a
//! [`PredictionResult`](vulnscan_core::PredictionResult) by
//! [`decision::decide`]. [`VulnerabilityDetector`] wires the stages together.
//!
//! # Example
//!
//! ```no_run
//! use candle_core::Device;
//! use vulnscan_detector::{HybridClassifier, VulnerabilityDetector, ZeroEncoder};
//!
//! # fn main() -> vulnscan_core::Result<()> {
//! let classifier =
//!     HybridClassifier::load("model/hybrid_classifier.safetensors".as_ref(), &Device::Cpu)?;
//! let detector = VulnerabilityDetector::new(classifier, None, Box::new(ZeroEncoder::new(768)))?;
//! let result = detector.predict("char buf[8]; strcpy(buf, argv[1]);")?;
//! println!("{} ({:.3})", result.label, result.confidence);
//! # Ok(())
//! # }
//! ```

pub mod decision;
pub mod detector;
pub mod device;
pub mod encoder;
pub mod feature_extraction;
pub mod hybrid_classifier;
pub mod scaler;
#[cfg(feature = "transformer")]
pub mod transformer_encoder;

pub use detector::{validate_source, VulnerabilityDetector};
pub use device::select_device;
pub use encoder::{TextEncoder, ZeroEncoder};
pub use feature_extraction::{extract_features, FEATURE_DIM, FEATURE_SCHEMA};
pub use hybrid_classifier::{HybridClassifier, ModelDims};
pub use scaler::{FeatureScaler, ScalerParams};
#[cfg(feature = "transformer")]
pub use transformer_encoder::TransformerEncoder;
