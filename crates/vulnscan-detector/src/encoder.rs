//! Text encoders producing the pooled embedding for the text branch.
//!
//! The classifier only needs a fixed-size vector per input. Any
//! [`TextEncoder`] that is deterministic for identical input and always
//! returns [`TextEncoder::dim`] values will do. [`ZeroEncoder`] is the
//! degraded configuration used when no encoder model is deployed.

use vulnscan_core::Result;

/// Produces a fixed-size pooled representation of a code snippet.
pub trait TextEncoder: Send + Sync {
    /// Length of every vector returned by [`TextEncoder::encode`].
    fn dim(&self) -> usize;

    /// Encode `code` into a pooled embedding of length [`TextEncoder::dim`].
    fn encode(&self, code: &str) -> Result<Vec<f32>>;

    /// Human-readable encoder name.
    fn name(&self) -> &'static str;
}

/// Placeholder encoder that always returns the zero vector.
///
/// The classifier stays well-defined over it; prediction quality relies on
/// the feature branch alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroEncoder {
    dim: usize,
}

impl ZeroEncoder {
    /// Create a zero encoder of the given dimension.
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl TextEncoder for ZeroEncoder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn encode(&self, _code: &str) -> Result<Vec<f32>> {
        Ok(vec![0.0; self.dim])
    }

    fn name(&self) -> &'static str {
        "zero"
    }
}
