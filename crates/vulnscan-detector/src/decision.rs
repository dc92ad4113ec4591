//! Decision rule: logits → label + confidence.
//!
//! Softmax is computed in `f64` with the usual max-subtraction, then the
//! arg-max class becomes the label. On an exact tie the first class wins, so
//! equal logits always yield `SAFE` with confidence `0.5`.

use vulnscan_core::{Label, PredictionResult, Result, VulnScanError};

/// Number of output classes (safe, vulnerable).
pub const NUM_CLASSES: usize = 2;

/// Numerically stable softmax over finite logits.
fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits
        .iter()
        .map(|&l| f64::from(l))
        .fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&l| (f64::from(l) - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Convert class logits into a [`PredictionResult`].
///
/// # Errors
///
/// Returns [`VulnScanError::Inference`] if there are not exactly
/// [`NUM_CLASSES`] logits or any logit is NaN or infinite.
pub fn decide(logits: &[f32]) -> Result<PredictionResult> {
    if logits.len() != NUM_CLASSES {
        return Err(VulnScanError::Inference(format!(
            "Expected {NUM_CLASSES} logits, got {}",
            logits.len()
        )));
    }
    if logits.iter().any(|l| !l.is_finite()) {
        return Err(VulnScanError::Inference(format!(
            "Non-finite logits: {logits:?}"
        )));
    }

    let probs = softmax(logits);
    let safe = probs[Label::Safe.class_index()];
    let vulnerable = probs[Label::Vulnerable.class_index()];

    let (label, confidence) = if vulnerable > safe {
        (Label::Vulnerable, vulnerable)
    } else {
        (Label::Safe, safe)
    };

    Ok(PredictionResult {
        label,
        confidence: confidence.clamp(0.0, 1.0),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
