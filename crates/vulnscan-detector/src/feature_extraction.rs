//! Lexical feature extraction for the hybrid classifier.
//!
//! Builds a fixed-size numeric feature vector from raw source text. The
//! vector is fed to the feature projection branch of the
//! [`HybridClassifier`](crate::hybrid_classifier::HybridClassifier), which
//! depends positionally on the layout below.
//!
//! # Feature Vector Layout (19 dimensions)
//!
//! | Index | Feature          | Type    |
//! |-------|------------------|---------|
//! | 0     | `api_strcpy`     | Count   |
//! | 1     | `api_strcat`     | Count   |
//! | 2     | `api_sprintf`    | Count   |
//! | 3     | `api_gets`       | Count   |
//! | 4     | `api_scanf`      | Count   |
//! | 5     | `api_memcpy`     | Count   |
//! | 6     | `api_memmove`    | Count   |
//! | 7     | `api_malloc`     | Count   |
//! | 8     | `api_free`       | Count   |
//! | 9     | `uses_malloc`    | Binary  |
//! | 10    | `uses_free`      | Binary  |
//! | 11    | `malloc_count`   | Count   |
//! | 12    | `free_count`     | Count   |
//! | 13    | `ptr_star`       | Count   |
//! | 14    | `ptr_amp`        | Count   |
//! | 15    | `ptr_arrow`      | Count   |
//! | 16    | `code_length`    | Numeric |
//! | 17    | `num_statements` | Count   |
//! | 18    | `num_lines`      | Count   |
//!
//! Every counter is measured on the cleaned text: comments removed, then
//! whitespace runs collapsed to a single space. Because newlines are
//! collapsed too, `num_lines` is always 1. The trained checkpoints were fit
//! on exactly this layout, so it must not be "fixed" without retraining.
//!
//! Counts are plain non-overlapping substring counts, so `free` also matches
//! inside `freeaddrinfo`.

/// Security-sensitive C library calls, in feature order.
pub const DANGEROUS_APIS: [&str; 9] = [
    "strcpy", "strcat", "sprintf", "gets", "scanf", "memcpy", "memmove", "malloc", "free",
];

/// How a single feature is computed from the cleaned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// Non-overlapping occurrences of a substring.
    Occurrences(&'static str),
    /// `1.0` if the substring occurs at least once, else `0.0`.
    Presence(&'static str),
    /// Length of the cleaned text in characters.
    CharLength,
    /// Number of `\n` characters plus one.
    LineCount,
}

/// A named entry of the feature schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureDescriptor {
    /// Stable feature name, e.g. `api_strcpy`.
    pub name: &'static str,
    /// Computation for this slot.
    pub kind: FeatureKind,
}

const fn occurrences(name: &'static str, needle: &'static str) -> FeatureDescriptor {
    FeatureDescriptor {
        name,
        kind: FeatureKind::Occurrences(needle),
    }
}

/// Ordered feature schema. The single source of truth for [`FEATURE_DIM`].
pub const FEATURE_SCHEMA: [FeatureDescriptor; 19] = [
    occurrences("api_strcpy", "strcpy"),
    occurrences("api_strcat", "strcat"),
    occurrences("api_sprintf", "sprintf"),
    occurrences("api_gets", "gets"),
    occurrences("api_scanf", "scanf"),
    occurrences("api_memcpy", "memcpy"),
    occurrences("api_memmove", "memmove"),
    occurrences("api_malloc", "malloc"),
    occurrences("api_free", "free"),
    FeatureDescriptor {
        name: "uses_malloc",
        kind: FeatureKind::Presence("malloc"),
    },
    FeatureDescriptor {
        name: "uses_free",
        kind: FeatureKind::Presence("free"),
    },
    occurrences("malloc_count", "malloc"),
    occurrences("free_count", "free"),
    occurrences("ptr_star", "*"),
    occurrences("ptr_amp", "&"),
    occurrences("ptr_arrow", "->"),
    FeatureDescriptor {
        name: "code_length",
        kind: FeatureKind::CharLength,
    },
    occurrences("num_statements", ";"),
    FeatureDescriptor {
        name: "num_lines",
        kind: FeatureKind::LineCount,
    },
];

/// Total number of features in the lexical feature vector.
pub const FEATURE_DIM: usize = FEATURE_SCHEMA.len();

/// Position of a named feature in the vector, if it exists.
#[must_use]
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_SCHEMA.iter().position(|d| d.name == name)
}

/// Feature names in vector order.
pub fn feature_names() -> impl Iterator<Item = &'static str> {
    FEATURE_SCHEMA.iter().map(|d| d.name)
}

/// Pair each value with its feature name, for logging.
#[must_use]
pub fn describe_features(features: &[f32]) -> Vec<(&'static str, f32)> {
    feature_names().zip(features.iter().copied()).collect()
}

/// Remove `//` line comments, then `/* ... */` block comments.
///
/// Line comments run up to (not including) the next `\n`. Block comments are
/// non-nested and end at the first `*/`; an unterminated `/*` is kept.
#[must_use]
pub fn strip_comments(code: &str) -> String {
    let mut without_line = String::with_capacity(code.len());
    for (i, line) in code.split('\n').enumerate() {
        if i > 0 {
            without_line.push('\n');
        }
        match line.find("//") {
            Some(pos) => without_line.push_str(&line[..pos]),
            None => without_line.push_str(line),
        }
    }

    let mut out = String::with_capacity(without_line.len());
    let mut rest = without_line.as_str();
    while let Some(open) = rest.find("/*") {
        match rest[open + 2..].find("*/") {
            Some(close) => {
                out.push_str(&rest[..open]);
                rest = &rest[open + 2 + close + 2..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// Collapse every whitespace run into one space and trim both ends.
///
/// The ASCII information separators U+001C..=U+001F count as whitespace,
/// matching the tokenisation the training features were computed with.
#[must_use]
pub fn normalize_whitespace(code: &str) -> String {
    code.split(is_separator)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Comment stripping followed by whitespace normalisation.
#[must_use]
pub fn clean_code(code: &str) -> String {
    normalize_whitespace(&strip_comments(code))
}

/// Extract the lexical feature vector from raw source text.
///
/// Returns a `Vec<f32>` of length [`FEATURE_DIM`], laid out as
/// [`FEATURE_SCHEMA`].
#[must_use]
pub fn extract_features(code: &str) -> Vec<f32> {
    let cleaned = clean_code(code);
    FEATURE_SCHEMA
        .iter()
        .map(|descriptor| match descriptor.kind {
            FeatureKind::Occurrences(needle) => cleaned.matches(needle).count() as f32,
            FeatureKind::Presence(needle) => {
                if cleaned.contains(needle) {
                    1.0
                } else {
                    0.0
                }
            }
            FeatureKind::CharLength => cleaned.chars().count() as f32,
            FeatureKind::LineCount => (cleaned.matches('\n').count() + 1) as f32,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
