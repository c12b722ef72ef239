//! Sentence canonicalization.

use unicode_normalization::UnicodeNormalization;

/// NFKC-normalize, collapse whitespace runs to one space, and trim.
///
/// Total: whitespace-only input becomes the empty string.
pub fn normalize(raw: &str) -> String {
    let composed: String = raw.nfkc().collect();
    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}
