//! Boolean verdict detection.

use super::Rejection;

/// Decide whether `raw` encodes a boolean verdict.
///
/// The text is lower-cased and trimmed, then searched for `"true"` before
/// `"false"`. A response mentioning both is read as `true`.
pub fn interpret_boolean(raw: &str) -> Result<bool, Rejection> {
    let normalized = raw.trim().to_lowercase();

    if normalized.contains("true") {
        Ok(true)
    } else if normalized.contains("false") {
        Ok(false)
    } else {
        Err(Rejection::NoBoolean)
    }
}
