use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Result, TransitError};

/// Decode a transit signature of the form `<prefix>:<key-version>:<base64>`.
///
/// Only the third segment carries signature bytes.
pub fn decode_composite_signature(composite: &str) -> Result<Vec<u8>> {
    let segments: Vec<&str> = composite.split(':').collect();
    let Some(payload) = segments.get(2) else {
        return Err(TransitError::Signature(format!(
            "expected <prefix>:<key-version>:<signature>, got {} segment(s)",
            segments.len()
        )));
    };

    let signature = STANDARD
        .decode(payload)
        .map_err(|e| TransitError::Signature(format!("signature is not base64: {e}")))?;
    if signature.is_empty() {
        return Err(TransitError::Signature("signature is empty".into()));
    }
    Ok(signature)
}
