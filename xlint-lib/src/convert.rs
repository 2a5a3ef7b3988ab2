//! Base64 <-> DER conversion for batch input and output records.

use crate::XlintError;
use base64::Engine;

/// Decode a standard (padded) base64 string into DER bytes.
///
/// Surrounding whitespace is ignored.
pub fn base64_to_der(encoded: &str) -> Result<Vec<u8>, XlintError> {
    Ok(base64::engine::general_purpose::STANDARD.decode(encoded.trim())?)
}

/// Encode DER bytes as a single-line standard base64 string.
pub fn der_to_base64(der: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(der)
}
