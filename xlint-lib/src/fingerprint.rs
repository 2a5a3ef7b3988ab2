//! Certificate fingerprint (digest) computation.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 fingerprint of DER-encoded certificate bytes.
///
/// Returns lowercase hex without separators, the form used in batch
/// process output.
pub fn sha256_hex(der_bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(der_bytes))
}
