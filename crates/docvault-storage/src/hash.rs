//! Content digests used for document identity and change detection.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `content`.
pub fn content_hash(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}
