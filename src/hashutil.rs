//! Shared content-hashing helper backing both file-identity and shape-signature
//! hashing: sha256 the bytes, hex-encode the digest.

use sha2::{Digest, Sha256};

pub(crate) fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
