//! # Content Digest — References to Opaque Payloads
//!
//! Defines `ContentDigest`, the SHA-256 reference type used wherever the
//! core records a payload it does not interpret: dispute evidence bodies,
//! evidence attachments, and relayer attestation signature payloads.
//!
//! ## Security Invariant
//!
//! The core never stores or trusts the payload bytes themselves; it stores
//! the digest, so an audit record cannot be silently rewritten after
//! insertion.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A SHA-256 content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    /// The raw 32-byte digest value.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Wrap raw digest bytes.
    ///
    /// Prefer [`sha256_digest()`] when the payload is at hand.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// Compute the SHA-256 digest of a payload.
pub fn sha256_digest(data: &[u8]) -> ContentDigest {
    let hash = Sha256::digest(data);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest::new(bytes)
}
