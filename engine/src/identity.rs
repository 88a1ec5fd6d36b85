//! Participant identities
//!
//! The ledger layer authenticates callers; the engine receives identities
//! as opaque 32-byte values and trusts them as given.

use serde::{Deserialize, Serialize};

/// Authenticated caller identity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity([u8; 32]);

impl Identity {
    /// Create an identity from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive an identity from a human-readable label
    pub fn derive(label: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"obscura_identity_v1");
        hasher.update(label.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short display form for logs
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..8])
    }
}
