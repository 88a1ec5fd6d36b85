//! Opaque handles to ciphertexts held by the FHE service
//!
//! A handle is never inspected by the engine. It is passed back into the
//! capability's declared operations and stored; the ciphertext itself stays
//! on the service side of the boundary. Integer and boolean handles are
//! distinct types so the compiler enforces which operations accept which.

use serde::{Deserialize, Serialize};

/// Bit width of integer handles
pub const INTEGER_WIDTH: u16 = 64;

/// Identifier of a ciphertext held by the service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandleId([u8; 32]);

impl HandleId {
    /// Create a handle id from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive a fresh id from a sequence number and a domain tag
    pub fn derive(seq: u64, tag: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"obscura_handle_v1");
        hasher.update(tag);
        hasher.update(&seq.to_le_bytes());
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
}

/// Handle to an encrypted unsigned integer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedHandle {
    /// Ciphertext identifier
    pub id: HandleId,
    /// Plaintext bit width
    pub width: u16,
}

impl EncryptedHandle {
    /// Create a new integer handle
    pub fn new(id: HandleId, width: u16) -> Self {
        Self { id, width }
    }
}

/// Handle to an encrypted boolean (comparison results)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBoolHandle {
    /// Ciphertext identifier
    pub id: HandleId,
}

impl EncryptedBoolHandle {
    /// Create a new boolean handle
    pub fn new(id: HandleId) -> Self {
        Self { id }
    }
}
