//! The capability boundary between the engine and the FHE service
//!
//! The engine only ever sees opaque handles and the operations declared
//! here. Every call is independent: the only state that crosses the
//! boundary is the handle and request identifiers the service returns.
//!
//! Decryption is asymmetric by design. `request_decrypt` queues the work
//! and returns an identifier; the plaintext arrives later through
//! `take_decrypt_results` and is matched against that identifier by the
//! caller. A local service may answer immediately, but it still delivers
//! through the outbox so callers exercise the same request/callback path
//! as a networked decryption oracle.

use serde::{Deserialize, Serialize};

use crate::client::EncryptedInput;
use crate::handle::{EncryptedBoolHandle, EncryptedHandle, HandleId};
use crate::FheResult;

/// Identifier of an outstanding decryption request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecryptRequestId([u8; 32]);

impl DecryptRequestId {
    /// Create a request id from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive a fresh id from a sequence number and the handle under decryption
    pub fn derive(seq: u64, handle: &HandleId) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"obscura_decrypt_request_v1");
        hasher.update(handle.as_bytes());
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

/// A completed decryption, delivered through the service's outbox
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptResult {
    /// The request this answers
    pub request_id: DecryptRequestId,
    /// Recovered plaintext
    pub value: u64,
}

/// Operations the external FHE service exposes to the engine
pub trait FheCapability {
    /// Encrypt a non-sensitive initialization value (zero counters,
    /// constants). Contribution values never go through here; they arrive
    /// client-encrypted via [`FheCapability::ingest`].
    fn encrypt(&mut self, value: u64, width: u16) -> FheResult<EncryptedHandle>;

    /// Validate a client-encrypted submission against its attestation and
    /// admit it as a handle
    fn ingest(&mut self, input: &EncryptedInput) -> FheResult<EncryptedHandle>;

    /// a + b
    fn hom_add(
        &mut self,
        a: &EncryptedHandle,
        b: &EncryptedHandle,
    ) -> FheResult<EncryptedHandle>;

    /// a - b
    fn hom_sub(
        &mut self,
        a: &EncryptedHandle,
        b: &EncryptedHandle,
    ) -> FheResult<EncryptedHandle>;

    /// a > b, as an encrypted boolean
    fn hom_gt(
        &mut self,
        a: &EncryptedHandle,
        b: &EncryptedHandle,
    ) -> FheResult<EncryptedBoolHandle>;

    /// if cond { a } else { b }
    fn hom_select(
        &mut self,
        cond: &EncryptedBoolHandle,
        a: &EncryptedHandle,
        b: &EncryptedHandle,
    ) -> FheResult<EncryptedHandle>;

    /// Disclose a single comparison bit
    ///
    /// This is the one declared disclosure below the reveal: callers use it
    /// to track a plaintext auction leader from an encrypted comparison.
    /// It never discloses an integer handle's value.
    fn disclose_bool(&mut self, cond: &EncryptedBoolHandle) -> FheResult<bool>;

    /// Queue decryption of an aggregate handle; the plaintext arrives later
    /// through [`FheCapability::take_decrypt_results`]
    fn request_decrypt(&mut self, handle: &EncryptedHandle) -> FheResult<DecryptRequestId>;

    /// Drain completed decryptions
    fn take_decrypt_results(&mut self) -> Vec<DecryptResult>;
}
