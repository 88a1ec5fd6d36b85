//! Client-side encryption of contributions
//!
//! Contributions are encrypted by the participant and submitted as raw
//! ciphertext bytes plus an attestation binding those bytes to the
//! submission. The local deployment uses a keyed commitment as the
//! attestation; a deployment with untrusted clients substitutes a
//! zero-knowledge proof of plaintext knowledge at the same seam.

use serde::{Deserialize, Serialize};
use tfhe::prelude::*;
use tfhe::FheUint64;

use crate::handle::INTEGER_WIDTH;
use crate::keys::ClientKey;
use crate::{FheError, FheResult};

/// Attestation that a submitted ciphertext was formed correctly
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionProof {
    /// Keyed commitment over the ciphertext bytes
    pub commitment: [u8; 32],
}

impl SubmissionProof {
    /// Compute the commitment for a ciphertext
    pub fn compute(attestation_key: &[u8; 32], ciphertext: &[u8], width: u16) -> Self {
        let mut hasher = blake3::Hasher::new_keyed(attestation_key);
        hasher.update(ciphertext);
        hasher.update(&width.to_le_bytes());
        Self {
            commitment: *hasher.finalize().as_bytes(),
        }
    }

    /// Check the proof against the ciphertext it claims to attest
    pub fn verify(&self, attestation_key: &[u8; 32], ciphertext: &[u8], width: u16) -> bool {
        Self::compute(attestation_key, ciphertext, width).commitment == self.commitment
    }
}

/// A client-encrypted contribution ready for submission
#[derive(Clone, Serialize, Deserialize)]
pub struct EncryptedInput {
    /// Serialized ciphertext
    pub ciphertext: Vec<u8>,
    /// Plaintext bit width
    pub width: u16,
    /// Attestation over the ciphertext
    pub proof: SubmissionProof,
}

impl std::fmt::Debug for EncryptedInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedInput")
            .field("size", &self.ciphertext.len())
            .field("width", &self.width)
            .finish()
    }
}

/// Encrypts contribution values on behalf of a participant
#[derive(Clone)]
pub struct ClientEncryptor {
    client_key: ClientKey,
    attestation_key: [u8; 32],
}

impl ClientEncryptor {
    pub(crate) fn new(client_key: ClientKey, attestation_key: [u8; 32]) -> Self {
        Self {
            client_key,
            attestation_key,
        }
    }

    /// Encrypt a 64-bit value for submission
    pub fn encrypt_u64(&self, value: u64) -> FheResult<EncryptedInput> {
        let ciphertext = FheUint64::try_encrypt(value, self.client_key.inner())
            .map_err(|e| FheError::EncryptionFailed(e.to_string()))?;

        let bytes = bincode::serialize(&ciphertext)
            .map_err(|e| FheError::SerializationError(e.to_string()))?;

        let proof = SubmissionProof::compute(&self.attestation_key, &bytes, INTEGER_WIDTH);

        Ok(EncryptedInput {
            ciphertext: bytes,
            width: INTEGER_WIDTH,
            proof,
        })
    }

    /// Encrypt a 0/1 ballot choice
    pub fn encrypt_choice(&self, choice: bool) -> FheResult<EncryptedInput> {
        self.encrypt_u64(choice as u64)
    }
}

impl std::fmt::Debug for ClientEncryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientEncryptor")
            .field("attestation_key", &hex::encode(&self.attestation_key[..8]))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proof_binds_ciphertext() {
        let key = [7u8; 32];
        let proof = SubmissionProof::compute(&key, b"ciphertext-bytes", INTEGER_WIDTH);

        assert!(proof.verify(&key, b"ciphertext-bytes", INTEGER_WIDTH));
        assert!(!proof.verify(&key, b"tampered-bytes", INTEGER_WIDTH));
        assert!(!proof.verify(&key, b"ciphertext-bytes", 32));
        assert!(!proof.verify(&[8u8; 32], b"ciphertext-bytes", INTEGER_WIDTH));
    }
}
