//! FHE capability error types

use thiserror::Error;

/// Errors surfaced across the capability boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FheError {
    /// Handle does not name a ciphertext this service holds
    #[error("Unknown handle: {0}")]
    UnknownHandle(String),

    /// Operand widths are incompatible
    #[error("Width mismatch: expected {expected} bits, got {got}")]
    WidthMismatch { expected: u16, got: u16 },

    /// Submitted ciphertext failed attestation
    #[error("Submission proof rejected: {0}")]
    InvalidProof(String),

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Ciphertext bytes could not be (de)serialized
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Homomorphic operation failed
    #[error("Homomorphic operation failed: {0}")]
    OperationFailed(String),
}
