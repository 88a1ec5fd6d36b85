//! OBSCURA FHE Capability Boundary
//!
//! The engine computes on encrypted values it can never read. Everything it
//! is allowed to do is declared by the [`FheCapability`] trait; everything it
//! is allowed to hold is an opaque handle. Ciphertexts, keys, and the
//! plaintext/ciphertext boundary live on this side.
//!
//! # Components
//!
//! - [`EncryptedHandle`] / [`EncryptedBoolHandle`]: opaque references to
//!   ciphertexts held by the service
//! - [`FheCapability`]: the declared operation set (encrypt, ingest,
//!   homomorphic add/sub/compare/select, request-decrypt)
//! - [`ClientEncryptor`]: client-side encryption and attestation of
//!   contributions
//! - [`LocalFheService`]: a TFHE-rs-backed deployment of the capability for
//!   single-process use

pub mod capability;
pub mod client;
pub mod errors;
pub mod handle;
pub mod keys;
pub mod service;

pub use capability::{DecryptRequestId, DecryptResult, FheCapability};
pub use client::{ClientEncryptor, EncryptedInput, SubmissionProof};
pub use errors::FheError;
pub use handle::{EncryptedBoolHandle, EncryptedHandle, HandleId, INTEGER_WIDTH};
pub use keys::{ClientKey, ServerKey, ServiceKeys};
pub use service::LocalFheService;

/// Result type for FHE capability operations
pub type FheResult<T> = Result<T, FheError>;

#[cfg(test)]
pub(crate) mod testkeys {
    use crate::keys::ServiceKeys;
    use once_cell::sync::Lazy;

    /// Key generation dominates test time; every test in this crate shares
    /// one pair.
    pub static KEYS: Lazy<ServiceKeys> =
        Lazy::new(|| ServiceKeys::generate().expect("key generation"));
}
