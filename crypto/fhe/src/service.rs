//! Local TFHE-rs deployment of the FHE capability
//!
//! Holds the ciphertexts the engine only sees handles to. Homomorphic
//! operations run under the installed server key; decryption requests are
//! answered through an outbox rather than inline, so callers drive the
//! same request/callback sequence they would against a networked
//! decryption oracle.

use std::collections::HashMap;

use tfhe::prelude::*;
use tfhe::{FheBool, FheUint64};

use crate::capability::{DecryptRequestId, DecryptResult, FheCapability};
use crate::client::{ClientEncryptor, EncryptedInput};
use crate::handle::{EncryptedBoolHandle, EncryptedHandle, HandleId, INTEGER_WIDTH};
use crate::keys::ServiceKeys;
use crate::{FheError, FheResult};

/// Ciphertext held on behalf of a handle
enum StoredCipher {
    Uint(FheUint64),
    Bool(FheBool),
}

/// Single-process FHE service backed by TFHE-rs
///
/// Holds both halves of the key pair: it evaluates homomorphic operations
/// with the server key and doubles as the decryption oracle with the
/// client key. A networked deployment splits those roles; the capability
/// surface is unchanged.
pub struct LocalFheService {
    keys: ServiceKeys,
    attestation_key: [u8; 32],
    table: HashMap<HandleId, StoredCipher>,
    outbox: Vec<DecryptResult>,
    next_seq: u64,
}

impl LocalFheService {
    /// Create a service with freshly generated keys
    ///
    /// WARNING: key generation is slow (tens of seconds)
    pub fn new() -> FheResult<Self> {
        Ok(Self::with_keys(ServiceKeys::generate()?))
    }

    /// Create a service over an existing key pair
    pub fn with_keys(keys: ServiceKeys) -> Self {
        keys.install();

        // The attestation key is shared with client encryptors; deriving it
        // from the client key keeps attestation ability scoped to key holders.
        let key_bytes = bincode::serialize(keys.client.inner()).unwrap_or_default();
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"obscura_attestation_v1");
        hasher.update(&key_bytes);
        let attestation_key = *hasher.finalize().as_bytes();

        Self {
            keys,
            attestation_key,
            table: HashMap::new(),
            outbox: Vec::new(),
            next_seq: 0,
        }
    }

    /// Client-side encryptor sharing this service's attestation key
    pub fn encryptor(&self) -> ClientEncryptor {
        ClientEncryptor::new(self.keys.client.clone(), self.attestation_key)
    }

    /// Number of ciphertexts currently held
    pub fn handle_count(&self) -> usize {
        self.table.len()
    }

    fn next_id(&mut self, tag: &[u8]) -> HandleId {
        let id = HandleId::derive(self.next_seq, tag);
        self.next_seq += 1;
        id
    }

    fn store_uint(&mut self, ciphertext: FheUint64) -> EncryptedHandle {
        let id = self.next_id(b"uint");
        self.table.insert(id, StoredCipher::Uint(ciphertext));
        EncryptedHandle::new(id, INTEGER_WIDTH)
    }

    fn store_bool(&mut self, ciphertext: FheBool) -> EncryptedBoolHandle {
        let id = self.next_id(b"bool");
        self.table.insert(id, StoredCipher::Bool(ciphertext));
        EncryptedBoolHandle::new(id)
    }

    fn uint(&self, handle: &EncryptedHandle) -> FheResult<&FheUint64> {
        match self.table.get(&handle.id) {
            Some(StoredCipher::Uint(ciphertext)) => Ok(ciphertext),
            _ => Err(FheError::UnknownHandle(handle.id.to_hex())),
        }
    }

    fn boolean(&self, handle: &EncryptedBoolHandle) -> FheResult<&FheBool> {
        match self.table.get(&handle.id) {
            Some(StoredCipher::Bool(ciphertext)) => Ok(ciphertext),
            _ => Err(FheError::UnknownHandle(handle.id.to_hex())),
        }
    }

    fn check_widths(a: &EncryptedHandle, b: &EncryptedHandle) -> FheResult<()> {
        if a.width != b.width {
            return Err(FheError::WidthMismatch {
                expected: a.width,
                got: b.width,
            });
        }
        Ok(())
    }
}

impl FheCapability for LocalFheService {
    fn encrypt(&mut self, value: u64, width: u16) -> FheResult<EncryptedHandle> {
        if width != INTEGER_WIDTH {
            return Err(FheError::WidthMismatch {
                expected: INTEGER_WIDTH,
                got: width,
            });
        }

        let ciphertext = FheUint64::try_encrypt(value, self.keys.client.inner())
            .map_err(|e| FheError::EncryptionFailed(e.to_string()))?;

        Ok(self.store_uint(ciphertext))
    }

    fn ingest(&mut self, input: &EncryptedInput) -> FheResult<EncryptedHandle> {
        if !input
            .proof
            .verify(&self.attestation_key, &input.ciphertext, input.width)
        {
            return Err(FheError::InvalidProof(
                "commitment does not match ciphertext".into(),
            ));
        }

        if input.width != INTEGER_WIDTH {
            return Err(FheError::WidthMismatch {
                expected: INTEGER_WIDTH,
                got: input.width,
            });
        }

        let ciphertext: FheUint64 = bincode::deserialize(&input.ciphertext)
            .map_err(|e| FheError::SerializationError(e.to_string()))?;

        Ok(self.store_uint(ciphertext))
    }

    fn hom_add(
        &mut self,
        a: &EncryptedHandle,
        b: &EncryptedHandle,
    ) -> FheResult<EncryptedHandle> {
        Self::check_widths(a, b)?;
        let sum = self.uint(a)? + self.uint(b)?;
        Ok(self.store_uint(sum))
    }

    fn hom_sub(
        &mut self,
        a: &EncryptedHandle,
        b: &EncryptedHandle,
    ) -> FheResult<EncryptedHandle> {
        Self::check_widths(a, b)?;
        let difference = self.uint(a)? - self.uint(b)?;
        Ok(self.store_uint(difference))
    }

    fn hom_gt(
        &mut self,
        a: &EncryptedHandle,
        b: &EncryptedHandle,
    ) -> FheResult<EncryptedBoolHandle> {
        Self::check_widths(a, b)?;
        let flag = self.uint(a)?.gt(self.uint(b)?);
        Ok(self.store_bool(flag))
    }

    fn hom_select(
        &mut self,
        cond: &EncryptedBoolHandle,
        a: &EncryptedHandle,
        b: &EncryptedHandle,
    ) -> FheResult<EncryptedHandle> {
        Self::check_widths(a, b)?;
        let chosen = self.boolean(cond)?.if_then_else(self.uint(a)?, self.uint(b)?);
        Ok(self.store_uint(chosen))
    }

    fn disclose_bool(&mut self, cond: &EncryptedBoolHandle) -> FheResult<bool> {
        let flag: bool = self.boolean(cond)?.decrypt(self.keys.client.inner());
        Ok(flag)
    }

    fn request_decrypt(&mut self, handle: &EncryptedHandle) -> FheResult<DecryptRequestId> {
        // The local oracle answers immediately but still delivers through
        // the outbox, keeping the request/callback sequence intact.
        let value: u64 = self.uint(handle)?.decrypt(self.keys.client.inner());

        let request_id = DecryptRequestId::derive(self.next_seq, &handle.id);
        self.next_seq += 1;

        self.outbox.push(DecryptResult { request_id, value });
        Ok(request_id)
    }

    fn take_decrypt_results(&mut self) -> Vec<DecryptResult> {
        std::mem::take(&mut self.outbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkeys::KEYS;

    fn service() -> LocalFheService {
        LocalFheService::with_keys(KEYS.clone())
    }

    #[test]
    fn test_ingest_then_request_decrypt() {
        let mut svc = service();
        let input = svc.encryptor().encrypt_u64(42).unwrap();

        let handle = svc.ingest(&input).unwrap();
        assert_eq!(handle.width, INTEGER_WIDTH);
        assert_eq!(svc.handle_count(), 1);

        let request_id = svc.request_decrypt(&handle).unwrap();
        let results = svc.take_decrypt_results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].request_id, request_id);
        assert_eq!(results[0].value, 42);

        // Outbox drains on take
        assert!(svc.take_decrypt_results().is_empty());
    }

    #[test]
    fn test_tampered_submission_rejected() {
        let mut svc = service();
        let mut input = svc.encryptor().encrypt_u64(9).unwrap();
        input.ciphertext[0] ^= 0x01;

        match svc.ingest(&input) {
            Err(FheError::InvalidProof(_)) => {}
            other => panic!("expected InvalidProof, got {other:?}"),
        }
    }

    #[test]
    fn test_homomorphic_arithmetic_and_select() {
        let mut svc = service();
        let a = svc.encrypt(10, INTEGER_WIDTH).unwrap();
        let b = svc.encrypt(4, INTEGER_WIDTH).unwrap();

        let sum = svc.hom_add(&a, &b).unwrap();
        let difference = svc.hom_sub(&a, &b).unwrap();
        let a_greater = svc.hom_gt(&a, &b).unwrap();
        let max = svc.hom_select(&a_greater, &a, &b).unwrap();

        assert!(svc.disclose_bool(&a_greater).unwrap());

        for (handle, expected) in [(sum, 14), (difference, 6), (max, 10)] {
            svc.request_decrypt(&handle).unwrap();
            let results = svc.take_decrypt_results();
            assert_eq!(results[0].value, expected);
        }
    }

    #[test]
    fn test_unknown_handle() {
        let mut svc = service();
        let a = svc.encrypt(1, INTEGER_WIDTH).unwrap();
        let bogus = EncryptedHandle::new(HandleId::from_bytes([0xEE; 32]), INTEGER_WIDTH);

        assert!(matches!(
            svc.hom_add(&a, &bogus),
            Err(FheError::UnknownHandle(_))
        ));
    }
}
