//! Plaintext stand-in for the FHE capability, used by unit tests
//!
//! Behaves like the real service at the handle/request level while keeping
//! every value readable, so engine tests can assert on state without
//! paying for real FHE. Submissions carry a plain hash commitment in place
//! of the keyed attestation.

use std::collections::HashMap;

use obscura_fhe::{
    DecryptRequestId, DecryptResult, EncryptedBoolHandle, EncryptedHandle, EncryptedInput,
    FheCapability, FheError, FheResult, HandleId, SubmissionProof, INTEGER_WIDTH,
};

#[derive(Default)]
pub struct ClearCapability {
    uints: HashMap<HandleId, u64>,
    bools: HashMap<HandleId, bool>,
    outbox: Vec<DecryptResult>,
    next_seq: u64,
}

impl ClearCapability {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plaintext view of a handle, for assertions
    pub fn value_of(&self, handle: &EncryptedHandle) -> u64 {
        self.uints[&handle.id]
    }

    /// Build a submission the way a client would
    pub fn input_for(value: u64) -> EncryptedInput {
        let bytes = value.to_le_bytes().to_vec();
        let commitment = *blake3::hash(&bytes).as_bytes();
        EncryptedInput {
            ciphertext: bytes,
            width: INTEGER_WIDTH,
            proof: SubmissionProof { commitment },
        }
    }

    fn fresh_id(&mut self, tag: &[u8]) -> HandleId {
        let id = HandleId::derive(self.next_seq, tag);
        self.next_seq += 1;
        id
    }

    fn store_uint(&mut self, value: u64) -> EncryptedHandle {
        let id = self.fresh_id(b"clear_uint");
        self.uints.insert(id, value);
        EncryptedHandle::new(id, INTEGER_WIDTH)
    }

    fn get(&self, handle: &EncryptedHandle) -> FheResult<u64> {
        self.uints
            .get(&handle.id)
            .copied()
            .ok_or_else(|| FheError::UnknownHandle(handle.id.to_hex()))
    }
}

impl FheCapability for ClearCapability {
    fn encrypt(&mut self, value: u64, width: u16) -> FheResult<EncryptedHandle> {
        if width != INTEGER_WIDTH {
            return Err(FheError::WidthMismatch {
                expected: INTEGER_WIDTH,
                got: width,
            });
        }
        Ok(self.store_uint(value))
    }

    fn ingest(&mut self, input: &EncryptedInput) -> FheResult<EncryptedHandle> {
        let commitment = *blake3::hash(&input.ciphertext).as_bytes();
        if commitment != input.proof.commitment {
            return Err(FheError::InvalidProof(
                "commitment does not match ciphertext".into(),
            ));
        }

        let bytes: [u8; 8] = input
            .ciphertext
            .as_slice()
            .try_into()
            .map_err(|_| FheError::SerializationError("expected 8 bytes".into()))?;
        Ok(self.store_uint(u64::from_le_bytes(bytes)))
    }

    fn hom_add(
        &mut self,
        a: &EncryptedHandle,
        b: &EncryptedHandle,
    ) -> FheResult<EncryptedHandle> {
        let sum = self.get(a)?.wrapping_add(self.get(b)?);
        Ok(self.store_uint(sum))
    }

    fn hom_sub(
        &mut self,
        a: &EncryptedHandle,
        b: &EncryptedHandle,
    ) -> FheResult<EncryptedHandle> {
        let difference = self.get(a)?.wrapping_sub(self.get(b)?);
        Ok(self.store_uint(difference))
    }

    fn hom_gt(
        &mut self,
        a: &EncryptedHandle,
        b: &EncryptedHandle,
    ) -> FheResult<EncryptedBoolHandle> {
        let flag = self.get(a)? > self.get(b)?;
        let id = self.fresh_id(b"clear_bool");
        self.bools.insert(id, flag);
        Ok(EncryptedBoolHandle::new(id))
    }

    fn hom_select(
        &mut self,
        cond: &EncryptedBoolHandle,
        a: &EncryptedHandle,
        b: &EncryptedHandle,
    ) -> FheResult<EncryptedHandle> {
        let flag = *self
            .bools
            .get(&cond.id)
            .ok_or_else(|| FheError::UnknownHandle(cond.id.to_hex()))?;
        let chosen = if flag { self.get(a)? } else { self.get(b)? };
        Ok(self.store_uint(chosen))
    }

    fn disclose_bool(&mut self, cond: &EncryptedBoolHandle) -> FheResult<bool> {
        self.bools
            .get(&cond.id)
            .copied()
            .ok_or_else(|| FheError::UnknownHandle(cond.id.to_hex()))
    }

    fn request_decrypt(&mut self, handle: &EncryptedHandle) -> FheResult<DecryptRequestId> {
        let value = self.get(handle)?;
        let request_id = DecryptRequestId::derive(self.next_seq, &handle.id);
        self.next_seq += 1;
        self.outbox.push(DecryptResult { request_id, value });
        Ok(request_id)
    }

    fn take_decrypt_results(&mut self) -> Vec<DecryptResult> {
        std::mem::take(&mut self.outbox)
    }
}
