//! Participant registry
//!
//! Enforces at-most-once participation per identity. A record, once
//! inserted, is never removed; the participant counter only ever grows.
//! Callers sequence `ensure_absent` before any fallible capability call
//! and `register` after all of them, so a failed contribution leaves the
//! registry untouched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::identity::Identity;

/// Per-identity participation record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    /// Timestamp the contribution was accepted
    pub contributed_at: u64,
    /// Escrow deposited with the contribution, if any
    pub escrow: Option<u64>,
    /// Whether the escrow has been returned
    pub refunded: bool,
}

/// Registry of contributors for one instance
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ParticipantRegistry {
    records: HashMap<Identity, ParticipantRecord>,
    count: u64,
}

impl ParticipantRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject duplicates without mutating anything
    pub fn ensure_absent(&self, identity: &Identity) -> EngineResult<()> {
        if self.records.contains_key(identity) {
            return Err(EngineError::AlreadyRegistered(identity.short_hex()));
        }
        Ok(())
    }

    /// Record a contribution
    pub fn register(
        &mut self,
        identity: Identity,
        now: u64,
        escrow: Option<u64>,
    ) -> EngineResult<()> {
        self.ensure_absent(&identity)?;
        self.records.insert(
            identity,
            ParticipantRecord {
                contributed_at: now,
                escrow,
                refunded: false,
            },
        );
        self.count += 1;
        Ok(())
    }

    /// Return the escrowed amount, exactly once
    pub fn mark_refunded(&mut self, identity: &Identity) -> EngineResult<u64> {
        let record = self
            .records
            .get_mut(identity)
            .ok_or_else(|| EngineError::NoEscrow(identity.short_hex()))?;

        if record.refunded {
            return Err(EngineError::AlreadyRefunded(identity.short_hex()));
        }

        let amount = record
            .escrow
            .ok_or_else(|| EngineError::NoEscrow(identity.short_hex()))?;

        record.refunded = true;
        Ok(amount)
    }

    /// Whether the identity has contributed
    pub fn has_contributed(&self, identity: &Identity) -> bool {
        self.records.contains_key(identity)
    }

    /// Participation record for an identity
    pub fn record(&self, identity: &Identity) -> Option<&ParticipantRecord> {
        self.records.get(identity)
    }

    /// Number of accepted contributions
    pub fn count(&self) -> u64 {
        self.count
    }

    /// True before the first contribution
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
