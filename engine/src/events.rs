//! Observable instance events
//!
//! Emitted for external consumers (a UI, an indexer). Contribution values
//! never appear here: observers learn who participated and when results
//! landed, nothing else.

use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::reveal::RevealedResult;

/// Events emitted by a sealed instance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A contribution was accepted (the value is withheld)
    ContributionAccepted { identity: Identity, at: u64 },
    /// The collection window elapsed
    InstanceClosed { at: u64 },
    /// Decryption of the final aggregates was requested
    RevealRequested { at: u64 },
    /// The final result was committed
    ResultRevealed { result: RevealedResult, at: u64 },
    /// The instance was abandoned before any contribution
    InstanceCancelled { at: u64 },
    /// An escrow was returned
    EscrowRefunded {
        identity: Identity,
        amount: u64,
        at: u64,
    },
}
