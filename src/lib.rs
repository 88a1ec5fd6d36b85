//! OBSCURA: Sealed-Round Engine for Encrypted Ballots and Auctions
//!
//! Root crate re-exporting the OBSCURA components and providing the
//! single-process host that wires them together.
//!
//! ## Crate Organization
//!
//! - `obscura-fhe`: the capability boundary (opaque handles, the
//!   `FheCapability` trait, and a TFHE-rs-backed local service)
//! - `obscura-engine`: phase controller, participant registry, encrypted
//!   accumulators, reveal coordinator, and the sealed instances
//! - `obscura-cli`: demo binary running complete rounds in-process
//!
//! The engine never sees plaintext contributions. Ciphertexts live behind
//! the capability trait; only final aggregates are ever decrypted, exactly
//! once per round, through an explicit request/callback boundary.

pub mod host;

// Re-export member crates for integration consumers
pub use obscura_engine as engine;
pub use obscura_fhe as fhe;

/// OBSCURA version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::host::{HostError, HostResult, LocalHost};
    pub use obscura_engine::{
        AuctionInstance, BallotInstance, EngineError, EngineEvent, Identity, InstanceId, Phase,
        RevealedResult,
    };
    pub use obscura_fhe::{
        ClientEncryptor, EncryptedInput, FheCapability, LocalFheService, ServiceKeys,
    };
}
