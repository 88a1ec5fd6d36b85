//! OBSCURA Sealed-Round Engine
//!
//! State machine for collecting encrypted contributions under a
//! commit-then-reveal discipline:
//!
//! - **Phase controller**: time-gated lifecycle
//!   (Open → Closed → RevealPending → Revealed, with Cancelled as a side
//!   branch), observed lazily against caller-supplied timestamps
//! - **Participant registry**: at-most-once participation per identity,
//!   with escrow records for auction rounds
//! - **Encrypted accumulators**: additive tally (ballot) and running
//!   maximum (auction), built only on the capability's declared operations
//! - **Reveal coordinator**: one-shot decryption of the final aggregates
//!   via the request/callback boundary
//! - **Sealed instances**: `BallotInstance` and `AuctionInstance`, each
//!   exclusively owning its accumulator, registry, and event log
//!
//! The engine holds only opaque handles; ciphertexts live behind the
//! `FheCapability` boundary in `obscura-fhe`. Every mutating operation is
//! synchronous and all-or-nothing; the reveal window is the single
//! cross-call asynchronous boundary.

pub mod accumulator;
pub mod errors;
pub mod events;
pub mod identity;
pub mod instance;
pub mod phase;
pub mod registry;
pub mod reveal;

pub use accumulator::{MaxAccumulator, TallyAccumulator};
pub use errors::{EngineError, EngineResult};
pub use events::EngineEvent;
pub use identity::Identity;
pub use instance::{AuctionInstance, BallotInstance, InstanceId};
pub use phase::{Phase, PhaseClock};
pub use registry::{ParticipantRecord, ParticipantRegistry};
pub use reveal::{RevealCoordinator, RevealedResult};

#[cfg(test)]
pub(crate) mod clear;
