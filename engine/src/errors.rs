//! Engine error types
//!
//! Every error is terminal for the triggering call and names its specific
//! kind; callers can distinguish "try later" (phase violations) from
//! "invalid request" (proof failures) from "already done" (duplicate
//! contribution or reveal). Nothing is retried internally.

use obscura_fhe::FheError;
use thiserror::Error;

use crate::phase::Phase;

/// Errors that can occur during sealed-round operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Operation attempted outside its legal phase
    #[error("Phase violation: operation requires {expected}, instance is {actual}")]
    PhaseViolation { expected: Phase, actual: Phase },

    /// Duplicate contribution attempt
    #[error("Identity {0} has already contributed")]
    AlreadyRegistered(String),

    /// Duplicate reveal attempt
    #[error("Result already revealed")]
    AlreadyRevealed,

    /// Submitted ciphertext failed attestation (propagated, never recovered)
    #[error("Submission proof rejected: {0}")]
    InvalidProof(String),

    /// Caller lacks the required role (creator-only operations)
    #[error("Caller is not authorized for this operation")]
    NotAuthorized,

    /// Reveal attempted with zero contributions
    #[error("Instance has no contributions to reveal")]
    EmptyInstance,

    /// Cancellation attempted after contributions were accepted
    #[error("Cannot cancel: {0} contributions already accepted")]
    CancelWithContributions(u64),

    /// Escrow already returned
    #[error("Escrow for {0} already refunded")]
    AlreadyRefunded(String),

    /// Identity has no escrow on record
    #[error("No escrow recorded for {0}")]
    NoEscrow(String),

    /// The winning bidder's escrow stays with the instance
    #[error("Winning bidder's escrow is not refundable")]
    WinnerEscrowHeld,

    /// Decryption callback does not match an outstanding request
    #[error("Unknown decryption request: {0}")]
    UnknownDecryptRequest(String),

    /// Other capability failure, propagated as-is
    #[error("FHE capability error: {0}")]
    Capability(FheError),
}

impl From<FheError> for EngineError {
    fn from(err: FheError) -> Self {
        match err {
            // Proof failures keep their identity across the seam
            FheError::InvalidProof(reason) => EngineError::InvalidProof(reason),
            other => EngineError::Capability(other),
        }
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
