//! Reveal coordinator
//!
//! One-shot decryption of the final aggregates, commit-then-callback
//! throughout: `begin_*` issues the decryption requests and records the
//! expected ids; `absorb` matches callbacks against those ids and commits
//! the plaintext result exactly once, when every expected value has
//! arrived. The committed result is immutable; later begins fail with
//! `AlreadyRevealed` and later callbacks with `UnknownDecryptRequest`.

use obscura_fhe::{DecryptRequestId, FheCapability};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::accumulator::{MaxAccumulator, TallyAccumulator};
use crate::errors::{EngineError, EngineResult};
use crate::identity::Identity;

/// Final plaintext result of a sealed round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevealedResult {
    /// Ballot outcome
    Tally { yes: u64, no: u64 },
    /// Auction outcome; the winner is the comparator's tracked leader
    Auction {
        winning_bid: u64,
        winner: Option<Identity>,
    },
}

/// Decryptions outstanding for one reveal
#[derive(Clone, Debug)]
enum PendingReveal {
    Tally {
        yes_request: DecryptRequestId,
        no_request: DecryptRequestId,
        yes: Option<u64>,
        no: Option<u64>,
    },
    Auction {
        best_request: DecryptRequestId,
        winner: Option<Identity>,
    },
}

/// One-shot reveal state for an instance
#[derive(Clone, Debug, Default)]
pub struct RevealCoordinator {
    pending: Option<PendingReveal>,
    revealed: Option<RevealedResult>,
}

impl RevealCoordinator {
    /// Create a coordinator with nothing pending
    pub fn new() -> Self {
        Self::default()
    }

    /// True while callbacks are outstanding
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Committed result, if any
    pub fn result(&self) -> Option<&RevealedResult> {
        self.revealed.as_ref()
    }

    // The phase machine excludes a second begin while callbacks are
    // outstanding; this guard covers the post-commit case.
    fn ensure_fresh(&self) -> EngineResult<()> {
        if self.revealed.is_some() {
            return Err(EngineError::AlreadyRevealed);
        }
        Ok(())
    }

    /// Request decryption of the tally counters
    pub fn begin_tally(
        &mut self,
        svc: &mut dyn FheCapability,
        tally: &TallyAccumulator,
    ) -> EngineResult<Vec<DecryptRequestId>> {
        self.ensure_fresh()?;

        let yes_request = svc.request_decrypt(tally.yes_handle())?;
        let no_request = svc.request_decrypt(tally.no_handle())?;

        self.pending = Some(PendingReveal::Tally {
            yes_request,
            no_request,
            yes: None,
            no: None,
        });
        Ok(vec![yes_request, no_request])
    }

    /// Request decryption of the running maximum
    pub fn begin_auction(
        &mut self,
        svc: &mut dyn FheCapability,
        max: &MaxAccumulator,
    ) -> EngineResult<Vec<DecryptRequestId>> {
        self.ensure_fresh()?;

        let best_request = svc.request_decrypt(max.best_handle())?;

        self.pending = Some(PendingReveal::Auction {
            best_request,
            winner: max.leader().copied(),
        });
        Ok(vec![best_request])
    }

    /// Match one decryption callback; commits when every expected value
    /// has arrived. Returns the result on the committing call.
    pub fn absorb(
        &mut self,
        request_id: DecryptRequestId,
        value: u64,
    ) -> EngineResult<Option<&RevealedResult>> {
        let Some(pending) = self.pending.as_mut() else {
            return Err(EngineError::UnknownDecryptRequest(request_id.to_hex()));
        };

        let completed = match pending {
            PendingReveal::Tally {
                yes_request,
                no_request,
                yes,
                no,
            } => {
                if request_id == *yes_request {
                    *yes = Some(value);
                } else if request_id == *no_request {
                    *no = Some(value);
                } else {
                    return Err(EngineError::UnknownDecryptRequest(request_id.to_hex()));
                }

                match (*yes, *no) {
                    (Some(yes), Some(no)) => Some(RevealedResult::Tally { yes, no }),
                    _ => None,
                }
            }
            PendingReveal::Auction {
                best_request,
                winner,
            } => {
                if request_id != *best_request {
                    return Err(EngineError::UnknownDecryptRequest(request_id.to_hex()));
                }
                Some(RevealedResult::Auction {
                    winning_bid: value,
                    winner: *winner,
                })
            }
        };

        if let Some(result) = completed {
            debug!(?result, "reveal committed");
            self.revealed = Some(result);
            self.pending = None;
        }
        Ok(self.revealed.as_ref())
    }
}
