//! Encrypted accumulators
//!
//! Both variants are built only on the capability's declared operations
//! and never request decryption of the accumulated state: the aggregates
//! stay opaque until the reveal coordinator acts.

use obscura_fhe::{EncryptedHandle, FheCapability, INTEGER_WIDTH};
use tracing::debug;

use crate::errors::EngineResult;
use crate::identity::Identity;

/// Additive tally over encrypted 0/1 contributions
///
/// Maintains encrypted `yes`/`no` counters. Folding a contribution `v`
/// computes `yes + v` and `no + (1 - v)`, so `yes + no` equals the number
/// of folded contributions after every step, and the final counts are
/// independent of fold order.
#[derive(Clone, Debug)]
pub struct TallyAccumulator {
    yes: EncryptedHandle,
    no: EncryptedHandle,
    one: EncryptedHandle,
}

impl TallyAccumulator {
    /// Initialize zeroed counters and the constant one
    /// (non-sensitive trusted encryption)
    pub fn new(svc: &mut dyn FheCapability) -> EngineResult<Self> {
        let yes = svc.encrypt(0, INTEGER_WIDTH)?;
        let no = svc.encrypt(0, INTEGER_WIDTH)?;
        let one = svc.encrypt(1, INTEGER_WIDTH)?;
        Ok(Self { yes, no, one })
    }

    /// Fold one 0/1 vote handle into the counters
    pub fn fold_vote(
        &mut self,
        svc: &mut dyn FheCapability,
        vote: &EncryptedHandle,
    ) -> EngineResult<()> {
        let inverse = svc.hom_sub(&self.one, vote)?;
        let yes = svc.hom_add(&self.yes, vote)?;
        let no = svc.hom_add(&self.no, &inverse)?;

        // Both counters computed before either is swapped in
        self.yes = yes;
        self.no = no;
        Ok(())
    }

    /// Handle to the encrypted yes counter
    pub fn yes_handle(&self) -> &EncryptedHandle {
        &self.yes
    }

    /// Handle to the encrypted no counter
    pub fn no_handle(&self) -> &EncryptedHandle {
        &self.no
    }
}

/// Running encrypted maximum over sealed bids
///
/// The leader identity is plaintext, updated from the disclosed one-bit
/// outcome of each comparison. The disclosure leaks that a new leader
/// exists (an order/timing fact), never a bid magnitude; keeping the
/// leader encrypted until reveal would close that leak at the cost of
/// resolving the winner homomorphically. The trade-off is kept
/// deliberately, with [`FheCapability::disclose_bool`] as the single
/// disclosure site.
///
/// The maximum starts at an encrypted zero floor, so a bid of zero never
/// takes the lead.
#[derive(Clone, Debug)]
pub struct MaxAccumulator {
    best: EncryptedHandle,
    leader: Option<Identity>,
}

impl MaxAccumulator {
    /// Initialize with an encrypted zero floor
    pub fn new(svc: &mut dyn FheCapability) -> EngineResult<Self> {
        let best = svc.encrypt(0, INTEGER_WIDTH)?;
        Ok(Self { best, leader: None })
    }

    /// Fold one bid; returns whether it took the lead
    pub fn fold_bid(
        &mut self,
        svc: &mut dyn FheCapability,
        bid: &EncryptedHandle,
        bidder: Identity,
    ) -> EngineResult<bool> {
        let higher = svc.hom_gt(bid, &self.best)?;
        let best = svc.hom_select(&higher, bid, &self.best)?;

        // The single disclosure below reveal: one comparison bit
        let took_lead = svc.disclose_bool(&higher)?;

        self.best = best;
        if took_lead {
            debug!(bidder = %bidder.short_hex(), "new auction leader");
            self.leader = Some(bidder);
        }
        Ok(took_lead)
    }

    /// Handle to the encrypted running maximum
    pub fn best_handle(&self) -> &EncryptedHandle {
        &self.best
    }

    /// Current leader, if any bid has beaten the zero floor
    pub fn leader(&self) -> Option<&Identity> {
        self.leader.as_ref()
    }
}
