//! Sealed instances: one round of encrypted collection
//!
//! [`SealedCore`] carries what every round shares (round id, creator,
//! phase clock, participant registry, reveal coordinator, event log);
//! [`BallotInstance`] and [`AuctionInstance`] add their accumulator and
//! the operations over it. Each instance exclusively owns its state;
//! nothing is shared between instances.
//!
//! Contribution sequencing is all-or-nothing: the phase and duplicate
//! checks run first, every fallible capability call next, and the
//! registry insert, handle swap, and event append happen together last.
//! A failed call leaves no partial engine state behind (handles it
//! ingested but never committed are the capability's garbage, not ours).
//!
//! The lazy close is time's effect rather than any call's: it is settled
//! on access, including by calls that then fail their own checks.

use obscura_fhe::{DecryptRequestId, EncryptedInput, FheCapability};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::accumulator::{MaxAccumulator, TallyAccumulator};
use crate::errors::{EngineError, EngineResult};
use crate::events::EngineEvent;
use crate::identity::Identity;
use crate::phase::{Phase, PhaseClock};
use crate::registry::ParticipantRegistry;
use crate::reveal::{RevealCoordinator, RevealedResult};

/// Identifier of a sealed instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId([u8; 32]);

impl InstanceId {
    /// Derive an instance id from its creation parameters
    fn derive(creator: &Identity, opened_at: u64, closes_at: u64, kind: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"obscura_instance_v1");
        hasher.update(kind);
        hasher.update(creator.as_bytes());
        hasher.update(&opened_at.to_le_bytes());
        hasher.update(&closes_at.to_le_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short display form for logs
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

/// State shared by every sealed round
#[derive(Debug)]
struct SealedCore {
    id: InstanceId,
    creator: Identity,
    clock: PhaseClock,
    registry: ParticipantRegistry,
    reveal: RevealCoordinator,
    events: Vec<EngineEvent>,
}

impl SealedCore {
    fn open(creator: Identity, opened_at: u64, closes_at: u64, kind: &[u8]) -> Self {
        Self {
            id: InstanceId::derive(&creator, opened_at, closes_at, kind),
            creator,
            clock: PhaseClock::open(opened_at, closes_at),
            registry: ParticipantRegistry::new(),
            reveal: RevealCoordinator::new(),
            events: Vec::new(),
        }
    }

    /// Record the lazily observed close, once, with its event
    fn settle(&mut self, now: u64) {
        if self.clock.settle(now) {
            self.events.push(EngineEvent::InstanceClosed {
                at: self.clock.closes_at(),
            });
        }
    }

    fn ensure_creator(&self, caller: &Identity) -> EngineResult<()> {
        if caller != &self.creator {
            return Err(EngineError::NotAuthorized);
        }
        Ok(())
    }

    /// Contribution gate: open phase, first-time identity. Mutates nothing
    /// beyond the settled close.
    fn gate_contribution(&mut self, identity: &Identity, now: u64) -> EngineResult<()> {
        self.settle(now);
        self.clock.expect(now, Phase::Open)?;
        self.registry.ensure_absent(identity)?;
        Ok(())
    }

    /// Commit step shared by both round kinds; runs only after every
    /// fallible capability call has succeeded
    fn commit_contribution(
        &mut self,
        identity: Identity,
        now: u64,
        escrow: Option<u64>,
    ) -> EngineResult<()> {
        self.registry.register(identity, now, escrow)?;
        self.events
            .push(EngineEvent::ContributionAccepted { identity, at: now });
        Ok(())
    }

    /// Reveal gate: creator, closed, non-empty, not already done. Mutates
    /// nothing beyond the settled close.
    fn gate_reveal(&mut self, caller: &Identity, now: u64) -> EngineResult<()> {
        self.ensure_creator(caller)?;
        self.settle(now);
        if self.reveal.result().is_some() {
            return Err(EngineError::AlreadyRevealed);
        }
        self.clock.expect(now, Phase::Closed)?;
        if self.registry.is_empty() {
            return Err(EngineError::EmptyInstance);
        }
        Ok(())
    }

    /// Park the phase once the decryption requests went out
    fn commit_reveal_request(&mut self, now: u64) -> EngineResult<()> {
        self.clock.begin_reveal(now)?;
        self.events.push(EngineEvent::RevealRequested { at: now });
        Ok(())
    }

    /// Route one decryption callback; commits phase and result together
    fn absorb_decrypt(
        &mut self,
        request_id: DecryptRequestId,
        value: u64,
        now: u64,
    ) -> EngineResult<Option<RevealedResult>> {
        let committed = self.reveal.absorb(request_id, value)?.cloned();
        if let Some(result) = &committed {
            self.clock.commit_reveal()?;
            info!(instance = %self.id.short_hex(), "result revealed");
            self.events.push(EngineEvent::ResultRevealed {
                result: result.clone(),
                at: now,
            });
        }
        Ok(committed)
    }

    fn cancel(&mut self, caller: &Identity, now: u64) -> EngineResult<()> {
        self.ensure_creator(caller)?;
        self.settle(now);
        self.clock.expect(now, Phase::Open)?;
        if !self.registry.is_empty() {
            return Err(EngineError::CancelWithContributions(self.registry.count()));
        }
        self.clock.cancel(now)?;
        info!(instance = %self.id.short_hex(), "instance cancelled");
        self.events.push(EngineEvent::InstanceCancelled { at: now });
        Ok(())
    }
}

/// Private ballot: additive tally of encrypted 0/1 votes
#[derive(Debug)]
pub struct BallotInstance {
    core: SealedCore,
    tally: TallyAccumulator,
}

impl BallotInstance {
    /// Open a ballot with a `[opened_at, closes_at)` collection window
    pub fn open(
        svc: &mut dyn FheCapability,
        creator: Identity,
        opened_at: u64,
        closes_at: u64,
    ) -> EngineResult<Self> {
        let tally = TallyAccumulator::new(svc)?;
        let core = SealedCore::open(creator, opened_at, closes_at, b"ballot");
        info!(instance = %core.id.short_hex(), closes_at, "ballot opened");
        Ok(Self { core, tally })
    }

    /// Accept one encrypted 0/1 vote
    pub fn cast_vote(
        &mut self,
        svc: &mut dyn FheCapability,
        voter: Identity,
        input: &EncryptedInput,
        now: u64,
    ) -> EngineResult<()> {
        self.core.gate_contribution(&voter, now)?;

        let vote = svc.ingest(input)?;
        self.tally.fold_vote(svc, &vote)?;

        self.core.commit_contribution(voter, now, None)?;
        debug!(
            instance = %self.core.id.short_hex(),
            voter = %voter.short_hex(),
            "vote accepted"
        );
        Ok(())
    }

    /// Request decryption of the final counters (creator-only, once)
    pub fn begin_reveal(
        &mut self,
        svc: &mut dyn FheCapability,
        caller: &Identity,
        now: u64,
    ) -> EngineResult<Vec<DecryptRequestId>> {
        self.core.gate_reveal(caller, now)?;
        let requests = self.core.reveal.begin_tally(svc, &self.tally)?;
        self.core.commit_reveal_request(now)?;
        Ok(requests)
    }

    /// Deliver one decryption callback; returns the result on the
    /// committing call
    pub fn on_decrypt_result(
        &mut self,
        request_id: DecryptRequestId,
        value: u64,
        now: u64,
    ) -> EngineResult<Option<RevealedResult>> {
        self.core.absorb_decrypt(request_id, value, now)
    }

    /// Abandon the ballot (creator-only, zero contributions)
    pub fn cancel(&mut self, caller: &Identity, now: u64) -> EngineResult<()> {
        self.core.cancel(caller, now)
    }

    /// Committed result, if revealed
    pub fn result(&self) -> Option<&RevealedResult> {
        self.core.reveal.result()
    }

    /// Instance identifier
    pub fn id(&self) -> InstanceId {
        self.core.id
    }

    /// Creator identity
    pub fn creator(&self) -> &Identity {
        &self.core.creator
    }

    /// Phase as observed at `now`
    pub fn phase(&self, now: u64) -> Phase {
        self.core.clock.effective(now)
    }

    /// Number of accepted votes
    pub fn participant_count(&self) -> u64 {
        self.core.registry.count()
    }

    /// Whether the identity has voted
    pub fn has_contributed(&self, identity: &Identity) -> bool {
        self.core.registry.has_contributed(identity)
    }

    /// Drain the observable event log
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.core.events)
    }
}

/// Sealed-bid auction: encrypted running maximum with escrowed bids
#[derive(Debug)]
pub struct AuctionInstance {
    core: SealedCore,
    max: MaxAccumulator,
}

impl AuctionInstance {
    /// Open an auction with a `[opened_at, closes_at)` bidding window
    pub fn open(
        svc: &mut dyn FheCapability,
        creator: Identity,
        opened_at: u64,
        closes_at: u64,
    ) -> EngineResult<Self> {
        let max = MaxAccumulator::new(svc)?;
        let core = SealedCore::open(creator, opened_at, closes_at, b"auction");
        info!(instance = %core.id.short_hex(), closes_at, "auction opened");
        Ok(Self { core, max })
    }

    /// Accept one sealed bid with its escrow deposit
    ///
    /// The escrow is a plaintext deposit and should not equal the bid, or
    /// it defeats the sealing.
    pub fn place_bid(
        &mut self,
        svc: &mut dyn FheCapability,
        bidder: Identity,
        input: &EncryptedInput,
        escrow: u64,
        now: u64,
    ) -> EngineResult<()> {
        self.core.gate_contribution(&bidder, now)?;

        let bid = svc.ingest(input)?;
        self.max.fold_bid(svc, &bid, bidder)?;

        self.core.commit_contribution(bidder, now, Some(escrow))?;
        debug!(
            instance = %self.core.id.short_hex(),
            bidder = %bidder.short_hex(),
            "bid accepted"
        );
        Ok(())
    }

    /// Request decryption of the winning bid (creator-only, once)
    pub fn begin_reveal(
        &mut self,
        svc: &mut dyn FheCapability,
        caller: &Identity,
        now: u64,
    ) -> EngineResult<Vec<DecryptRequestId>> {
        self.core.gate_reveal(caller, now)?;
        let requests = self.core.reveal.begin_auction(svc, &self.max)?;
        self.core.commit_reveal_request(now)?;
        Ok(requests)
    }

    /// Deliver one decryption callback; returns the result on the
    /// committing call
    pub fn on_decrypt_result(
        &mut self,
        request_id: DecryptRequestId,
        value: u64,
        now: u64,
    ) -> EngineResult<Option<RevealedResult>> {
        self.core.absorb_decrypt(request_id, value, now)
    }

    /// Abandon the auction (creator-only, zero bids)
    pub fn cancel(&mut self, caller: &Identity, now: u64) -> EngineResult<()> {
        self.core.cancel(caller, now)
    }

    /// Return a losing bidder's escrow, in full, exactly once
    pub fn refund(&mut self, identity: &Identity, now: u64) -> EngineResult<u64> {
        self.core.settle(now);
        self.core.clock.expect(now, Phase::Revealed)?;

        if self.max.leader() == Some(identity) {
            return Err(EngineError::WinnerEscrowHeld);
        }

        let amount = self.core.registry.mark_refunded(identity)?;
        self.core.events.push(EngineEvent::EscrowRefunded {
            identity: *identity,
            amount,
            at: now,
        });
        Ok(amount)
    }

    /// Committed result, if revealed
    pub fn result(&self) -> Option<&RevealedResult> {
        self.core.reveal.result()
    }

    /// Current plaintext leader (see the comparator's documented leak)
    pub fn leader(&self) -> Option<&Identity> {
        self.max.leader()
    }

    /// Instance identifier
    pub fn id(&self) -> InstanceId {
        self.core.id
    }

    /// Creator identity
    pub fn creator(&self) -> &Identity {
        &self.core.creator
    }

    /// Phase as observed at `now`
    pub fn phase(&self, now: u64) -> Phase {
        self.core.clock.effective(now)
    }

    /// Number of accepted bids
    pub fn participant_count(&self) -> u64 {
        self.core.registry.count()
    }

    /// Whether the identity has bid
    pub fn has_contributed(&self, identity: &Identity) -> bool {
        self.core.registry.has_contributed(identity)
    }

    /// Drain the observable event log
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.core.events)
    }
}
