//! Single-process host for sealed rounds
//!
//! Owns the local FHE service and the live instances, and pumps completed
//! decryptions from the service's outbox back into the instances'
//! callbacks. This is where a networked deployment would split: the
//! service moves behind a transport and the pump becomes a subscription
//! to the decryption oracle; the instances are unchanged.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info};

use obscura_engine::{
    AuctionInstance, BallotInstance, EngineError, EngineEvent, Identity, InstanceId,
    RevealedResult,
};
use obscura_fhe::{
    ClientEncryptor, EncryptedInput, FheCapability, FheError, FheResult, LocalFheService,
};

/// Host-level errors
#[derive(Error, Debug)]
pub enum HostError {
    /// No live instance under that id
    #[error("Unknown instance: {0}")]
    UnknownInstance(String),

    /// The oracle has not delivered every expected decryption
    #[error("Reveal incomplete: decryption results still outstanding")]
    RevealIncomplete,

    /// Engine rejection, passed through
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Capability failure, passed through
    #[error("FHE capability error: {0}")]
    Fhe(#[from] FheError),
}

/// Result type for host operations
pub type HostResult<T> = Result<T, HostError>;

/// Orchestrates a local FHE service and the rounds running over it
pub struct LocalHost {
    service: LocalFheService,
    ballots: HashMap<InstanceId, BallotInstance>,
    auctions: HashMap<InstanceId, AuctionInstance>,
}

impl LocalHost {
    /// Create a host with freshly generated service keys
    ///
    /// WARNING: key generation is slow (tens of seconds)
    pub fn new() -> FheResult<Self> {
        info!("generating FHE service keys");
        Ok(Self::with_service(LocalFheService::new()?))
    }

    /// Create a host over an existing service
    pub fn with_service(service: LocalFheService) -> Self {
        Self {
            service,
            ballots: HashMap::new(),
            auctions: HashMap::new(),
        }
    }

    /// Client-side encryptor for participants
    pub fn encryptor(&self) -> ClientEncryptor {
        self.service.encryptor()
    }

    /// Open a ballot round
    pub fn open_ballot(
        &mut self,
        creator: Identity,
        opened_at: u64,
        closes_at: u64,
    ) -> HostResult<InstanceId> {
        let ballot = BallotInstance::open(&mut self.service, creator, opened_at, closes_at)
            .map_err(HostError::Engine)?;
        let id = ballot.id();
        self.ballots.insert(id, ballot);
        Ok(id)
    }

    /// Open an auction round
    pub fn open_auction(
        &mut self,
        creator: Identity,
        opened_at: u64,
        closes_at: u64,
    ) -> HostResult<InstanceId> {
        let auction = AuctionInstance::open(&mut self.service, creator, opened_at, closes_at)
            .map_err(HostError::Engine)?;
        let id = auction.id();
        self.auctions.insert(id, auction);
        Ok(id)
    }

    // Instance lookups that also need `&mut self.service` split the borrow
    // at the field level instead of going through this helper.
    fn auction_mut(&mut self, id: &InstanceId) -> HostResult<&mut AuctionInstance> {
        self.auctions
            .get_mut(id)
            .ok_or_else(|| HostError::UnknownInstance(id.to_hex()))
    }

    /// Cast a vote into a ballot round
    pub fn cast_vote(
        &mut self,
        id: &InstanceId,
        voter: Identity,
        input: &EncryptedInput,
        now: u64,
    ) -> HostResult<()> {
        let ballot = self
            .ballots
            .get_mut(id)
            .ok_or_else(|| HostError::UnknownInstance(id.to_hex()))?;
        ballot.cast_vote(&mut self.service, voter, input, now)?;
        Ok(())
    }

    /// Place a bid into an auction round
    pub fn place_bid(
        &mut self,
        id: &InstanceId,
        bidder: Identity,
        input: &EncryptedInput,
        escrow: u64,
        now: u64,
    ) -> HostResult<()> {
        let auction = self
            .auctions
            .get_mut(id)
            .ok_or_else(|| HostError::UnknownInstance(id.to_hex()))?;
        auction.place_bid(&mut self.service, bidder, input, escrow, now)?;
        Ok(())
    }

    /// Reveal a ballot: request decryption and drive the callbacks home
    ///
    /// Every reveal drains the outbox to completion inside this call, so
    /// the deliveries seen here all belong to this instance.
    pub fn reveal_ballot(
        &mut self,
        id: &InstanceId,
        caller: &Identity,
        now: u64,
    ) -> HostResult<RevealedResult> {
        let ballot = self
            .ballots
            .get_mut(id)
            .ok_or_else(|| HostError::UnknownInstance(id.to_hex()))?;
        ballot.begin_reveal(&mut self.service, caller, now)?;

        let mut committed = None;
        for delivery in self.service.take_decrypt_results() {
            debug!(request = %delivery.request_id.to_hex(), "decryption delivered");
            if let Some(result) = ballot.on_decrypt_result(delivery.request_id, delivery.value, now)? {
                committed = Some(result);
            }
        }
        committed.ok_or(HostError::RevealIncomplete)
    }

    /// Reveal an auction: request decryption and drive the callbacks home
    pub fn reveal_auction(
        &mut self,
        id: &InstanceId,
        caller: &Identity,
        now: u64,
    ) -> HostResult<RevealedResult> {
        let auction = self
            .auctions
            .get_mut(id)
            .ok_or_else(|| HostError::UnknownInstance(id.to_hex()))?;
        auction.begin_reveal(&mut self.service, caller, now)?;

        let mut committed = None;
        for delivery in self.service.take_decrypt_results() {
            debug!(request = %delivery.request_id.to_hex(), "decryption delivered");
            if let Some(result) =
                auction.on_decrypt_result(delivery.request_id, delivery.value, now)?
            {
                committed = Some(result);
            }
        }
        committed.ok_or(HostError::RevealIncomplete)
    }

    /// Return a losing bidder's escrow
    pub fn refund(&mut self, id: &InstanceId, identity: &Identity, now: u64) -> HostResult<u64> {
        let amount = self.auction_mut(id)?.refund(identity, now)?;
        Ok(amount)
    }

    /// Current auction leader
    pub fn auction_leader(&self, id: &InstanceId) -> HostResult<Option<Identity>> {
        let auction = self
            .auctions
            .get(id)
            .ok_or_else(|| HostError::UnknownInstance(id.to_hex()))?;
        Ok(auction.leader().copied())
    }

    /// Cancel a round of either kind
    pub fn cancel(&mut self, id: &InstanceId, caller: &Identity, now: u64) -> HostResult<()> {
        if let Some(ballot) = self.ballots.get_mut(id) {
            ballot.cancel(caller, now)?;
            return Ok(());
        }
        if let Some(auction) = self.auctions.get_mut(id) {
            auction.cancel(caller, now)?;
            return Ok(());
        }
        Err(HostError::UnknownInstance(id.to_hex()))
    }

    /// Drain the observable event log of a round of either kind
    pub fn take_events(&mut self, id: &InstanceId) -> HostResult<Vec<EngineEvent>> {
        if let Some(ballot) = self.ballots.get_mut(id) {
            return Ok(ballot.take_events());
        }
        if let Some(auction) = self.auctions.get_mut(id) {
            return Ok(auction.take_events());
        }
        Err(HostError::UnknownInstance(id.to_hex()))
    }

    /// Drop a finished instance; returns whether it existed
    pub fn remove(&mut self, id: &InstanceId) -> bool {
        self.ballots.remove(id).is_some() || self.auctions.remove(id).is_some()
    }
}
