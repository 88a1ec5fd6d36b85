//! End-to-end sealed-round scenarios over the real TFHE-rs service
//!
//! Key generation dominates wall time; every test shares one key pair.

use once_cell::sync::Lazy;

use obscura::prelude::*;
use obscura::engine::{BallotInstance, EngineError, Phase};
use obscura::fhe::{LocalFheService, ServiceKeys};
use obscura::host::HostError;

static KEYS: Lazy<ServiceKeys> = Lazy::new(|| ServiceKeys::generate().expect("key generation"));

fn service() -> LocalFheService {
    LocalFheService::with_keys(KEYS.clone())
}

fn drive_ballot_reveal(
    svc: &mut LocalFheService,
    ballot: &mut BallotInstance,
    caller: &Identity,
    now: u64,
) -> Result<RevealedResult, EngineError> {
    ballot.begin_reveal(svc, caller, now)?;
    let mut committed = None;
    for delivery in svc.take_decrypt_results() {
        if let Some(result) = ballot.on_decrypt_result(delivery.request_id, delivery.value, now)? {
            committed = Some(result);
        }
    }
    Ok(committed.expect("local oracle answers immediately"))
}

#[test]
fn ballot_tally_is_order_independent() {
    let creator = Identity::derive("creator");

    // Same multiset of votes, two different arrival orders
    let mut results = Vec::new();
    for (window, order) in [(3600, [1u64, 0, 1]), (7200, [0, 1, 1])] {
        let mut svc = service();
        let mut ballot = BallotInstance::open(&mut svc, creator, 0, window).unwrap();
        let encryptor = svc.encryptor();

        for (i, &choice) in order.iter().enumerate() {
            let voter = Identity::derive(&format!("voter-{i}"));
            let input = encryptor.encrypt_u64(choice).unwrap();
            ballot.cast_vote(&mut svc, voter, &input, 1 + i as u64).unwrap();
        }

        assert_eq!(ballot.participant_count(), 3);
        results.push(drive_ballot_reveal(&mut svc, &mut ballot, &creator, window + 1).unwrap());
    }

    assert_eq!(results[0], RevealedResult::Tally { yes: 2, no: 1 });
    assert_eq!(results[0], results[1]);
}

#[test]
fn ballot_rejects_out_of_phase_and_duplicates() {
    let creator = Identity::derive("creator");
    let mut svc = service();
    let mut ballot = BallotInstance::open(&mut svc, creator, 0, 3600).unwrap();
    let encryptor = svc.encryptor();

    let alice = Identity::derive("alice");
    let input = encryptor.encrypt_choice(true).unwrap();
    ballot.cast_vote(&mut svc, alice, &input, 10).unwrap();
    assert!(ballot.has_contributed(&alice));

    // Reveal before the window elapses
    let err = ballot.begin_reveal(&mut svc, &creator, 1800).unwrap_err();
    assert!(matches!(err, EngineError::PhaseViolation { .. }));

    // Duplicate contribution leaves the count untouched
    let second = encryptor.encrypt_choice(false).unwrap();
    let err = ballot.cast_vote(&mut svc, alice, &second, 20).unwrap_err();
    assert!(matches!(err, EngineError::AlreadyRegistered(_)));
    assert_eq!(ballot.participant_count(), 1);

    // Contribution at the close boundary
    let late = encryptor.encrypt_choice(true).unwrap();
    let err = ballot
        .cast_vote(&mut svc, Identity::derive("bob"), &late, 3600)
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::PhaseViolation {
            expected: Phase::Open,
            actual: Phase::Closed,
        }
    );
    assert_eq!(ballot.participant_count(), 1);

    // Reveal succeeds exactly once; the rejected vote changed nothing
    let result = drive_ballot_reveal(&mut svc, &mut ballot, &creator, 3601).unwrap();
    assert_eq!(result, RevealedResult::Tally { yes: 1, no: 0 });

    let err = ballot.begin_reveal(&mut svc, &creator, 3700).unwrap_err();
    assert_eq!(err, EngineError::AlreadyRevealed);
    assert_eq!(ballot.result(), Some(&RevealedResult::Tally { yes: 1, no: 0 }));
}

#[test]
fn auction_round_through_host() {
    let mut host = LocalHost::with_service(service());
    let encryptor = host.encryptor();

    let creator = Identity::derive("auctioneer");
    let id = host.open_auction(creator, 0, 3600).unwrap();

    let alice = Identity::derive("alice");
    let bob = Identity::derive("bob");
    let carol = Identity::derive("carol");

    for (i, (bidder, amount)) in [(alice, 5u64), (bob, 8), (carol, 3)].iter().enumerate() {
        let input = encryptor.encrypt_u64(*amount).unwrap();
        host.place_bid(&id, *bidder, &input, 100, 1 + i as u64).unwrap();
    }
    assert_eq!(host.auction_leader(&id).unwrap(), Some(bob));

    let result = host.reveal_auction(&id, &creator, 3601).unwrap();
    assert_eq!(
        result,
        RevealedResult::Auction {
            winning_bid: 8,
            winner: Some(bob),
        }
    );

    // Losing bidders reclaim escrow exactly once; the winner never does
    assert_eq!(host.refund(&id, &alice, 3602).unwrap(), 100);
    assert_eq!(host.refund(&id, &carol, 3602).unwrap(), 100);
    assert!(matches!(
        host.refund(&id, &carol, 3603),
        Err(HostError::Engine(EngineError::AlreadyRefunded(_)))
    ));
    assert!(matches!(
        host.refund(&id, &bob, 3603),
        Err(HostError::Engine(EngineError::WinnerEscrowHeld))
    ));

    // The event log names participants but never values
    let events = host.take_events(&id).unwrap();
    assert!(events
        .iter()
        .any(|event| matches!(event, EngineEvent::ContributionAccepted { identity, .. } if *identity == bob)));
    assert!(events
        .iter()
        .any(|event| matches!(event, EngineEvent::ResultRevealed { .. })));
}

#[test]
fn cancellation_requires_empty_instance() {
    let mut host = LocalHost::with_service(service());
    let encryptor = host.encryptor();
    let creator = Identity::derive("creator");

    // Empty ballot cancels cleanly
    let empty = host.open_ballot(creator, 0, 3600).unwrap();
    host.cancel(&empty, &creator, 10).unwrap();
    let input = encryptor.encrypt_choice(true).unwrap();
    assert!(matches!(
        host.cast_vote(&empty, Identity::derive("late"), &input, 11),
        Err(HostError::Engine(EngineError::PhaseViolation { .. }))
    ));

    // A single contribution blocks cancellation
    let active = host.open_ballot(creator, 100, 3600).unwrap();
    let input = encryptor.encrypt_choice(false).unwrap();
    host.cast_vote(&active, Identity::derive("alice"), &input, 110).unwrap();
    assert!(matches!(
        host.cancel(&active, &creator, 120),
        Err(HostError::Engine(EngineError::CancelWithContributions(1)))
    ));
}
