//! Property-based tests for the sealed-round state machines
//!
//! Uses proptest to generate random inputs and verify the registry and
//! phase-clock invariants hold. No FHE involved; these run fast.

use proptest::prelude::*;
use std::collections::HashSet;

use obscura::engine::{Identity, ParticipantRegistry, Phase, PhaseClock};

/// Strategy for generating random 32-byte identities
fn bytes32() -> impl Strategy<Value = [u8; 32]> {
    prop::array::uniform32(any::<u8>())
}

proptest! {
    /// Property: each identity registers exactly once; the counter equals
    /// the number of distinct identities seen
    #[test]
    fn registry_accepts_each_identity_once(ids in prop::collection::vec(bytes32(), 1..50)) {
        let mut registry = ParticipantRegistry::new();
        let mut distinct = HashSet::new();

        for (i, bytes) in ids.iter().enumerate() {
            let identity = Identity::from_bytes(*bytes);
            let fresh = distinct.insert(*bytes);

            let outcome = registry.register(identity, i as u64, None);
            prop_assert_eq!(outcome.is_ok(), fresh);
            prop_assert!(registry.has_contributed(&identity));
        }

        prop_assert_eq!(registry.count(), distinct.len() as u64);
    }

    /// Property: a rejected duplicate leaves the stored record untouched
    #[test]
    fn rejected_duplicate_preserves_record(
        bytes in bytes32(),
        first_at in 0u64..1000,
        second_at in 1000u64..2000,
        escrow in prop::option::of(1u64..1_000_000),
    ) {
        let mut registry = ParticipantRegistry::new();
        let identity = Identity::from_bytes(bytes);

        registry.register(identity, first_at, escrow).unwrap();
        prop_assert!(registry.register(identity, second_at, None).is_err());

        let record = registry.record(&identity).unwrap();
        prop_assert_eq!(record.contributed_at, first_at);
        prop_assert_eq!(record.escrow, escrow);
    }

    /// Property: the lazy close is monotone in the observation time
    #[test]
    fn phase_close_is_monotone(
        opened in 0u64..1000,
        window in 1u64..10_000,
        t1 in 0u64..20_000,
        t2 in 0u64..20_000,
    ) {
        let clock = PhaseClock::open(opened, opened + window);
        let (lo, hi) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };

        if clock.is_closed(lo) {
            prop_assert!(clock.is_closed(hi));
        }
        if clock.is_open(hi) {
            prop_assert!(clock.is_open(lo));
        }
        // The boundary itself is closed
        prop_assert!(clock.is_closed(opened + window));
    }

    /// Property: no sequence of attempted transitions leaves a terminal phase
    #[test]
    fn terminal_phases_are_terminal(
        window in 1u64..1000,
        times in prop::collection::vec(0u64..5000, 1..20),
        cancelled in any::<bool>(),
    ) {
        let mut clock = PhaseClock::open(0, window);

        let terminal = if cancelled {
            clock.cancel(0).unwrap();
            Phase::Cancelled
        } else {
            clock.begin_reveal(window).unwrap();
            clock.commit_reveal().unwrap();
            Phase::Revealed
        };

        for &t in &times {
            let _ = clock.settle(t);
            let _ = clock.begin_reveal(t);
            let _ = clock.commit_reveal();
            let _ = clock.cancel(t);
            prop_assert_eq!(clock.effective(t), terminal);
        }
    }
}
