//! Propriétés du moteur de candidates et du classement

use amorce_core::offtarget::BatchOutcome;
use amorce_core::ranking::{finalize, merge_passes, Budget};
use amorce_core::{CandidateEngine, Constraints, IupacBase, PlacementRules, PositionMask, PrimerPair};
use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

fn sequence(seed: u64, len: usize) -> Vec<IupacBase> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let alphabet = [IupacBase::A, IupacBase::C, IupacBase::G, IupacBase::T];
    (0..len).map(|_| alphabet[rng.gen_range(0..4)]).collect()
}

fn qpcr_constraints() -> Constraints {
    Constraints {
        amplicon_range: (80, 150),
        ..Constraints::default()
    }
}

fn engine_pairs(seq: &[IupacBase], constraints: &Constraints, batches: usize) -> Vec<PrimerPair> {
    CandidateEngine::new(seq, constraints, PlacementRules::default(), HashSet::new())
        .take(batches)
        .flatten()
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn test_masked_positions_never_covered(
        seed in any::<u64>(),
        masked in prop::collection::btree_set(0usize..300, 1..6),
    ) {
        let seq = sequence(seed, 300);
        let mask: PositionMask = masked.iter().copied().collect();
        let pairs = engine_pairs(&mask.apply(&seq), &qpcr_constraints(), 10);

        for pair in &pairs {
            for candidate in [&pair.forward, &pair.reverse] {
                let range = candidate.window_start..candidate.window_end;
                prop_assert!(!mask.overlaps(&range));
            }
        }
    }

    #[test]
    fn test_emission_order_is_monotonic(seed in any::<u64>()) {
        let seq = sequence(seed, 300);
        let pairs = engine_pairs(&seq, &qpcr_constraints(), 20);

        for w in pairs.windows(2) {
            prop_assert!(w[0].pair_penalty <= w[1].pair_penalty + 1e-9);
        }
        let distinct: HashSet<&PrimerPair> = pairs.iter().collect();
        prop_assert_eq!(distinct.len(), pairs.len());
    }

    #[test]
    fn test_merge_is_idempotent(seed in any::<u64>(), extra in 0usize..5) {
        let seq = sequence(seed, 300);
        let constraints = qpcr_constraints();
        let masked = engine_pairs(&seq, &constraints, 3);
        let blind = engine_pairs(&seq, &constraints, 3 + extra);

        let merged = merge_passes(&masked, &blind);
        prop_assert_eq!(merge_passes(&merged, &merged), merged.clone());
        prop_assert!(merged.len() <= masked.len().max(blind.len()));
    }

    #[test]
    fn test_budgets_are_respected(
        seed in any::<u64>(),
        result_count in 1usize..12,
        candidate_budget in 1usize..60,
        batch_size in 1usize..15,
    ) {
        let seq = sequence(seed, 300);
        let pairs = engine_pairs(&seq, &qpcr_constraints(), 10);
        let budget = Budget { result_count, candidate_budget, batch_size };

        let mut calls = 0;
        let outcome = finalize(&pairs, &[], &budget, |batch| {
            calls += 1;
            assert!(batch.len() <= batch_size);
            BatchOutcome::default()
        });

        prop_assert!(outcome.examined <= candidate_budget);
        prop_assert_eq!(outcome.examined, candidate_budget.min(pairs.len()));
        prop_assert!(calls <= candidate_budget.div_ceil(batch_size));
        prop_assert!(outcome.results.is_empty());
    }
}
