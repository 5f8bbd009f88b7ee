//! Property tests for the codec and the resolver over the seed table.

use meihua_core::codec::{
    self, compose_primary_code, flip_line, remainder_or_max, LINE_DIVISOR, TRIGRAM_DIVISOR,
};
use meihua_core::seed::seed_knowledge_base;
use meihua_core::{DivinationError, DivinationResolver, SymbolicKnowledge};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_code() -> impl Strategy<Value = String> {
    (0u8..64).prop_map(|v| format!("{v:06b}"))
}

fn arb_positive() -> impl Strategy<Value = i64> {
    1i64..=i64::MAX
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn remainder_is_never_zero(n in 1u64..=u64::MAX, divisor in prop_oneof![Just(TRIGRAM_DIVISOR), Just(LINE_DIVISOR)]) {
        let r = remainder_or_max(n, divisor);
        prop_assert!((1..=divisor).contains(&r));
        prop_assert_eq!(r % divisor, n % divisor);
    }

    #[test]
    fn primary_code_is_six_bits(lower in 1u64..=8, upper in 1u64..=8) {
        let code = compose_primary_code(lower, upper).unwrap();
        prop_assert!(codec::is_hexagram_code(&code));
        prop_assert_eq!(&code[..3], codec::trigram_bits(lower).unwrap());
        prop_assert_eq!(&code[3..], codec::trigram_bits(upper).unwrap());
    }

    #[test]
    fn flip_changes_exactly_one_position(code in arb_code(), line in 1u64..=6) {
        let flipped = flip_line(&code, line).unwrap();
        let diffs: Vec<usize> = code
            .bytes()
            .zip(flipped.bytes())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(diffs, vec![(line - 1) as usize]);
    }

    #[test]
    fn flip_is_an_involution(code in arb_code(), line in 1u64..=6) {
        let twice = flip_line(&flip_line(&code, line).unwrap(), line).unwrap();
        prop_assert_eq!(twice, code);
    }

    #[test]
    fn flip_rejects_lines_outside_range(code in arb_code(), line in 7u64..1000) {
        prop_assert_eq!(flip_line(&code, line), Err(DivinationError::InvalidLinePosition(line)));
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn derive_is_deterministic(n1 in arb_positive(), n2 in arb_positive(), n3 in arb_positive()) {
        let kb = seed_knowledge_base().unwrap();
        let resolver = DivinationResolver::new(&kb);
        let first = resolver.derive(n1, n2, n3).unwrap();
        let second = resolver.derive(n1, n2, n3).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn derive_resolves_consistent_records(n1 in arb_positive(), n2 in arb_positive(), n3 in arb_positive()) {
        let kb = seed_knowledge_base().unwrap();
        let result = DivinationResolver::new(&kb).derive(n1, n2, n3).unwrap();

        prop_assert_eq!(&result.primary.binary_code, &result.binaries.primary);
        prop_assert_eq!(&result.secondary.binary_code, &result.binaries.secondary);
        prop_assert_eq!(result.changing_line.hexagram_position, result.primary.position);
        prop_assert_eq!(result.changing_line.position as u64, result.remainders.line);
        prop_assert_eq!(
            flip_line(&result.binaries.secondary, result.remainders.line).unwrap(),
            result.binaries.primary.clone()
        );
        prop_assert_eq!(
            result.all_changing_line.is_some(),
            result.primary.is_uniform()
        );
    }

    #[test]
    fn shifting_by_the_period_changes_nothing(n1 in 1i64..1_000_000, n2 in 1i64..1_000_000, n3 in 1i64..1_000_000, k in 1i64..100) {
        let kb = seed_knowledge_base().unwrap();
        let resolver = DivinationResolver::new(&kb);
        let base = resolver.derive(n1, n2, n3).unwrap();
        // 24 is a multiple of both divisors
        let shifted = resolver.derive(n1 + 24 * k, n2 + 8 * k, n3 + 6 * k).unwrap();
        prop_assert_eq!(base.primary, shifted.primary);
        prop_assert_eq!(base.secondary, shifted.secondary);
        prop_assert_eq!(base.changing_line, shifted.changing_line);
    }

    #[test]
    fn non_positive_first_input_is_rejected(n1 in i64::MIN..=0, n2 in arb_positive(), n3 in arb_positive()) {
        let kb = seed_knowledge_base().unwrap();
        let err = DivinationResolver::new(&kb).derive(n1, n2, n3).unwrap_err();
        prop_assert_eq!(err, DivinationError::InvalidInput { index: 1, value: n1 });
    }
}

#[test]
fn every_code_resolves_in_seed() {
    let kb = seed_knowledge_base().unwrap();
    for code in codec::all_codes() {
        assert!(kb.find_hexagram_by_code(&code).is_ok(), "missing {code}");
    }
}
