//! Property-based tests for interleaving enumeration.

use std::collections::HashSet;

use interleave::{multinomial, simulate, Schedules};
use proptest::prelude::*;

/// Instruction counts of up to four threads, small enough to enumerate.
fn arb_lengths(max_total: usize) -> impl Strategy<Value = Vec<usize>> {
    proptest::collection::vec(0usize..=3, 0..=4)
        .prop_filter("too many instructions", move |lengths| {
            lengths.iter().sum::<usize>() <= max_total
        })
}

/// Thread sources where thread `t` appends `t` to a shared log.
fn log_threads(lengths: &[usize]) -> Vec<String> {
    lengths
        .iter()
        .enumerate()
        .map(|(t, &len)| format!("log.push({t});\n").repeat(len))
        .collect()
}

proptest! {
    /// The number of interleavings is the multinomial coefficient.
    #[test]
    fn count_is_multinomial(lengths in arb_lengths(8)) {
        let count = Schedules::new(lengths.iter().copied()).count();
        prop_assert_eq!(Some(count as u128), multinomial(lengths.iter().copied()));
    }

    /// Every interleaving places every instruction exactly once, in its
    /// thread's order.
    #[test]
    fn preserves_program_order(lengths in arb_lengths(8)) {
        let total = lengths.iter().sum::<usize>();
        for interleaving in Schedules::new(lengths.iter().copied()) {
            prop_assert_eq!(interleaving.len(), total);
            for (t, &len) in lengths.iter().enumerate() {
                let projected = interleaving.project(t).collect::<Vec<_>>();
                prop_assert_eq!(projected, (0..len).collect::<Vec<_>>());
            }
        }
    }

    /// No schedule is produced twice, and they come in ascending order.
    #[test]
    fn schedules_are_unique(lengths in arb_lengths(8)) {
        let schedules = Schedules::new(lengths.iter().copied())
            .map(|interleaving| interleaving.schedule().collect::<Vec<_>>())
            .collect::<Vec<_>>();
        let unique = schedules.iter().collect::<HashSet<_>>();
        prop_assert_eq!(unique.len(), schedules.len());
        prop_assert!(schedules.windows(2).all(|w| w[0] < w[1]));
    }

    /// Each interleaving yields a distinct log, and the tally accounts for
    /// all of them.
    #[test]
    fn tally_sums_to_count(lengths in arb_lengths(6)) {
        let threads = log_threads(&lengths);
        let tally = simulate("let log = [];", &threads, "return log;").unwrap();
        let expected = multinomial(lengths.iter().copied()).unwrap();
        prop_assert_eq!(u128::from(tally.total()), expected);
        prop_assert_eq!(tally.iter().map(|(_, &n)| u128::from(n)).sum::<u128>(), expected);
        prop_assert_eq!(tally.len() as u128, expected);
    }
}
