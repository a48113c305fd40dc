use std::collections::HashSet;

use crate::partition::Buckets;
use crate::profile::{Requirement, Strategy};

/// Number of `k`-item subsets of `n` candidates, saturating at `u128::MAX`.
pub fn subset_count(n: u128, k: u128) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut total: u128 = 1;
    for step in 0..k {
        // exact at every step: total is C(n, step) before the multiply
        total = match total.checked_mul(n - step) {
            Some(product) => product / (step + 1),
            None => return u128::MAX,
        };
    }
    total
}

/// Upper bound on subsets the exhaustive search may visit for `requirement`.
///
/// `None` for strategies that do not search.
pub fn requirement_search_space(buckets: &Buckets, requirement: &Requirement) -> Option<u128> {
    let counts = match &requirement.strategy {
        Strategy::FixedCountSearch { counts } | Strategy::PreferredFirst { counts, .. } => counts,
        _ => return None,
    };
    let mut distinct = HashSet::new();
    for name in &requirement.buckets {
        distinct.extend(buckets.get(name).iter().copied());
    }
    let n = distinct.len() as u128;
    Some(counts.iter().fold(0u128, |acc, &k| {
        acc.saturating_add(subset_count(n, k as u128))
    }))
}

/// Render `value` with thousands separators.
pub fn format_u128_with_commas(value: u128) -> String {
    let raw = value.to_string();
    let mut grouped_reversed = String::with_capacity(raw.len() + (raw.len() / 3));
    for (idx, ch) in raw.chars().rev().enumerate() {
        if idx > 0 && idx % 3 == 0 {
            grouped_reversed.push(',');
        }
        grouped_reversed.push(ch);
    }
    grouped_reversed.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::SumConstraint;

    #[test]
    fn subset_count_matches_binomials() {
        assert_eq!(subset_count(7, 7), 1);
        assert_eq!(subset_count(5, 2), 10);
        assert_eq!(subset_count(40, 16), 62_852_101_650);
        assert_eq!(subset_count(3, 4), 0);
        assert_eq!(subset_count(10, 0), 1);
        assert_eq!(subset_count(u128::MAX, 3), u128::MAX);
    }

    #[test]
    fn search_space_sums_candidate_counts() {
        let mut buckets = Buckets::new();
        buckets.insert("a", vec![0, 1, 2]);
        buckets.insert("b", vec![2, 3, 4]);
        let requirement = Requirement::new(
            "r",
            vec!["a".into(), "b".into()],
            Strategy::FixedCountSearch { counts: vec![2, 3] },
            SumConstraint::Exact { marks: 9 },
        );
        assert_eq!(requirement_search_space(&buckets, &requirement), Some(20));

        let greedy = Requirement::new(
            "g",
            vec!["a".into()],
            Strategy::ExactRemainder,
            SumConstraint::Remainder,
        );
        assert_eq!(requirement_search_space(&buckets, &greedy), None);
    }

    #[test]
    fn formats_with_commas() {
        assert_eq!(format_u128_with_commas(0), "0");
        assert_eq!(format_u128_with_commas(999), "999");
        assert_eq!(format_u128_with_commas(1_234_567), "1,234,567");
    }
}
