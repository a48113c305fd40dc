//! Final result construction and invariant validation.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::data::Pool;
use crate::profile::TargetProfile;
use crate::strategy::{ResolvedSum, Selection};
use crate::types::{ItemId, Marks, PaperId};

/// One selected question with its position in the paper.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NumberedItem {
    /// 1-based question number.
    pub number: usize,
    /// Selected item id.
    pub item_id: ItemId,
    /// Marks the item carries.
    pub marks: Marks,
    /// Requirement that selected the item.
    pub requirement: String,
}

/// What one requirement contributed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RequirementReport {
    /// Requirement name.
    pub name: String,
    /// Strategy label.
    pub strategy: &'static str,
    /// Number of items selected.
    pub count: usize,
    /// Marks selected.
    pub sum: Marks,
    /// Lower bound of the resolved sum target.
    pub target_min: Marks,
    /// Upper bound of the resolved sum target (equal to `target_min` for exact sums).
    pub target_max: Marks,
}

/// One flag per selection invariant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// No item id appears twice.
    pub unique_ids: bool,
    /// Every exact (or remainder) requirement hit its sum.
    pub exact_sums: bool,
    /// Every range requirement landed inside its range.
    pub range_sums: bool,
    /// Every requirement respected its count bound.
    pub count_bounds: bool,
    /// Selected marks equal the paper total.
    pub total_conserved: bool,
}

impl ValidationReport {
    /// True when every invariant holds.
    pub fn is_valid(&self) -> bool {
        self.failures().is_empty()
    }

    /// Names of the invariants that do not hold.
    pub fn failures(&self) -> Vec<&'static str> {
        [
            ("unique_ids", self.unique_ids),
            ("exact_sums", self.exact_sums),
            ("range_sums", self.range_sums),
            ("count_bounds", self.count_bounds),
            ("total_conserved", self.total_conserved),
        ]
        .into_iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| name)
        .collect()
    }
}

/// Summary numbers for a generated paper.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenerationStats {
    /// Marks actually selected.
    pub total_marks: Marks,
    /// Marks the profile declares.
    pub target_total: Marks,
    /// Number of items selected.
    pub item_count: usize,
    /// Attempts used, including the successful one.
    pub attempts: usize,
    /// Wall time spent in the attempt loop.
    pub elapsed: Duration,
    /// When the result was assembled.
    pub generated_at: DateTime<Utc>,
}

/// A generated paper.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenerationResult {
    /// Profile id.
    pub paper: PaperId,
    /// Profile title.
    pub title: String,
    /// Items in answer order, numbered from 1.
    pub items: Vec<NumberedItem>,
    /// Per-requirement breakdown in declared order.
    pub requirements: Vec<RequirementReport>,
    /// Invariant flags.
    pub validation: ValidationReport,
    /// Summary statistics.
    pub stats: GenerationStats,
}

impl GenerationResult {
    /// Selected item ids in answer order.
    pub fn item_ids(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.item_id.as_str()).collect()
    }

    /// True when every invariant holds.
    pub fn is_valid(&self) -> bool {
        self.validation.is_valid()
    }
}

/// Builds `GenerationResult`s from finished selections.
pub struct ResultAssembler;

impl ResultAssembler {
    /// Assemble a successful attempt.
    ///
    /// `targets` holds the resolved sum target per requirement in declared
    /// order. Items are concatenated in declared requirement order regardless
    /// of fill order.
    pub fn assemble(
        pool: &Pool,
        profile: &TargetProfile,
        selection: &Selection,
        targets: &[ResolvedSum],
        attempts: usize,
        elapsed: Duration,
    ) -> GenerationResult {
        let mut items = Vec::new();
        let mut requirements = Vec::with_capacity(profile.requirements.len());
        let mut seen = HashSet::new();
        let mut validation = ValidationReport {
            unique_ids: true,
            exact_sums: true,
            range_sums: true,
            count_bounds: true,
            total_conserved: true,
        };

        for (req_idx, requirement) in profile.requirements.iter().enumerate() {
            let picks = selection.picks(req_idx);
            let sum = selection.sum(req_idx);
            for &idx in picks {
                let Some(item) = pool.get(idx) else {
                    validation.unique_ids = false;
                    continue;
                };
                if !seen.insert(item.id.as_str()) {
                    validation.unique_ids = false;
                }
                items.push(NumberedItem {
                    number: items.len() + 1,
                    item_id: item.id.clone(),
                    marks: item.marks,
                    requirement: requirement.name.to_string(),
                });
            }

            let (target_min, target_max) = match targets.get(req_idx) {
                Some(ResolvedSum::Exact(marks)) => {
                    validation.exact_sums &= sum == *marks;
                    (*marks, *marks)
                }
                Some(ResolvedSum::Range { min, max }) => {
                    validation.range_sums &= *min <= sum && sum <= *max;
                    (*min, *max)
                }
                None => {
                    validation.exact_sums = false;
                    (0, 0)
                }
            };
            validation.count_bounds &= requirement.count.contains(picks.len());
            requirements.push(RequirementReport {
                name: requirement.name.to_string(),
                strategy: requirement.strategy.label(),
                count: picks.len(),
                sum,
                target_min,
                target_max,
            });
        }

        let total_marks: Marks = items.iter().map(|item| item.marks).sum();
        validation.total_conserved = total_marks == profile.total_marks;

        GenerationResult {
            paper: profile.id.to_string(),
            title: profile.title.to_string(),
            stats: GenerationStats {
                total_marks,
                target_total: profile.total_marks,
                item_count: items.len(),
                attempts,
                elapsed,
                generated_at: Utc::now(),
            },
            items,
            requirements,
            validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Item;
    use crate::profile::{CountBound, Requirement, Strategy, SumConstraint};

    fn profile() -> TargetProfile {
        TargetProfile::new(
            "mini",
            "Mini",
            10,
            Vec::new(),
            vec![
                Requirement::new(
                    "first",
                    vec!["a".into()],
                    Strategy::FixedCountSearch { counts: vec![1] },
                    SumConstraint::Exact { marks: 4 },
                )
                .with_count(CountBound::exactly(1)),
                Requirement::new(
                    "second",
                    vec!["b".into()],
                    Strategy::ExactRemainder,
                    SumConstraint::Exact { marks: 6 },
                ),
            ],
        )
    }

    fn pool() -> Pool {
        Pool::new(
            Vec::new(),
            vec![
                Item::new("x", "t", 3),
                Item::new("y", "t", 3),
                Item::new("z", "t", 4),
            ],
        )
        .unwrap()
    }

    #[test]
    fn numbering_follows_declared_order() {
        let pool = pool();
        let mut selection = Selection::new(2);
        // fill the second requirement first
        selection.record(1, vec![0, 1], &pool).unwrap();
        selection.record(0, vec![2], &pool).unwrap();
        let result = ResultAssembler::assemble(
            &pool,
            &profile(),
            &selection,
            &[ResolvedSum::Exact(4), ResolvedSum::Exact(6)],
            2,
            Duration::from_millis(3),
        );
        assert_eq!(result.item_ids(), vec!["z", "x", "y"]);
        let numbers: Vec<usize> = result.items.iter().map(|item| item.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(result.is_valid());
        assert_eq!(result.stats.total_marks, 10);
        assert_eq!(result.stats.attempts, 2);
        assert_eq!(result.requirements[1].strategy, "exact_remainder");
    }

    #[test]
    fn broken_selection_is_flagged() {
        let pool = pool();
        let mut selection = Selection::new(2);
        selection.record(0, vec![0], &pool).unwrap();
        selection.record(1, vec![1], &pool).unwrap();
        let result = ResultAssembler::assemble(
            &pool,
            &profile(),
            &selection,
            &[ResolvedSum::Exact(4), ResolvedSum::Exact(6)],
            1,
            Duration::ZERO,
        );
        assert!(!result.is_valid());
        assert_eq!(
            result.validation.failures(),
            vec!["exact_sums", "total_conserved"]
        );
    }
}
