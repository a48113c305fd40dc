//! Declarative target profiles describing what a generated paper must satisfy.

use std::borrow::Cow;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::GenerationError;
use crate::partition::PartitionKey;
use crate::types::{BucketName, Marks};

/// Inclusive bound on how many items a requirement may select.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountBound {
    /// Fewest items allowed.
    pub min: usize,
    /// Most items allowed.
    pub max: usize,
}

impl CountBound {
    /// Exactly `count` items.
    pub fn exactly(count: usize) -> Self {
        Self {
            min: count,
            max: count,
        }
    }

    /// Between `min` and `max` items inclusive.
    pub fn between(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Any number of items.
    pub fn any() -> Self {
        Self {
            min: 0,
            max: usize::MAX,
        }
    }

    /// True when `count` satisfies the bound.
    pub fn contains(&self, count: usize) -> bool {
        self.min <= count && count <= self.max
    }
}

impl Default for CountBound {
    fn default() -> Self {
        Self::any()
    }
}

/// Constraint on the sum of marks selected for a requirement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SumConstraint {
    /// Sum must equal `marks`.
    Exact {
        /// Required sum.
        marks: Marks,
    },
    /// Sum must fall in `[min, max]`.
    Range {
        /// Inclusive lower bound.
        min: Marks,
        /// Inclusive upper bound.
        max: Marks,
    },
    /// Sum must equal the paper total minus everything filled before.
    Remainder,
}

/// Selection algorithm used to satisfy one requirement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Randomized accumulation that stops once within `tolerance` of `target`.
    ToleranceWindow {
        /// Preferred sum.
        target: Marks,
        /// Allowed distance from `target` for early stop.
        tolerance: Marks,
    },
    /// Greedy exact fill where each bucket is a mark denomination in priority order.
    ExactRemainder,
    /// Exhaustive subset search for exactly `k` items, trying `counts` in order.
    FixedCountSearch {
        /// Candidate item counts, most preferred first.
        counts: Vec<usize>,
    },
    /// Like `FixedCountSearch`, but the first slot comes from `preferred` buckets
    /// whenever they hold an unused item that is also in the requirement's buckets.
    PreferredFirst {
        /// Buckets that must supply the first slot when non-empty.
        preferred: Vec<BucketName>,
        /// Candidate item counts, most preferred first.
        counts: Vec<usize>,
    },
}

impl Strategy {
    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::ToleranceWindow { .. } => "tolerance_window",
            Strategy::ExactRemainder => "exact_remainder",
            Strategy::FixedCountSearch { .. } => "fixed_count_search",
            Strategy::PreferredFirst { .. } => "preferred_first",
        }
    }
}

/// One constraint line of a target profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Unique name within the profile.
    pub name: Cow<'static, str>,
    /// Buckets the requirement draws from, in priority order.
    pub buckets: Vec<BucketName>,
    /// Inclusive count bound.
    #[serde(default)]
    pub count: CountBound,
    /// Sum constraint.
    pub sum: SumConstraint,
    /// Algorithm used to satisfy the constraint.
    pub strategy: Strategy,
    /// Lower values fill first; ties keep declared order.
    #[serde(default)]
    pub fill_priority: u8,
}

impl Requirement {
    /// Requirement with no count bound and default fill priority.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        buckets: Vec<BucketName>,
        strategy: Strategy,
        sum: SumConstraint,
    ) -> Self {
        Self {
            name: name.into(),
            buckets,
            count: CountBound::any(),
            sum,
            strategy,
            fill_priority: 0,
        }
    }

    /// Set the count bound.
    pub fn with_count(mut self, count: CountBound) -> Self {
        self.count = count;
        self
    }

    /// Set the fill priority.
    pub fn with_fill_priority(mut self, fill_priority: u8) -> Self {
        self.fill_priority = fill_priority;
        self
    }

    fn validate(&self) -> Result<(), GenerationError> {
        let invalid = |reason: &str| -> Result<(), GenerationError> {
            Err(GenerationError::Configuration(format!(
                "requirement '{}': {reason}",
                self.name
            )))
        };
        if self.buckets.is_empty() {
            return invalid("no buckets referenced");
        }
        if self.count.min > self.count.max {
            return invalid("count min exceeds max");
        }
        match (&self.strategy, &self.sum) {
            (Strategy::ToleranceWindow { target, .. }, SumConstraint::Range { min, max }) => {
                if min > max {
                    return invalid("sum range min exceeds max");
                }
                if target < min || target > max {
                    return invalid("tolerance target lies outside the sum range");
                }
            }
            (Strategy::ToleranceWindow { .. }, _) => {
                return invalid("tolerance window needs a range sum constraint");
            }
            (_, SumConstraint::Range { .. }) => {
                return invalid("range sum constraints need the tolerance window strategy");
            }
            (Strategy::FixedCountSearch { counts }, _) => self.validate_counts(counts)?,
            (Strategy::PreferredFirst { preferred, counts }, _) => {
                if preferred.is_empty() {
                    return invalid("preferred-first needs at least one preferred bucket");
                }
                if counts.contains(&0) {
                    return invalid("preferred-first counts must be positive");
                }
                self.validate_counts(counts)?;
            }
            (Strategy::ExactRemainder, _) => {}
        }
        Ok(())
    }

    fn validate_counts(&self, counts: &[usize]) -> Result<(), GenerationError> {
        if counts.is_empty() {
            return Err(GenerationError::Configuration(format!(
                "requirement '{}': no candidate counts",
                self.name
            )));
        }
        if let Some(bad) = counts.iter().find(|count| !self.count.contains(**count)) {
            return Err(GenerationError::Configuration(format!(
                "requirement '{}': candidate count {bad} violates count bound {}..={}",
                self.name, self.count.min, self.count.max
            )));
        }
        Ok(())
    }
}

/// Full declarative constraint set for one paper type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetProfile {
    /// Paper id, e.g. `chemistry-2`.
    pub id: Cow<'static, str>,
    /// Human readable title.
    pub title: Cow<'static, str>,
    /// Declared paper total.
    pub total_marks: Marks,
    /// Keys used to partition the pool for this paper.
    pub partition: Vec<PartitionKey>,
    /// Requirements in output (numbering) order.
    pub requirements: Vec<Requirement>,
}

impl TargetProfile {
    /// Build a profile without validating it.
    pub fn new(
        id: impl Into<Cow<'static, str>>,
        title: impl Into<Cow<'static, str>>,
        total_marks: Marks,
        partition: Vec<PartitionKey>,
        requirements: Vec<Requirement>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            total_marks,
            partition,
            requirements,
        }
    }

    /// Parse and validate a profile from JSON.
    pub fn from_json_str(raw: &str) -> Result<Self, GenerationError> {
        let profile: TargetProfile = serde_json::from_str(raw)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Requirement indices in fill order (stable by `fill_priority`).
    pub fn fill_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.requirements.len()).collect();
        order.sort_by_key(|&idx| self.requirements[idx].fill_priority);
        order
    }

    /// Every bucket name any requirement reads, first occurrence order.
    pub fn referenced_buckets(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for requirement in &self.requirements {
            let preferred: &[BucketName] = match &requirement.strategy {
                Strategy::PreferredFirst { preferred, .. } => preferred,
                _ => &[],
            };
            for name in preferred.iter().chain(&requirement.buckets) {
                if seen.insert(name.as_str()) {
                    names.push(name.as_str());
                }
            }
        }
        names
    }

    /// Reject profiles whose requirements cannot conserve the declared total.
    pub fn validate(&self) -> Result<(), GenerationError> {
        let invalid = |reason: String| -> Result<(), GenerationError> {
            Err(GenerationError::Configuration(format!(
                "profile '{}': {reason}",
                self.id
            )))
        };
        if self.requirements.is_empty() {
            return invalid("no requirements".into());
        }
        let mut names = HashSet::new();
        for requirement in &self.requirements {
            if !names.insert(requirement.name.as_ref()) {
                return invalid(format!("duplicate requirement '{}'", requirement.name));
            }
            requirement.validate()?;
        }

        let remainders: Vec<usize> = self
            .requirements
            .iter()
            .enumerate()
            .filter(|(_, requirement)| requirement.sum == SumConstraint::Remainder)
            .map(|(idx, _)| idx)
            .collect();
        if remainders.len() > 1 {
            return invalid("more than one remainder requirement".into());
        }

        let mut fixed_total: Marks = 0;
        let mut has_range = false;
        for requirement in &self.requirements {
            let fixed = match requirement.sum {
                SumConstraint::Exact { marks } => marks,
                SumConstraint::Range { min, .. } => {
                    has_range = true;
                    min
                }
                SumConstraint::Remainder => 0,
            };
            let Some(total) = fixed_total.checked_add(fixed) else {
                return invalid("requirement sums overflow the mark range".into());
            };
            fixed_total = total;
        }

        match remainders.first() {
            Some(&remainder_idx) => {
                let order = self.fill_order();
                if order.last() != Some(&remainder_idx) {
                    return invalid("the remainder requirement must fill last".into());
                }
                if fixed_total > self.total_marks {
                    return invalid(format!(
                        "fixed sums ({fixed_total}) exceed the paper total {}",
                        self.total_marks
                    ));
                }
            }
            None => {
                if has_range {
                    return invalid(
                        "range requirements need a remainder requirement to conserve the total"
                            .into(),
                    );
                }
                if fixed_total != self.total_marks {
                    return invalid(format!(
                        "exact sums total {fixed_total} but the paper declares {}",
                        self.total_marks
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_phase(total: Marks) -> TargetProfile {
        TargetProfile::new(
            "two-phase",
            "Two phase",
            total,
            vec![PartitionKey::Nested, PartitionKey::StandaloneMarks],
            vec![
                Requirement::new(
                    "standalone",
                    vec!["standalone:marks:2".into(), "standalone:marks:1".into()],
                    Strategy::ExactRemainder,
                    SumConstraint::Remainder,
                )
                .with_fill_priority(1),
                Requirement::new(
                    "nested",
                    vec!["nested".into()],
                    Strategy::ToleranceWindow {
                        target: 20,
                        tolerance: 2,
                    },
                    SumConstraint::Range { min: 16, max: 24 },
                ),
            ],
        )
    }

    #[test]
    fn fill_order_respects_priority_then_declaration() {
        let profile = two_phase(40);
        assert_eq!(profile.fill_order(), vec![1, 0]);
        profile.validate().unwrap();
    }

    #[test]
    fn remainder_must_fill_last() {
        let mut profile = two_phase(40);
        profile.requirements[0].fill_priority = 0;
        let err = profile.validate().unwrap_err();
        assert!(err.to_string().contains("must fill last"));
    }

    #[test]
    fn exact_totals_must_match_declared_total() {
        let profile = TargetProfile::new(
            "exact",
            "Exact",
            50,
            Vec::new(),
            vec![Requirement::new(
                "all",
                vec!["b".into()],
                Strategy::FixedCountSearch { counts: vec![3] },
                SumConstraint::Exact { marks: 45 },
            )],
        );
        assert!(matches!(
            profile.validate(),
            Err(GenerationError::Configuration(_))
        ));
    }

    #[test]
    fn overflowing_requirement_sums_are_rejected() {
        let requirement = |name: &'static str| {
            Requirement::new(
                name,
                vec!["b".into()],
                Strategy::ExactRemainder,
                SumConstraint::Exact { marks: Marks::MAX },
            )
        };
        let profile = TargetProfile::new(
            "huge",
            "Huge",
            Marks::MAX,
            Vec::new(),
            vec![requirement("first"), requirement("second")],
        );
        let err = profile.validate().unwrap_err();
        assert!(matches!(err, GenerationError::Configuration(_)));
        assert!(err.to_string().contains("overflow"));
    }

    #[test]
    fn strategy_and_sum_pairings_are_checked() {
        let profile = TargetProfile::new(
            "bad",
            "Bad",
            10,
            Vec::new(),
            vec![Requirement::new(
                "window",
                vec!["b".into()],
                Strategy::ToleranceWindow {
                    target: 10,
                    tolerance: 1,
                },
                SumConstraint::Exact { marks: 10 },
            )],
        );
        assert!(profile.validate().is_err());

        let counts_outside_bound = TargetProfile::new(
            "bad-counts",
            "Bad counts",
            10,
            Vec::new(),
            vec![
                Requirement::new(
                    "search",
                    vec!["b".into()],
                    Strategy::FixedCountSearch { counts: vec![2, 5] },
                    SumConstraint::Exact { marks: 10 },
                )
                .with_count(CountBound::between(1, 4)),
            ],
        );
        let err = counts_outside_bound.validate().unwrap_err();
        assert!(err.to_string().contains("candidate count 5"));
    }

    #[test]
    fn profile_round_trips_through_json() {
        let profile = two_phase(40);
        let raw = serde_json::to_string(&profile).unwrap();
        assert!(raw.contains("\"kind\":\"tolerance_window\""));
        let parsed = TargetProfile::from_json_str(&raw).unwrap();
        assert_eq!(parsed, profile);
        assert_eq!(
            parsed.referenced_buckets(),
            vec!["standalone:marks:2", "standalone:marks:1", "nested"]
        );
    }
}
