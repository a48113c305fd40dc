//! Attempt loop: reshuffle, fill every requirement, retry on failure.
//!
//! A failed attempt is a normal outcome reported to the observer; only
//! configuration and precondition failures, exhaustion, and invariant
//! violations escape `run`.

use std::time::Instant;

use rand::RngCore;
use tracing::{debug, info, warn};

use crate::assembler::{GenerationResult, ResultAssembler};
use crate::config::SearchBudget;
use crate::constants::generator::LARGE_SEARCH_SPACE;
use crate::data::Pool;
use crate::errors::{BucketSizes, GenerationError};
use crate::heuristics::{format_u128_with_commas, requirement_search_space};
use crate::partition::{Buckets, PoolPartitioner};
use crate::profile::{Requirement, SumConstraint, TargetProfile};
use crate::strategy::{self, ResolvedSum, Selection, SelectionContext};

/// Receives attempt lifecycle events.
///
/// Every method defaults to a no-op so observers implement only what they need.
pub trait GenerationObserver {
    /// Attempt `attempt` (1-based) is about to start.
    fn attempt_started(&mut self, _paper: &str, _attempt: usize) {}

    /// Attempt `attempt` failed while filling `requirement`.
    fn attempt_failed(&mut self, _paper: &str, _attempt: usize, _requirement: &str) {}

    /// A valid paper was produced.
    fn generation_succeeded(&mut self, _result: &GenerationResult) {}

    /// Every attempt failed.
    fn generation_exhausted(&mut self, _paper: &str, _attempts: usize, _sizes: &BucketSizes) {}
}

/// Observer that forwards events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl GenerationObserver for TracingObserver {
    fn attempt_failed(&mut self, paper: &str, attempt: usize, requirement: &str) {
        debug!(paper, attempt, requirement, "attempt failed");
    }

    fn generation_succeeded(&mut self, result: &GenerationResult) {
        info!(
            paper = %result.paper,
            attempts = result.stats.attempts,
            items = result.stats.item_count,
            marks = result.stats.total_marks,
            elapsed_ms = result.stats.elapsed.as_millis() as u64,
            "paper generated"
        );
    }

    fn generation_exhausted(&mut self, paper: &str, attempts: usize, sizes: &BucketSizes) {
        warn!(paper, attempts, bucket_sizes = %sizes, "generation exhausted");
    }
}

/// Observer that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl GenerationObserver for NoopObserver {}

enum AttemptOutcome {
    Selected {
        selection: Selection,
        targets: Vec<ResolvedSum>,
    },
    Failed {
        requirement: usize,
    },
}

/// Runs up to `max_attempts` randomized attempts against one profile.
#[derive(Clone, Copy, Debug)]
pub struct RetryOrchestrator {
    max_attempts: usize,
    budget: SearchBudget,
}

impl RetryOrchestrator {
    /// Orchestrator with the given attempt cap and search budget.
    pub fn new(max_attempts: usize, budget: SearchBudget) -> Self {
        Self {
            max_attempts,
            budget,
        }
    }

    /// Attempt cap.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Validate the profile and buckets, then attempt selection until success or exhaustion.
    ///
    /// `buckets` must come from partitioning `pool`; each attempt works on an
    /// independently shuffled copy drawn from `rng`.
    pub fn run<R: RngCore + ?Sized>(
        &self,
        profile: &TargetProfile,
        pool: &Pool,
        buckets: &Buckets,
        rng: &mut R,
        observer: &mut dyn GenerationObserver,
    ) -> Result<GenerationResult, GenerationError> {
        profile.validate()?;
        PoolPartitioner::validate(pool, buckets, profile)?;
        warn_on_large_search_spaces(profile, buckets);

        let order = profile.fill_order();
        let started = Instant::now();
        for attempt in 1..=self.max_attempts {
            observer.attempt_started(&profile.id, attempt);
            let shuffled = buckets.shuffled(rng);
            match self.attempt(profile, pool, &shuffled, &order)? {
                AttemptOutcome::Selected { selection, targets } => {
                    let result = ResultAssembler::assemble(
                        pool,
                        profile,
                        &selection,
                        &targets,
                        attempt,
                        started.elapsed(),
                    );
                    if !result.is_valid() {
                        return Err(GenerationError::InvariantViolation(format!(
                            "paper '{}' failed checks: {}",
                            profile.id,
                            result.validation.failures().join(", ")
                        )));
                    }
                    observer.generation_succeeded(&result);
                    return Ok(result);
                }
                AttemptOutcome::Failed { requirement } => {
                    observer.attempt_failed(
                        &profile.id,
                        attempt,
                        &profile.requirements[requirement].name,
                    );
                }
            }
        }

        let bucket_sizes = buckets.sizes();
        observer.generation_exhausted(&profile.id, self.max_attempts, &bucket_sizes);
        Err(GenerationError::Exhausted {
            paper: profile.id.to_string(),
            attempts: self.max_attempts,
            bucket_sizes,
        })
    }

    fn attempt(
        &self,
        profile: &TargetProfile,
        pool: &Pool,
        buckets: &Buckets,
        order: &[usize],
    ) -> Result<AttemptOutcome, GenerationError> {
        let mut selection = Selection::new(profile.requirements.len());
        let mut targets: Vec<Option<ResolvedSum>> = vec![None; profile.requirements.len()];
        for &req_idx in order {
            let requirement = &profile.requirements[req_idx];
            let Some(target) = resolve_target(requirement, profile, &selection) else {
                return Ok(AttemptOutcome::Failed {
                    requirement: req_idx,
                });
            };
            let picks = {
                let ctx = SelectionContext {
                    pool,
                    buckets,
                    selection: &selection,
                    budget: self.budget,
                };
                strategy::select(requirement, target, &ctx)
            };
            let Some(picks) = picks else {
                return Ok(AttemptOutcome::Failed {
                    requirement: req_idx,
                });
            };
            selection.record(req_idx, picks, pool)?;
            targets[req_idx] = Some(target);
        }
        let targets = targets
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                GenerationError::InvariantViolation("fill order skipped a requirement".into())
            })?;
        Ok(AttemptOutcome::Selected { selection, targets })
    }
}

fn resolve_target(
    requirement: &Requirement,
    profile: &TargetProfile,
    selection: &Selection,
) -> Option<ResolvedSum> {
    match requirement.sum {
        SumConstraint::Exact { marks } => Some(ResolvedSum::Exact(marks)),
        SumConstraint::Range { min, max } => Some(ResolvedSum::Range { min, max }),
        SumConstraint::Remainder => profile
            .total_marks
            .checked_sub(selection.total())
            .map(ResolvedSum::Exact),
    }
}

fn warn_on_large_search_spaces(profile: &TargetProfile, buckets: &Buckets) {
    for requirement in &profile.requirements {
        if let Some(space) = requirement_search_space(buckets, requirement)
            && space > LARGE_SEARCH_SPACE
        {
            warn!(
                paper = %profile.id,
                requirement = %requirement.name,
                subsets = %format_u128_with_commas(space),
                "large subset search space; attempts may stop at the node budget"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Item;
    use crate::profile::{CountBound, Strategy};
    use crate::rng::DeterministicRng;

    #[derive(Default)]
    struct Counting {
        started: usize,
        failed: usize,
        succeeded: usize,
        exhausted: usize,
    }

    impl GenerationObserver for Counting {
        fn attempt_started(&mut self, _paper: &str, _attempt: usize) {
            self.started += 1;
        }
        fn attempt_failed(&mut self, _paper: &str, _attempt: usize, _requirement: &str) {
            self.failed += 1;
        }
        fn generation_succeeded(&mut self, _result: &GenerationResult) {
            self.succeeded += 1;
        }
        fn generation_exhausted(&mut self, _paper: &str, _attempts: usize, _sizes: &BucketSizes) {
            self.exhausted += 1;
        }
    }

    fn threes_profile(total: u32) -> TargetProfile {
        TargetProfile::new(
            "threes",
            "Threes",
            total,
            Vec::new(),
            vec![Requirement::new(
                "all",
                vec!["all".into()],
                Strategy::ExactRemainder,
                SumConstraint::Exact { marks: total },
            )],
        )
    }

    fn threes_pool() -> (Pool, Buckets) {
        let pool = Pool::new(
            Vec::new(),
            (0..6).map(|idx| Item::new(format!("q{idx}"), "t", 3)).collect(),
        )
        .unwrap();
        let mut buckets = Buckets::new();
        buckets.insert("all", (0..6).collect());
        (pool, buckets)
    }

    #[test]
    fn unsatisfiable_sum_exhausts_all_attempts() {
        let (pool, buckets) = threes_pool();
        let mut observer = Counting::default();
        let err = RetryOrchestrator::new(7, SearchBudget::default())
            .run(
                &threes_profile(10),
                &pool,
                &buckets,
                &mut DeterministicRng::new(1),
                &mut observer,
            )
            .unwrap_err();
        match err {
            GenerationError::Exhausted {
                attempts,
                bucket_sizes,
                ..
            } => {
                assert_eq!(attempts, 7);
                assert_eq!(bucket_sizes.get("all"), Some(6));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(observer.started, 7);
        assert_eq!(observer.failed, 7);
        assert_eq!(observer.exhausted, 1);
    }

    #[test]
    fn satisfiable_profile_succeeds_first_attempt() {
        let (pool, buckets) = threes_pool();
        let mut observer = Counting::default();
        let result = RetryOrchestrator::new(5, SearchBudget::default())
            .run(
                &threes_profile(12),
                &pool,
                &buckets,
                &mut DeterministicRng::new(9),
                &mut observer,
            )
            .unwrap();
        assert_eq!(result.stats.attempts, 1);
        assert_eq!(result.items.len(), 4);
        assert_eq!(observer.succeeded, 1);
    }

    #[test]
    fn precondition_failure_records_no_attempts() {
        let (pool, buckets) = threes_pool();
        let mut profile = threes_profile(12);
        profile.requirements[0].count = CountBound::between(7, 9);
        let mut observer = Counting::default();
        let err = RetryOrchestrator::new(5, SearchBudget::default())
            .run(
                &profile,
                &pool,
                &buckets,
                &mut DeterministicRng::new(9),
                &mut observer,
            )
            .unwrap_err();
        assert!(err.is_precondition());
        assert_eq!(observer.started, 0);
    }

    #[test]
    fn unbalanced_profile_is_a_configuration_error() {
        let (pool, buckets) = threes_pool();
        let mut profile = threes_profile(12);
        profile.total_marks = 20;
        let mut observer = Counting::default();
        let err = RetryOrchestrator::new(5, SearchBudget::default())
            .run(
                &profile,
                &pool,
                &buckets,
                &mut DeterministicRng::new(3),
                &mut observer,
            )
            .unwrap_err();
        assert!(matches!(err, GenerationError::Configuration(_)), "{err}");
        assert_eq!(observer.started, 0);
        assert_eq!(observer.exhausted, 0);
    }

    #[test]
    fn remainder_resolves_against_earlier_fills() {
        let selection = Selection::new(1);
        let profile = threes_profile(12);
        let remainder = Requirement::new(
            "rest",
            vec!["all".into()],
            Strategy::ExactRemainder,
            SumConstraint::Remainder,
        );
        assert_eq!(
            resolve_target(&remainder, &profile, &selection),
            Some(ResolvedSum::Exact(12))
        );
    }
}
