//! Per-attempt selection state and the algorithms that satisfy requirements.
//!
//! Every algorithm reads the attempt's shuffled buckets, skips items already
//! used earlier in the attempt, and returns `None` when it cannot satisfy its
//! requirement. `None` is an attempt failure, never an error.

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use crate::config::SearchBudget;
use crate::data::Pool;
use crate::errors::GenerationError;
use crate::partition::Buckets;
use crate::profile::{CountBound, Requirement, Strategy};
use crate::types::{BucketName, Marks};

/// Mutable state of one attempt.
#[derive(Clone, Debug)]
pub struct Selection {
    picks: Vec<Vec<usize>>,
    sums: Vec<Marks>,
    used: HashSet<usize>,
}

impl Selection {
    /// Fresh selection for a profile with `requirements` requirements.
    pub fn new(requirements: usize) -> Self {
        Self {
            picks: vec![Vec::new(); requirements],
            sums: vec![0; requirements],
            used: HashSet::new(),
        }
    }

    /// True when pool index `idx` was already chosen in this attempt.
    pub fn is_used(&self, idx: usize) -> bool {
        self.used.contains(&idx)
    }

    /// Indices chosen for requirement `requirement`, in answer order.
    pub fn picks(&self, requirement: usize) -> &[usize] {
        self.picks.get(requirement).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Marks chosen for requirement `requirement`.
    pub fn sum(&self, requirement: usize) -> Marks {
        self.sums.get(requirement).copied().unwrap_or(0)
    }

    /// Marks chosen across all requirements so far.
    pub fn total(&self) -> Marks {
        self.sums.iter().fold(0, |total, sum| total.saturating_add(*sum))
    }

    /// Number of requirements tracked.
    pub fn requirement_count(&self) -> usize {
        self.picks.len()
    }

    /// Record the picks for `requirement`.
    ///
    /// A pick that is already used means a strategy ignored the shared used
    /// set, which is a programming error.
    pub fn record(
        &mut self,
        requirement: usize,
        picks: Vec<usize>,
        pool: &Pool,
    ) -> Result<(), GenerationError> {
        if requirement >= self.picks.len() {
            return Err(GenerationError::InvariantViolation(format!(
                "requirement index {requirement} out of range"
            )));
        }
        for &idx in &picks {
            if !self.used.insert(idx) {
                let id = pool.get(idx).map(|item| item.id.as_str()).unwrap_or("?");
                return Err(GenerationError::InvariantViolation(format!(
                    "item '{id}' selected twice"
                )));
            }
        }
        self.sums[requirement] = picks.iter().map(|&idx| pool.marks_at(idx)).sum();
        self.picks[requirement] = picks;
        Ok(())
    }
}

/// Sum target after resolving `Remainder` against the running total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolvedSum {
    /// Sum must equal the value.
    Exact(Marks),
    /// Sum must fall in the inclusive range.
    Range {
        /// Inclusive lower bound.
        min: Marks,
        /// Inclusive upper bound.
        max: Marks,
    },
}

impl ResolvedSum {
    /// True when `sum` satisfies the target.
    pub fn accepts(&self, sum: Marks) -> bool {
        match *self {
            ResolvedSum::Exact(marks) => sum == marks,
            ResolvedSum::Range { min, max } => min <= sum && sum <= max,
        }
    }
}

/// Read-only inputs shared by strategies during one attempt.
pub struct SelectionContext<'a> {
    /// Pool for mark lookups.
    pub pool: &'a Pool,
    /// Buckets shuffled for this attempt.
    pub buckets: &'a Buckets,
    /// Items already used in this attempt.
    pub selection: &'a Selection,
    /// Node budget for subset searches.
    pub budget: SearchBudget,
}

impl SelectionContext<'_> {
    /// Unused items across `names`, bucket order then shuffled order, deduplicated.
    pub fn candidates(&self, names: &[BucketName]) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for name in names {
            for &idx in self.buckets.get(name) {
                if !self.selection.is_used(idx) && seen.insert(idx) {
                    out.push(idx);
                }
            }
        }
        out
    }

    fn marks_of(&self, indices: &[usize]) -> Vec<Marks> {
        indices.iter().map(|&idx| self.pool.marks_at(idx)).collect()
    }
}

/// Run the requirement's strategy against `target`.
pub fn select(
    requirement: &Requirement,
    target: ResolvedSum,
    ctx: &SelectionContext<'_>,
) -> Option<Vec<usize>> {
    let mut nodes = 0usize;
    match (&requirement.strategy, target) {
        (Strategy::ToleranceWindow { target, tolerance }, ResolvedSum::Range { min, max }) => {
            let candidates = ctx.candidates(&requirement.buckets);
            tolerance_fill(
                ctx.pool,
                &candidates,
                *target,
                *tolerance,
                (min, max),
                requirement.count,
            )
        }
        (Strategy::ExactRemainder, ResolvedSum::Exact(marks)) => {
            exact_remainder_fill(ctx, &requirement.buckets, marks, requirement.count)
        }
        (Strategy::FixedCountSearch { counts }, ResolvedSum::Exact(marks)) => {
            let candidates = ctx.candidates(&requirement.buckets);
            fixed_count_search(ctx, &candidates, counts, marks, &mut nodes)
        }
        (Strategy::PreferredFirst { preferred, counts }, ResolvedSum::Exact(marks)) => {
            preferred_first(ctx, preferred, &requirement.buckets, counts, marks, &mut nodes)
        }
        (strategy, target) => {
            debug!(
                requirement = %requirement.name,
                strategy = strategy.label(),
                ?target,
                "strategy cannot serve resolved sum target"
            );
            None
        }
    }
}

/// Accumulate candidates below `max`, stopping once within `tolerance` of `target`.
pub fn tolerance_fill(
    pool: &Pool,
    candidates: &[usize],
    target: Marks,
    tolerance: Marks,
    (min, max): (Marks, Marks),
    count: CountBound,
) -> Option<Vec<usize>> {
    let mut picked = Vec::new();
    let mut sum: Marks = 0;
    for &idx in candidates {
        if picked.len() >= count.max {
            break;
        }
        let Some(next) = sum.checked_add(pool.marks_at(idx)).filter(|next| *next <= max) else {
            continue;
        };
        picked.push(idx);
        sum = next;
        if sum.abs_diff(target) <= tolerance && picked.len() >= count.min {
            break;
        }
    }
    (min <= sum && sum <= max && count.contains(picked.len())).then_some(picked)
}

/// Greedy exact fill over mark denominations in bucket priority order.
///
/// An exact-gap match always wins; otherwise the first denomination that
/// leaves a gap the remaining denominations can still close is taken.
pub fn exact_remainder_fill(
    ctx: &SelectionContext<'_>,
    denominations: &[BucketName],
    target: Marks,
    count: CountBound,
) -> Option<Vec<usize>> {
    let mut queues: Vec<(Marks, VecDeque<usize>)> = Vec::new();
    for idx in ctx.candidates(denominations) {
        let marks = ctx.pool.marks_at(idx);
        if marks == 0 {
            continue;
        }
        match queues.iter_mut().find(|(value, _)| *value == marks) {
            Some((_, queue)) => queue.push_back(idx),
            None => queues.push((marks, VecDeque::from([idx]))),
        }
    }

    let mut picked = Vec::new();
    let mut remaining = target;
    while remaining > 0 {
        if picked.len() >= count.max {
            return None;
        }
        let exact = queues
            .iter()
            .position(|(marks, queue)| *marks == remaining && !queue.is_empty());
        let choice = exact.or_else(|| {
            queues.iter().enumerate().position(|(pos, (marks, queue))| {
                !queue.is_empty()
                    && *marks <= remaining
                    && gap_closable(&queues, pos, remaining - marks)
            })
        })?;
        let (marks, queue) = &mut queues[choice];
        let idx = queue.pop_front()?;
        picked.push(idx);
        remaining -= *marks;
    }
    count.contains(picked.len()).then_some(picked)
}

fn gap_closable(queues: &[(Marks, VecDeque<usize>)], taking: usize, gap: Marks) -> bool {
    if gap == 0 {
        return true;
    }
    let mut divisor: Marks = 0;
    let mut smallest = Marks::MAX;
    let mut available: u64 = 0;
    for (pos, (marks, queue)) in queues.iter().enumerate() {
        let left = if pos == taking {
            queue.len().saturating_sub(1)
        } else {
            queue.len()
        };
        if left == 0 {
            continue;
        }
        divisor = gcd(divisor, *marks);
        smallest = smallest.min(*marks);
        available += u64::from(*marks) * left as u64;
    }
    divisor > 0 && gap % divisor == 0 && gap >= smallest && available >= u64::from(gap)
}

fn gcd(a: Marks, b: Marks) -> Marks {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// Try each `k` in `counts` with the exhaustive subset search.
pub fn fixed_count_search(
    ctx: &SelectionContext<'_>,
    candidates: &[usize],
    counts: &[usize],
    target: Marks,
    nodes: &mut usize,
) -> Option<Vec<usize>> {
    let marks = ctx.marks_of(candidates);
    for &k in counts {
        match search_exact(&marks, k, target, nodes, ctx.budget.max_nodes) {
            SearchOutcome::Found(positions) => {
                return Some(positions.into_iter().map(|pos| candidates[pos]).collect());
            }
            SearchOutcome::NotFound => continue,
            SearchOutcome::BudgetExceeded => {
                debug!(k, target, nodes = *nodes, "subset search budget exhausted");
                return None;
            }
        }
    }
    None
}

/// First slot from `preferred` when any preferred item is unused, the rest by search.
///
/// Preferred items outside the `fallback` buckets are ignored, so a preferred
/// bucket can only reorder the requirement's own candidates.
pub fn preferred_first(
    ctx: &SelectionContext<'_>,
    preferred: &[BucketName],
    fallback: &[BucketName],
    counts: &[usize],
    target: Marks,
    nodes: &mut usize,
) -> Option<Vec<usize>> {
    let fallback_candidates = ctx.candidates(fallback);
    let preferred_candidates: Vec<usize> = ctx
        .candidates(preferred)
        .into_iter()
        .filter(|idx| fallback_candidates.contains(idx))
        .collect();
    if preferred_candidates.is_empty() {
        return fixed_count_search(ctx, &fallback_candidates, counts, target, nodes);
    }
    for &first in &preferred_candidates {
        let first_marks = ctx.pool.marks_at(first);
        if first_marks > target {
            continue;
        }
        let rest: Vec<usize> = fallback_candidates
            .iter()
            .copied()
            .filter(|&idx| idx != first)
            .collect();
        let rest_counts: Vec<usize> = counts
            .iter()
            .filter(|&&k| k > 0)
            .map(|&k| k - 1)
            .collect();
        let marks = ctx.marks_of(&rest);
        for &k in &rest_counts {
            match search_exact(&marks, k, target - first_marks, nodes, ctx.budget.max_nodes) {
                SearchOutcome::Found(positions) => {
                    let mut picked = Vec::with_capacity(positions.len() + 1);
                    picked.push(first);
                    picked.extend(positions.into_iter().map(|pos| rest[pos]));
                    return Some(picked);
                }
                SearchOutcome::NotFound => continue,
                SearchOutcome::BudgetExceeded => {
                    debug!(k, target, nodes = *nodes, "preferred search budget exhausted");
                    return None;
                }
            }
        }
    }
    None
}

#[derive(Debug, PartialEq, Eq)]
enum SearchOutcome {
    Found(Vec<usize>),
    NotFound,
    BudgetExceeded,
}

struct Frame {
    next: usize,
    sum: Marks,
}

/// Depth-first search for exactly `k` positions of `marks` summing to `target`.
///
/// `stack.len() == chosen.len() + 1` holds throughout: each frame holds the
/// next position to try at its depth and the sum of the positions above it.
fn search_exact(
    marks: &[Marks],
    k: usize,
    target: Marks,
    nodes: &mut usize,
    max_nodes: usize,
) -> SearchOutcome {
    if k == 0 {
        return if target == 0 {
            SearchOutcome::Found(Vec::new())
        } else {
            SearchOutcome::NotFound
        };
    }
    let n = marks.len();
    if n < k {
        return SearchOutcome::NotFound;
    }
    let mut chosen: Vec<usize> = Vec::with_capacity(k);
    let mut stack = vec![Frame { next: 0, sum: 0 }];
    while let Some(frame) = stack.last_mut() {
        let still_needed = k - chosen.len();
        if frame.next + still_needed > n {
            stack.pop();
            chosen.pop();
            continue;
        }
        let pos = frame.next;
        frame.next += 1;
        *nodes += 1;
        if *nodes > max_nodes {
            return SearchOutcome::BudgetExceeded;
        }
        // an overflowing sum is past any target
        let Some(sum) = frame.sum.checked_add(marks[pos]) else {
            continue;
        };
        if still_needed == 1 {
            if sum == target {
                chosen.push(pos);
                return SearchOutcome::Found(chosen);
            }
            continue;
        }
        // partial sets at or above the target can never take another item
        if sum >= target {
            continue;
        }
        chosen.push(pos);
        stack.push(Frame { next: pos + 1, sum });
    }
    SearchOutcome::NotFound
}
