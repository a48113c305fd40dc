//! Pool partitioning into named buckets and eager pool validation.

use std::collections::HashSet;

use indexmap::IndexMap;
use rand::RngCore;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::constants::buckets;
use crate::data::{Item, Pool};
use crate::errors::{BucketSizes, GenerationError};
use crate::profile::{Requirement, Strategy, SumConstraint, TargetProfile};
use crate::types::{BucketName, ItemId, Marks};

/// Categorical key mapping an item to at most one bucket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PartitionKey {
    /// `nested` or `standalone`.
    Nested,
    /// `marks:N` for every item.
    Marks,
    /// `standalone:marks:N` for standalone items only.
    StandaloneMarks,
    /// `nested:marks:N` for nested items only.
    NestedMarks,
    /// `section:S` for items carrying a section tag.
    Section,
    /// `kind:K` for items carrying a question type.
    Kind,
    /// `section:S:kind:K` for items carrying both tags.
    SectionKind,
    /// `label` for items whose marks fall in `[min, max]`.
    MarkRange {
        /// Bucket name produced for matching items.
        label: BucketName,
        /// Inclusive lower mark bound.
        min: Marks,
        /// Inclusive upper mark bound.
        max: Marks,
    },
}

impl PartitionKey {
    /// Bucket this key assigns `item` to, if any.
    pub fn bucket_for(&self, item: &Item) -> Option<BucketName> {
        match self {
            PartitionKey::Nested => Some(if item.nested {
                buckets::NESTED.to_string()
            } else {
                buckets::STANDALONE.to_string()
            }),
            PartitionKey::Marks => Some(buckets::marks(item.marks)),
            PartitionKey::StandaloneMarks => {
                (!item.nested).then(|| buckets::standalone_marks(item.marks))
            }
            PartitionKey::NestedMarks => item.nested.then(|| buckets::nested_marks(item.marks)),
            PartitionKey::Section => item.section.as_deref().map(buckets::section),
            PartitionKey::Kind => item.kind.as_deref().map(buckets::kind),
            PartitionKey::SectionKind => match (item.section.as_deref(), item.kind.as_deref()) {
                (Some(section), Some(kind)) => Some(buckets::section_kind(section, kind)),
                _ => None,
            },
            PartitionKey::MarkRange { label, min, max } => {
                (*min <= item.marks && item.marks <= *max).then(|| label.clone())
            }
        }
    }
}

/// Named views (pool indices) over a pool.
///
/// Buckets from different keys may overlap; callers track used indices
/// across all views.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Buckets {
    buckets: IndexMap<BucketName, Vec<usize>>,
}

impl Buckets {
    /// Empty bucket set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append pool index `idx` to bucket `name`, creating it if needed.
    pub fn push(&mut self, name: impl Into<BucketName>, idx: usize) {
        self.buckets.entry(name.into()).or_default().push(idx);
    }

    /// Replace bucket `name` with `indices`.
    pub fn insert(&mut self, name: impl Into<BucketName>, indices: Vec<usize>) {
        self.buckets.insert(name.into(), indices);
    }

    /// Indices in bucket `name`; missing buckets are empty.
    pub fn get(&self, name: &str) -> &[usize] {
        self.buckets.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Bucket names in creation order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// True when no bucket exists.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Size of every bucket in creation order.
    pub fn sizes(&self) -> BucketSizes {
        BucketSizes(
            self.buckets
                .iter()
                .map(|(name, indices)| (name.clone(), indices.len()))
                .collect(),
        )
    }

    /// Copy of these buckets with each bucket independently shuffled.
    pub fn shuffled<R: RngCore + ?Sized>(&self, rng: &mut R) -> Buckets {
        let mut copy = self.clone();
        for indices in copy.buckets.values_mut() {
            indices.shuffle(rng);
        }
        copy
    }
}

/// Capacity of one requirement's buckets as observed during validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RequirementCapacity {
    /// Requirement name.
    pub requirement: String,
    /// Distinct items reachable through the requirement's buckets.
    pub available: usize,
    /// Sum of marks across those items.
    pub available_marks: Marks,
    /// Fewest items any strategy attempt could use.
    pub required: usize,
}

/// Outcome of the eager pool validation step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PoolReport {
    /// Profile id the pool was validated against.
    pub paper: String,
    /// Number of items in the pool.
    pub pool_size: usize,
    /// Observed bucket sizes.
    #[serde(serialize_with = "serialize_sizes")]
    pub bucket_sizes: BucketSizes,
    /// Per-requirement capacity.
    pub requirements: Vec<RequirementCapacity>,
}

fn serialize_sizes<S: serde::Serializer>(sizes: &BucketSizes, ser: S) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeMap;
    let mut map = ser.serialize_map(Some(sizes.0.len()))?;
    for (name, size) in &sizes.0 {
        map.serialize_entry(name, size)?;
    }
    map.end()
}

/// Splits pools into buckets and checks them against a profile.
pub struct PoolPartitioner;

impl PoolPartitioner {
    /// Partition `pool` with every key in `keys`.
    ///
    /// Items named in `hinted` are additionally collected, in hint order, into
    /// the `hinted` bucket. Buckets preserve pool order.
    pub fn partition(pool: &Pool, keys: &[PartitionKey], hinted: &[ItemId]) -> Buckets {
        let mut out = Buckets::new();
        for key in keys {
            for (idx, item) in pool.items().iter().enumerate() {
                if let Some(name) = key.bucket_for(item) {
                    out.push(name, idx);
                }
            }
        }
        if !hinted.is_empty() {
            let mut hinted_indices = Vec::new();
            for id in hinted {
                if let Some(idx) = pool.items().iter().position(|item| &item.id == id)
                    && !hinted_indices.contains(&idx)
                {
                    hinted_indices.push(idx);
                }
            }
            out.insert(buckets::HINTED, hinted_indices);
        }
        out
    }

    /// Check that every requirement can possibly be met before any attempt.
    pub fn validate(
        pool: &Pool,
        buckets: &Buckets,
        profile: &TargetProfile,
    ) -> Result<PoolReport, GenerationError> {
        if pool.is_empty() {
            return Err(GenerationError::EmptyPool(profile.id.to_string()));
        }
        let mut requirements = Vec::with_capacity(profile.requirements.len());
        for requirement in &profile.requirements {
            let capacity = requirement_capacity(pool, buckets, requirement);
            if capacity.available < capacity.required {
                return Err(GenerationError::InsufficientPool {
                    requirement: requirement.name.to_string(),
                    reason: format!(
                        "needs at least {} items but buckets [{}] hold {}",
                        capacity.required,
                        requirement.buckets.join(", "),
                        capacity.available
                    ),
                });
            }
            let needed_marks = match requirement.sum {
                SumConstraint::Exact { marks } => Some(marks),
                SumConstraint::Range { min, .. } => Some(min),
                SumConstraint::Remainder => None,
            };
            if let Some(needed) = needed_marks
                && capacity.available_marks < needed
            {
                return Err(GenerationError::InsufficientPool {
                    requirement: requirement.name.to_string(),
                    reason: format!(
                        "needs {needed} marks but buckets [{}] hold {}",
                        requirement.buckets.join(", "),
                        capacity.available_marks
                    ),
                });
            }
            requirements.push(capacity);
        }
        Ok(PoolReport {
            paper: profile.id.to_string(),
            pool_size: pool.len(),
            bucket_sizes: buckets.sizes(),
            requirements,
        })
    }
}

fn requirement_capacity(
    pool: &Pool,
    buckets: &Buckets,
    requirement: &Requirement,
) -> RequirementCapacity {
    let mut seen = HashSet::new();
    let mut available_marks: Marks = 0;
    for name in &requirement.buckets {
        for &idx in buckets.get(name) {
            if seen.insert(idx) {
                available_marks = available_marks.saturating_add(pool.marks_at(idx));
            }
        }
    }
    let smallest_count = match &requirement.strategy {
        Strategy::FixedCountSearch { counts } | Strategy::PreferredFirst { counts, .. } => {
            counts.iter().copied().min().unwrap_or(0)
        }
        _ => 0,
    };
    RequirementCapacity {
        requirement: requirement.name.to_string(),
        available: seen.len(),
        available_marks,
        required: requirement.count.min.max(smallest_count),
    }
}
