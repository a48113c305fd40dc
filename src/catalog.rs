//! Built-in paper profiles and JSON-loaded custom profiles.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use crate::constants::buckets::{self, HINTED, NESTED};
use crate::constants::papers::*;
use crate::constants::tags::*;
use crate::errors::GenerationError;
use crate::partition::PartitionKey;
use crate::profile::{CountBound, Requirement, Strategy, SumConstraint, TargetProfile};
use crate::types::{BucketName, Marks, PaperId};

/// Registry of target profiles keyed by paper id.
#[derive(Clone, Debug)]
pub struct ProfileCatalog {
    profiles: IndexMap<PaperId, TargetProfile>,
}

impl Default for ProfileCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProfileCatalog {
    /// Catalog without any profile.
    pub fn empty() -> Self {
        Self {
            profiles: IndexMap::new(),
        }
    }

    /// Catalog holding every built-in paper.
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        for profile in [
            two_phase(BIOLOGY_1, "Biology Paper 1", 40, 3, (35, 45), &[5, 4, 3, 2, 1]),
            two_phase(CHEMISTRY_1, "Chemistry Paper 1", 50, 5, (42, 58), &[3, 2, 1, 4]),
            chemistry_2(),
            mathematics(MATHEMATICS_1, "Mathematics Paper 1"),
            mathematics(MATHEMATICS_2, "Mathematics Paper 2"),
            english_1(),
            english_2(),
            english_3(),
            geography(GEOGRAPHY_1, "Geography Paper 1", true),
            geography(GEOGRAPHY_2, "Geography Paper 2", false),
        ] {
            catalog.profiles.insert(profile.id.to_string(), profile);
        }
        catalog
    }

    /// Validate and register `profile`, returning any profile it replaced.
    pub fn insert(
        &mut self,
        profile: TargetProfile,
    ) -> Result<Option<TargetProfile>, GenerationError> {
        profile.validate()?;
        Ok(self.profiles.insert(profile.id.to_string(), profile))
    }

    /// Profile for `paper`.
    pub fn get(&self, paper: &str) -> Result<&TargetProfile, GenerationError> {
        self.profiles
            .get(paper)
            .ok_or_else(|| GenerationError::UnknownPaper(paper.to_string()))
    }

    /// Registered paper ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Number of registered profiles.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// True when no profile is registered.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Register the profiles in a JSON file holding one profile or an array.
    ///
    /// Returns the number of profiles loaded. Nothing is registered when any
    /// profile in the file is invalid.
    pub fn load_json_file(&mut self, path: impl AsRef<Path>) -> Result<usize, GenerationError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        let profiles: Vec<TargetProfile> = if value.is_array() {
            serde_json::from_value(value)?
        } else {
            vec![serde_json::from_value(value)?]
        };
        for profile in &profiles {
            profile.validate()?;
        }
        let loaded = profiles.len();
        for profile in profiles {
            debug!(paper = %profile.id, path = %path.display(), "registered profile");
            self.profiles.insert(profile.id.to_string(), profile);
        }
        Ok(loaded)
    }
}

fn single(name: &'static str, bucket: BucketName, marks: Marks) -> Requirement {
    Requirement::new(
        name,
        vec![bucket],
        Strategy::FixedCountSearch { counts: vec![1] },
        SumConstraint::Exact { marks },
    )
    .with_count(CountBound::exactly(1))
}

fn several(
    name: &'static str,
    bucket: BucketName,
    (min, max): (usize, usize),
    marks: Marks,
) -> Requirement {
    Requirement::new(
        name,
        vec![bucket],
        Strategy::FixedCountSearch {
            counts: (min..=max).collect(),
        },
        SumConstraint::Exact { marks },
    )
    .with_count(CountBound::between(min, max))
}

/// Nested questions near a target, then standalone questions for the exact remainder.
fn two_phase(
    id: &'static str,
    title: &'static str,
    nested_target: Marks,
    tolerance: Marks,
    (min, max): (Marks, Marks),
    denominations: &[Marks],
) -> TargetProfile {
    TargetProfile::new(
        id,
        title,
        80,
        vec![PartitionKey::Nested, PartitionKey::StandaloneMarks],
        vec![
            Requirement::new(
                "nested",
                vec![NESTED.to_string()],
                Strategy::ToleranceWindow {
                    target: nested_target,
                    tolerance,
                },
                SumConstraint::Range { min, max },
            ),
            Requirement::new(
                "standalone",
                denominations
                    .iter()
                    .map(|marks| buckets::standalone_marks(*marks))
                    .collect(),
                Strategy::ExactRemainder,
                SumConstraint::Remainder,
            )
            .with_fill_priority(1),
        ],
    )
}

fn chemistry_2() -> TargetProfile {
    let label = "long-answer";
    TargetProfile::new(
        CHEMISTRY_2,
        "Chemistry Paper 2",
        80,
        vec![PartitionKey::MarkRange {
            label: label.to_string(),
            min: 10,
            max: 13,
        }],
        vec![
            Requirement::new(
                "long-answer",
                vec![label.to_string()],
                Strategy::FixedCountSearch {
                    counts: vec![7, 6, 8],
                },
                SumConstraint::Exact { marks: 80 },
            )
            .with_count(CountBound::between(6, 8)),
        ],
    )
}

fn mathematics(id: &'static str, title: &'static str) -> TargetProfile {
    TargetProfile::new(
        id,
        title,
        130,
        vec![PartitionKey::Section],
        vec![
            several("section-i", buckets::section(SECTION_I), (16, 16), 50),
            several("section-ii", buckets::section(SECTION_II), (8, 8), 80),
        ],
    )
}

fn english_1() -> TargetProfile {
    TargetProfile::new(
        ENGLISH_1,
        "English Paper 1",
        60,
        vec![PartitionKey::Kind],
        vec![
            single("functional-writing", buckets::kind(KIND_FUNCTIONAL), 20),
            single("cloze", buckets::kind(KIND_CLOZE), 10),
            several("oral-skills", buckets::kind(KIND_ORAL), (3, 6), 30),
        ],
    )
}

fn english_2() -> TargetProfile {
    TargetProfile::new(
        ENGLISH_2,
        "English Paper 2",
        80,
        vec![PartitionKey::Kind],
        vec![
            single("comprehension", buckets::kind(KIND_COMPREHENSION), 20),
            single("literary-excerpt", buckets::kind(KIND_EXCERPT), 25),
            single("poem", buckets::kind(KIND_POEM), 20),
            several("grammar", buckets::kind(KIND_GRAMMAR), (3, 8), 15),
        ],
    )
}

/// Set-text essays named in the request hints take the compulsory slot.
fn english_3() -> TargetProfile {
    TargetProfile::new(
        ENGLISH_3,
        "English Paper 3",
        60,
        vec![PartitionKey::Kind],
        vec![
            single("composition", buckets::kind(KIND_COMPOSITION), 20).with_fill_priority(1),
            Requirement::new(
                "compulsory-essay",
                vec![buckets::kind(KIND_COMPULSORY_ESSAY)],
                Strategy::PreferredFirst {
                    preferred: vec![HINTED.to_string()],
                    counts: vec![1],
                },
                SumConstraint::Exact { marks: 20 },
            )
            .with_count(CountBound::exactly(1)),
            single("optional-essay", buckets::kind(KIND_OPTIONAL_ESSAY), 20).with_fill_priority(1),
        ],
    )
}

fn geography(id: &'static str, title: &'static str, map_first: bool) -> TargetProfile {
    let section_b = buckets::section(SECTION_B);
    let strategy = if map_first {
        Strategy::PreferredFirst {
            preferred: vec![buckets::section_kind(SECTION_B, KIND_MAP)],
            counts: vec![5],
        }
    } else {
        Strategy::FixedCountSearch { counts: vec![5] }
    };
    TargetProfile::new(
        id,
        title,
        150,
        vec![PartitionKey::Section, PartitionKey::SectionKind],
        vec![
            several("section-a", buckets::section(SECTION_A), (4, 6), 25),
            Requirement::new(
                "section-b",
                vec![section_b],
                strategy,
                SumConstraint::Exact { marks: 125 },
            )
            .with_count(CountBound::exactly(5)),
        ],
    )
}
