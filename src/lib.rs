#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Clap-based runners shared by the demo binaries.
pub mod apps;
/// Result construction and invariant checks.
pub mod assembler;
/// Built-in and JSON-loaded paper profiles.
pub mod catalog;
/// Generator configuration types.
pub mod config;
/// Centralized constants for buckets, papers, tags, and defaults.
pub mod constants;
/// Item and pool types.
pub mod data;
/// Paper generation entry point.
pub mod generator;
mod hash;
/// Search-space estimation helpers.
pub mod heuristics;
/// Aggregate metrics over generated papers.
pub mod metrics;
/// Retry loop and attempt observers.
pub mod orchestrator;
/// Pool partitioning and precondition checks.
pub mod partition;
/// Declarative target profiles.
pub mod profile;
/// Deterministic random number generation.
pub mod rng;
/// Item sources.
pub mod source;
/// Selection strategies and per-attempt state.
pub mod strategy;
/// Shared type aliases.
pub mod types;

mod errors;

pub use assembler::{
    GenerationResult, GenerationStats, NumberedItem, RequirementReport, ResultAssembler,
    ValidationReport,
};
pub use catalog::ProfileCatalog;
pub use config::{GeneratorConfig, SearchBudget};
pub use data::{Item, Pool};
pub use errors::{BucketSizes, GenerationError};
pub use generator::{GenerationRequest, PaperGenerator, SelectionHints};
pub use orchestrator::{GenerationObserver, NoopObserver, RetryOrchestrator, TracingObserver};
pub use partition::{Buckets, PartitionKey, PoolPartitioner, PoolReport, RequirementCapacity};
pub use profile::{CountBound, Requirement, Strategy, SumConstraint, TargetProfile};
pub use rng::DeterministicRng;
pub use source::{FileItemSource, InMemoryItemSource, ItemSource};
pub use types::{BucketName, ItemId, Marks, PaperId, TagValue, TopicId};
