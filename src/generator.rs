//! In-process entry point tying sources, profiles, and the attempt loop together.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assembler::GenerationResult;
use crate::catalog::ProfileCatalog;
use crate::config::GeneratorConfig;
use crate::data::Pool;
use crate::errors::GenerationError;
use crate::hash::call_seed;
use crate::orchestrator::{GenerationObserver, RetryOrchestrator, TracingObserver};
use crate::partition::{Buckets, PoolPartitioner, PoolReport};
use crate::profile::TargetProfile;
use crate::rng::DeterministicRng;
use crate::source::ItemSource;
use crate::types::{ItemId, PaperId, TopicId};

/// Caller preferences that steer, but never break, selection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionHints {
    /// Items collected into the `hinted` bucket, in preference order.
    #[serde(default)]
    pub preferred_items: Vec<ItemId>,
}

/// One paper generation request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Paper id resolved through the catalog.
    pub paper: PaperId,
    /// Topics scoping the pool; must not be empty.
    pub topics: Vec<TopicId>,
    /// Optional selection hints.
    #[serde(default)]
    pub hints: SelectionHints,
}

impl GenerationRequest {
    /// Request for `paper` over `topics` without hints.
    pub fn new(paper: impl Into<PaperId>, topics: Vec<TopicId>) -> Self {
        Self {
            paper: paper.into(),
            topics,
            hints: SelectionHints::default(),
        }
    }

    /// Set the preferred item ids.
    pub fn with_preferred_items(mut self, items: Vec<ItemId>) -> Self {
        self.hints.preferred_items = items;
        self
    }
}

/// Generates papers from a catalog of profiles.
///
/// The generator owns one seeded RNG stream; each call derives its own RNG
/// from that stream and the paper id, so a fixed seed and call sequence
/// always yields the same papers.
pub struct PaperGenerator {
    config: GeneratorConfig,
    catalog: ProfileCatalog,
    rng: DeterministicRng,
}

impl PaperGenerator {
    /// Generator over the built-in catalog.
    pub fn new(config: GeneratorConfig) -> Self {
        Self::with_catalog(config, ProfileCatalog::builtin())
    }

    /// Generator over a caller-supplied catalog.
    pub fn with_catalog(config: GeneratorConfig, catalog: ProfileCatalog) -> Self {
        let rng = DeterministicRng::new(config.seed);
        Self {
            config,
            catalog,
            rng,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Profiles this generator resolves paper ids against.
    pub fn catalog(&self) -> &ProfileCatalog {
        &self.catalog
    }

    /// Mutable catalog access for registering custom profiles.
    pub fn catalog_mut(&mut self) -> &mut ProfileCatalog {
        &mut self.catalog
    }

    /// Generate a paper, logging attempt events through `tracing`.
    pub fn generate(
        &mut self,
        request: &GenerationRequest,
        source: &dyn ItemSource,
    ) -> Result<GenerationResult, GenerationError> {
        self.generate_with_observer(request, source, &mut TracingObserver)
    }

    /// Generate a paper, reporting attempt events to `observer`.
    pub fn generate_with_observer(
        &mut self,
        request: &GenerationRequest,
        source: &dyn ItemSource,
        observer: &mut dyn GenerationObserver,
    ) -> Result<GenerationResult, GenerationError> {
        let seed = call_seed(self.rng.next_u64(), &request.paper);
        let (profile, pool, buckets) = self.prepare(request, source)?;
        let mut rng = DeterministicRng::new(seed);
        RetryOrchestrator::new(self.config.max_attempts, self.config.search).run(
            profile,
            &pool,
            &buckets,
            &mut rng,
            observer,
        )
    }

    /// Run only the precondition checks and report bucket capacity.
    pub fn validate_pool(
        &self,
        request: &GenerationRequest,
        source: &dyn ItemSource,
    ) -> Result<PoolReport, GenerationError> {
        let (profile, pool, buckets) = self.prepare(request, source)?;
        PoolPartitioner::validate(&pool, &buckets, profile)
    }

    fn prepare(
        &self,
        request: &GenerationRequest,
        source: &dyn ItemSource,
    ) -> Result<(&TargetProfile, Pool, Buckets), GenerationError> {
        let profile = self.catalog.get(&request.paper)?;
        if request.topics.is_empty() {
            return Err(GenerationError::NoTopics(request.paper.clone()));
        }
        let items = source.load_items(&request.topics)?;
        let pool = Pool::new(request.topics.clone(), items)?;
        let buckets = PoolPartitioner::partition(
            &pool,
            &profile.partition,
            &request.hints.preferred_items,
        );
        debug!(
            paper = %request.paper,
            source = source.id(),
            pool = pool.len(),
            buckets = buckets.len(),
            "prepared pool"
        );
        Ok((profile, pool, buckets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::papers::CHEMISTRY_2;
    use crate::data::Item;
    use crate::source::InMemoryItemSource;

    fn chemistry_source() -> InMemoryItemSource {
        let marks = [10, 11, 11, 12, 13, 13, 10, 10, 12];
        InMemoryItemSource::new(
            "mem",
            marks
                .iter()
                .enumerate()
                .map(|(idx, m)| Item::new(format!("c{idx}"), "chem", *m))
                .collect(),
        )
    }

    #[test]
    fn unknown_paper_and_missing_topics_fail_early() {
        let mut generator = PaperGenerator::new(GeneratorConfig::default());
        let source = chemistry_source();
        let err = generator
            .generate(&GenerationRequest::new("latin-1", vec!["chem".into()]), &source)
            .unwrap_err();
        assert!(matches!(err, GenerationError::UnknownPaper(_)));
        let err = generator
            .generate(&GenerationRequest::new(CHEMISTRY_2, Vec::new()), &source)
            .unwrap_err();
        assert!(matches!(err, GenerationError::NoTopics(_)));
    }

    #[test]
    fn generates_valid_paper() {
        let mut generator = PaperGenerator::new(GeneratorConfig::default());
        let result = generator
            .generate(
                &GenerationRequest::new(CHEMISTRY_2, vec!["chem".into()]),
                &chemistry_source(),
            )
            .unwrap();
        assert!(result.is_valid());
        assert_eq!(result.stats.total_marks, 80);
        assert!((6..=8).contains(&result.items.len()));
    }

    #[test]
    fn validate_pool_reports_without_attempting() {
        let generator = PaperGenerator::new(GeneratorConfig::default());
        let report = generator
            .validate_pool(
                &GenerationRequest::new(CHEMISTRY_2, vec!["chem".into()]),
                &chemistry_source(),
            )
            .unwrap();
        assert_eq!(report.pool_size, 9);
        assert_eq!(report.requirements[0].available, 9);
    }
}
