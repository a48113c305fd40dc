use std::fmt;
use std::io;

use thiserror::Error;

use crate::types::{BucketName, ItemId, PaperId};

/// Error type for paper resolution, pool loading, and selection failures.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("unknown paper '{0}'")]
    UnknownPaper(PaperId),
    #[error("no topics supplied for paper '{0}'")]
    NoTopics(PaperId),
    #[error("question pool for paper '{0}' is empty")]
    EmptyPool(PaperId),
    #[error("requirement '{requirement}' cannot be met by the pool: {reason}")]
    InsufficientPool { requirement: String, reason: String },
    #[error("paper '{paper}' could not be generated after {attempts} attempts (bucket sizes: {bucket_sizes})")]
    Exhausted {
        paper: PaperId,
        attempts: usize,
        bucket_sizes: BucketSizes,
    },
    #[error("selection invariant violated: {0}")]
    InvariantViolation(String),
    #[error("item source '{source_id}' is unavailable: {reason}")]
    SourceUnavailable { source_id: String, reason: String },
    #[error("item source '{source_id}' returned inconsistent state: {details}")]
    SourceInconsistent { source_id: String, details: String },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl GenerationError {
    /// True for failures detected before any selection attempt.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            GenerationError::UnknownPaper(_)
                | GenerationError::NoTopics(_)
                | GenerationError::EmptyPool(_)
                | GenerationError::InsufficientPool { .. }
        )
    }

    pub(crate) fn duplicate_item(source_id: &str, id: &ItemId) -> Self {
        GenerationError::SourceInconsistent {
            source_id: source_id.to_string(),
            details: format!("duplicate item id '{id}'"),
        }
    }
}

/// Observed bucket sizes carried by exhaustion failures for diagnosis.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BucketSizes(pub Vec<(BucketName, usize)>);

impl BucketSizes {
    /// Size recorded for `bucket`, if it was observed.
    pub fn get(&self, bucket: &str) -> Option<usize> {
        self.0
            .iter()
            .find(|(name, _)| name == bucket)
            .map(|(_, size)| *size)
    }
}

impl fmt::Display for BucketSizes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "none");
        }
        for (idx, (name, size)) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={size}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_sizes_display_lists_every_bucket() {
        let sizes = BucketSizes(vec![("nested".into(), 3), ("standalone".into(), 0)]);
        assert_eq!(sizes.to_string(), "nested=3, standalone=0");
        assert_eq!(sizes.get("standalone"), Some(0));
        assert_eq!(sizes.get("missing"), None);
        assert_eq!(BucketSizes::default().to_string(), "none");
    }

    #[test]
    fn precondition_classification_excludes_exhaustion() {
        assert!(GenerationError::UnknownPaper("x".into()).is_precondition());
        assert!(
            GenerationError::InsufficientPool {
                requirement: "r".into(),
                reason: "too small".into(),
            }
            .is_precondition()
        );
        let exhausted = GenerationError::Exhausted {
            paper: "p".into(),
            attempts: 3,
            bucket_sizes: BucketSizes::default(),
        };
        assert!(!exhausted.is_precondition());
        assert!(exhausted.to_string().contains("after 3 attempts"));
    }
}
