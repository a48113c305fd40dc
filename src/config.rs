use serde::{Deserialize, Serialize};

use crate::constants::generator::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_SEARCH_MAX_NODES, DEFAULT_SEED,
};

/// Bounds applied to the exhaustive fixed-count subset search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBudget {
    /// Max candidate extensions explored per requirement per attempt.
    ///
    /// Exceeding the budget fails the current attempt only; the orchestrator
    /// reshuffles and tries again.
    pub max_nodes: usize,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_nodes: DEFAULT_SEARCH_MAX_NODES,
        }
    }
}

/// Top-level generator configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// RNG seed that controls deterministic bucket shuffles.
    pub seed: u64,
    /// Number of full attempts before generation is declared exhausted.
    pub max_attempts: usize,
    /// Bounds for the backtracking subset search.
    pub search: SearchBudget,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            search: SearchBudget::default(),
        }
    }
}
