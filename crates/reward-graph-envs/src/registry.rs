//! Reward configuration registry
//!
//! An explicit name -> builder lookup table assembled at startup. Nothing
//! here is global: callers construct a registry, register what they need
//! (or take [`default_registry`](crate::default_registry)) and pass it
//! around.

use std::collections::HashMap;

use reward_graph_core::{ConfigurationError, GraphRewardEvaluator, ValidationError};
use tracing::info;

use crate::params::EnvParams;

/// Errors from registry lookup and reward construction.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no reward configuration registered under {0:?}")]
    UnknownReward(String),

    #[error("missing required environment parameter {0:?}")]
    MissingParam(String),

    #[error("no reward topology for task {0:?}")]
    UnknownTask(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Builds an evaluator from environment parameters.
pub type RewardBuilder =
    Box<dyn Fn(&EnvParams) -> Result<GraphRewardEvaluator, RegistryError> + Send + Sync>;

/// Name -> builder table of reward configurations.
pub struct RewardRegistry {
    builders: HashMap<String, RewardBuilder>,
}

impl RewardRegistry {
    pub fn new() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Register a builder under a name. First registration wins, so a
    /// caller can shadow-proof its own entries before adding defaults.
    pub fn register(&mut self, name: impl Into<String>, builder: RewardBuilder) {
        let name = name.into();
        if !self.builders.contains_key(&name) {
            info!(%name, "registered reward configuration");
            self.builders.insert(name, builder);
        }
    }

    /// Build the named evaluator for the given parameters.
    pub fn build(
        &self,
        name: &str,
        params: &EnvParams,
    ) -> Result<GraphRewardEvaluator, RegistryError> {
        let builder = self
            .builders
            .get(name)
            .ok_or_else(|| RegistryError::UnknownReward(name.to_string()))?;
        builder(params)
    }

    /// Registered configuration names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }
}

impl Default for RewardRegistry {
    fn default() -> Self {
        Self::new()
    }
}
