//! Environment parameter set loaded at startup

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::registry::RegistryError;

/// Named numeric parameters of an environment plus an optional task
/// variant. Loaded from JSON by the CLI and handed to reward builders;
/// builders fail fast on anything missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvParams {
    /// Task variant selector (e.g. `fixed_height` vs `random_height`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,

    /// Named numeric parameters
    #[serde(flatten)]
    pub values: HashMap<String, f64>,
}

impl EnvParams {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Required parameter, or `RegistryError::MissingParam`.
    pub fn require(&self, name: &str) -> Result<f64, RegistryError> {
        self.get(name)
            .ok_or_else(|| RegistryError::MissingParam(name.to_string()))
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        self.values.insert(name.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattened_params_deserialize() {
        let json = r#"{"task": "fixed_height", "x_limit": 2.5, "theta_limit": 24.0}"#;
        let params: EnvParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.task.as_deref(), Some("fixed_height"));
        assert_eq!(params.require("x_limit").unwrap(), 2.5);
        assert!(matches!(
            params.require("absent"),
            Err(RegistryError::MissingParam(_))
        ));
    }
}
