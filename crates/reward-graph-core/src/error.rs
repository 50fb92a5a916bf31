//! Error types for the reward graph core

use thiserror::Error;

/// Construction-time graph validation failures. Fatal: the reward
/// configuration must be fixed, there is nothing to recover.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Node labels must be unique identifiers
    #[error("duplicate node label: {0}")]
    DuplicateLabel(String),

    /// Edge endpoint does not name an existing node
    #[error("edge ({parent}, {child}) references unknown label {unknown}")]
    UnknownLabel {
        parent: String,
        child: String,
        unknown: String,
    },

    /// The precedence relation must be a DAG
    #[error("cycle detected through node {0}")]
    CycleDetected(String),
}

/// Construction-time wrapper misconfiguration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Normalization bounds collapse to a point
    #[error("degenerate normalization bounds: min == max == {0}")]
    DegenerateBounds(f64),

    /// An aggregator over zero functions has no defined value
    #[error("aggregator requires at least one function")]
    EmptyAggregate,

    /// Calibrating bounds from boundary states failed
    #[error("bound calibration failed: {0}")]
    Calibration(#[from] EvalError),
}

/// Failure raised by a score or indicator function during evaluation.
///
/// These propagate unmodified through the evaluator: a wrapped function
/// failing mid-training indicates a contract violation between the reward
/// configuration and the environment state, and substituting a fallback
/// value would corrupt the training signal undetectably.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The state does not carry a quantity the scorer requires
    #[error("state is missing required quantity {0:?}")]
    MissingQuantity(String),

    /// The info map does not carry a constant the scorer requires
    #[error("info is missing required constant {0:?}")]
    MissingConstant(String),

    /// The scorer requires an action and none was supplied
    #[error("transition carries no action")]
    MissingAction,

    /// Scorer-specific failure
    #[error("{0}")]
    Custom(String),
}
