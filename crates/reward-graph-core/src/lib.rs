//! # reward-graph-core
//!
//! Hierarchical reward shaping for reinforcement-learning agents.
//!
//! This crate provides the algorithmic core shared by all environments:
//! - State, transition and evaluation-step types
//! - `Scorer` / `Indicator` traits with normalization, threshold and
//!   aggregation wrappers
//! - `HierarchicalGraph`: a validated DAG of scored, gated nodes
//! - `GraphRewardEvaluator`: gated-sum and potential-based reward modes

pub mod error;
pub mod evaluator;
pub mod graph;
pub mod scoring;
pub mod state;

pub use error::{ConfigurationError, EvalError, ValidationError};
pub use evaluator::{GraphRewardEvaluator, Reward, ShapingMode, TerminalPolicy};
pub use graph::{GraphRewardConfig, HierarchicalGraph, NodeSpec};
pub use scoring::{
    ConstantIndicator, ConstantScore, Indicator, MinAggregator, NormalizedScore, ProdAggregator,
    Scorer, SharedIndicator, SharedScorer, ThresholdIndicator,
};
pub use state::{Info, State, Step, Transition};
