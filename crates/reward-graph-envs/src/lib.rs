//! # reward-graph-envs
//!
//! Environment-specific hierarchical reward configurations built on
//! `reward-graph-core`:
//! - Subtask score functions per environment
//! - Graph topologies wiring them into safety/target/comfort hierarchies
//! - An explicit registry mapping configuration names to builders

pub mod bipedal_walker;
pub mod cart_pole_obst;
pub mod params;
pub mod racecar;
pub mod registry;

mod util;

pub use params::EnvParams;
pub use registry::{RegistryError, RewardBuilder, RewardRegistry};

/// Registry with every built-in reward configuration registered.
pub fn default_registry() -> RewardRegistry {
    let mut registry = RewardRegistry::new();
    cart_pole_obst::register(&mut registry);
    bipedal_walker::register(&mut registry);
    racecar::register(&mut registry);
    registry
}
