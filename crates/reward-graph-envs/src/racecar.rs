//! Racecar: hierarchical potential shaping
//!
//! States are named maps with `wall_collision`, `wrong_way`, `progress`,
//! `speed`, `steering` and `dist_to_wall`. The per-step info map carries
//! the normalized limits plus the running `lap` counter consumed by the
//! sparse base reward.

use std::sync::Arc;

use reward_graph_core::{
    ConstantIndicator, EvalError, GraphRewardConfig, GraphRewardEvaluator, HierarchicalGraph,
    Indicator, NodeSpec, Scorer, SharedIndicator, SharedScorer, Step, TerminalPolicy,
    ThresholdIndicator,
};

use crate::params::EnvParams;
use crate::registry::{RegistryError, RewardRegistry};
use crate::util::{clip_and_norm, constant, quantity};

/// Holds while the car is off the walls; doubles as a 0/1 potential.
pub struct NoCollisionScore;

impl Scorer for NoCollisionScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        Ok(if quantity(step, "wall_collision")? <= 0.0 {
            1.0
        } else {
            0.0
        })
    }
}

/// Holds while the car drives the right way; 0/1 potential.
pub struct RightWayScore;

impl Scorer for RightWayScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        Ok(if quantity(step, "wrong_way")? <= 0.0 {
            1.0
        } else {
            0.0
        })
    }
}

/// Track progress normalized against the episode's progress target.
pub struct ProgressScore;

impl Scorer for ProgressScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        let progress = quantity(step, "progress")?;
        Ok(clip_and_norm(progress, 0.0, constant(step, "progress_target")?))
    }
}

/// Comfort: stay under the normalized speed limit.
pub struct ComfortSpeedScore;

impl Scorer for ComfortSpeedScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        let speed = quantity(step, "speed")?;
        Ok(1.0
            - clip_and_norm(
                speed,
                constant(step, "norm_speed_limit")?,
                constant(step, "norm_max_speed")?,
            ))
    }
}

/// Comfort: keep the steering angle inside the comfortable band.
pub struct ComfortSteeringScore;

impl Scorer for ComfortSteeringScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        let steering = quantity(step, "steering")?.abs();
        Ok(1.0
            - clip_and_norm(
                steering,
                constant(step, "norm_comf_steering")?,
                constant(step, "norm_max_steering")?,
            ))
    }
}

/// Comfort: hold the reference distance to the right wall. Cross-track
/// error is assumed bounded by 1 m.
pub struct KeepRightScore;

impl Scorer for KeepRightScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        let error = (quantity(step, "dist_to_wall")? - constant(step, "comf_dist_to_wall")?).abs();
        Ok(1.0 - clip_and_norm(error, constant(step, "tolerance_margin")?, 1.0))
    }
}

/// Sparse base reward: 1 once a full lap is complete, else 0. The lap
/// counter starts at 1, so the bonus requires it to have advanced past 1.
pub struct LapBaseScore;

impl Scorer for LapBaseScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        Ok(if constant(step, "lap")? - 1.0 >= 0.001 {
            1.0
        } else {
            0.0
        })
    }
}

/// Progress must be moving at all for comfort to count.
struct ProgressStarted;

impl Indicator for ProgressStarted {
    fn holds(&self, step: &Step<'_>) -> Result<bool, EvalError> {
        Ok(quantity(step, "progress")? > 0.0)
    }
}

/// Safety roots, a progress target, and three comfort leaves; evaluated
/// in potential mode with the lap bonus as base reward.
pub struct HierarchicalPotentialShaping {
    specs: Vec<NodeSpec>,
    topology: Vec<(String, Vec<String>)>,
}

impl HierarchicalPotentialShaping {
    pub fn new(_params: &EnvParams) -> Result<Self, RegistryError> {
        let coll_fn: SharedScorer = Arc::new(NoCollisionScore);
        let rev_fn: SharedScorer = Arc::new(RightWayScore);
        let coll_sat: SharedIndicator = Arc::new(
            ThresholdIndicator::new(coll_fn.clone())
                .with_threshold(1.0),
        );
        let rev_sat: SharedIndicator = Arc::new(
            ThresholdIndicator::new(rev_fn.clone())
                .with_threshold(1.0),
        );

        let specs = vec![
            NodeSpec::new("S_coll", coll_fn, coll_sat),
            NodeSpec::new("S_rev", rev_fn, rev_sat),
            NodeSpec::new(
                "T_prog",
                Arc::new(ProgressScore),
                Arc::new(ProgressStarted),
            ),
            NodeSpec::new(
                "C_speed",
                Arc::new(ComfortSpeedScore),
                Arc::new(ConstantIndicator(true)),
            ),
            NodeSpec::new(
                "C_steer",
                Arc::new(ComfortSteeringScore),
                Arc::new(ConstantIndicator(true)),
            ),
            NodeSpec::new(
                "C_right",
                Arc::new(KeepRightScore),
                Arc::new(ConstantIndicator(true)),
            ),
        ];
        let children = |labels: &[&str]| labels.iter().map(|l| l.to_string()).collect::<Vec<_>>();
        let topology = vec![
            ("S_coll".to_string(), children(&["T_prog"])),
            ("S_rev".to_string(), children(&["T_prog"])),
            (
                "T_prog".to_string(),
                children(&["C_speed", "C_steer", "C_right"]),
            ),
        ];
        Ok(Self { specs, topology })
    }
}

impl GraphRewardConfig for HierarchicalPotentialShaping {
    fn nodes(&self) -> Vec<NodeSpec> {
        self.specs.clone()
    }

    fn topology(&self) -> Vec<(String, Vec<String>)> {
        self.topology.clone()
    }
}

/// Register the racecar reward configurations.
pub fn register(registry: &mut RewardRegistry) {
    registry.register(
        "racecar/hierarchical_potential",
        Box::new(|params| {
            let gamma = params.get("gamma").unwrap_or(1.0);
            let config = HierarchicalPotentialShaping::new(params)?;
            let graph = HierarchicalGraph::from_config(&config)?;
            Ok(GraphRewardEvaluator::new(Arc::new(graph))
                .with_potential(gamma, TerminalPolicy::BaseOnly)
                .with_base(Arc::new(LapBaseScore)))
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use reward_graph_core::{Info, State, Transition};
    use std::collections::HashMap;

    fn info() -> Info {
        HashMap::from([
            ("progress_target".to_string(), 1.0),
            ("norm_speed_limit".to_string(), 0.5),
            ("norm_max_speed".to_string(), 1.0),
            ("norm_comf_steering".to_string(), 0.2),
            ("norm_max_steering".to_string(), 1.0),
            ("comf_dist_to_wall".to_string(), 0.3),
            ("tolerance_margin".to_string(), 0.1),
            ("lap".to_string(), 1.0),
        ])
    }

    fn driving_state(progress: f64) -> State {
        State::Named(HashMap::from([
            ("wall_collision".to_string(), 0.0),
            ("wrong_way".to_string(), 0.0),
            ("progress".to_string(), progress),
            ("speed".to_string(), 0.4),
            ("steering".to_string(), 0.1),
            ("dist_to_wall".to_string(), 0.3),
        ]))
    }

    fn evaluator() -> GraphRewardEvaluator {
        let mut registry = RewardRegistry::new();
        register(&mut registry);
        registry
            .build("racecar/hierarchical_potential", &EnvParams::default())
            .unwrap()
    }

    #[test]
    fn steady_driving_shapes_to_zero() {
        let eval = evaluator();
        let tr = Transition {
            state: driving_state(0.4),
            action: None,
            next_state: driving_state(0.4),
            info: info(),
            done: false,
        };
        assert!(eval.reward(&tr).unwrap().abs() < 1e-12);
    }

    #[test]
    fn progress_yields_positive_shaping() {
        let eval = evaluator();
        let tr = Transition {
            state: driving_state(0.4),
            action: None,
            next_state: driving_state(0.6),
            info: info(),
            done: false,
        };
        let reward = eval.evaluate(&tr).unwrap();
        assert!(reward.value > 0.0, "got {}", reward.value);
        assert!((reward.components["T_prog"] - 0.2).abs() < 1e-9);
    }

    #[test]
    fn collision_drops_gated_potentials() {
        let eval = evaluator();
        let mut crashed = driving_state(0.6);
        if let State::Named(map) = &mut crashed {
            map.insert("wall_collision".to_string(), 1.0);
        }
        let tr = Transition {
            state: driving_state(0.6),
            action: None,
            next_state: crashed,
            info: info(),
            done: false,
        };
        let reward = eval.evaluate(&tr).unwrap();
        // losing the safety gate zeroes the target and comfort potentials,
        // so the shaped difference is strongly negative
        assert!(reward.value < 0.0, "got {}", reward.value);
    }

    #[test]
    fn terminal_transition_pays_lap_bonus_only() {
        let eval = evaluator();
        let mut lap_info = info();
        lap_info.insert("lap".to_string(), 2.0);
        let tr = Transition {
            state: driving_state(0.9),
            action: None,
            next_state: driving_state(1.0),
            info: lap_info,
            done: true,
        };
        let reward = eval.evaluate(&tr).unwrap();
        assert_eq!(reward.value, 1.0);
        assert_eq!(reward.components.len(), 1);
        assert_eq!(reward.components["base"], 1.0);
    }

    #[test]
    fn initial_lap_counter_earns_no_bonus() {
        let eval = evaluator();
        let mut lap_info = info();
        // the counter is 1-based: a fresh episode has lap == 1
        lap_info.insert("lap".to_string(), 1.0);
        let tr = Transition {
            state: driving_state(0.9),
            action: None,
            next_state: driving_state(1.0),
            info: lap_info,
            done: true,
        };
        let reward = eval.evaluate(&tr).unwrap();
        assert_eq!(reward.value, 0.0);
        assert_eq!(reward.components["base"], 0.0);
    }
}
