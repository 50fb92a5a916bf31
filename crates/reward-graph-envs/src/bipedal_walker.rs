//! Bipedal walker: subtask scores and reward graphs
//!
//! States are named maps with `hull_angle`, `hull_angle_velocity`,
//! `vertical_speed`, `horizontal_speed` and `collision` (hull touching
//! ground). Limits arrive through the info map.

use std::collections::HashMap;
use std::sync::Arc;

use reward_graph_core::{
    EvalError, GraphRewardConfig, GraphRewardEvaluator, HierarchicalGraph, Info, MinAggregator,
    NodeSpec, ProdAggregator, Scorer, SharedIndicator, SharedScorer, State, Step,
    ThresholdIndicator,
};

use crate::params::EnvParams;
use crate::registry::{RegistryError, RewardRegistry};
use crate::util::{constant, quantity, scored_node, Bounds};

/// Binary falldown score: penalty when the hull touches the ground.
pub struct BinaryFalldownScore {
    pub falldown_penalty: f64,
    pub no_falldown_bonus: f64,
}

impl Scorer for BinaryFalldownScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        Ok(if quantity(step, "collision")? > 0.0 {
            self.falldown_penalty
        } else {
            self.no_falldown_bonus
        })
    }
}

/// Horizontal hull speed; the simulator already normalizes it into ±1.
pub struct SpeedTargetScore;

impl Scorer for SpeedTargetScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        quantity(step, "horizontal_speed")
    }
}

/// Margin to the comfortable hull angle: `angle_hull_limit - |hull_angle|`.
pub struct HullAngleScore;

impl Scorer for HullAngleScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        Ok(constant(step, "angle_hull_limit")? - quantity(step, "hull_angle")?.abs())
    }
}

/// Margin to the comfortable vertical speed.
pub struct VerticalSpeedScore;

impl Scorer for VerticalSpeedScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        Ok(constant(step, "speed_y_limit")? - quantity(step, "vertical_speed")?.abs())
    }
}

/// Margin to the comfortable hull angular velocity.
pub struct HullAngleVelocityScore;

impl Scorer for HullAngleVelocityScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        Ok(constant(step, "angle_vel_limit")? - quantity(step, "hull_angle_velocity")?.abs())
    }
}

fn build_info(params: &EnvParams) -> Result<Info, RegistryError> {
    let mut info = Info::new();
    for name in [
        "angle_hull_limit",
        "speed_y_limit",
        "angle_vel_limit",
        "speed_x_target",
    ] {
        info.insert(name.to_string(), params.require(name)?);
    }
    Ok(info)
}

fn named_state(pairs: &[(&str, f64)]) -> State {
    State::Named(pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect())
}

fn falldown_node() -> (SharedScorer, SharedIndicator) {
    let fun: SharedScorer = Arc::new(BinaryFalldownScore {
        falldown_penalty: -1.0,
        no_falldown_bonus: 0.0,
    });
    let sat: SharedIndicator = Arc::new(ThresholdIndicator::new(fun.clone()));
    (fun, sat)
}

fn target_node(info: &Info) -> Result<(SharedScorer, SharedIndicator), RegistryError> {
    let target = info["speed_x_target"];
    Ok(scored_node(
        Arc::new(SpeedTargetScore),
        Bounds::AtStates {
            worst: &named_state(&[("horizontal_speed", target)]),
            best: &named_state(&[("horizontal_speed", 1.0)]),
            info,
        },
        target,
        true,
    )?)
}

/// The three comfort node pairs: hull angle, vertical speed, angular
/// velocity. Comfort nodes are leaves, so their indicators never gate
/// anything; threshold zero on the margin keeps them meaningful anyway.
fn comfort_nodes(
    info: &Info,
) -> Result<Vec<(String, SharedScorer, SharedIndicator)>, RegistryError> {
    let (angle_fn, angle_sat) = scored_node(
        Arc::new(HullAngleScore),
        Bounds::AtStates {
            worst: &named_state(&[("hull_angle", info["angle_hull_limit"])]),
            best: &named_state(&[("hull_angle", 0.0)]),
            info,
        },
        0.0,
        true,
    )?;
    let (vy_fn, vy_sat) = scored_node(
        Arc::new(VerticalSpeedScore),
        Bounds::AtStates {
            worst: &named_state(&[("vertical_speed", info["speed_y_limit"])]),
            best: &named_state(&[("vertical_speed", 0.0)]),
            info,
        },
        0.0,
        true,
    )?;
    let (avel_fn, avel_sat) = scored_node(
        Arc::new(HullAngleVelocityScore),
        Bounds::AtStates {
            worst: &named_state(&[("hull_angle_velocity", info["angle_vel_limit"])]),
            best: &named_state(&[("hull_angle_velocity", 0.0)]),
            info,
        },
        0.0,
        true,
    )?;
    Ok(vec![
        ("C_angle".to_string(), angle_fn, angle_sat),
        ("C_v_y".to_string(), vy_fn, vy_sat),
        ("C_angle_vel".to_string(), avel_fn, avel_sat),
    ])
}

/// Three-layer graph: falldown safety gates the speed target, which gates
/// the three comfort leaves.
pub struct ContinuousScoreBinaryIndicator {
    specs: Vec<NodeSpec>,
    topology: Vec<(String, Vec<String>)>,
}

impl ContinuousScoreBinaryIndicator {
    pub fn new(params: &EnvParams) -> Result<Self, RegistryError> {
        let info = build_info(params)?;

        let (fall_fn, fall_sat) = falldown_node();
        let (move_fn, move_sat) = target_node(&info)?;
        let mut specs = vec![
            NodeSpec::new("S_fall", fall_fn, fall_sat),
            NodeSpec::new("T_move", move_fn, move_sat),
        ];
        for (label, fun, sat) in comfort_nodes(&info)? {
            specs.push(NodeSpec::new(label, fun, sat));
        }

        let topology = vec![
            ("S_fall".to_string(), vec!["T_move".to_string()]),
            (
                "T_move".to_string(),
                vec![
                    "C_angle".to_string(),
                    "C_angle_vel".to_string(),
                    "C_v_y".to_string(),
                ],
            ),
        ];
        Ok(Self { specs, topology })
    }
}

impl GraphRewardConfig for ContinuousScoreBinaryIndicator {
    fn nodes(&self) -> Vec<NodeSpec> {
        self.specs.clone()
    }

    fn topology(&self) -> Vec<(String, Vec<String>)> {
        self.topology.clone()
    }
}

/// Chain variant: one node per hierarchy level, comfort rules aggregated
/// into a single conjunction.
pub struct ChainGraph {
    specs: Vec<NodeSpec>,
    topology: Vec<(String, Vec<String>)>,
}

impl ChainGraph {
    pub fn new(params: &EnvParams) -> Result<Self, RegistryError> {
        let info = build_info(params)?;

        let (fall_fn, fall_sat) = falldown_node();
        let (move_fn, move_sat) = target_node(&info)?;

        let (funs, sats): (Vec<SharedScorer>, Vec<SharedIndicator>) = comfort_nodes(&info)?
            .into_iter()
            .map(|(_, fun, sat)| (fun, sat))
            .unzip();

        let specs = vec![
            NodeSpec::new("S_fall", fall_fn, fall_sat),
            NodeSpec::new("T_move", move_fn, move_sat),
            NodeSpec::new(
                "C_all",
                Arc::new(MinAggregator::new(funs)?) as SharedScorer,
                Arc::new(ProdAggregator::new(sats)?) as SharedIndicator,
            ),
        ];
        let topology = vec![
            ("S_fall".to_string(), vec!["T_move".to_string()]),
            ("T_move".to_string(), vec!["C_all".to_string()]),
        ];
        Ok(Self { specs, topology })
    }
}

impl GraphRewardConfig for ChainGraph {
    fn nodes(&self) -> Vec<NodeSpec> {
        self.specs.clone()
    }

    fn topology(&self) -> Vec<(String, Vec<String>)> {
        self.topology.clone()
    }
}

fn build_evaluator(config: &dyn GraphRewardConfig) -> Result<GraphRewardEvaluator, RegistryError> {
    let graph = HierarchicalGraph::from_config(config)?;
    Ok(GraphRewardEvaluator::new(Arc::new(graph)))
}

/// Register the bipedal walker reward configurations.
pub fn register(registry: &mut RewardRegistry) {
    registry.register(
        "bipedal_walker/graph_binary_indicator",
        Box::new(|params| build_evaluator(&ContinuousScoreBinaryIndicator::new(params)?)),
    );
    registry.register(
        "bipedal_walker/graph_chain",
        Box::new(|params| build_evaluator(&ChainGraph::new(params)?)),
    );
}
