//! Cart-pole with obstacle: subtask scores and reward graphs
//!
//! States are named maps with `x`, `theta`, `collision` and
//! `dist_to_obstacle`; angular limits and targets arrive in the per-episode
//! info map in radians (parameters are given in degrees and converted
//! once at build time).

use std::collections::HashMap;
use std::sync::Arc;

use reward_graph_core::{
    ConstantScore, EvalError, GraphRewardConfig, GraphRewardEvaluator, HierarchicalGraph, Info,
    MinAggregator, NodeSpec, ProdAggregator, Scorer, SharedIndicator, SharedScorer, State, Step,
    ThresholdIndicator,
};

use crate::params::EnvParams;
use crate::registry::{RegistryError, RewardRegistry};
use crate::util::{constant, quantity, scored_node, Bounds};

/// Signed clearance between pole and obstacle; negative on contact.
/// The obstacle position is randomized per episode, so the robustness
/// range is approximate and fixed by the configuration.
pub struct ContinuousCollisionScore;

impl Scorer for ContinuousCollisionScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        quantity(step, "dist_to_obstacle")
    }
}

/// Margin to the falldown limit: `theta_limit - |theta|`.
pub struct ContinuousFalldownScore;

impl Scorer for ContinuousFalldownScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        Ok(constant(step, "theta_limit")? - quantity(step, "theta")?.abs())
    }
}

/// Margin to the track boundary: `x_limit - |x|`.
pub struct ContinuousOutsideScore;

impl Scorer for ContinuousOutsideScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        Ok(constant(step, "x_limit")? - quantity(step, "x")?.abs())
    }
}

/// Robustness of `|x - x_target| <= x_target_tol`.
pub struct ReachTargetScore;

impl Scorer for ReachTargetScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        let error = (quantity(step, "x")? - constant(step, "x_target")?).abs();
        Ok(constant(step, "x_target_tol")? - error)
    }
}

/// Robustness of `|theta - theta_target| <= theta_target_tol`.
pub struct BalanceScore;

impl Scorer for BalanceScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        let error = (quantity(step, "theta")? - constant(step, "theta_target")?).abs();
        Ok(constant(step, "theta_target_tol")? - error)
    }
}

/// Step-wise progress toward the target position, scaled by `coeff`.
pub struct ProgressToTargetScore {
    pub coeff: f64,
}

impl Scorer for ProgressToTargetScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        let target = constant(step, "x_target")?;
        let before = (quantity(step, "x")? - target).abs();
        let after = step
            .next_state
            .get("x")
            .map(|x| (x - target).abs())
            .ok_or_else(|| EvalError::MissingQuantity("x".to_string()))?;
        Ok(self.coeff * (before - after))
    }
}

/// Whether the pole can overcome the episode's obstacle at all. A static
/// condition of the episode, read from the info map; positive when the
/// obstacle leaves enough clearance.
pub struct OvercomingFeasibilityScore;

impl Scorer for OvercomingFeasibilityScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        Ok(constant(step, "feasible_height")? - constant(step, "obstacle_height")?)
    }
}

/// Binary collision score: penalty on contact, bonus otherwise.
pub struct CollisionScore {
    pub collision_penalty: f64,
    pub no_collision_bonus: f64,
}

impl Scorer for CollisionScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        Ok(if quantity(step, "collision")? > 0.0 {
            self.collision_penalty
        } else {
            self.no_collision_bonus
        })
    }
}

/// Binary falldown score over the angular limit.
pub struct FalldownScore {
    pub falldown_penalty: f64,
    pub no_falldown_bonus: f64,
}

impl Scorer for FalldownScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        Ok(
            if quantity(step, "theta")?.abs() > constant(step, "theta_limit")? {
                self.falldown_penalty
            } else {
                self.no_falldown_bonus
            },
        )
    }
}

/// Binary outside score over the positional limit.
pub struct OutsideScore {
    pub exit_penalty: f64,
    pub no_exit_bonus: f64,
}

impl Scorer for OutsideScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        Ok(
            if quantity(step, "x")?.abs() > constant(step, "x_limit")? {
                self.exit_penalty
            } else {
                self.no_exit_bonus
            },
        )
    }
}

/// Task variants of the obstacle environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    FixedHeight,
    RandomHeight,
}

impl Task {
    fn from_params(params: &EnvParams) -> Result<Self, RegistryError> {
        match params.task.as_deref() {
            Some("fixed_height") | None => Ok(Task::FixedHeight),
            Some("random_height") => Ok(Task::RandomHeight),
            Some(other) => Err(RegistryError::UnknownTask(other.to_string())),
        }
    }
}

/// Per-episode constants derived from the environment parameters; angular
/// parameters are converted from degrees here, once.
fn build_info(params: &EnvParams) -> Result<Info, RegistryError> {
    let mut info = Info::new();
    info.insert("x_limit".into(), params.require("x_limit")?);
    info.insert("x_target".into(), params.require("x_target")?);
    info.insert("x_target_tol".into(), params.require("x_target_tol")?);
    info.insert(
        "theta_limit".into(),
        params.require("theta_limit")?.to_radians(),
    );
    info.insert(
        "theta_target".into(),
        params.require("theta_target")?.to_radians(),
    );
    info.insert(
        "theta_target_tol".into(),
        params.require("theta_target_tol")?.to_radians(),
    );
    Ok(info)
}

fn theta_state(theta: f64) -> State {
    State::Named(HashMap::from([("theta".to_string(), theta)]))
}

fn x_state(x: f64) -> State {
    State::Named(HashMap::from([("x".to_string(), x)]))
}

/// Approximate robustness range of the collision score; the true range
/// depends on the randomized obstacle position.
const COLLISION_BOUNDS: (f64, f64) = (-0.5, 2.5);

fn safety_nodes(info: &Info) -> Result<Vec<(String, SharedScorer, SharedIndicator)>, RegistryError> {
    let theta_limit = info["theta_limit"];
    let x_limit = info["x_limit"];

    let (coll_fn, coll_sat) = scored_node(
        Arc::new(ContinuousCollisionScore),
        Bounds::Explicit {
            min: COLLISION_BOUNDS.0,
            max: COLLISION_BOUNDS.1,
        },
        0.0,
        true,
    )?;
    let (fall_fn, fall_sat) = scored_node(
        Arc::new(ContinuousFalldownScore),
        Bounds::AtStates {
            worst: &theta_state(theta_limit),
            best: &theta_state(0.0),
            info,
        },
        0.0,
        true,
    )?;
    let (exit_fn, exit_sat) = scored_node(
        Arc::new(ContinuousOutsideScore),
        Bounds::AtStates {
            worst: &x_state(x_limit),
            best: &x_state(0.0),
            info,
        },
        0.0,
        true,
    )?;
    Ok(vec![
        ("S_coll".to_string(), coll_fn, coll_sat),
        ("S_fall".to_string(), fall_fn, fall_sat),
        ("S_exit".to_string(), exit_fn, exit_sat),
    ])
}

/// Safety nodes from the binary scorers: the raw penalty/bonus value is
/// used directly as the score, with a plain threshold indicator over it.
fn binary_safety_nodes() -> Vec<(String, SharedScorer, SharedIndicator)> {
    let coll: SharedScorer = Arc::new(CollisionScore {
        collision_penalty: -1.0,
        no_collision_bonus: 0.0,
    });
    let fall: SharedScorer = Arc::new(FalldownScore {
        falldown_penalty: -1.0,
        no_falldown_bonus: 0.0,
    });
    let exit: SharedScorer = Arc::new(OutsideScore {
        exit_penalty: -1.0,
        no_exit_bonus: 0.0,
    });
    [("S_coll", coll), ("S_fall", fall), ("S_exit", exit)]
        .into_iter()
        .map(|(label, fun)| {
            let sat: SharedIndicator = Arc::new(ThresholdIndicator::new(fun.clone()));
            (label.to_string(), fun, sat)
        })
        .collect()
}

fn target_node(info: &Info) -> Result<(SharedScorer, SharedIndicator), RegistryError> {
    Ok(scored_node(
        Arc::new(ReachTargetScore),
        Bounds::AtStates {
            worst: &x_state(info["x_limit"]),
            best: &x_state(info["x_target"]),
            info,
        },
        0.0,
        true,
    )?)
}

fn balance_node(info: &Info) -> Result<(SharedScorer, SharedIndicator), RegistryError> {
    Ok(scored_node(
        Arc::new(BalanceScore),
        Bounds::AtStates {
            worst: &theta_state(info["theta_limit"]),
            best: &theta_state(info["theta_target"]),
            info,
        },
        0.0,
        true,
    )?)
}

/// Conditional node pair: a zero score gated purely by the feasibility of
/// overcoming the episode's obstacle, and its negation.
fn conditional_nodes() -> Vec<NodeSpec> {
    let zero: SharedScorer = Arc::new(ConstantScore(0.0));
    let feasible: SharedIndicator =
        Arc::new(ThresholdIndicator::new(Arc::new(OvercomingFeasibilityScore)));
    let infeasible: SharedIndicator = Arc::new(
        ThresholdIndicator::new(Arc::new(OvercomingFeasibilityScore)).negated(),
    );
    vec![
        NodeSpec::new("H_feas", zero.clone(), feasible),
        NodeSpec::new("H_nfeas", zero, infeasible),
    ]
}

fn topology(task: Task, safety_labels: &[&str]) -> Vec<(String, Vec<String>)> {
    let children = |labels: &[&str]| labels.iter().map(|l| l.to_string()).collect::<Vec<_>>();
    match task {
        Task::FixedHeight => {
            let mut topo: Vec<(String, Vec<String>)> = safety_labels
                .iter()
                .map(|s| (s.to_string(), children(&["T_origin"])))
                .collect();
            topo.push(("T_origin".to_string(), children(&["T_bal"])));
            topo
        }
        Task::RandomHeight => {
            let mut topo: Vec<(String, Vec<String>)> = safety_labels
                .iter()
                .map(|s| (s.to_string(), children(&["H_feas", "H_nfeas"])))
                .collect();
            topo.push(("H_feas".to_string(), children(&["T_origin"])));
            topo.push(("H_nfeas".to_string(), children(&["T_bal"])));
            topo.push(("T_origin".to_string(), children(&["C_bal"])));
            topo
        }
    }
}

/// Continuous scores with binary threshold indicators; one node per
/// safety rule.
pub struct ContinuousScoreBinaryIndicator {
    specs: Vec<NodeSpec>,
    topology: Vec<(String, Vec<String>)>,
}

impl std::fmt::Debug for ContinuousScoreBinaryIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContinuousScoreBinaryIndicator")
            .field("topology", &self.topology)
            .finish_non_exhaustive()
    }
}

impl ContinuousScoreBinaryIndicator {
    pub fn new(params: &EnvParams) -> Result<Self, RegistryError> {
        let task = Task::from_params(params)?;
        let info = build_info(params)?;

        let mut specs: Vec<NodeSpec> = safety_nodes(&info)?
            .into_iter()
            .map(|(label, fun, sat)| NodeSpec::new(label, fun, sat))
            .collect();

        let (target_fn, target_sat) = target_node(&info)?;
        specs.push(NodeSpec::new("T_origin", target_fn, target_sat));

        let (bal_fn, bal_sat) = balance_node(&info)?;
        specs.push(NodeSpec::new("T_bal", bal_fn, bal_sat));

        if task == Task::RandomHeight {
            let (cbal_fn, cbal_sat) = balance_node(&info)?;
            specs.push(NodeSpec::new("C_bal", cbal_fn, cbal_sat));
            specs.extend(conditional_nodes());
        }

        Ok(Self {
            specs,
            topology: topology(task, &["S_coll", "S_fall", "S_exit"]),
        })
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

/// Like [`ContinuousScoreBinaryIndicator`], but the target node rewards
/// per-step progress toward the target instead of absolute distance. The
/// progress score is unnormalized; its indicator fires only on strictly
/// positive progress.
pub struct ProgressScoreBinaryIndicator {
    specs: Vec<NodeSpec>,
    topology: Vec<(String, Vec<String>)>,
}

impl ProgressScoreBinaryIndicator {
    pub fn new(params: &EnvParams) -> Result<Self, RegistryError> {
        let task = Task::from_params(params)?;
        let info = build_info(params)?;

        let mut specs: Vec<NodeSpec> = safety_nodes(&info)?
            .into_iter()
            .map(|(label, fun, sat)| NodeSpec::new(label, fun, sat))
            .collect();

        let progress: SharedScorer = Arc::new(ProgressToTargetScore { coeff: 1.0 });
        let progress_sat: SharedIndicator =
            Arc::new(ThresholdIndicator::new(progress.clone()).exclude_zero());
        specs.push(NodeSpec::new("T_origin", progress, progress_sat));

        let (bal_fn, bal_sat) = balance_node(&info)?;
        specs.push(NodeSpec::new("T_bal", bal_fn, bal_sat));

        if task == Task::RandomHeight {
            let (cbal_fn, cbal_sat) = balance_node(&info)?;
            specs.push(NodeSpec::new("C_bal", cbal_fn, cbal_sat));
            specs.extend(conditional_nodes());
        }

        Ok(Self {
            specs,
            topology: topology(task, &["S_coll", "S_fall", "S_exit"]),
        })
    }
}

impl GraphRewardConfig for ProgressScoreBinaryIndicator {
    fn nodes(&self) -> Vec<NodeSpec> {
        self.specs.clone()
    }

    fn topology(&self) -> Vec<(String, Vec<String>)> {
        self.topology.clone()
    }
}

/// Binary safety scores (-1 on violation, 0 when satisfied) with the same
/// normalized target and comfort nodes as the continuous variant.
pub struct BinarySafetyScoreBinaryIndicator {
    specs: Vec<NodeSpec>,
    topology: Vec<(String, Vec<String>)>,
}

impl BinarySafetyScoreBinaryIndicator {
    pub fn new(params: &EnvParams) -> Result<Self, RegistryError> {
        let task = Task::from_params(params)?;
        let info = build_info(params)?;

        let mut specs: Vec<NodeSpec> = binary_safety_nodes()
            .into_iter()
            .map(|(label, fun, sat)| NodeSpec::new(label, fun, sat))
            .collect();

        let (target_fn, target_sat) = target_node(&info)?;
        specs.push(NodeSpec::new("T_origin", target_fn, target_sat));

        let (bal_fn, bal_sat) = balance_node(&info)?;
        specs.push(NodeSpec::new("T_bal", bal_fn, bal_sat));

        if task == Task::RandomHeight {
            let (cbal_fn, cbal_sat) = balance_node(&info)?;
            specs.push(NodeSpec::new("C_bal", cbal_fn, cbal_sat));
            specs.extend(conditional_nodes());
        }

        Ok(Self {
            specs,
            topology: topology(task, &["S_coll", "S_fall", "S_exit"]),
        })
    }
}

impl GraphRewardConfig for BinarySafetyScoreBinaryIndicator {
    fn nodes(&self) -> Vec<NodeSpec> {
        self.specs.clone()
    }

    fn topology(&self) -> Vec<(String, Vec<String>)> {
        self.topology.clone()
    }
}

/// All safety rules collapsed into one conjunctive node: min of the
/// normalized scores, product of the indicators.
pub struct SingleConjunctiveSafetyNode {
    specs: Vec<NodeSpec>,
    topology: Vec<(String, Vec<String>)>,
}

impl SingleConjunctiveSafetyNode {
    pub fn new(params: &EnvParams) -> Result<Self, RegistryError> {
        let task = Task::from_params(params)?;
        let info = build_info(params)?;

        let (funs, sats): (Vec<SharedScorer>, Vec<SharedIndicator>) = safety_nodes(&info)?
            .into_iter()
            .map(|(_, fun, sat)| (fun, sat))
            .unzip();
        let mut specs = vec![NodeSpec::new(
            "S_all",
            Arc::new(MinAggregator::new(funs)?) as SharedScorer,
            Arc::new(ProdAggregator::new(sats)?) as SharedIndicator,
        )];

        let (target_fn, target_sat) = target_node(&info)?;
        specs.push(NodeSpec::new("T_origin", target_fn, target_sat));

        let (bal_fn, bal_sat) = balance_node(&info)?;
        specs.push(NodeSpec::new("T_bal", bal_fn, bal_sat));

        if task == Task::RandomHeight {
            let (cbal_fn, cbal_sat) = balance_node(&info)?;
            specs.push(NodeSpec::new("C_bal", cbal_fn, cbal_sat));
            specs.extend(conditional_nodes());
        }

        Ok(Self {
            specs,
            topology: topology(task, &["S_all"]),
        })
    }
}

impl GraphRewardConfig for SingleConjunctiveSafetyNode {
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

/// Register the cart-pole reward configurations.
pub fn register(registry: &mut RewardRegistry) {
    registry.register(
        "cart_pole_obst/graph_binary_indicator",
        Box::new(|params| build_evaluator(&ContinuousScoreBinaryIndicator::new(params)?)),
    );
    registry.register(
        "cart_pole_obst/graph_progress",
        Box::new(|params| build_evaluator(&ProgressScoreBinaryIndicator::new(params)?)),
    );
    registry.register(
        "cart_pole_obst/graph_binary_safety",
        Box::new(|params| build_evaluator(&BinarySafetyScoreBinaryIndicator::new(params)?)),
    );
    registry.register(
        "cart_pole_obst/graph_chain",
        Box::new(|params| build_evaluator(&SingleConjunctiveSafetyNode::new(params)?)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use reward_graph_core::Transition;

    fn params(task: &str) -> EnvParams {
        let mut params = EnvParams {
            task: Some(task.to_string()),
            values: HashMap::new(),
        };
        params
            .set("x_limit", 2.5)
            .set("x_target", 0.0)
            .set("x_target_tol", 0.25)
            .set("theta_limit", 24.0)
            .set("theta_target", 0.0)
            .set("theta_target_tol", 24.0);
        params
    }

    fn state(x: f64, theta: f64, dist_to_obstacle: f64) -> State {
        State::Named(HashMap::from([
            ("x".to_string(), x),
            ("theta".to_string(), theta),
            ("collision".to_string(), 0.0),
            ("dist_to_obstacle".to_string(), dist_to_obstacle),
        ]))
    }

    fn transition(s: State, info: Info) -> Transition {
        Transition {
            state: s.clone(),
            action: None,
            next_state: s,
            info,
            done: false,
        }
    }

    #[test]
    fn fixed_height_graph_builds() {
        let config = ContinuousScoreBinaryIndicator::new(&params("fixed_height")).unwrap();
        let graph = HierarchicalGraph::from_config(&config).unwrap();
        assert_eq!(graph.len(), 5);
        assert_eq!(graph.layer("S_coll"), Some(0));
        assert_eq!(graph.layer("T_origin"), Some(1));
        assert_eq!(graph.layer("T_bal"), Some(2));
    }

    #[test]
    fn random_height_graph_has_conditional_layer() {
        let config = ContinuousScoreBinaryIndicator::new(&params("random_height")).unwrap();
        let graph = HierarchicalGraph::from_config(&config).unwrap();
        assert_eq!(graph.len(), 8);
        assert_eq!(graph.layer("H_feas"), Some(1));
        assert_eq!(graph.layer("T_origin"), Some(2));
        assert_eq!(graph.layer("C_bal"), Some(3));
        let ancestors: Vec<&str> = graph.ancestors("C_bal").unwrap().collect();
        assert!(ancestors.contains(&"S_coll"));
        assert!(ancestors.contains(&"H_feas"));
    }

    #[test]
    fn unknown_task_rejected() {
        let err = ContinuousScoreBinaryIndicator::new(&params("no_such_task")).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownTask(_)));
    }

    #[test]
    fn safe_centered_state_scores_high() {
        let p = params("fixed_height");
        let evaluator = build_evaluator(&ContinuousScoreBinaryIndicator::new(&p).unwrap()).unwrap();
        let info = build_info(&p).unwrap();

        let safe = transition(state(0.0, 0.0, 1.0), info);
        let reward = evaluator.evaluate(&safe).unwrap();
        // all three safety margins positive, target reached, balanced
        assert!(reward.value > 3.0, "got {}", reward.value);
        assert_eq!(reward.components.len(), 5);
    }

    #[test]
    fn violated_safety_gates_target_and_comfort() {
        let p = params("fixed_height");
        let evaluator = build_evaluator(&ContinuousScoreBinaryIndicator::new(&p).unwrap()).unwrap();
        let info = build_info(&p).unwrap();

        // collision margin negative: S_coll indicator fails
        let colliding = transition(state(0.0, 0.0, -0.1), info);
        let reward = evaluator.evaluate(&colliding).unwrap();
        assert_eq!(reward.components["T_origin"], 0.0);
        assert_eq!(reward.components["T_bal"], 0.0);
    }

    #[test]
    fn feasibility_branch_selects_subtree() {
        let p = params("random_height");
        let evaluator = build_evaluator(&ContinuousScoreBinaryIndicator::new(&p).unwrap()).unwrap();
        let mut info = build_info(&p).unwrap();
        info.insert("feasible_height".into(), 0.5);
        info.insert("obstacle_height".into(), 0.2);

        let tr = transition(state(0.0, 0.0, 1.0), info.clone());
        let reward = evaluator.evaluate(&tr).unwrap();
        // feasible: T_origin enabled, the infeasible branch contributes 0
        assert!(reward.components["T_origin"] > 0.0);
        assert_eq!(reward.components["T_bal"], 0.0);

        info.insert("obstacle_height".into(), 0.9);
        let tr = transition(state(0.0, 0.0, 1.0), info);
        let reward = evaluator.evaluate(&tr).unwrap();
        assert_eq!(reward.components["T_origin"], 0.0);
        assert!(reward.components["T_bal"] > 0.0);
    }

    #[test]
    fn progress_config_rewards_movement_toward_target() {
        let p = params("fixed_height");
        let evaluator =
            build_evaluator(&ProgressScoreBinaryIndicator::new(&p).unwrap()).unwrap();
        let info = build_info(&p).unwrap();

        let tr = Transition {
            state: state(1.0, 0.0, 1.0),
            action: None,
            next_state: state(0.6, 0.0, 1.0),
            info,
            done: false,
        };
        let reward = evaluator.evaluate(&tr).unwrap();
        assert!((reward.components["T_origin"] - 0.4).abs() < 1e-9);
    }

    #[test]
    fn binary_safety_config_scores_and_gates() {
        let p = params("fixed_height");
        let evaluator =
            build_evaluator(&BinarySafetyScoreBinaryIndicator::new(&p).unwrap()).unwrap();
        let info = build_info(&p).unwrap();

        // satisfied safety rules score 0 and leave the target enabled
        let safe = transition(state(0.0, 0.0, 1.0), info.clone());
        let reward = evaluator.evaluate(&safe).unwrap();
        assert_eq!(reward.components["S_coll"], 0.0);
        assert_eq!(reward.components["S_fall"], 0.0);
        assert!(reward.components["T_origin"] > 0.0);

        // a collision scores the penalty and gates target and comfort
        let mut crashed = state(0.0, 0.0, -0.1);
        if let State::Named(map) = &mut crashed {
            map.insert("collision".to_string(), 1.0);
        }
        let reward = evaluator.evaluate(&transition(crashed, info)).unwrap();
        assert_eq!(reward.components["S_coll"], -1.0);
        assert_eq!(reward.components["T_origin"], 0.0);
        assert_eq!(reward.components["T_bal"], 0.0);
    }

    #[test]
    fn chain_config_builds_three_layers() {
        let config = SingleConjunctiveSafetyNode::new(&params("fixed_height")).unwrap();
        let graph = HierarchicalGraph::from_config(&config).unwrap();
        assert_eq!(graph.len(), 3);
        let order: Vec<&str> = graph.topological_order().collect();
        assert_eq!(order, vec!["S_all", "T_origin", "T_bal"]);
    }
}
