//! Gated reward evaluation over a hierarchical graph

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::EvalError;
use crate::graph::HierarchicalGraph;
use crate::scoring::SharedScorer;
use crate::state::{Step, Transition};

/// Scalar reward with its per-node decomposition, keyed by node label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    /// Total scalar reward
    pub value: f64,
    /// Per-node gated contributions, for analysis
    #[serde(default)]
    pub components: HashMap<String, f64>,
}

/// What a terminal transition emits in potential mode.
///
/// Call sites differ on this, so it is explicit configuration rather than
/// a single built-in rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalPolicy {
    /// Emit the shaped potential difference like any other step
    Shaped,
    /// Emit only the base reward, dropping the shaping term
    BaseOnly,
}

/// Reward computation mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapingMode {
    /// Sum of gated node scores at the transition's starting state
    Direct,
    /// Potential-based shaping: discount-weighted difference of gated
    /// scores between the two endpoints of the transition
    Potential {
        gamma: f64,
        terminal: TerminalPolicy,
    },
}

/// Computes the scalar reward for a transition from an immutable
/// [`HierarchicalGraph`].
///
/// Stateless across steps: each evaluation is a pure function of the
/// transition, so one graph may back any number of evaluator instances in
/// parallel environment workers.
pub struct GraphRewardEvaluator {
    graph: Arc<HierarchicalGraph>,
    mode: ShapingMode,
    base: Option<SharedScorer>,
}

impl std::fmt::Debug for GraphRewardEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphRewardEvaluator")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl GraphRewardEvaluator {
    /// Direct-mode evaluator over the graph.
    pub fn new(graph: Arc<HierarchicalGraph>) -> Self {
        Self {
            graph,
            mode: ShapingMode::Direct,
            base: None,
        }
    }

    /// Switch to potential-based shaping.
    pub fn with_potential(mut self, gamma: f64, terminal: TerminalPolicy) -> Self {
        self.mode = ShapingMode::Potential { gamma, terminal };
        self
    }

    /// Sparse base reward, evaluated at the transition's successor state
    /// and added on top of the shaping term.
    pub fn with_base(mut self, base: SharedScorer) -> Self {
        self.base = Some(base);
        self
    }

    pub fn mode(&self) -> ShapingMode {
        self.mode
    }

    pub fn graph(&self) -> &HierarchicalGraph {
        &self.graph
    }

    /// Scalar reward for one transition.
    pub fn reward(&self, transition: &Transition) -> Result<f64, EvalError> {
        self.evaluate(transition).map(|r| r.value)
    }

    /// Reward plus per-node decomposition for one transition.
    ///
    /// Errors from wrapped score or indicator functions propagate
    /// unmodified; there is no retry and no fallback value.
    pub fn evaluate(&self, transition: &Transition) -> Result<Reward, EvalError> {
        let mut components = HashMap::with_capacity(self.graph.node_count());

        let value = match self.mode {
            ShapingMode::Direct => {
                let gated = self.gated_scores(&transition.step())?;
                let mut total = 0.0;
                for (n, contribution) in gated.into_iter().enumerate() {
                    components.insert(self.graph.node(n).label.clone(), contribution);
                    total += contribution;
                }
                total + self.base_reward(transition, &mut components)?
            }
            ShapingMode::Potential { gamma, terminal } => {
                if transition.done && terminal == TerminalPolicy::BaseOnly {
                    self.base_reward(transition, &mut components)?
                } else {
                    let current = self.gated_scores(&transition.step())?;
                    let next = self.gated_scores(&transition.step_at_next())?;
                    let mut total = 0.0;
                    for n in 0..self.graph.node_count() {
                        let shaped = gamma * next[n] - current[n];
                        components.insert(self.graph.node(n).label.clone(), shaped);
                        total += shaped;
                    }
                    total + self.base_reward(transition, &mut components)?
                }
            }
        };

        trace!(value, "evaluated reward");
        Ok(Reward { value, components })
    }

    /// Per-node `gate(n) * score(n)` at one evaluation step.
    ///
    /// Every score and indicator is evaluated exactly once; a node's gate
    /// is the conjunction of its ancestors' indicators, so roots (empty
    /// ancestor set) are always enabled.
    fn gated_scores(&self, step: &Step<'_>) -> Result<Vec<f64>, EvalError> {
        let n = self.graph.node_count();
        let mut satisfied = Vec::with_capacity(n);
        let mut scores = Vec::with_capacity(n);
        for id in 0..n {
            let node = self.graph.node(id);
            satisfied.push(node.indicator.holds(step)?);
            scores.push(node.scorer.score(step)?);
        }

        let gated = (0..n)
            .map(|id| {
                let enabled = self.graph.ancestor_ids(id).iter().all(|&a| satisfied[a]);
                if enabled {
                    scores[id]
                } else {
                    0.0
                }
            })
            .collect();
        Ok(gated)
    }

    fn base_reward(
        &self,
        transition: &Transition,
        components: &mut HashMap<String, f64>,
    ) -> Result<f64, EvalError> {
        match &self.base {
            Some(base) => {
                let value = base.score(&transition.step_at_next())?;
                components.insert("base".to_string(), value);
                Ok(value)
            }
            None => Ok(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeSpec;
    use crate::scoring::{ConstantIndicator, ConstantScore, Indicator, Scorer};
    use crate::state::State;
    use std::collections::HashMap as Map;

    fn chain_graph(indicators: [bool; 3]) -> Arc<HierarchicalGraph> {
        let specs = vec![
            NodeSpec::new(
                "A",
                Arc::new(ConstantScore(1.0)),
                Arc::new(ConstantIndicator(indicators[0])),
            ),
            NodeSpec::new(
                "B",
                Arc::new(ConstantScore(2.0)),
                Arc::new(ConstantIndicator(indicators[1])),
            ),
            NodeSpec::new(
                "C",
                Arc::new(ConstantScore(3.0)),
                Arc::new(ConstantIndicator(indicators[2])),
            ),
        ];
        let edges = vec![
            ("A".to_string(), "B".to_string()),
            ("B".to_string(), "C".to_string()),
        ];
        Arc::new(HierarchicalGraph::new(specs, &edges).unwrap())
    }

    fn transition() -> Transition {
        Transition {
            state: State::Vector(vec![0.0]),
            action: None,
            next_state: State::Vector(vec![0.0]),
            info: Map::new(),
            done: false,
        }
    }

    #[test]
    fn chain_with_all_satisfied_sums_scores() {
        let eval = GraphRewardEvaluator::new(chain_graph([true, true, true]));
        let reward = eval.evaluate(&transition()).unwrap();
        assert_eq!(reward.value, 6.0);
        assert_eq!(reward.components["A"], 1.0);
        assert_eq!(reward.components["B"], 2.0);
        assert_eq!(reward.components["C"], 3.0);
    }

    #[test]
    fn root_is_always_enabled() {
        // root contributes even when its own indicator is false; the
        // indicator gates descendants, never the node itself
        let eval = GraphRewardEvaluator::new(chain_graph([false, true, true]));
        let reward = eval.evaluate(&transition()).unwrap();
        assert_eq!(reward.components["A"], 1.0);
    }

    #[test]
    fn unsatisfied_ancestor_zeroes_descendants() {
        let eval = GraphRewardEvaluator::new(chain_graph([false, true, true]));
        let reward = eval.evaluate(&transition()).unwrap();
        assert_eq!(reward.components["B"], 0.0);
        assert_eq!(reward.components["C"], 0.0);
        assert_eq!(reward.value, 1.0);
    }

    #[test]
    fn middle_indicator_gates_only_below() {
        let eval = GraphRewardEvaluator::new(chain_graph([true, false, true]));
        let reward = eval.evaluate(&transition()).unwrap();
        assert_eq!(reward.value, 1.0 + 2.0);
        assert_eq!(reward.components["C"], 0.0);
    }

    struct KeyIndicator(&'static str);

    impl Indicator for KeyIndicator {
        fn holds(&self, step: &Step<'_>) -> Result<bool, EvalError> {
            Ok(step.state.get(self.0).unwrap_or(0.0) > 0.0)
        }
    }

    fn fan_in_graph() -> Arc<HierarchicalGraph> {
        // S1, S2 gate T1; T1 gates C1
        let specs = vec![
            NodeSpec::new("S1", Arc::new(ConstantScore(0.5)), Arc::new(KeyIndicator("s1"))),
            NodeSpec::new("S2", Arc::new(ConstantScore(0.5)), Arc::new(KeyIndicator("s2"))),
            NodeSpec::new("T1", Arc::new(ConstantScore(1.0)), Arc::new(KeyIndicator("t1"))),
            NodeSpec::new("C1", Arc::new(ConstantScore(2.0)), Arc::new(KeyIndicator("c1"))),
        ];
        let edges = vec![
            ("S1".to_string(), "T1".to_string()),
            ("S2".to_string(), "T1".to_string()),
            ("T1".to_string(), "C1".to_string()),
        ];
        Arc::new(HierarchicalGraph::new(specs, &edges).unwrap())
    }

    fn named(pairs: &[(&str, f64)]) -> State {
        State::Named(pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect())
    }

    fn transition_between(state: State, next_state: State, done: bool) -> Transition {
        Transition {
            state,
            action: None,
            next_state,
            info: Map::new(),
            done,
        }
    }

    #[test]
    fn one_failed_safety_node_disables_whole_subtree() {
        let eval = GraphRewardEvaluator::new(fan_in_graph());
        // S1 unsatisfied: T1 and C1 contribute nothing regardless of t1/c1
        let state = named(&[("s1", 0.0), ("s2", 1.0), ("t1", 1.0), ("c1", 1.0)]);
        let reward = eval
            .evaluate(&transition_between(state.clone(), state, false))
            .unwrap();
        assert_eq!(reward.components["T1"], 0.0);
        assert_eq!(reward.components["C1"], 0.0);
        assert_eq!(reward.value, 0.5 + 0.5);
    }

    #[test]
    fn all_ancestors_checked_independently() {
        let eval = GraphRewardEvaluator::new(fan_in_graph());
        // T1 satisfied but S2 not: C1 still disabled through its indirect
        // ancestor
        let state = named(&[("s1", 1.0), ("s2", 0.0), ("t1", 1.0), ("c1", 1.0)]);
        let reward = eval
            .evaluate(&transition_between(state.clone(), state, false))
            .unwrap();
        assert_eq!(reward.components["C1"], 0.0);
    }

    struct KeyScore(&'static str);

    impl Scorer for KeyScore {
        fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
            step.state
                .get(self.0)
                .ok_or_else(|| EvalError::MissingQuantity(self.0.to_string()))
        }
    }

    fn potential_chain() -> Arc<HierarchicalGraph> {
        let specs = vec![
            NodeSpec::new("S", Arc::new(KeyScore("s")), Arc::new(KeyIndicator("s"))),
            NodeSpec::new("T", Arc::new(KeyScore("t")), Arc::new(KeyIndicator("t"))),
        ];
        let edges = vec![("S".to_string(), "T".to_string())];
        Arc::new(HierarchicalGraph::new(specs, &edges).unwrap())
    }

    #[test]
    fn unchanged_potentials_shape_to_zero() {
        let eval = GraphRewardEvaluator::new(potential_chain())
            .with_potential(1.0, TerminalPolicy::Shaped);
        let state = named(&[("s", 1.0), ("t", 0.4)]);
        let reward = eval
            .evaluate(&transition_between(state.clone(), state, false))
            .unwrap();
        assert!(reward.value.abs() < 1e-12);
    }

    #[test]
    fn potential_difference_rewards_progress() {
        let eval = GraphRewardEvaluator::new(potential_chain())
            .with_potential(1.0, TerminalPolicy::Shaped);
        let before = named(&[("s", 1.0), ("t", 0.2)]);
        let after = named(&[("s", 1.0), ("t", 0.7)]);
        let reward = eval
            .evaluate(&transition_between(before, after, false))
            .unwrap();
        assert!((reward.value - 0.5).abs() < 1e-9);
    }

    #[test]
    fn discount_scales_next_potential() {
        let eval = GraphRewardEvaluator::new(potential_chain())
            .with_potential(0.9, TerminalPolicy::Shaped);
        let state = named(&[("s", 1.0), ("t", 1.0)]);
        let reward = eval
            .evaluate(&transition_between(state.clone(), state, false))
            .unwrap();
        // phi = 2.0 at both endpoints: 0.9 * 2 - 2
        assert!((reward.value - (-0.2)).abs() < 1e-9);
    }

    #[test]
    fn terminal_base_only_drops_shaping() {
        let eval = GraphRewardEvaluator::new(potential_chain())
            .with_potential(1.0, TerminalPolicy::BaseOnly)
            .with_base(Arc::new(ConstantScore(10.0)));
        let before = named(&[("s", 1.0), ("t", 0.0)]);
        let after = named(&[("s", 1.0), ("t", 1.0)]);

        let terminal = eval
            .evaluate(&transition_between(before.clone(), after.clone(), true))
            .unwrap();
        assert_eq!(terminal.value, 10.0);
        assert_eq!(terminal.components.len(), 1);

        let mid_episode = eval
            .evaluate(&transition_between(before, after, false))
            .unwrap();
        assert!((mid_episode.value - 11.0).abs() < 1e-9);
    }

    #[test]
    fn zero_scored_conditional_nodes_still_gate() {
        // H exists purely to gate T via its indicator
        let specs = vec![
            NodeSpec::new("H", Arc::new(ConstantScore(0.0)), Arc::new(KeyIndicator("feasible"))),
            NodeSpec::new("T", Arc::new(ConstantScore(1.0)), Arc::new(ConstantIndicator(true))),
        ];
        let edges = vec![("H".to_string(), "T".to_string())];
        let graph = Arc::new(HierarchicalGraph::new(specs, &edges).unwrap());
        let eval = GraphRewardEvaluator::new(graph);

        let feasible = named(&[("feasible", 1.0)]);
        let infeasible = named(&[("feasible", 0.0)]);
        assert_eq!(
            eval.reward(&transition_between(feasible.clone(), feasible, false))
                .unwrap(),
            1.0
        );
        assert_eq!(
            eval.reward(&transition_between(infeasible.clone(), infeasible, false))
                .unwrap(),
            0.0
        );
    }

    #[test]
    fn scorer_failures_propagate() {
        let eval = GraphRewardEvaluator::new(potential_chain());
        // vector state lacks the named quantities the scorers require
        let err = eval.evaluate(&transition()).unwrap_err();
        assert!(matches!(err, EvalError::MissingQuantity(_)));
    }
}
