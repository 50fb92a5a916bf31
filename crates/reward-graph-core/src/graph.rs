//! Hierarchical reward graph: a DAG of scored, gated nodes
//!
//! Each node pairs a score function with a satisfaction indicator. An edge
//! `(parent, child)` means the child's reward contribution is enabled only
//! while the parent's indicator holds; transitively, a node contributes only
//! when every one of its ancestors is individually satisfied.

use std::collections::HashMap;

use tracing::debug;

use crate::error::ValidationError;
use crate::scoring::{SharedIndicator, SharedScorer};

/// Declarative node specification: label plus the paired functions.
#[derive(Clone)]
pub struct NodeSpec {
    pub label: String,
    pub scorer: SharedScorer,
    pub indicator: SharedIndicator,
}

impl NodeSpec {
    pub fn new(
        label: impl Into<String>,
        scorer: SharedScorer,
        indicator: SharedIndicator,
    ) -> Self {
        Self {
            label: label.into(),
            scorer,
            indicator,
        }
    }
}

/// How environment reward configurations declare their graph: a node table
/// and a parent -> children topology.
pub trait GraphRewardConfig {
    fn nodes(&self) -> Vec<NodeSpec>;
    fn topology(&self) -> Vec<(String, Vec<String>)>;
}

pub(crate) struct Node {
    pub label: String,
    pub scorer: SharedScorer,
    pub indicator: SharedIndicator,
    pub layer: usize,
}

/// Immutable DAG of reward nodes with precomputed topological order,
/// per-node layer (longest-path distance from a root) and ancestor sets.
///
/// Built once per reward configuration, then only read during evaluation;
/// safe to share across parallel environment workers behind an `Arc`.
pub struct HierarchicalGraph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    parents: Vec<Vec<usize>>,
    topo: Vec<usize>,
    ancestors: Vec<Vec<usize>>,
}

impl std::fmt::Debug for HierarchicalGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchicalGraph")
            .field(
                "labels",
                &self.nodes.iter().map(|n| &n.label).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl HierarchicalGraph {
    /// Validate and build the graph.
    ///
    /// Fails if labels are not unique, if an edge endpoint names an unknown
    /// label, or if the edges form a cycle.
    pub fn new(
        specs: Vec<NodeSpec>,
        edges: &[(String, String)],
    ) -> Result<Self, ValidationError> {
        let mut index = HashMap::with_capacity(specs.len());
        for (i, spec) in specs.iter().enumerate() {
            if index.insert(spec.label.clone(), i).is_some() {
                return Err(ValidationError::DuplicateLabel(spec.label.clone()));
            }
        }

        let mut parents: Vec<Vec<usize>> = vec![Vec::new(); specs.len()];
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); specs.len()];
        for (parent, child) in edges {
            let unknown = |label: &String| ValidationError::UnknownLabel {
                parent: parent.clone(),
                child: child.clone(),
                unknown: label.clone(),
            };
            let p = *index.get(parent).ok_or_else(|| unknown(parent))?;
            let c = *index.get(child).ok_or_else(|| unknown(child))?;
            children[p].push(c);
            parents[c].push(p);
        }

        let topo = topological_order(&specs, &children, &parents)?;

        // layer(n) = 0 for roots, else 1 + max over parents
        let mut layers = vec![0usize; specs.len()];
        for &n in &topo {
            if let Some(max_parent) = parents[n].iter().map(|&p| layers[p]).max() {
                layers[n] = max_parent + 1;
            }
        }

        // ancestors(n) = union over parents p of {p} + ancestors(p),
        // accumulated in topological order so parents are always done first
        let mut ancestors: Vec<Vec<usize>> = vec![Vec::new(); specs.len()];
        for &n in &topo {
            let mut seen: Vec<bool> = vec![false; specs.len()];
            let mut set = Vec::new();
            for &p in &parents[n] {
                for &a in ancestors[p].iter().chain(std::iter::once(&p)) {
                    if !seen[a] {
                        seen[a] = true;
                        set.push(a);
                    }
                }
            }
            set.sort_unstable();
            ancestors[n] = set;
        }

        let nodes = specs
            .into_iter()
            .enumerate()
            .map(|(i, spec)| Node {
                label: spec.label,
                scorer: spec.scorer,
                indicator: spec.indicator,
                layer: layers[i],
            })
            .collect::<Vec<_>>();

        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            depth = layers.iter().max().copied().unwrap_or(0),
            "built hierarchical reward graph"
        );

        Ok(Self {
            nodes,
            index,
            parents,
            topo,
            ancestors,
        })
    }

    /// Build from a declarative configuration, flattening its
    /// parent -> children topology into an edge list.
    pub fn from_config(config: &dyn GraphRewardConfig) -> Result<Self, ValidationError> {
        let mut edges = Vec::new();
        for (parent, children) in config.topology() {
            for child in children {
                edges.push((parent.clone(), child));
            }
        }
        Self::new(config.nodes(), &edges)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node labels in insertion order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.label.as_str())
    }

    /// Labels in an order where every edge points forward. Ties between
    /// unrelated nodes are broken by insertion order, so the order is
    /// deterministic for a given configuration.
    pub fn topological_order(&self) -> impl Iterator<Item = &str> {
        self.topo.iter().map(|&n| self.nodes[n].label.as_str())
    }

    /// Longest-path distance from a root, or `None` for an unknown label.
    pub fn layer(&self, label: &str) -> Option<usize> {
        self.index.get(label).map(|&n| self.nodes[n].layer)
    }

    /// All nodes with a directed path to `label`, not just direct parents.
    pub fn ancestors(&self, label: &str) -> Option<impl Iterator<Item = &str>> {
        self.index
            .get(label)
            .map(|&n| self.ancestors[n].iter().map(|&a| self.nodes[a].label.as_str()))
    }

    pub(crate) fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    pub(crate) fn ancestor_ids(&self, id: usize) -> &[usize] {
        &self.ancestors[id]
    }

    /// Direct predecessors of `label`, or `None` for an unknown label.
    pub fn parents(&self, label: &str) -> Option<impl Iterator<Item = &str>> {
        self.index
            .get(label)
            .map(|&n| self.parents[n].iter().map(|&p| self.nodes[p].label.as_str()))
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Kahn's algorithm with a stable insertion-order frontier. Any node left
/// unplaced when the frontier drains sits on a cycle.
fn topological_order(
    specs: &[NodeSpec],
    children: &[Vec<usize>],
    parents: &[Vec<usize>],
) -> Result<Vec<usize>, ValidationError> {
    let mut in_degree: Vec<usize> = parents.iter().map(Vec::len).collect();
    let mut frontier: Vec<usize> = (0..specs.len()).filter(|&n| in_degree[n] == 0).collect();
    let mut order = Vec::with_capacity(specs.len());

    let mut cursor = 0;
    while cursor < frontier.len() {
        let n = frontier[cursor];
        cursor += 1;
        order.push(n);
        for &c in &children[n] {
            in_degree[c] -= 1;
            if in_degree[c] == 0 {
                frontier.push(c);
            }
        }
    }

    if order.len() != specs.len() {
        // every unplaced node retains positive in-degree and sits on a cycle
        let stuck = (0..specs.len()).find(|&n| in_degree[n] > 0).unwrap_or(0);
        return Err(ValidationError::CycleDetected(specs[stuck].label.clone()));
    }
    Ok(order)
}
