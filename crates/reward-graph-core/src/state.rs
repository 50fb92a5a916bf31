//! Environment state and transition types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-episode constants captured by the environment (limits, targets,
/// tolerances). Scorers read these instead of closing over magic numbers.
pub type Info = HashMap<String, f64>;

/// Environment state at a single simulation tick.
///
/// Environments either expose a fixed-order numeric vector or a mapping
/// from named physical quantities to values. The graph core does not
/// interpret the contents; scorers and the environment must agree on the
/// representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum State {
    /// Raw vector state
    Vector(Vec<f64>),
    /// Named physical quantities
    Named(HashMap<String, f64>),
}

impl State {
    /// Look up a named quantity. Returns `None` for vector states.
    pub fn get(&self, name: &str) -> Option<f64> {
        match self {
            State::Named(map) => map.get(name).copied(),
            State::Vector(_) => None,
        }
    }

    /// Look up a vector component. Returns `None` for named states.
    pub fn at(&self, index: usize) -> Option<f64> {
        match self {
            State::Vector(v) => v.get(index).copied(),
            State::Named(_) => None,
        }
    }
}

impl From<Vec<f64>> for State {
    fn from(v: Vec<f64>) -> Self {
        State::Vector(v)
    }
}

impl From<HashMap<String, f64>> for State {
    fn from(map: HashMap<String, f64>) -> Self {
        State::Named(map)
    }
}

/// One environment step: the unit of reward evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    /// State before the action
    pub state: State,

    /// Action taken, if the reward depends on it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Vec<f64>>,

    /// State after the action
    pub next_state: State,

    /// Per-episode constants
    #[serde(default)]
    pub info: Info,

    /// Episode terminated on this transition
    #[serde(default)]
    pub done: bool,
}

impl Transition {
    /// View of this transition anchored at its starting state.
    pub fn step(&self) -> Step<'_> {
        Step {
            state: &self.state,
            action: self.action.as_deref(),
            next_state: &self.next_state,
            info: &self.info,
        }
    }

    /// View of this transition anchored at its successor state. Used by
    /// potential-based shaping to evaluate the same functions at both
    /// endpoints of the transition.
    pub fn step_at_next(&self) -> Step<'_> {
        Step {
            state: &self.next_state,
            action: self.action.as_deref(),
            next_state: &self.next_state,
            info: &self.info,
        }
    }
}

/// Borrowed evaluation view handed to scorers and indicators.
#[derive(Debug, Clone, Copy)]
pub struct Step<'a> {
    pub state: &'a State,
    pub action: Option<&'a [f64]>,
    pub next_state: &'a State,
    pub info: &'a Info,
}

impl<'a> Step<'a> {
    /// Evaluation view of a single state, with the state standing in for
    /// its own successor. Used when calibrating normalization bounds from
    /// boundary states.
    pub fn at_state(state: &'a State, info: &'a Info) -> Self {
        Step {
            state,
            action: None,
            next_state: state,
            info,
        }
    }

    /// Named quantity from the info map.
    pub fn constant(&self, name: &str) -> Option<f64> {
        self.info.get(name).copied()
    }
}
