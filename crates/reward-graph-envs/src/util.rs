//! Shared helpers for environment scorers

use std::sync::Arc;

use reward_graph_core::{
    ConfigurationError, EvalError, Info, NormalizedScore, SharedIndicator, SharedScorer, State,
    Step, ThresholdIndicator,
};

/// Required named quantity from the state.
pub(crate) fn quantity(step: &Step<'_>, name: &str) -> Result<f64, EvalError> {
    step.state
        .get(name)
        .ok_or_else(|| EvalError::MissingQuantity(name.to_string()))
}

/// Required per-episode constant from the info map.
pub(crate) fn constant(step: &Step<'_>, name: &str) -> Result<f64, EvalError> {
    step.constant(name)
        .ok_or_else(|| EvalError::MissingConstant(name.to_string()))
}

/// Clamp `value` into `[lo, hi]` and rescale to [0, 1]. A collapsed
/// interval maps everything to 0 rather than dividing by zero.
pub(crate) fn clip_and_norm(value: f64, lo: f64, hi: f64) -> f64 {
    if hi <= lo {
        return 0.0;
    }
    ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
}

/// Calibration bounds for a normalized node.
pub(crate) enum Bounds<'a> {
    /// Known robustness range
    Explicit { min: f64, max: f64 },
    /// Range derived from worst/best-case surrogate states; needed when
    /// the true range depends on per-episode randomization
    AtStates {
        worst: &'a State,
        best: &'a State,
        info: &'a Info,
    },
}

/// Wrap one raw score function into the usual node pair: a normalized
/// score and a threshold indicator over the raw (unnormalized) value.
pub(crate) fn scored_node(
    fun: SharedScorer,
    bounds: Bounds<'_>,
    threshold: f64,
    include_zero: bool,
) -> Result<(SharedScorer, SharedIndicator), ConfigurationError> {
    let normalized = match bounds {
        Bounds::Explicit { min, max } => NormalizedScore::new(fun.clone(), min, max)?,
        Bounds::AtStates { worst, best, info } => {
            NormalizedScore::calibrated(fun.clone(), worst, best, info)?
        }
    };
    let mut indicator = ThresholdIndicator::new(fun).with_threshold(threshold);
    if !include_zero {
        indicator = indicator.exclude_zero();
    }
    Ok((Arc::new(normalized), Arc::new(indicator)))
}
