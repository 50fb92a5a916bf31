//! Score and indicator functions, normalization and aggregation wrappers

use std::sync::Arc;

use crate::error::{ConfigurationError, EvalError};
use crate::state::{Info, State, Step};

/// A score function `s: S -> R` over an evaluation step.
pub trait Scorer: Send + Sync {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError>;
}

/// A satisfaction function `v: S -> B` over an evaluation step.
pub trait Indicator: Send + Sync {
    fn holds(&self, step: &Step<'_>) -> Result<bool, EvalError>;
}

impl<F> Scorer for F
where
    F: Fn(&Step<'_>) -> Result<f64, EvalError> + Send + Sync,
{
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        self(step)
    }
}

impl<F> Indicator for F
where
    F: Fn(&Step<'_>) -> Result<bool, EvalError> + Send + Sync,
{
    fn holds(&self, step: &Step<'_>) -> Result<bool, EvalError> {
        self(step)
    }
}

/// Shared handle to a score function. One raw scorer commonly backs both a
/// node's normalized score and its threshold indicator.
pub type SharedScorer = Arc<dyn Scorer>;

/// Shared handle to an indicator function.
pub type SharedIndicator = Arc<dyn Indicator>;

/// Fixed-value score. Conditional nodes that exist purely to gate their
/// descendants carry `ConstantScore(0.0)`.
pub struct ConstantScore(pub f64);

impl Scorer for ConstantScore {
    fn score(&self, _step: &Step<'_>) -> Result<f64, EvalError> {
        Ok(self.0)
    }
}

/// Fixed-value indicator.
pub struct ConstantIndicator(pub bool);

impl Indicator for ConstantIndicator {
    fn holds(&self, _step: &Step<'_>) -> Result<bool, EvalError> {
        Ok(self.0)
    }
}

/// Affine remap of a raw score into [0, 1], clamped at both ends so the
/// output stays bounded even when the raw score exceeds the calibration
/// bounds (some quantities, like a randomized obstacle position, have no
/// analytically known range and are calibrated with surrogates).
pub struct NormalizedScore {
    inner: SharedScorer,
    min_r: f64,
    max_r: f64,
}

impl NormalizedScore {
    pub fn new(inner: SharedScorer, min_r: f64, max_r: f64) -> Result<Self, ConfigurationError> {
        if min_r == max_r {
            return Err(ConfigurationError::DegenerateBounds(min_r));
        }
        Ok(Self { inner, min_r, max_r })
    }

    /// Derive bounds by evaluating the raw scorer at caller-supplied
    /// worst-case and best-case boundary states.
    pub fn calibrated(
        inner: SharedScorer,
        worst: &State,
        best: &State,
        info: &Info,
    ) -> Result<Self, ConfigurationError> {
        let min_r = inner.score(&Step::at_state(worst, info))?;
        let max_r = inner.score(&Step::at_state(best, info))?;
        Self::new(inner, min_r, max_r)
    }
}

impl Scorer for NormalizedScore {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        let raw = self.inner.score(step)?;
        let norm = (raw - self.min_r) / (self.max_r - self.min_r);
        Ok(norm.clamp(0.0, 1.0))
    }
}

/// Boolean satisfaction derived from a score function: holds iff the raw
/// score is at or above (strictly above, when `include_zero` is false) the
/// threshold. `negate` inverts the result, used for the infeasible branch
/// of a conditional pair.
pub struct ThresholdIndicator {
    inner: SharedScorer,
    threshold: f64,
    include_zero: bool,
    negate: bool,
}

impl ThresholdIndicator {
    pub fn new(inner: SharedScorer) -> Self {
        Self {
            inner,
            threshold: 0.0,
            include_zero: true,
            negate: false,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn exclude_zero(mut self) -> Self {
        self.include_zero = false;
        self
    }

    pub fn negated(mut self) -> Self {
        self.negate = true;
        self
    }
}

impl Indicator for ThresholdIndicator {
    fn holds(&self, step: &Step<'_>) -> Result<bool, EvalError> {
        let raw = self.inner.score(step)?;
        let sat = if self.include_zero {
            raw >= self.threshold
        } else {
            raw > self.threshold
        };
        Ok(sat != self.negate)
    }
}

/// Weakest-link conjunction of continuous scores.
pub struct MinAggregator {
    parts: Vec<SharedScorer>,
}

impl MinAggregator {
    pub fn new(parts: Vec<SharedScorer>) -> Result<Self, ConfigurationError> {
        if parts.is_empty() {
            return Err(ConfigurationError::EmptyAggregate);
        }
        Ok(Self { parts })
    }
}

impl Scorer for MinAggregator {
    fn score(&self, step: &Step<'_>) -> Result<f64, EvalError> {
        let mut min = f64::INFINITY;
        for part in &self.parts {
            min = min.min(part.score(step)?);
        }
        Ok(min)
    }
}

/// Conjunction of indicators: holds only if every part holds.
pub struct ProdAggregator {
    parts: Vec<SharedIndicator>,
}

impl ProdAggregator {
    pub fn new(parts: Vec<SharedIndicator>) -> Result<Self, ConfigurationError> {
        if parts.is_empty() {
            return Err(ConfigurationError::EmptyAggregate);
        }
        Ok(Self { parts })
    }
}

impl Indicator for ProdAggregator {
    fn holds(&self, step: &Step<'_>) -> Result<bool, EvalError> {
        for part in &self.parts {
            if !part.holds(step)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
