//! Scoring oracles.
//!
//! Search treats the probabilistic model as a black box behind
//! [`ScoringOracle`]: given a phrase, one candidate grounding and the
//! groundings already resolved for the phrase's children, it returns one
//! probability per value of the candidate's correspondence variable domain.
//!
//! Two oracles are provided. [`Uniform`] is the uninformed baseline.
//! [`LogLinear`] evaluates a log-linear model over externally supplied
//! features and weights; how weights are learned is not this crate's
//! concern.

use crate::error::{GroundingError, Result};
use crate::grounding::{Cv, CvArity, Denotation, Grounding, GroundingClass};
use crate::phrase::Phrase;
use crate::world::World;

/// Everything an oracle may look at when scoring one candidate.
#[derive(Clone, Copy, Debug)]
pub struct ScoreRequest<'r> {
    pub phrase: &'r Phrase,
    pub class: GroundingClass,
    pub candidate: &'r Grounding,
    pub domain: CvArity,
    /// Resolved denotation sets, one per child phrase in order.
    pub children: &'r [Vec<Denotation>],
    pub world: &'r World,
    pub context: Option<&'r Grounding>,
}

impl ScoreRequest<'_> {
    /// All child denotations, flattened.
    pub fn child_groundings(&self) -> impl Iterator<Item = &Denotation> {
        self.children.iter().flatten()
    }
}

pub trait ScoringOracle {
    /// Probabilities for each value of `request.domain`, in domain order.
    fn score(&self, request: &ScoreRequest<'_>) -> Result<Vec<f64>>;
}

impl<F> ScoringOracle for F
where
    F: Fn(&ScoreRequest<'_>) -> Result<Vec<f64>>,
{
    fn score(&self, request: &ScoreRequest<'_>) -> Result<Vec<f64>> {
        self(request)
    }
}

/// Rejects answers that would corrupt the ranking instead of defaulting them.
pub(crate) fn checked_score<O: ScoringOracle + ?Sized>(
    oracle: &O,
    request: &ScoreRequest<'_>,
) -> Result<Vec<f64>> {
    let probabilities = oracle.score(request)?;
    if probabilities.len() != request.domain.len() {
        return Err(GroundingError::oracle(format!(
            "expected {} probabilities for {}, got {}",
            request.domain.len(),
            request.candidate,
            probabilities.len()
        )));
    }
    if let Some(p) = probabilities
        .iter()
        .find(|p| !p.is_finite() || **p < 0.0 || **p > 1.0)
    {
        return Err(GroundingError::oracle(format!(
            "probability {} for {} is outside [0, 1]",
            p, request.candidate
        )));
    }
    Ok(probabilities)
}

// ------------- Uniform -------------
/// Every value of every domain is equally likely.
#[derive(Clone, Copy, Debug, Default)]
pub struct Uniform;

impl ScoringOracle for Uniform {
    fn score(&self, request: &ScoreRequest<'_>) -> Result<Vec<f64>> {
        let n = request.domain.len();
        Ok(vec![1.0 / n as f64; n])
    }
}

// ------------- LogLinear -------------
/// A feature evaluated for one hypothesised correspondence value.
pub trait Feature {
    fn name(&self) -> &str;
    fn value(&self, cv: Cv, request: &ScoreRequest<'_>) -> f64;
}

/// Fires whenever the hypothesised value equals `cv`.
#[derive(Clone, Debug)]
pub struct Bias {
    name: String,
    cv: Cv,
}

impl Bias {
    pub fn new(cv: Cv) -> Self {
        Self {
            name: format!("bias_{}", cv),
            cv,
        }
    }
}

impl Feature for Bias {
    fn name(&self) -> &str {
        &self.name
    }
    fn value(&self, cv: Cv, _request: &ScoreRequest<'_>) -> f64 {
        if cv == self.cv { 1.0 } else { 0.0 }
    }
}

/// A feature backed by a closure.
pub struct FnFeature<F> {
    name: String,
    function: F,
}

impl<F> FnFeature<F>
where
    F: Fn(Cv, &ScoreRequest<'_>) -> f64,
{
    pub fn new(name: impl Into<String>, function: F) -> Self {
        Self {
            name: name.into(),
            function,
        }
    }
}

impl<F> Feature for FnFeature<F>
where
    F: Fn(Cv, &ScoreRequest<'_>) -> f64,
{
    fn name(&self) -> &str {
        &self.name
    }
    fn value(&self, cv: Cv, request: &ScoreRequest<'_>) -> f64 {
        (self.function)(cv, request)
    }
}

/// p(cv) = exp(w · f(cv)) / Σ exp(w · f(cv')) over the candidate's domain.
#[derive(Default)]
pub struct LogLinear {
    features: Vec<Box<dyn Feature>>,
    weights: Vec<f64>,
}

impl LogLinear {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn feature(mut self, feature: impl Feature + 'static, weight: f64) -> Self {
        self.features.push(Box::new(feature));
        self.weights.push(weight);
        self
    }
    /// Replaces all weights at once, e.g. with weights trained elsewhere.
    pub fn set_weights(&mut self, weights: Vec<f64>) -> Result<()> {
        if weights.len() != self.features.len() {
            return Err(GroundingError::oracle(format!(
                "{} weights given for {} features",
                weights.len(),
                self.features.len()
            )));
        }
        self.weights = weights;
        Ok(())
    }
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.name())
    }
}

impl ScoringOracle for LogLinear {
    fn score(&self, request: &ScoreRequest<'_>) -> Result<Vec<f64>> {
        let potentials: Vec<f64> = request
            .domain
            .domain()
            .iter()
            .map(|&cv| {
                self.features
                    .iter()
                    .zip(self.weights.iter())
                    .map(|(feature, weight)| weight * feature.value(cv, request))
                    .sum::<f64>()
            })
            .collect();
        // subtract the maximum so exp never overflows
        let max = potentials.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return Err(GroundingError::oracle(format!(
                "non-finite potential for {}",
                request.candidate
            )));
        }
        let exps: Vec<f64> = potentials.iter().map(|p| (p - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        Ok(exps.into_iter().map(|e| e / total).collect())
    }
}
