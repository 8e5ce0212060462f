//! Beam search over a factor graph.
//!
//! Factors are resolved bottom-up: a factor becomes ready once all of its
//! children are resolved, and the first ready factor in graph order is
//! resolved next. Resolving a factor walks its slots in order; for every slot
//! each retained partial solution is branched over the slot's correspondence
//! domain, each branch is weighted by the oracle's probability for that value,
//! and the branches are stably sorted and cut back to the beam width. Ties
//! therefore keep insertion order and repeated searches rank identically.
//!
//! Because every branch multiplies in a probability no larger than one, the
//! best score in the beam never increases as more values are resolved.

use std::time::{Duration, Instant};

use roaring::RoaringBitmap;
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::error::{GroundingError, Result};
use crate::factor::{FactorGraph, FactorId};
use crate::grounding::{Cv, Denotation, Grounding};
use crate::interface::SearchOptions;
use crate::oracle::{checked_score, ScoreRequest, ScoringOracle};
use crate::phrase::GroundedPhrase;
use crate::world::World;

// ------------- Solutions -------------
/// A (partial) assignment of correspondence values to every factor slot.
#[derive(Clone, PartialEq, Debug)]
pub struct Solution {
    pub probability: f64,
    /// Values per factor id, one per slot once the factor is resolved.
    pub assignments: Vec<Vec<Cv>>,
    /// Factor ids in the order they were resolved.
    pub order: Vec<FactorId>,
}

impl Solution {
    fn empty(factors: usize) -> Self {
        Self {
            probability: 1.0,
            assignments: vec![Vec::new(); factors],
            order: Vec::new(),
        }
    }
}

/// A fully grounded phrase tree and its probability.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Ranked {
    pub probability: f64,
    pub tree: GroundedPhrase,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize)]
pub struct SearchStats {
    /// Factors resolved.
    pub steps: usize,
    /// Slots branched over.
    pub expansions: usize,
    pub oracle_calls: u64,
    /// Largest beam retained after any expansion.
    pub max_beam: usize,
    /// Best probability in the beam after each expansion.
    pub top_scores: Vec<f64>,
    pub elapsed: Duration,
}

#[derive(Clone, Debug)]
pub struct SearchOutcome {
    pub solutions: Vec<Solution>,
    pub stats: SearchStats,
}

impl SearchOutcome {
    /// Materialises a grounded phrase tree for every retained solution.
    pub fn rank(&self, graph: &FactorGraph<'_>) -> Vec<Ranked> {
        self.solutions
            .iter()
            .map(|solution| Ranked {
                probability: solution.probability,
                tree: graph.ground(&solution.assignments),
            })
            .collect()
    }
}

// ------------- BeamSearch -------------
pub struct BeamSearch<'s, O: ?Sized> {
    graph: &'s FactorGraph<'s>,
    world: &'s World,
    oracle: &'s O,
    options: &'s SearchOptions,
    context: Option<&'s Grounding>,
}

impl<'s, O: ScoringOracle + ?Sized> BeamSearch<'s, O> {
    pub fn new(
        graph: &'s FactorGraph<'s>,
        world: &'s World,
        oracle: &'s O,
        options: &'s SearchOptions,
    ) -> Self {
        Self {
            graph,
            world,
            oracle,
            options,
            context: None,
        }
    }
    pub fn context(mut self, context: Option<&'s Grounding>) -> Self {
        self.context = context;
        self
    }

    pub fn run(&self) -> Result<SearchOutcome> {
        let width = self.options.beam_width;
        if width == 0 {
            return Err(GroundingError::InvalidBeamWidth);
        }
        let started = Instant::now();
        let mut stats = SearchStats::default();
        let mut beam = vec![Solution::empty(self.graph.len())];
        let mut resolved = RoaringBitmap::new();

        while let Some(id) = self.next_ready(&resolved) {
            stats.steps += 1;
            let factor = self.graph.factor_at(id);
            let phrase = self.graph.phrase_at(id);
            debug!(
                factor = id,
                category = %phrase.category(),
                slots = factor.slots().len(),
                beam = beam.len(),
                "resolving factor"
            );
            if factor.is_empty() {
                debug!(factor = id, "empty domain, resolved without branching");
            }
            for slot in factor.slots() {
                let domain = slot.arity();
                let candidate = self.graph.grounding_at(slot);
                let mut branches = Vec::with_capacity(beam.len() * domain.len());
                for solution in &beam {
                    self.check_budget(&stats, started)?;
                    let children: Vec<Vec<Denotation>> = factor
                        .children()
                        .iter()
                        .map(|&child| self.graph.denotations(child, &solution.assignments[child]))
                        .collect();
                    let request = ScoreRequest {
                        phrase,
                        class: slot.class,
                        candidate,
                        domain,
                        children: &children,
                        world: self.world,
                        context: self.context,
                    };
                    let probabilities = checked_score(self.oracle, &request)?;
                    stats.oracle_calls += 1;
                    for (&cv, probability) in domain.domain().iter().zip(probabilities) {
                        let mut branch = solution.clone();
                        branch.assignments[id].push(cv);
                        branch.probability *= probability;
                        branches.push(branch);
                    }
                }
                // sort_by is stable, equal scores keep insertion order
                branches.sort_by(|a, b| b.probability.total_cmp(&a.probability));
                branches.truncate(width);
                beam = branches;
                stats.expansions += 1;
                stats.max_beam = stats.max_beam.max(beam.len());
                let top = beam.first().map_or(0.0, |s| s.probability);
                stats.top_scores.push(top);
                trace!(factor = id, candidate = %candidate, beam = beam.len(), top, "expanded slot");
            }
            for solution in &mut beam {
                solution.order.push(id);
            }
            resolved.insert(id as u32);
        }

        stats.elapsed = started.elapsed();
        info!(
            factors = self.graph.len(),
            solutions = beam.len(),
            oracle_calls = stats.oracle_calls,
            ms = stats.elapsed.as_secs_f64() * 1000.0,
            "beam search complete"
        );
        Ok(SearchOutcome {
            solutions: beam,
            stats,
        })
    }

    /// The first unresolved factor, in graph order, whose children are all
    /// resolved.
    fn next_ready(&self, resolved: &RoaringBitmap) -> Option<FactorId> {
        (0..self.graph.len()).find(|&id| {
            !resolved.contains(id as u32)
                && self
                    .graph
                    .factor_at(id)
                    .children()
                    .iter()
                    .all(|&child| resolved.contains(child as u32))
        })
    }

    fn check_budget(&self, stats: &SearchStats, started: Instant) -> Result<()> {
        if self
            .options
            .cancel
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
        {
            warn!(oracle_calls = stats.oracle_calls, "search cancelled");
            return Err(GroundingError::Cancelled);
        }
        let over_calls = self
            .options
            .max_oracle_calls
            .is_some_and(|max| stats.oracle_calls >= max);
        let over_time = self
            .options
            .time_budget
            .is_some_and(|budget| started.elapsed() >= budget);
        if over_calls || over_time {
            let elapsed_ms = started.elapsed().as_millis();
            warn!(oracle_calls = stats.oracle_calls, elapsed_ms, "search budget exhausted");
            return Err(GroundingError::BudgetExhausted {
                oracle_calls: stats.oracle_calls,
                elapsed_ms,
            });
        }
        Ok(())
    }
}
