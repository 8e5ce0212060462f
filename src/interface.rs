//! Entry points for collaborators.
//!
//! Everything here is synchronous: a search call runs to completion on the
//! calling thread. Long searches can be bounded with an oracle-call or time
//! budget and stopped early from another thread through a [`CancelToken`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::debug;

use crate::beam::{BeamSearch, Ranked};
use crate::error::{GroundingError, Result};
use crate::factor::{CategoryMap, FactorGraph};
use crate::grounding::Grounding;
use crate::oracle::ScoringOracle;
use crate::phrase::PhraseTree;
use crate::space::{Scope, SearchSpace, SpaceGenerator};
use crate::symbols::SymbolDictionary;
use crate::world::World;

pub use crate::hierarchical::hierarchical_search;
pub use crate::space::generate_search_space;

/// Cancellation token shared with a running search.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }
    /// Request cancellation (cooperative). The search observes it before its
    /// next oracle call.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Search options.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub beam_width: usize,
    /// Beam width of the first stage of [`hierarchical_search`].
    pub rule_beam_width: usize,
    pub max_oracle_calls: Option<u64>,
    pub time_budget: Option<Duration>,
    pub cancel: Option<CancelToken>,
    /// Scope of the space [`search`] generates.
    pub scope: Scope,
    pub max_group_objects: usize,
    pub categories: CategoryMap,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            beam_width: 4,
            rule_beam_width: 4,
            max_oracle_calls: None,
            time_budget: None,
            cancel: None,
            scope: Scope::All,
            max_group_objects: 16,
            categories: CategoryMap::default(),
        }
    }
}

impl SearchOptions {
    pub fn new(beam_width: usize) -> Self {
        Self {
            beam_width,
            ..Self::default()
        }
    }
    pub fn rule_beam_width(mut self, width: usize) -> Self {
        self.rule_beam_width = width;
        self
    }
    pub fn max_oracle_calls(mut self, max: u64) -> Self {
        self.max_oracle_calls = Some(max);
        self
    }
    pub fn time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }
    pub fn cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }
    pub fn max_group_objects(mut self, max: usize) -> Self {
        self.max_group_objects = max;
        self
    }
    pub fn categories(mut self, categories: CategoryMap) -> Self {
        self.categories = categories;
        self
    }

    pub(crate) fn generator(&self, scope: Scope) -> SpaceGenerator {
        SpaceGenerator::new(scope).max_group_objects(self.max_group_objects)
    }
}

/// Grounds a phrase tree against a world. The search space is generated from
/// the dictionary in `options.scope`; results are ordered by descending
/// probability and hold at most `options.beam_width` trees.
pub fn search<O: ScoringOracle + ?Sized>(
    tree: &PhraseTree,
    world: &World,
    dictionary: &SymbolDictionary,
    oracle: &O,
    options: &SearchOptions,
    context: Option<&Grounding>,
) -> Result<Vec<Ranked>> {
    if !tree.has_root() {
        return Err(GroundingError::EmptyPhraseTree);
    }
    if options.beam_width == 0 {
        return Err(GroundingError::InvalidBeamWidth);
    }
    let space = options.generator(options.scope).generate(dictionary, world);
    debug!(candidates = space.len(), scope = ?options.scope, "search space generated");
    search_in(tree, world, &space, oracle, options, context)
}

/// Grounds a phrase tree in an already generated search space.
pub fn search_in<O: ScoringOracle + ?Sized>(
    tree: &PhraseTree,
    world: &World,
    space: &SearchSpace,
    oracle: &O,
    options: &SearchOptions,
    context: Option<&Grounding>,
) -> Result<Vec<Ranked>> {
    let graph = FactorGraph::build(tree, space, &options.categories)?;
    let outcome = BeamSearch::new(&graph, world, oracle, options)
        .context(context)
        .run()?;
    Ok(outcome.rank(&graph))
}
