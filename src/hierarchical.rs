//! Two-stage abstract/concrete search.
//!
//! The first stage grounds the phrase tree in the small rule space, which
//! holds only symbolic values (types, colors, relations, numbers). Every
//! stage-1 solution implies a reduced symbol dictionary; the second stage
//! regenerates a full search space from each distinct reduced dictionary and
//! searches it. Stage-2 scores are weighted by the probability of the
//! dictionary they came from and the union is ranked again.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::FastHasher;
use crate::beam::Ranked;
use crate::error::{GroundingError, Result};
use crate::grounding::Grounding;
use crate::interface::{search_in, SearchOptions};
use crate::oracle::ScoringOracle;
use crate::phrase::PhraseTree;
use crate::space::{generate_rule_space, Scope};
use crate::symbols::SymbolDictionary;
use crate::world::World;

/// A reduced dictionary and the summed probability of the stage-1 solutions
/// that implied it.
#[derive(Clone, PartialEq, Debug)]
pub struct Hypothesis {
    pub probability: f64,
    pub dictionary: SymbolDictionary,
}

/// Scrapes one dictionary per stage-1 solution and merges identical ones,
/// keeping the order in which each dictionary was first seen. Classes are
/// restricted to those the original dictionary names.
pub fn infer_dictionaries(rules: &[Ranked], original: &SymbolDictionary) -> Vec<Hypothesis> {
    let mut hypotheses: Vec<Hypothesis> = Vec::new();
    let mut seen: HashMap<SymbolDictionary, usize, FastHasher> = HashMap::default();
    for ranked in rules {
        let dictionary = SymbolDictionary::scrape(&ranked.tree).restrict_classes(original);
        match seen.get(&dictionary) {
            Some(&at) => hypotheses[at].probability += ranked.probability,
            None => {
                seen.insert(dictionary.clone(), hypotheses.len());
                hypotheses.push(Hypothesis {
                    probability: ranked.probability,
                    dictionary,
                });
            }
        }
    }
    hypotheses
}

/// Grounds a phrase tree in two stages. Stage-1 solutions that imply the same
/// reduced dictionary are searched once, weighted by the sum of their
/// probabilities, so each concrete tree appears once per distinct dictionary
/// rather than once per stage-1 solution.
pub fn hierarchical_search<O: ScoringOracle + ?Sized>(
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
    let rule_space = generate_rule_space(dictionary);
    let rule_options = SearchOptions {
        beam_width: options.rule_beam_width,
        ..options.clone()
    };
    let rules = search_in(tree, world, &rule_space, oracle, &rule_options, context)?;
    let hypotheses = infer_dictionaries(&rules, dictionary);
    info!(
        rule_solutions = rules.len(),
        dictionaries = hypotheses.len(),
        "rule stage complete"
    );

    let generator = options.generator(Scope::All);
    let mut ranked = Vec::new();
    for hypothesis in &hypotheses {
        let space = generator.generate(&hypothesis.dictionary, world);
        debug!(
            candidates = space.len(),
            weight = hypothesis.probability,
            "searching reduced space"
        );
        for solution in search_in(tree, world, &space, oracle, options, context)? {
            ranked.push(Ranked {
                probability: solution.probability * hypothesis.probability,
                tree: solution.tree,
            });
        }
    }
    ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    Ok(ranked)
}
