//! Factor graphs mirror phrase trees for search.
//!
//! Every phrase reachable from the root gets exactly one [`Factor`]. A factor
//! records which candidates of the search space its phrase may denote (the
//! slice selected by the phrase category through a [`CategoryMap`]) and the
//! factors of its children. Factors refer to phrases, candidates and other
//! factors by index only; the graph borrows the tree and the search space and
//! owns nothing but its own structure.

use std::collections::HashMap;

use crate::FastHasher;
use crate::error::{GroundingError, Result};
use crate::grounding::{Cv, CvArity, Denotation, Grounding, GroundingClass};
use crate::phrase::{Category, GroundedPhrase, Phrase, PhraseId, PhraseTree};
use crate::space::SearchSpace;

pub type FactorId = usize;

// ------------- CategoryMap -------------
/// Which grounding classes a phrase of a given category can denote.
#[derive(Clone, Debug)]
pub struct CategoryMap {
    classes: HashMap<Category, Vec<GroundingClass>, FastHasher>,
}

impl CategoryMap {
    /// A map where no category observes any class.
    pub fn empty() -> Self {
        Self {
            classes: HashMap::default(),
        }
    }
    pub fn with(mut self, category: Category, classes: &[GroundingClass]) -> Self {
        self.set(category, classes);
        self
    }
    pub fn set(&mut self, category: Category, classes: &[GroundingClass]) {
        self.classes.insert(category, classes.to_vec());
    }
    pub fn classes_for(&self, category: &Category) -> &[GroundingClass] {
        self.classes.get(category).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for CategoryMap {
    fn default() -> Self {
        use GroundingClass::*;
        CategoryMap::empty()
            .with(
                Category::NounPhrase,
                &[
                    Object,
                    Container,
                    AbstractContainer,
                    ObjectProperty,
                    ObjectType,
                    ObjectColor,
                    Number,
                    Index,
                    ContainerType,
                ],
            )
            .with(
                Category::PrepositionalPhrase,
                &[Region, RegionContainer, RegionAbstractContainer, SpatialRelation],
            )
            .with(Category::VerbPhrase, &[Constraint, ConstraintType])
            .with(Category::AdjectivePhrase, &[ObjectColor, ObjectProperty, Index])
            .with(Category::AdverbPhrase, &[SpatialRelation])
            .with(Category::Particle, &[SpatialRelation])
    }
}

// ------------- Factor -------------
/// A candidate of the search space, addressed by class and position.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Slot {
    pub(crate) class: GroundingClass,
    pub(crate) index: usize,
}

impl Slot {
    pub fn class(&self) -> GroundingClass {
        self.class
    }
    pub fn index(&self) -> usize {
        self.index
    }
    pub fn arity(&self) -> CvArity {
        self.class.arity()
    }
}

#[derive(Clone, Debug)]
pub struct Factor {
    phrase: PhraseId,
    slots: Vec<Slot>,
    children: Vec<FactorId>,
}

impl Factor {
    pub fn phrase(&self) -> PhraseId {
        self.phrase
    }
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }
    pub fn children(&self) -> &[FactorId] {
        &self.children
    }
    /// A factor without candidates has an empty domain and is resolved
    /// without branching.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

// ------------- FactorGraph -------------
#[derive(Clone, Debug)]
pub struct FactorGraph<'g> {
    tree: &'g PhraseTree,
    space: &'g SearchSpace,
    factors: Vec<Factor>,
    phrases: Vec<&'g Phrase>,
}

impl<'g> FactorGraph<'g> {
    /// Builds one factor per reachable phrase. Factor ids follow the
    /// preorder of the tree, so the root factor is always `0`.
    pub fn build(
        tree: &'g PhraseTree,
        space: &'g SearchSpace,
        categories: &CategoryMap,
    ) -> Result<Self> {
        let order = tree.preorder()?;
        let mut factor_of = vec![None; tree.len()];
        for (factor, &phrase) in order.iter().enumerate() {
            factor_of[phrase] = Some(factor);
        }
        let mut factors = Vec::with_capacity(order.len());
        let mut phrases = Vec::with_capacity(order.len());
        for &phrase_id in &order {
            let phrase = tree
                .get(phrase_id)
                .ok_or_else(|| GroundingError::malformed(format!("missing phrase {}", phrase_id)))?;
            let mut slots = Vec::new();
            for &class in categories.classes_for(phrase.category()) {
                for index in 0..space.candidates(class).len() {
                    slots.push(Slot { class, index });
                }
            }
            let mut children = Vec::with_capacity(phrase.children().len());
            for &child in phrase.children() {
                let factor = factor_of[child].ok_or_else(|| {
                    GroundingError::malformed(format!("phrase {} was not reached", child))
                })?;
                children.push(factor);
            }
            factors.push(Factor {
                phrase: phrase_id,
                slots,
                children,
            });
            phrases.push(phrase);
        }
        Ok(Self {
            tree,
            space,
            factors,
            phrases,
        })
    }

    pub fn root(&self) -> FactorId {
        0
    }
    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }
    pub fn factor(&self, id: FactorId) -> Option<&Factor> {
        self.factors.get(id)
    }
    pub fn len(&self) -> usize {
        self.factors.len()
    }
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
    pub fn tree(&self) -> &'g PhraseTree {
        self.tree
    }
    pub fn space(&self) -> &'g SearchSpace {
        self.space
    }
    pub fn phrase(&self, id: FactorId) -> Option<&'g Phrase> {
        self.phrases.get(id).copied()
    }
    /// The candidate a slot addresses, if the slot belongs to this graph's
    /// search space.
    pub fn grounding(&self, slot: &Slot) -> Option<&'g Grounding> {
        self.space.candidate(slot.class, slot.index)
    }

    // Ids and slots handed out by the graph itself are always in range.
    pub(crate) fn factor_at(&self, id: FactorId) -> &Factor {
        &self.factors[id]
    }
    pub(crate) fn phrase_at(&self, id: FactorId) -> &'g Phrase {
        self.phrases[id]
    }
    pub(crate) fn grounding_at(&self, slot: &Slot) -> &'g Grounding {
        &self.space.candidates(slot.class)[slot.index]
    }

    /// The denotation set a factor gets from one assignment of its slots.
    /// Slots without an assignment count as `False`; unknown ids denote
    /// nothing.
    pub fn denotations(&self, id: FactorId, cvs: &[Cv]) -> Vec<Denotation> {
        let Some(factor) = self.factors.get(id) else {
            return Vec::new();
        };
        factor
            .slots
            .iter()
            .zip(cvs.iter())
            .filter(|(_, cv)| cv.denotes())
            .map(|(slot, cv)| Denotation::new(self.grounding_at(slot).clone(), *cv))
            .collect()
    }

    /// Builds a new grounded phrase tree from per-factor assignments.
    pub fn ground(&self, assignments: &[Vec<Cv>]) -> GroundedPhrase {
        self.ground_factor(self.root(), assignments)
    }

    fn ground_factor(&self, id: FactorId, assignments: &[Vec<Cv>]) -> GroundedPhrase {
        let phrase = self.phrase_at(id);
        let cvs = assignments.get(id).map(Vec::as_slice).unwrap_or(&[]);
        GroundedPhrase {
            category: phrase.category().clone(),
            words: phrase.words().to_vec(),
            denotations: self.denotations(id, cvs),
            children: self.factors[id]
                .children
                .iter()
                .map(|&child| self.ground_factor(child, assignments))
                .collect(),
        }
    }

    /// Recovers the per-factor assignments a grounded tree encodes. The tree
    /// must have the shape of this graph.
    pub fn assignments_of(&self, grounded: &GroundedPhrase) -> Result<Vec<Vec<Cv>>> {
        let phrases = grounded.walk();
        if phrases.len() != self.factors.len() {
            return Err(GroundingError::malformed(format!(
                "grounded tree has {} phrases, factor graph has {}",
                phrases.len(),
                self.factors.len()
            )));
        }
        let mut assignments = Vec::with_capacity(self.factors.len());
        for (factor, phrase) in self.factors.iter().zip(phrases) {
            if phrase.children.len() != factor.children.len() {
                return Err(GroundingError::malformed(format!(
                    "phrase {} has {} children in the grounded tree",
                    factor.phrase,
                    phrase.children.len()
                )));
            }
            let cvs = factor
                .slots
                .iter()
                .map(|slot| {
                    let grounding = self.grounding_at(slot);
                    phrase
                        .denotations
                        .iter()
                        .find(|d| &d.grounding == grounding)
                        .map_or(Cv::False, |d| d.cv)
                })
                .collect();
            assignments.push(cvs);
        }
        Ok(assignments)
    }
}
