//! Phrase trees, before and after grounding.
//!
//! A [`PhraseTree`] is an arena of [`Phrase`] nodes addressed by
//! [`PhraseId`]. Parsing text into such a tree happens elsewhere; search
//! only reads the structure. Grounding results are returned as freshly built
//! [`GroundedPhrase`] trees, the input tree is never mutated.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GroundingError, Result};
use crate::grounding::Denotation;

pub type PhraseId = usize;

// ------------- Category -------------
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    NounPhrase,
    PrepositionalPhrase,
    VerbPhrase,
    AdjectivePhrase,
    AdverbPhrase,
    Particle,
    Sentence,
    Other(String),
}

impl Category {
    pub fn tag(&self) -> &str {
        match self {
            Category::NounPhrase => "NP",
            Category::PrepositionalPhrase => "PP",
            Category::VerbPhrase => "VP",
            Category::AdjectivePhrase => "ADJP",
            Category::AdverbPhrase => "ADVP",
            Category::Particle => "PRT",
            Category::Sentence => "S",
            Category::Other(tag) => tag,
        }
    }
}
impl FromStr for Category {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "NP" => Category::NounPhrase,
            "PP" => Category::PrepositionalPhrase,
            "VP" => Category::VerbPhrase,
            "ADJP" => Category::AdjectivePhrase,
            "ADVP" => Category::AdverbPhrase,
            "PRT" => Category::Particle,
            "S" => Category::Sentence,
            other => Category::Other(other.to_string()),
        })
    }
}
impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ------------- Word -------------
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Word {
    pub pos: String,
    pub text: String,
}

impl Word {
    pub fn new(pos: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            pos: pos.into(),
            text: text.into(),
        }
    }
}

// ------------- Phrase -------------
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Phrase {
    category: Category,
    #[serde(default)]
    words: Vec<Word>,
    #[serde(default)]
    children: Vec<PhraseId>,
}

impl Phrase {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            words: Vec::new(),
            children: Vec::new(),
        }
    }
    pub fn word(mut self, pos: impl Into<String>, text: impl Into<String>) -> Self {
        self.words.push(Word::new(pos, text));
        self
    }
    pub fn child(mut self, child: PhraseId) -> Self {
        self.children.push(child);
        self
    }
    pub fn category(&self) -> &Category {
        &self.category
    }
    pub fn words(&self) -> &[Word] {
        &self.words
    }
    pub fn children(&self) -> &[PhraseId] {
        &self.children
    }
    /// The words of the phrase joined by spaces.
    pub fn text(&self) -> String {
        let mut s = String::new();
        for w in &self.words {
            s += &(w.text.clone() + " ");
        }
        s.pop();
        s
    }
}

// ------------- PhraseTree -------------
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PhraseTree {
    nodes: Vec<Phrase>,
    root: Option<PhraseId>,
}

impl PhraseTree {
    pub fn new() -> Self {
        Self::default()
    }
    /// Adds a phrase to the arena. Children must have been added before
    /// their parent so that their ids are known.
    pub fn add(&mut self, phrase: Phrase) -> PhraseId {
        self.nodes.push(phrase);
        self.nodes.len() - 1
    }
    pub fn set_root(&mut self, root: PhraseId) {
        self.root = Some(root);
    }
    /// Adds a phrase and makes it the root.
    pub fn add_root(&mut self, phrase: Phrase) -> PhraseId {
        let id = self.add(phrase);
        self.set_root(id);
        id
    }
    pub fn root(&self) -> Option<PhraseId> {
        self.root
    }
    pub fn get(&self, id: PhraseId) -> Option<&Phrase> {
        self.nodes.get(id)
    }
    /// Number of phrases in the arena, reachable from the root or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    /// A tree without a root has nothing to ground, whatever the arena holds.
    pub fn has_root(&self) -> bool {
        self.root.is_some()
    }
    /// Phrase ids reachable from the root, parents before children and
    /// siblings left to right. Fails if the tree is empty, a child id is
    /// dangling, or a phrase is reachable more than once.
    pub fn preorder(&self) -> Result<Vec<PhraseId>> {
        let root = self.root.ok_or(GroundingError::EmptyPhraseTree)?;
        if root >= self.nodes.len() {
            return Err(GroundingError::malformed(format!(
                "root {} is not a phrase in an arena of {}",
                root,
                self.nodes.len()
            )));
        }
        let mut seen = vec![false; self.nodes.len()];
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if seen[id] {
                return Err(GroundingError::malformed(format!(
                    "phrase {} is reachable more than once",
                    id
                )));
            }
            seen[id] = true;
            order.push(id);
            for &child in self.nodes[id].children.iter().rev() {
                if child >= self.nodes.len() {
                    return Err(GroundingError::malformed(format!(
                        "phrase {} has dangling child {}",
                        id, child
                    )));
                }
                stack.push(child);
            }
        }
        Ok(order)
    }
}

// ------------- GroundedPhrase -------------
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct GroundedPhrase {
    pub category: Category,
    pub words: Vec<Word>,
    pub denotations: Vec<Denotation>,
    pub children: Vec<GroundedPhrase>,
}

impl GroundedPhrase {
    /// All phrases of the tree, parents before children.
    pub fn walk(&self) -> Vec<&GroundedPhrase> {
        let mut order = Vec::new();
        let mut stack = vec![self];
        while let Some(phrase) = stack.pop() {
            order.push(phrase);
            for child in phrase.children.iter().rev() {
                stack.push(child);
            }
        }
        order
    }
}

impl fmt::Display for GroundedPhrase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}", self.category)?;
        for w in &self.words {
            write!(f, " {}", w.text)?;
        }
        if !self.denotations.is_empty() {
            let mut s = String::new();
            for d in &self.denotations {
                s += &(d.to_string() + ",");
            }
            s.pop();
            write!(f, " {{{}}}", s)?;
        }
        for child in &self.children {
            write!(f, " {}", child)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preorder_visits_parents_before_children() {
        let mut tree = PhraseTree::new();
        let left = tree.add(Phrase::new(Category::NounPhrase).word("NN", "block"));
        let leaf = tree.add(Phrase::new(Category::NounPhrase).word("NN", "table"));
        let right = tree.add(Phrase::new(Category::PrepositionalPhrase).word("IN", "on").child(leaf));
        let root = tree.add_root(Phrase::new(Category::VerbPhrase).child(left).child(right));
        assert_eq!(tree.preorder().expect("valid tree"), vec![root, left, right, leaf]);
    }

    #[test]
    fn empty_tree_has_no_preorder() {
        assert!(matches!(
            PhraseTree::new().preorder(),
            Err(GroundingError::EmptyPhraseTree)
        ));
    }

    #[test]
    fn phrases_without_a_root_are_not_a_tree() {
        let mut tree = PhraseTree::new();
        assert!(tree.is_empty() && !tree.has_root());
        let leaf = tree.add(Phrase::new(Category::NounPhrase));
        assert_eq!(tree.len(), 1);
        assert!(!tree.is_empty());
        assert!(!tree.has_root());
        assert!(matches!(tree.preorder(), Err(GroundingError::EmptyPhraseTree)));
        tree.set_root(leaf);
        assert!(tree.has_root());
    }

    #[test]
    fn shared_and_dangling_children_are_malformed() {
        let mut tree = PhraseTree::new();
        let leaf = tree.add(Phrase::new(Category::NounPhrase));
        tree.add_root(Phrase::new(Category::VerbPhrase).child(leaf).child(leaf));
        assert!(matches!(
            tree.preorder(),
            Err(GroundingError::MalformedPhraseTree { .. })
        ));

        let mut tree = PhraseTree::new();
        tree.add_root(Phrase::new(Category::VerbPhrase).child(7));
        assert!(matches!(
            tree.preorder(),
            Err(GroundingError::MalformedPhraseTree { .. })
        ));
    }

    #[test]
    fn categories_parse_from_tags() {
        assert_eq!("NP".parse::<Category>(), Ok(Category::NounPhrase));
        assert_eq!("WHNP".parse::<Category>(), Ok(Category::Other("WHNP".into())));
    }
}
