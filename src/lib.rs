//! Groundsearch – grounding natural-language phrase trees in a world model.
//!
//! Given a parsed instruction (a [`phrase::PhraseTree`]), a [`world::World`]
//! of typed, colored objects and a [`symbols::SymbolDictionary`] of legal
//! symbolic values, groundsearch finds the most probable *groundings* for
//! every phrase: which object, region, group of objects or placement
//! constraint each phrase denotes.
//!
//! ## Pipeline
//! * [`space`] – expands the dictionary and world into a search space of
//!   candidate [`grounding::Grounding`]s per grounding class.
//! * [`factor`] – mirrors the phrase tree as a factor graph; every factor
//!   observes the slice of the space its phrase category may denote.
//! * [`oracle`] – the probabilistic model behind the [`oracle::ScoringOracle`]
//!   trait, scoring one candidate's correspondence variable at a time.
//! * [`beam`] – bottom-up beam search over the factor graph, producing a ranked
//!   list of freshly built [`phrase::GroundedPhrase`] trees.
//! * [`hierarchical`] – a two-stage variant that first grounds the tree in
//!   symbolic rules, then searches the spaces those rules imply.
//!
//! ## Quick Start
//! ```
//! use groundsearch::grounding::attr;
//! use groundsearch::interface::{search, SearchOptions};
//! use groundsearch::oracle::Uniform;
//! use groundsearch::phrase::{Category, Phrase, PhraseTree};
//! use groundsearch::symbols::SymbolDictionary;
//! use groundsearch::world::{Object, Pose, World};
//!
//! let world = World::new()
//!     .with(Object::new("a", "block", "red", Pose::default()))
//!     .with(Object::new("b", "block", "blue", Pose::default()));
//! let dictionary = SymbolDictionary::new()
//!     .with_class("object")
//!     .with_strings(attr::OBJECT_TYPE, ["block"]);
//! let mut tree = PhraseTree::new();
//! tree.add_root(Phrase::new(Category::NounPhrase).word("NN", "block"));
//! let ranked = search(&tree, &world, &dictionary, &Uniform, &SearchOptions::new(4), None).unwrap();
//! assert_eq!(ranked.len(), 4);
//! ```

use std::hash::BuildHasherDefault;

use seahash::SeaHasher;

pub mod beam;
pub mod config;
pub mod error;
pub mod factor;
pub mod grounding;
pub mod hierarchical;
pub mod interface;
pub mod oracle;
pub mod phrase;
pub mod space;
pub mod symbols;
pub mod world;

pub use error::{GroundingError, Result};

/// Deterministic hashing for internal maps.
pub(crate) type FastHasher = BuildHasherDefault<SeaHasher>;
