//! Symbol dictionaries bound candidate generation.
//!
//! A [`SymbolDictionary`] names the grounding classes that may be used for an
//! instruction and, per attribute, the finite set of legal values. String
//! attributes (types, colors, relations) and integer attributes (numbers,
//! indices) are kept apart. Everything is ordered, so iterating a dictionary
//! is deterministic and dictionaries can be hashed and compared.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::grounding::{attr, Grounding, GroundingClass};
use crate::phrase::GroundedPhrase;

#[derive(Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct SymbolDictionary {
    #[serde(default)]
    classes: BTreeSet<String>,
    #[serde(default)]
    strings: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    ints: BTreeMap<String, BTreeSet<i64>>,
}

impl SymbolDictionary {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.insert(class.into());
        self
    }
    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes.extend(classes.into_iter().map(Into::into));
        self
    }
    pub fn with_strings<I, S>(mut self, attribute: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strings
            .entry(attribute.to_string())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }
    pub fn with_ints<I>(mut self, attribute: &str, values: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        self.ints
            .entry(attribute.to_string())
            .or_default()
            .extend(values);
        self
    }
    pub fn insert_class(&mut self, class: impl Into<String>) {
        self.classes.insert(class.into());
    }
    pub fn insert_string(&mut self, attribute: &str, value: impl Into<String>) {
        self.strings
            .entry(attribute.to_string())
            .or_default()
            .insert(value.into());
    }
    pub fn insert_int(&mut self, attribute: &str, value: i64) {
        self.ints.entry(attribute.to_string()).or_default().insert(value);
    }

    pub fn has_class(&self, class: GroundingClass) -> bool {
        self.classes.contains(class.name())
    }
    /// Class names as declared, including ones no generator knows about.
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }
    /// Legal string values of an attribute, in sorted order.
    pub fn strings(&self, attribute: &str) -> impl Iterator<Item = &str> {
        self.strings
            .get(attribute)
            .into_iter()
            .flat_map(|values| values.iter().map(String::as_str))
    }
    /// Legal integer values of an attribute, in ascending order.
    pub fn ints(&self, attribute: &str) -> impl Iterator<Item = i64> + '_ {
        self.ints
            .get(attribute)
            .into_iter()
            .flat_map(|values| values.iter().copied())
    }
    pub fn contains_string(&self, attribute: &str, value: &str) -> bool {
        self.strings
            .get(attribute)
            .is_some_and(|values| values.contains(value))
    }
    pub fn contains_int(&self, attribute: &str, value: i64) -> bool {
        self.ints
            .get(attribute)
            .is_some_and(|values| values.contains(&value))
    }
    /// Whether an attribute declares at least one legal value.
    pub fn declares(&self, attribute: &str) -> bool {
        self.strings.get(attribute).is_some_and(|v| !v.is_empty())
            || self.ints.get(attribute).is_some_and(|v| !v.is_empty())
    }
    /// Whether a class is both named and has every attribute it needs.
    pub fn permits(&self, class: GroundingClass) -> bool {
        self.has_class(class)
            && class
                .required_attributes()
                .iter()
                .all(|attribute| self.declares(attribute))
    }

    pub fn union(&self, other: &SymbolDictionary) -> SymbolDictionary {
        let mut merged = self.clone();
        merged.classes.extend(other.classes.iter().cloned());
        for (attribute, values) in &other.strings {
            merged
                .strings
                .entry(attribute.clone())
                .or_default()
                .extend(values.iter().cloned());
        }
        for (attribute, values) in &other.ints {
            merged
                .ints
                .entry(attribute.clone())
                .or_default()
                .extend(values.iter().copied());
        }
        merged
    }

    /// Drops every class `other` does not name; values are kept.
    pub fn restrict_classes(mut self, other: &SymbolDictionary) -> SymbolDictionary {
        self.classes.retain(|class| other.classes.contains(class));
        self
    }

    /// Infers the reduced dictionary a grounded phrase tree implies: every
    /// attribute value observed in a denotation anywhere in the tree, the
    /// scalar classes observed directly, and every class whose required
    /// attributes are all present.
    pub fn scrape(tree: &GroundedPhrase) -> SymbolDictionary {
        let mut dictionary = SymbolDictionary::new();
        for phrase in tree.walk() {
            for denotation in &phrase.denotations {
                dictionary.observe(&denotation.grounding);
            }
        }
        for class in GroundingClass::ALL {
            if class
                .required_attributes()
                .iter()
                .all(|attribute| dictionary.declares(attribute))
            {
                dictionary.insert_class(class.name());
            }
        }
        dictionary
    }

    fn observe(&mut self, grounding: &Grounding) {
        match grounding {
            // object identities carry no symbols of their own
            Grounding::Object(_) => (),
            Grounding::Region(r) => {
                self.insert_string(attr::SPATIAL_RELATION, r.spatial_relation.clone());
            }
            Grounding::Constraint(c) => {
                self.insert_string(attr::CONSTRAINT_TYPE, c.constraint_type.clone());
                self.insert_string(attr::SPATIAL_RELATION, c.reference_relation.clone());
                if let Some(relation) = &c.payload_relation {
                    self.insert_string(attr::SPATIAL_RELATION, relation.clone());
                }
            }
            Grounding::Container(c) => {
                self.insert_string(attr::CONTAINER_TYPE, c.container_type());
                for member in c.members() {
                    self.observe(member);
                }
            }
            Grounding::RegionContainer(r) => {
                self.insert_string(attr::SPATIAL_RELATION, r.spatial_relation.clone());
                self.observe(&Grounding::Container(r.container.clone()));
            }
            Grounding::AbstractContainer(a) => {
                self.insert_string(attr::OBJECT_TYPE, a.object_type.clone());
                self.insert_int(attr::NUMBER, a.number);
                self.insert_int(attr::INDEX, a.index);
                self.insert_string(attr::OBJECT_COLOR, a.color.clone());
            }
            Grounding::RegionAbstractContainer(r) => {
                self.insert_string(attr::SPATIAL_RELATION, r.spatial_relation.clone());
                self.observe(&Grounding::AbstractContainer(r.container.clone()));
            }
            Grounding::ObjectProperty(p) => {
                self.insert_string(attr::OBJECT_TYPE, p.object_type.clone());
                self.insert_string(attr::SPATIAL_RELATION, p.relation.clone());
                self.insert_int(attr::INDEX, p.index);
            }
            Grounding::ObjectType(v) => self.insert_string(attr::OBJECT_TYPE, v.clone()),
            Grounding::ObjectColor(v) => self.insert_string(attr::OBJECT_COLOR, v.clone()),
            Grounding::Index(v) => self.insert_int(attr::INDEX, *v),
            Grounding::Number(v) => self.insert_int(attr::NUMBER, *v),
            Grounding::SpatialRelation(v) => {
                self.insert_string(attr::SPATIAL_RELATION, v.clone())
            }
            Grounding::ContainerType(v) => self.insert_string(attr::CONTAINER_TYPE, v.clone()),
            Grounding::ConstraintType(v) => self.insert_string(attr::CONSTRAINT_TYPE, v.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grounding::{Cv, Denotation, Region};
    use crate::phrase::Category;
    use crate::world::ObjectId;

    fn grounded(denotations: Vec<Denotation>, children: Vec<GroundedPhrase>) -> GroundedPhrase {
        GroundedPhrase {
            category: Category::NounPhrase,
            words: Vec::new(),
            denotations,
            children,
        }
    }

    #[test]
    fn permits_requires_class_and_every_attribute() {
        let dictionary = SymbolDictionary::new()
            .with_classes(["object", "region"])
            .with_strings(attr::OBJECT_TYPE, ["block"]);
        assert!(dictionary.permits(GroundingClass::Object));
        assert!(!dictionary.permits(GroundingClass::Region));
        assert!(!dictionary.permits(GroundingClass::ObjectType));
    }

    #[test]
    fn scrape_collects_values_across_the_tree() {
        let leaf = grounded(
            vec![Denotation::new(Grounding::ObjectType("block".into()), Cv::True)],
            Vec::new(),
        );
        let root = grounded(
            vec![
                Denotation::new(Grounding::SpatialRelation("near".into()), Cv::True),
                Denotation::new(
                    Grounding::Region(Region {
                        spatial_relation: "left".into(),
                        object: ObjectId::from("a"),
                    }),
                    Cv::True,
                ),
            ],
            vec![leaf],
        );
        let dictionary = SymbolDictionary::scrape(&root);
        assert_eq!(
            dictionary.strings(attr::SPATIAL_RELATION).collect::<Vec<_>>(),
            vec!["left", "near"]
        );
        assert!(dictionary.contains_string(attr::OBJECT_TYPE, "block"));
        assert!(dictionary.has_class(GroundingClass::Object));
        assert!(dictionary.has_class(GroundingClass::Region));
        assert!(dictionary.has_class(GroundingClass::SpatialRelation));
        assert!(!dictionary.has_class(GroundingClass::Container));
    }

    #[test]
    fn union_merges_values() {
        let a = SymbolDictionary::new().with_ints(attr::NUMBER, [2]);
        let b = SymbolDictionary::new().with_ints(attr::NUMBER, [3]).with_class("number");
        let merged = a.union(&b);
        assert_eq!(merged.ints(attr::NUMBER).collect::<Vec<_>>(), vec![2, 3]);
        assert!(merged.has_class(GroundingClass::Number));
    }

    #[test]
    fn restrict_keeps_only_shared_classes() {
        let scraped = SymbolDictionary::new()
            .with_classes(["number", "index"])
            .with_ints(attr::INDEX, [1]);
        let original = SymbolDictionary::new().with_class("index");
        let restricted = scraped.restrict_classes(&original);
        assert_eq!(restricted.class_names().collect::<Vec<_>>(), vec!["index"]);
        assert!(restricted.contains_int(attr::INDEX, 1));
    }
}
