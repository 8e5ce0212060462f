//! Candidate search spaces.
//!
//! A [`SearchSpace`] maps every grounding class to the arity of its
//! correspondence variables and the ordered list of candidate groundings
//! generated for one (world, symbol dictionary) pair. Generation is the only
//! place world objects are combined with dictionary symbols, and the only
//! place where the combinatorial blow-up of object groupings is controlled.
//!
//! Candidate order is fully determined by the inputs: dictionary values in
//! sorted order, objects in world order and groupings in increasing bitmask
//! order. Search relies on this for reproducible rankings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::grounding::{
    attr, AbstractContainer, Constraint, Container, CvArity, Grounding, GroundingClass,
    ObjectProperty, Region, RegionAbstractContainer, RegionContainer,
};
use crate::symbols::SymbolDictionary;
use crate::world::{ObjectId, World};

/// Power sets are enumerated with 64-bit masks.
const MAX_GROUP_OBJECTS: usize = 63;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// World-bearing classes only, with full power sets.
    #[default]
    Concrete,
    /// Every class, with groupings restricted to cardinalities the
    /// dictionary mentions (or the whole set of a type).
    Abstract,
    /// Every class, with full power sets.
    All,
}

impl Scope {
    pub fn includes(self, class: GroundingClass) -> bool {
        match self {
            Scope::Concrete => class.is_concrete(),
            Scope::Abstract | Scope::All => true,
        }
    }
    fn filters_groups(self) -> bool {
        matches!(self, Scope::Abstract)
    }
}

// ------------- ClassSpace -------------
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct ClassSpace {
    arity: CvArity,
    candidates: Vec<Grounding>,
}

impl ClassSpace {
    pub fn arity(&self) -> CvArity {
        self.arity
    }
    pub fn candidates(&self) -> &[Grounding] {
        &self.candidates
    }
    pub fn len(&self) -> usize {
        self.candidates.len()
    }
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

// ------------- SearchSpace -------------
#[derive(Clone, PartialEq, Debug, Default, Serialize)]
pub struct SearchSpace {
    classes: BTreeMap<GroundingClass, ClassSpace>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self::default()
    }
    /// Sets the candidates of a class. The arity always follows the class.
    pub fn insert(&mut self, class: GroundingClass, candidates: Vec<Grounding>) {
        self.classes.insert(
            class,
            ClassSpace {
                arity: class.arity(),
                candidates,
            },
        );
    }
    pub fn get(&self, class: GroundingClass) -> Option<&ClassSpace> {
        self.classes.get(&class)
    }
    /// Candidates of a class; empty if the class was not generated.
    pub fn candidates(&self, class: GroundingClass) -> &[Grounding] {
        self.classes
            .get(&class)
            .map(ClassSpace::candidates)
            .unwrap_or(&[])
    }
    pub fn candidate(&self, class: GroundingClass, index: usize) -> Option<&Grounding> {
        self.candidates(class).get(index)
    }
    pub fn contains(&self, grounding: &Grounding) -> bool {
        self.candidates(grounding.class()).contains(grounding)
    }
    pub fn classes(&self) -> impl Iterator<Item = (GroundingClass, &ClassSpace)> {
        self.classes.iter().map(|(class, space)| (*class, space))
    }
    /// Total number of candidates over all classes.
    pub fn len(&self) -> usize {
        self.classes.values().map(ClassSpace::len).sum()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ------------- SpaceGenerator -------------
#[derive(Clone, Copy, Debug)]
pub struct SpaceGenerator {
    scope: Scope,
    max_group_objects: usize,
}

impl Default for SpaceGenerator {
    fn default() -> Self {
        Self {
            scope: Scope::default(),
            max_group_objects: 16,
        }
    }
}

impl SpaceGenerator {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            ..Self::default()
        }
    }
    /// Object types with more objects than this are not grouped at all.
    pub fn max_group_objects(mut self, max: usize) -> Self {
        self.max_group_objects = max.min(MAX_GROUP_OBJECTS);
        self
    }
    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn generate(&self, dictionary: &SymbolDictionary, world: &World) -> SearchSpace {
        for name in dictionary.class_names() {
            if name.parse::<GroundingClass>().is_err() {
                debug!(class = name, "symbol dictionary names an unknown class, ignored");
            }
        }
        let mut space = SearchSpace::new();
        for class in GroundingClass::ALL {
            if !self.scope.includes(class) {
                continue;
            }
            let candidates = if dictionary.permits(class) {
                self.generate_class(class, dictionary, world)
            } else {
                Vec::new()
            };
            debug!(class = %class, candidates = candidates.len(), "generated class space");
            space.insert(class, candidates);
        }
        space
    }

    fn generate_class(
        &self,
        class: GroundingClass,
        dictionary: &SymbolDictionary,
        world: &World,
    ) -> Vec<Grounding> {
        match class {
            GroundingClass::Object => referents(dictionary, world)
                .into_iter()
                .map(Grounding::Object)
                .collect(),
            GroundingClass::Region => regions(dictionary, world)
                .into_iter()
                .map(Grounding::Region)
                .collect(),
            GroundingClass::Constraint => constraints(dictionary, world),
            GroundingClass::Container => self
                .containers(dictionary, world)
                .into_iter()
                .map(Grounding::Container)
                .collect(),
            GroundingClass::RegionContainer => {
                let containers = self.containers(dictionary, world);
                let mut candidates = Vec::new();
                for relation in dictionary.strings(attr::SPATIAL_RELATION) {
                    for container in &containers {
                        candidates.push(Grounding::RegionContainer(RegionContainer {
                            spatial_relation: relation.to_string(),
                            container: container.clone(),
                        }));
                    }
                }
                candidates
            }
            GroundingClass::AbstractContainer => abstract_containers(dictionary)
                .into_iter()
                .map(Grounding::AbstractContainer)
                .collect(),
            GroundingClass::RegionAbstractContainer => {
                let containers = abstract_containers(dictionary);
                let mut candidates = Vec::new();
                for relation in dictionary.strings(attr::SPATIAL_RELATION) {
                    for container in &containers {
                        candidates.push(Grounding::RegionAbstractContainer(
                            RegionAbstractContainer {
                                spatial_relation: relation.to_string(),
                                container: container.clone(),
                            },
                        ));
                    }
                }
                candidates
            }
            GroundingClass::ObjectProperty => {
                let mut candidates = Vec::new();
                for object_type in dictionary.strings(attr::OBJECT_TYPE) {
                    for relation in dictionary.strings(attr::SPATIAL_RELATION) {
                        for index in dictionary.ints(attr::INDEX) {
                            candidates.push(Grounding::ObjectProperty(ObjectProperty {
                                object_type: object_type.to_string(),
                                relation: relation.to_string(),
                                index,
                            }));
                        }
                    }
                }
                candidates
            }
            scalar => scalars(scalar, dictionary),
        }
    }

    /// Groupings of at least two same-typed objects, per object type in the
    /// dictionary, crossed with every container type.
    fn containers(&self, dictionary: &SymbolDictionary, world: &World) -> Vec<Container> {
        let mut containers = Vec::new();
        for object_type in dictionary.strings(attr::OBJECT_TYPE) {
            let objects: Vec<&ObjectId> = world
                .objects_of_type(object_type)
                .map(|o| o.id())
                .collect();
            for group in self.groups(object_type, &objects, dictionary) {
                for container_type in dictionary.strings(attr::CONTAINER_TYPE) {
                    let members = group.iter().map(|id| Grounding::Object((*id).clone())).collect();
                    if let Some(container) = Container::new(container_type, members) {
                        containers.push(container);
                    }
                }
            }
        }
        containers
    }

    fn groups<'o>(
        &self,
        object_type: &str,
        objects: &[&'o ObjectId],
        dictionary: &SymbolDictionary,
    ) -> Vec<Vec<&'o ObjectId>> {
        let n = objects.len();
        if n < 2 {
            return Vec::new();
        }
        if n > self.max_group_objects {
            warn!(
                object_type,
                objects = n,
                max = self.max_group_objects,
                "too many objects to enumerate groupings, type skipped"
            );
            return Vec::new();
        }
        let mut groups = Vec::new();
        for mask in 0u64..(1u64 << n) {
            let size = mask.count_ones() as usize;
            if size < 2 {
                continue;
            }
            if self.scope.filters_groups()
                && size != n
                && !dictionary.contains_int(attr::NUMBER, size as i64)
            {
                continue;
            }
            let group = (0..n)
                .filter(|bit| mask & (1u64 << bit) != 0)
                .map(|bit| objects[bit])
                .collect();
            groups.push(group);
        }
        groups
    }
}

/// Generates the search space for a dictionary and world with default limits.
pub fn generate_search_space(
    dictionary: &SymbolDictionary,
    world: &World,
    scope: Scope,
) -> SearchSpace {
    SpaceGenerator::new(scope).generate(dictionary, world)
}

/// The coarse symbolic space used to infer reduced dictionaries: one
/// candidate per legal value of each rule class, no world objects involved.
/// Rule classes only need their attribute declared, not their class named.
pub fn generate_rule_space(dictionary: &SymbolDictionary) -> SearchSpace {
    let mut space = SearchSpace::new();
    for class in GroundingClass::RULES {
        space.insert(class, scalars(class, dictionary));
    }
    space
}

// Objects whose type the dictionary allows, in world order.
fn referents(dictionary: &SymbolDictionary, world: &World) -> Vec<ObjectId> {
    world
        .objects()
        .iter()
        .filter(|o| dictionary.contains_string(attr::OBJECT_TYPE, o.object_type()))
        .map(|o| o.id().clone())
        .collect()
}

fn regions(dictionary: &SymbolDictionary, world: &World) -> Vec<Region> {
    let objects = referents(dictionary, world);
    let mut regions = Vec::new();
    for relation in dictionary.strings(attr::SPATIAL_RELATION) {
        for object in &objects {
            regions.push(Region {
                spatial_relation: relation.to_string(),
                object: object.clone(),
            });
        }
    }
    regions
}

fn constraints(dictionary: &SymbolDictionary, world: &World) -> Vec<Grounding> {
    let objects = referents(dictionary, world);
    let relations: Vec<&str> = dictionary.strings(attr::SPATIAL_RELATION).collect();
    let payload_relations: Vec<Option<&str>> = std::iter::once(None)
        .chain(relations.iter().map(|r| Some(*r)))
        .collect();
    let mut candidates = Vec::new();
    for constraint_type in dictionary.strings(attr::CONSTRAINT_TYPE) {
        for payload in &objects {
            for payload_relation in &payload_relations {
                for reference in &objects {
                    for reference_relation in &relations {
                        let constraint = Constraint {
                            constraint_type: constraint_type.to_string(),
                            payload: payload.clone(),
                            payload_relation: payload_relation.map(str::to_string),
                            reference: reference.clone(),
                            reference_relation: reference_relation.to_string(),
                        };
                        if !constraint.is_self_referential() {
                            candidates.push(Grounding::Constraint(constraint));
                        }
                    }
                }
            }
        }
    }
    candidates
}

fn abstract_containers(dictionary: &SymbolDictionary) -> Vec<AbstractContainer> {
    let mut containers = Vec::new();
    for object_type in dictionary.strings(attr::OBJECT_TYPE) {
        for number in dictionary.ints(attr::NUMBER) {
            for index in dictionary.ints(attr::INDEX) {
                for color in dictionary.strings(attr::OBJECT_COLOR) {
                    containers.push(AbstractContainer {
                        object_type: object_type.to_string(),
                        number,
                        index,
                        color: color.to_string(),
                    });
                }
            }
        }
    }
    containers
}

fn scalars(class: GroundingClass, dictionary: &SymbolDictionary) -> Vec<Grounding> {
    let strings = |attribute: &str, make: fn(String) -> Grounding| -> Vec<Grounding> {
        dictionary
            .strings(attribute)
            .map(|v| make(v.to_string()))
            .collect()
    };
    let ints = |attribute: &str, make: fn(i64) -> Grounding| -> Vec<Grounding> {
        dictionary.ints(attribute).map(make).collect()
    };
    match class {
        GroundingClass::ObjectType => strings(attr::OBJECT_TYPE, Grounding::ObjectType),
        GroundingClass::ObjectColor => strings(attr::OBJECT_COLOR, Grounding::ObjectColor),
        GroundingClass::SpatialRelation => {
            strings(attr::SPATIAL_RELATION, Grounding::SpatialRelation)
        }
        GroundingClass::ContainerType => strings(attr::CONTAINER_TYPE, Grounding::ContainerType),
        GroundingClass::ConstraintType => {
            strings(attr::CONSTRAINT_TYPE, Grounding::ConstraintType)
        }
        GroundingClass::Index => ints(attr::INDEX, Grounding::Index),
        GroundingClass::Number => ints(attr::NUMBER, Grounding::Number),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Object, Pose};

    fn blocks(n: usize) -> World {
        let mut world = World::new();
        for i in 0..n {
            world.keep(Object::new(format!("b{}", i), "block", "red", Pose::default()));
        }
        world
    }

    fn dictionary() -> SymbolDictionary {
        SymbolDictionary::new()
            .with_classes(["object", "container", "region_container"])
            .with_strings(attr::OBJECT_TYPE, ["block"])
            .with_strings(attr::CONTAINER_TYPE, ["group", "row"])
            .with_strings(attr::SPATIAL_RELATION, ["near"])
    }

    #[test]
    fn concrete_power_set_excludes_empty_and_singletons() {
        for n in 0..6 {
            let space = generate_search_space(&dictionary(), &blocks(n), Scope::Concrete);
            let expected = if n < 2 { 0 } else { (1usize << n) - n - 1 } * 2;
            assert_eq!(space.candidates(GroundingClass::Container).len(), expected, "n = {}", n);
        }
    }

    #[test]
    fn abstract_scope_keeps_full_sets_and_listed_numbers() {
        let dictionary = dictionary().with_ints(attr::NUMBER, [2]);
        let space = generate_search_space(&dictionary, &blocks(4), Scope::Abstract);
        // six pairs plus the full set, for each of two container types
        assert_eq!(space.candidates(GroundingClass::Container).len(), (6 + 1) * 2);
        for candidate in space.candidates(GroundingClass::Container) {
            if let Grounding::Container(c) = candidate {
                assert!(c.len() == 2 || c.len() == 4);
            }
        }
    }

    #[test]
    fn region_containers_cross_relations_with_containers() {
        let space = generate_search_space(&dictionary(), &blocks(3), Scope::Concrete);
        assert_eq!(
            space.candidates(GroundingClass::RegionContainer).len(),
            space.candidates(GroundingClass::Container).len()
        );
    }

    #[test]
    fn oversized_types_are_not_grouped() {
        let space = SpaceGenerator::new(Scope::Concrete)
            .max_group_objects(3)
            .generate(&dictionary(), &blocks(4));
        assert!(space.candidates(GroundingClass::Container).is_empty());
        assert_eq!(space.candidates(GroundingClass::Object).len(), 4);
    }

    #[test]
    fn concrete_scope_leaves_out_scalar_classes() {
        let dictionary = dictionary().with_class("object_type");
        let concrete = generate_search_space(&dictionary, &blocks(2), Scope::Concrete);
        assert!(concrete.get(GroundingClass::ObjectType).is_none());
        let all = generate_search_space(&dictionary, &blocks(2), Scope::All);
        assert_eq!(all.candidates(GroundingClass::ObjectType).len(), 1);
    }

    #[test]
    fn constraints_skip_self_referential_placements() {
        let dictionary = SymbolDictionary::new()
            .with_class("constraint")
            .with_strings(attr::OBJECT_TYPE, ["block"])
            .with_strings(attr::SPATIAL_RELATION, ["near"])
            .with_strings(attr::CONSTRAINT_TYPE, ["place"]);
        let space = generate_search_space(&dictionary, &blocks(4), Scope::Concrete);
        let constraints = space.candidates(GroundingClass::Constraint);
        // payloads x {none, near} x references, less "b near b" for each block
        assert_eq!(constraints.len(), 4 * 2 * 4 - 4);
        for candidate in constraints {
            if let Grounding::Constraint(c) = candidate {
                assert!(!c.is_self_referential());
            }
        }
        let own_reference = constraints
            .iter()
            .filter(|g| matches!(g, Grounding::Constraint(c) if c.payload == c.reference))
            .count();
        assert_eq!(own_reference, 4);
    }

    #[test]
    fn rule_space_has_no_world_classes() {
        let space = generate_rule_space(&dictionary().with_ints(attr::NUMBER, [1, 2]));
        assert!(space.classes().all(|(class, _)| !class.is_concrete()));
        assert_eq!(space.candidates(GroundingClass::Number).len(), 2);
        assert_eq!(space.candidates(GroundingClass::ContainerType).len(), 2);
    }
}
