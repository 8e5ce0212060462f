//! The world model a phrase tree is grounded in.
//!
//! A [`World`] is a keeper of [`Object`]s. Objects are owned by the world and
//! referenced from groundings by their [`ObjectId`], so that groundings stay
//! plain, comparable values. The world preserves insertion order, which is
//! what makes candidate generation (and therefore search) deterministic.

use std::fmt;

// used to keep the one-to-one mapping between object ids and their slot in the world
use bimap::BiMap;
use serde::{Deserialize, Serialize};

// ------------- ObjectId -------------
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl From<&str> for ObjectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ------------- Pose -------------
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: [f64; 3],
    pub orientation: [f64; 4], // quaternion (x, y, z, w)
}

impl Pose {
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: [x, y, z],
            orientation: [0.0, 0.0, 0.0, 1.0],
        }
    }
    pub fn distance(&self, other: &Pose) -> f64 {
        self.position
            .iter()
            .zip(other.position.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }
}

// ------------- Object -------------
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Object {
    id: ObjectId,
    object_type: String,
    color: String,
    #[serde(default)]
    pose: Pose,
}

impl Object {
    pub fn new(
        id: impl Into<String>,
        object_type: impl Into<String>,
        color: impl Into<String>,
        pose: Pose,
    ) -> Self {
        Self {
            id: ObjectId::new(id),
            object_type: object_type.into(),
            color: color.into(),
            pose,
        }
    }
    // Objects are immutable once created, so only getters are exposed.
    pub fn id(&self) -> &ObjectId {
        &self.id
    }
    pub fn object_type(&self) -> &str {
        &self.object_type
    }
    pub fn color(&self) -> &str {
        &self.color
    }
    pub fn pose(&self) -> &Pose {
        &self.pose
    }
}
impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({} {})", self.id, self.color, self.object_type)
    }
}

// ------------- World -------------
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Object>", into = "Vec<Object>")]
pub struct World {
    objects: Vec<Object>,
    lookup: BiMap<ObjectId, usize>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }
    /// Keeps an object. An object with an already kept id replaces the
    /// previous one in its original position. Returns `true` if the id was
    /// previously kept.
    pub fn keep(&mut self, object: Object) -> bool {
        match self.lookup.get_by_left(object.id()) {
            Some(&slot) => {
                self.objects[slot] = object;
                true
            }
            None => {
                self.lookup.insert(object.id().clone(), self.objects.len());
                self.objects.push(object);
                false
            }
        }
    }
    pub fn with(mut self, object: Object) -> Self {
        self.keep(object);
        self
    }
    pub fn get(&self, id: &ObjectId) -> Option<&Object> {
        self.lookup.get_by_left(id).map(|&slot| &self.objects[slot])
    }
    /// The position of an object in insertion order.
    pub fn slot(&self, id: &ObjectId) -> Option<usize> {
        self.lookup.get_by_left(id).copied()
    }
    pub fn objects(&self) -> &[Object] {
        &self.objects
    }
    pub fn objects_of_type<'w>(&'w self, object_type: &'w str) -> impl Iterator<Item = &'w Object> {
        self.objects
            .iter()
            .filter(move |o| o.object_type == object_type)
    }
    /// Distinct object types in order of first appearance.
    pub fn object_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = Vec::new();
        for object in &self.objects {
            if !types.contains(&object.object_type()) {
                types.push(object.object_type());
            }
        }
        types
    }
    pub fn len(&self) -> usize {
        self.objects.len()
    }
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl From<Vec<Object>> for World {
    fn from(objects: Vec<Object>) -> Self {
        let mut world = World::new();
        for object in objects {
            world.keep(object);
        }
        world
    }
}
impl From<World> for Vec<Object> {
    fn from(world: World) -> Self {
        world.objects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeping_an_existing_id_replaces_in_place() {
        let mut world = World::new()
            .with(Object::new("a", "block", "red", Pose::default()))
            .with(Object::new("b", "block", "blue", Pose::default()));
        assert!(world.keep(Object::new("a", "ball", "green", Pose::default())));
        assert_eq!(world.len(), 2);
        assert_eq!(world.objects()[0].object_type(), "ball");
        assert_eq!(world.slot(&ObjectId::from("b")), Some(1));
    }

    #[test]
    fn object_types_follow_insertion_order() {
        let world = World::new()
            .with(Object::new("a", "ball", "red", Pose::default()))
            .with(Object::new("b", "block", "red", Pose::default()))
            .with(Object::new("c", "ball", "red", Pose::default()));
        assert_eq!(world.object_types(), vec!["ball", "block"]);
        assert_eq!(world.objects_of_type("ball").count(), 2);
    }
}
