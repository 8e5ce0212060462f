//! Groundings are the denotations a phrase can be assigned.
//!
//! All variants form one closed sum type, so a grounding of one kind never
//! compares equal to a grounding of another kind, and every consumer matches
//! exhaustively over the kinds it cares about.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::world::ObjectId;

// ------------- Attribute names -------------
// Keys into a symbol dictionary. String valued attributes first, then integers.
pub mod attr {
    pub const OBJECT_TYPE: &str = "object_type";
    pub const OBJECT_COLOR: &str = "object_color";
    pub const SPATIAL_RELATION: &str = "spatial_relation";
    pub const CONTAINER_TYPE: &str = "container_type";
    pub const CONSTRAINT_TYPE: &str = "constraint_type";
    pub const NUMBER: &str = "number";
    pub const INDEX: &str = "index";
}

// ------------- Correspondence variables -------------
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cv {
    False,
    True,
    Inverted,
}

impl Cv {
    /// Whether the candidate is part of the phrase's denotation set.
    pub fn denotes(self) -> bool {
        !matches!(self, Cv::False)
    }
}
impl fmt::Display for Cv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Cv::False => "false",
            Cv::True => "true",
            Cv::Inverted => "inverted",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CvArity {
    Binary,
    Ternary,
}

static BINARY: [Cv; 2] = [Cv::False, Cv::True];
static TERNARY: [Cv; 3] = [Cv::False, Cv::True, Cv::Inverted];

impl CvArity {
    pub fn domain(self) -> &'static [Cv] {
        match self {
            CvArity::Binary => &BINARY,
            CvArity::Ternary => &TERNARY,
        }
    }
    pub fn len(self) -> usize {
        self.domain().len()
    }
}

// ------------- Grounding classes -------------
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundingClass {
    Object,
    Region,
    Constraint,
    Container,
    RegionContainer,
    AbstractContainer,
    RegionAbstractContainer,
    ObjectProperty,
    ObjectType,
    ObjectColor,
    Index,
    Number,
    SpatialRelation,
    ContainerType,
    ConstraintType,
}

impl GroundingClass {
    pub const ALL: [GroundingClass; 15] = [
        GroundingClass::Object,
        GroundingClass::Region,
        GroundingClass::Constraint,
        GroundingClass::Container,
        GroundingClass::RegionContainer,
        GroundingClass::AbstractContainer,
        GroundingClass::RegionAbstractContainer,
        GroundingClass::ObjectProperty,
        GroundingClass::ObjectType,
        GroundingClass::ObjectColor,
        GroundingClass::Index,
        GroundingClass::Number,
        GroundingClass::SpatialRelation,
        GroundingClass::ContainerType,
        GroundingClass::ConstraintType,
    ];
    /// The coarse symbolic classes inferred by the first stage of the
    /// hierarchical search.
    pub const RULES: [GroundingClass; 7] = [
        GroundingClass::ConstraintType,
        GroundingClass::ObjectType,
        GroundingClass::ContainerType,
        GroundingClass::SpatialRelation,
        GroundingClass::Index,
        GroundingClass::Number,
        GroundingClass::ObjectColor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GroundingClass::Object => "object",
            GroundingClass::Region => "region",
            GroundingClass::Constraint => "constraint",
            GroundingClass::Container => "container",
            GroundingClass::RegionContainer => "region_container",
            GroundingClass::AbstractContainer => "abstract_container",
            GroundingClass::RegionAbstractContainer => "region_abstract_container",
            GroundingClass::ObjectProperty => "object_property",
            GroundingClass::ObjectType => "object_type",
            GroundingClass::ObjectColor => "object_color",
            GroundingClass::Index => "index",
            GroundingClass::Number => "number",
            GroundingClass::SpatialRelation => "spatial_relation",
            GroundingClass::ContainerType => "container_type",
            GroundingClass::ConstraintType => "constraint_type",
        }
    }
    pub fn arity(self) -> CvArity {
        match self {
            GroundingClass::Constraint | GroundingClass::ConstraintType => CvArity::Ternary,
            _ => CvArity::Binary,
        }
    }
    /// Whether candidates of this class are built from world objects.
    pub fn is_concrete(self) -> bool {
        matches!(
            self,
            GroundingClass::Object
                | GroundingClass::Region
                | GroundingClass::Constraint
                | GroundingClass::Container
                | GroundingClass::RegionContainer
                | GroundingClass::AbstractContainer
                | GroundingClass::RegionAbstractContainer
                | GroundingClass::ObjectProperty
        )
    }
    /// Symbol dictionary attributes that must declare at least one legal value
    /// for the class to produce any candidates.
    pub fn required_attributes(self) -> &'static [&'static str] {
        use attr::*;
        match self {
            GroundingClass::Object => &[OBJECT_TYPE],
            GroundingClass::Region => &[SPATIAL_RELATION, OBJECT_TYPE],
            GroundingClass::Constraint => &[CONSTRAINT_TYPE, SPATIAL_RELATION, OBJECT_TYPE],
            GroundingClass::Container => &[CONTAINER_TYPE, OBJECT_TYPE],
            GroundingClass::RegionContainer => &[SPATIAL_RELATION, CONTAINER_TYPE, OBJECT_TYPE],
            GroundingClass::AbstractContainer => &[OBJECT_TYPE, NUMBER, INDEX, OBJECT_COLOR],
            GroundingClass::RegionAbstractContainer => {
                &[SPATIAL_RELATION, OBJECT_TYPE, NUMBER, INDEX, OBJECT_COLOR]
            }
            GroundingClass::ObjectProperty => &[OBJECT_TYPE, SPATIAL_RELATION, INDEX],
            GroundingClass::ObjectType => &[OBJECT_TYPE],
            GroundingClass::ObjectColor => &[OBJECT_COLOR],
            GroundingClass::Index => &[INDEX],
            GroundingClass::Number => &[NUMBER],
            GroundingClass::SpatialRelation => &[SPATIAL_RELATION],
            GroundingClass::ContainerType => &[CONTAINER_TYPE],
            GroundingClass::ConstraintType => &[CONSTRAINT_TYPE],
        }
    }
}

impl FromStr for GroundingClass {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GroundingClass::ALL
            .iter()
            .copied()
            .find(|class| class.name() == s)
            .ok_or(())
    }
}
impl fmt::Display for GroundingClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ------------- Composite groundings -------------
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Region {
    pub spatial_relation: String,
    pub object: ObjectId,
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Constraint {
    pub constraint_type: String,
    pub payload: ObjectId,
    pub payload_relation: Option<String>,
    pub reference: ObjectId,
    pub reference_relation: String,
}

impl Constraint {
    /// A constraint that relates an object to itself in the same way is
    /// meaningless and never generated.
    pub fn is_self_referential(&self) -> bool {
        self.payload == self.reference
            && self.payload_relation.as_deref() == Some(self.reference_relation.as_str())
    }
}

/// A group of at least two groundings. Members are kept sorted and
/// duplicate-free so that equality is set equality.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "RawContainer")]
pub struct Container {
    container_type: String,
    members: Vec<Grounding>,
}

// Deserialized containers are canonicalised like constructed ones.
#[derive(Deserialize)]
struct RawContainer {
    container_type: String,
    members: Vec<Grounding>,
}

impl TryFrom<RawContainer> for Container {
    type Error = String;
    fn try_from(raw: RawContainer) -> Result<Self, Self::Error> {
        let container_type = raw.container_type;
        Container::new(container_type.clone(), raw.members).ok_or_else(|| {
            format!("container {} needs at least two distinct members", container_type)
        })
    }
}

impl Container {
    pub fn new(container_type: impl Into<String>, mut members: Vec<Grounding>) -> Option<Self> {
        members.sort_unstable();
        members.dedup();
        if members.len() < 2 {
            return None;
        }
        Some(Self {
            container_type: container_type.into(),
            members,
        })
    }
    pub fn container_type(&self) -> &str {
        &self.container_type
    }
    pub fn members(&self) -> &[Grounding] {
        &self.members
    }
    pub fn len(&self) -> usize {
        self.members.len()
    }
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct RegionContainer {
    pub spatial_relation: String,
    pub container: Container,
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct AbstractContainer {
    pub object_type: String,
    pub number: i64,
    pub index: i64,
    pub color: String,
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct RegionAbstractContainer {
    pub spatial_relation: String,
    pub container: AbstractContainer,
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct ObjectProperty {
    pub object_type: String,
    pub relation: String,
    pub index: i64,
}

// ------------- Grounding -------------
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Grounding {
    Object(ObjectId),
    Region(Region),
    Constraint(Constraint),
    Container(Container),
    RegionContainer(RegionContainer),
    AbstractContainer(AbstractContainer),
    RegionAbstractContainer(RegionAbstractContainer),
    ObjectProperty(ObjectProperty),
    ObjectType(String),
    ObjectColor(String),
    Index(i64),
    Number(i64),
    SpatialRelation(String),
    ContainerType(String),
    ConstraintType(String),
}

impl Grounding {
    pub fn class(&self) -> GroundingClass {
        match self {
            Grounding::Object(_) => GroundingClass::Object,
            Grounding::Region(_) => GroundingClass::Region,
            Grounding::Constraint(_) => GroundingClass::Constraint,
            Grounding::Container(_) => GroundingClass::Container,
            Grounding::RegionContainer(_) => GroundingClass::RegionContainer,
            Grounding::AbstractContainer(_) => GroundingClass::AbstractContainer,
            Grounding::RegionAbstractContainer(_) => GroundingClass::RegionAbstractContainer,
            Grounding::ObjectProperty(_) => GroundingClass::ObjectProperty,
            Grounding::ObjectType(_) => GroundingClass::ObjectType,
            Grounding::ObjectColor(_) => GroundingClass::ObjectColor,
            Grounding::Index(_) => GroundingClass::Index,
            Grounding::Number(_) => GroundingClass::Number,
            Grounding::SpatialRelation(_) => GroundingClass::SpatialRelation,
            Grounding::ContainerType(_) => GroundingClass::ContainerType,
            Grounding::ConstraintType(_) => GroundingClass::ConstraintType,
        }
    }
    pub fn object(id: impl Into<String>) -> Self {
        Grounding::Object(ObjectId::new(id))
    }
}

impl fmt::Display for Grounding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Grounding::Object(id) => write!(f, "object({})", id),
            Grounding::Region(r) => write!(f, "region({}, {})", r.spatial_relation, r.object),
            Grounding::Constraint(c) => write!(
                f,
                "constraint({}, {}:{}, {}:{})",
                c.constraint_type,
                c.payload,
                c.payload_relation.as_deref().unwrap_or("na"),
                c.reference,
                c.reference_relation
            ),
            Grounding::Container(c) => {
                let mut s = String::new();
                for m in c.members() {
                    s += &(m.to_string() + ",");
                }
                s.pop();
                write!(f, "container({}, {{{}}})", c.container_type(), s)
            }
            Grounding::RegionContainer(r) => write!(
                f,
                "region_container({}, {})",
                r.spatial_relation,
                Grounding::Container(r.container.clone())
            ),
            Grounding::AbstractContainer(a) => write!(
                f,
                "abstract_container({}, {}, {}, {})",
                a.object_type, a.number, a.index, a.color
            ),
            Grounding::RegionAbstractContainer(r) => write!(
                f,
                "region_abstract_container({}, {}, {}, {}, {})",
                r.spatial_relation,
                r.container.object_type,
                r.container.number,
                r.container.index,
                r.container.color
            ),
            Grounding::ObjectProperty(p) => {
                write!(f, "object_property({}, {}, {})", p.object_type, p.relation, p.index)
            }
            Grounding::ObjectType(v) => write!(f, "object_type({})", v),
            Grounding::ObjectColor(v) => write!(f, "object_color({})", v),
            Grounding::Index(v) => write!(f, "index({})", v),
            Grounding::Number(v) => write!(f, "number({})", v),
            Grounding::SpatialRelation(v) => write!(f, "spatial_relation({})", v),
            Grounding::ContainerType(v) => write!(f, "container_type({})", v),
            Grounding::ConstraintType(v) => write!(f, "constraint_type({})", v),
        }
    }
}

// ------------- Denotation -------------
/// A grounding that a phrase was found to denote, together with how.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Denotation {
    pub grounding: Grounding,
    pub cv: Cv,
}

impl Denotation {
    pub fn new(grounding: Grounding, cv: Cv) -> Self {
        Self { grounding, cv }
    }
}
impl fmt::Display for Denotation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.cv {
            Cv::Inverted => write!(f, "~{}", self.grounding),
            _ => write!(f, "{}", self.grounding),
        }
    }
}
