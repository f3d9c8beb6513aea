//! Raw upstream entities and their identifiers.

use std::{collections::HashMap, fmt, str::FromStr};

use geo::Coord;
use thiserror::Error;

/// Free-form OpenStreetMap key/value tags.
pub type Tags = HashMap<String, String>;

/// OpenStreetMap element family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    /// A single point.
    Node,
    /// An ordered list of nodes, usually a building outline.
    Way,
    /// A group of members, e.g. a multipolygon building.
    Relation,
}

impl EntityKind {
    /// Overpass type name (`node`, `way`, `relation`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised when parsing [`EntityKind`] or [`ElementId`] strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseElementIdError {
    /// The kind prefix is not `node`, `way` or `relation`.
    #[error("unknown element kind {0:?}")]
    Kind(String),
    /// The identifier is not of the form `<kind>/<id>`.
    #[error("element identifier {0:?} is not of the form <kind>/<id>")]
    Format(String),
}

impl FromStr for EntityKind {
    type Err = ParseElementIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "node" => Ok(Self::Node),
            "way" => Ok(Self::Way),
            "relation" => Ok(Self::Relation),
            other => Err(ParseElementIdError::Kind(other.to_owned())),
        }
    }
}

/// Identifier unique across element kinds.
///
/// Numeric OSM ids are only unique per kind, so the kind travels with the id.
///
/// # Examples
/// ```
/// use georisk_core::{ElementId, EntityKind};
///
/// let id = ElementId::new(EntityKind::Way, 42);
/// assert_eq!(id.to_string(), "way/42");
/// assert_eq!("way/42".parse::<ElementId>(), Ok(id));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId {
    /// Element family.
    pub kind: EntityKind,
    /// Numeric OSM id.
    pub id: i64,
}

impl ElementId {
    /// Pair a kind with a numeric id.
    #[must_use]
    pub const fn new(kind: EntityKind, id: i64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

impl FromStr for ElementId {
    type Err = ParseElementIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (kind, id) = value
            .split_once('/')
            .ok_or_else(|| ParseElementIdError::Format(value.to_owned()))?;
        let id = id
            .parse::<i64>()
            .map_err(|_| ParseElementIdError::Format(value.to_owned()))?;
        Ok(Self::new(kind.parse()?, id))
    }
}

/// An upstream element after geometry resolution.
///
/// `geometry` is `None` when no single coordinate could be derived, for
/// instance when a way references nodes missing from the response.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntity {
    /// Kind-qualified identifier.
    pub id: ElementId,
    /// Source tags.
    pub tags: Tags,
    /// Representative coordinate, `x = longitude`, `y = latitude`.
    pub geometry: Option<Coord<f64>>,
}

impl RawEntity {
    /// Construct a raw entity.
    #[must_use]
    pub const fn new(id: ElementId, tags: Tags, geometry: Option<Coord<f64>>) -> Self {
        Self { id, tags, geometry }
    }

    /// Element family of this entity.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.id.kind
    }

    /// Tag value for `key`, if present.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}
