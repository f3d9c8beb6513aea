//! Named areas and the immutable registry handed to the batch runner.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::BoundingBox;

/// Suffix appended to an area slug to form its default output file name.
pub const DEFAULT_FILE_SUFFIX: &str = "_buildings.geojson";

/// Built-in areas, in the order batch runs visit them.
const KENYA_AREAS: &[(&str, BoundingBox)] = &[
    ("Nairobi", BoundingBox::new(-1.35, 36.70, -1.20, 36.95)),
    ("Mombasa", BoundingBox::new(-4.10, 39.60, -4.00, 39.75)),
    ("Kisumu", BoundingBox::new(-0.15, 34.70, -0.05, 34.80)),
    ("Nakuru", BoundingBox::new(-0.35, 36.05, -0.25, 36.10)),
    ("Eldoret", BoundingBox::new(0.45, 35.25, 0.55, 35.35)),
];

/// A named region to scrape.
///
/// # Examples
/// ```
/// use georisk_core::{Area, BoundingBox};
///
/// let area = Area::new("New Town", BoundingBox::new(0.0, 0.0, 1.0, 1.0));
/// assert_eq!(area.default_file_name(), "new_town_buildings.geojson");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    /// Human-readable identifier.
    pub name: String,
    /// Region covered by the area. May be invalid until queried.
    pub bounds: BoundingBox,
}

impl Area {
    /// Construct an area from a name and bounding box.
    pub fn new(name: impl Into<String>, bounds: BoundingBox) -> Self {
        Self {
            name: name.into(),
            bounds,
        }
    }

    /// Lower-case name with whitespace runs replaced by `_`.
    #[must_use]
    pub fn slug(&self) -> String {
        self.name
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("_")
    }

    /// File name used when the caller does not pick one.
    #[must_use]
    pub fn default_file_name(&self) -> String {
        format!("{}{DEFAULT_FILE_SUFFIX}", self.slug())
    }
}

/// Errors raised while assembling an [`AreaRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two areas share a name (compared case-insensitively).
    #[error("area {name:?} is defined more than once")]
    DuplicateArea {
        /// The repeated name.
        name: String,
    },
    /// Two differently named areas map to the same default output file.
    #[error("areas {existing:?} and {name:?} would both write {file_name}")]
    FileNameCollision {
        /// Area registered first.
        existing: String,
        /// Area that collides with it.
        name: String,
        /// Shared default file name.
        file_name: String,
    },
}

/// Ordered, read-only mapping of area names to bounding boxes.
///
/// # Examples
/// ```
/// use georisk_core::AreaRegistry;
///
/// let registry = AreaRegistry::kenya();
/// let nairobi = registry.get("nairobi").expect("built-in area");
/// assert_eq!(nairobi.name, "Nairobi");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AreaRegistry {
    areas: Vec<Area>,
}

impl AreaRegistry {
    /// Build a registry preserving the supplied order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateArea`] when two areas share a name,
    /// or [`RegistryError::FileNameCollision`] when two names slug to the same
    /// default file.
    pub fn new(areas: impl IntoIterator<Item = Area>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        let mut slugs: HashMap<String, String> = HashMap::new();
        let mut collected = Vec::new();
        for area in areas {
            if !seen.insert(area.name.to_lowercase()) {
                return Err(RegistryError::DuplicateArea { name: area.name });
            }
            if let Some(existing) = slugs.get(&area.slug()) {
                return Err(RegistryError::FileNameCollision {
                    existing: existing.clone(),
                    file_name: area.default_file_name(),
                    name: area.name,
                });
            }
            slugs.insert(area.slug(), area.name.clone());
            collected.push(area);
        }
        Ok(Self { areas: collected })
    }

    /// The built-in Kenyan city registry.
    #[must_use]
    pub fn kenya() -> Self {
        Self {
            areas: KENYA_AREAS
                .iter()
                .map(|(name, bounds)| Area::new(*name, *bounds))
                .collect(),
        }
    }

    /// Look up an area by name, ignoring ASCII case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Area> {
        self.areas
            .iter()
            .find(|area| area.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Iterate areas in registry order.
    pub fn iter(&self) -> std::slice::Iter<'_, Area> {
        self.areas.iter()
    }

    /// Area names in registry order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.areas.iter().map(|area| area.name.as_str())
    }

    /// Number of registered areas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.areas.len()
    }

    /// Whether the registry holds no areas.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

impl<'a> IntoIterator for &'a AreaRegistry {
    type Item = &'a Area;
    type IntoIter = std::slice::Iter<'a, Area>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
