//! Normalised building features and their flat property mapping.

use geo::Coord;
use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::{ElementId, ParseElementIdError, RiskInput, RiskLevel, risk::ParseRiskLevelError};

/// Property key holding the kind-qualified identifier.
pub const ID_KEY: &str = "id";
/// Property key holding the display name.
pub const NAME_KEY: &str = "name";
/// Property key holding the building type.
pub const TYPE_KEY: &str = "type";
/// Property key holding the height in metres.
pub const HEIGHT_KEY: &str = "height_m";
/// Property key holding the storey count.
pub const LEVELS_KEY: &str = "levels";
/// Property key holding the postal address.
pub const ADDRESS_KEY: &str = "address";
/// Property key holding the special-use tag.
pub const USE_KEY: &str = "use";
/// Property key holding the construction year.
pub const YEAR_BUILT_KEY: &str = "year_built";
/// Property key holding the risk classification.
pub const RISK_KEY: &str = "risk_level";

/// One normalised building.
///
/// Optional fields are `None` when the source carried no usable value, which
/// keeps "unknown" distinct from a measured zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Kind-qualified upstream identifier.
    pub id: ElementId,
    /// Display name.
    pub name: Option<String>,
    /// Building classification, `yes` when unspecified.
    pub building_type: String,
    /// Height in metres, finite and non-negative.
    pub height_m: Option<f64>,
    /// Above-ground storeys.
    pub levels: Option<u32>,
    /// Postal address.
    pub address: Option<String>,
    /// Amenity, shop, office or healthcare tag value.
    pub special_use: Option<String>,
    /// Year of construction.
    pub year_built: Option<i32>,
    /// Derived seismic risk.
    pub risk: RiskLevel,
    /// Representative coordinate, `x = longitude`, `y = latitude`.
    pub location: Coord<f64>,
}

/// Errors raised when rebuilding a [`Feature`] from stored properties.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeaturePropertiesError {
    /// A required property is absent.
    #[error("missing property {0:?}")]
    Missing(&'static str),
    /// A property holds a value of the wrong JSON type or range.
    #[error("property {key:?} has unexpected value {value}")]
    Invalid {
        /// Offending key.
        key: &'static str,
        /// Stored value.
        value: Value,
    },
    /// The identifier property is malformed.
    #[error(transparent)]
    Id(#[from] ParseElementIdError),
    /// The risk property names no known level.
    #[error(transparent)]
    Risk(#[from] ParseRiskLevelError),
}

impl Feature {
    /// Structural attributes consumed by the risk rule table.
    #[must_use]
    pub fn risk_input(&self) -> RiskInput<'_> {
        RiskInput {
            height_m: self.height_m,
            levels: self.levels,
            building_type: Some(self.building_type.as_str()),
            year_built: self.year_built,
        }
    }

    /// Flat property mapping written alongside the geometry.
    ///
    /// Unset fields are omitted. Keys iterate in sorted order.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use georisk_core::{ElementId, EntityKind, Feature, RiskLevel};
    ///
    /// let feature = Feature {
    ///     id: ElementId::new(EntityKind::Way, 7),
    ///     name: None,
    ///     building_type: "yes".into(),
    ///     height_m: None,
    ///     levels: Some(2),
    ///     address: None,
    ///     special_use: None,
    ///     year_built: None,
    ///     risk: RiskLevel::Low,
    ///     location: Coord { x: 36.8, y: -1.3 },
    /// };
    /// let properties = feature.properties();
    /// assert_eq!(properties["id"], "way/7");
    /// assert_eq!(properties["risk_level"], "low");
    /// assert!(!properties.contains_key("name"));
    /// ```
    #[must_use]
    pub fn properties(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(ID_KEY.into(), Value::String(self.id.to_string()));
        map.insert(TYPE_KEY.into(), Value::String(self.building_type.clone()));
        map.insert(RISK_KEY.into(), Value::String(self.risk.as_str().into()));
        if let Some(name) = &self.name {
            map.insert(NAME_KEY.into(), Value::String(name.clone()));
        }
        if let Some(height) = self.height_m.and_then(Number::from_f64) {
            map.insert(HEIGHT_KEY.into(), Value::Number(height));
        }
        if let Some(levels) = self.levels {
            map.insert(LEVELS_KEY.into(), Value::from(levels));
        }
        if let Some(address) = &self.address {
            map.insert(ADDRESS_KEY.into(), Value::String(address.clone()));
        }
        if let Some(special_use) = &self.special_use {
            map.insert(USE_KEY.into(), Value::String(special_use.clone()));
        }
        if let Some(year) = self.year_built {
            map.insert(YEAR_BUILT_KEY.into(), Value::from(year));
        }
        map
    }

    /// Rebuild a feature from a property mapping and its coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`FeaturePropertiesError`] when a required key is missing or a
    /// value does not fit its field.
    pub fn from_properties(
        properties: &Map<String, Value>,
        location: Coord<f64>,
    ) -> Result<Self, FeaturePropertiesError> {
        let id = required_str(properties, ID_KEY)?.parse()?;
        let building_type = required_str(properties, TYPE_KEY)?.to_owned();
        let risk = required_str(properties, RISK_KEY)?.parse()?;
        let height_m = optional(properties, HEIGHT_KEY, Value::as_f64)?;
        let levels = optional(properties, LEVELS_KEY, |value| {
            value.as_u64().and_then(|raw| u32::try_from(raw).ok())
        })?;
        let year_built = optional(properties, YEAR_BUILT_KEY, |value| {
            value.as_i64().and_then(|raw| i32::try_from(raw).ok())
        })?;
        Ok(Self {
            id,
            name: optional_string(properties, NAME_KEY)?,
            building_type,
            height_m,
            levels,
            address: optional_string(properties, ADDRESS_KEY)?,
            special_use: optional_string(properties, USE_KEY)?,
            year_built,
            risk,
            location,
        })
    }
}

fn required_str<'a>(
    properties: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a str, FeaturePropertiesError> {
    let value = properties
        .get(key)
        .ok_or(FeaturePropertiesError::Missing(key))?;
    value.as_str().ok_or_else(|| FeaturePropertiesError::Invalid {
        key,
        value: value.clone(),
    })
}

fn optional<T>(
    properties: &Map<String, Value>,
    key: &'static str,
    convert: impl FnOnce(&Value) -> Option<T>,
) -> Result<Option<T>, FeaturePropertiesError> {
    properties
        .get(key)
        .map(|value| {
            convert(value).ok_or_else(|| FeaturePropertiesError::Invalid {
                key,
                value: value.clone(),
            })
        })
        .transpose()
}

fn optional_string(
    properties: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<String>, FeaturePropertiesError> {
    optional(properties, key, |value| value.as_str().map(str::to_owned))
}

/// Ordered set of features forming one scrape's output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    /// Features in upstream order.
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Wrap an ordered list of features.
    #[must_use]
    pub const fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the collection holds no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterate features in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
