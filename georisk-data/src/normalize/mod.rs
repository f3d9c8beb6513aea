//! Turn Overpass output into normalised, risk-classified features.
//!
//! Normalisation runs in two passes. [`raw_entities`] resolves a single
//! coordinate for every building-tagged element, then
//! [`normalize_entities`] deduplicates, extracts typed fields and classifies
//! each building. [`normalize`] chains both.
//!
//! Output order follows upstream element order, so identical input yields
//! identical output.

mod geometry;
mod tags;

use std::collections::HashSet;

use georisk_core::{
    ElementId, EntityKind, Feature, FeatureCollection, RawEntity, RiskInput, Tags, classify,
};
use log::debug;

use crate::overpass::{Element, OverpassResponse};

use self::{geometry::GeometryIndex, tags::Parsed};

/// Features produced from one response, with what was left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeReport {
    /// Features in upstream order.
    pub collection: FeatureCollection,
    /// Buildings dropped because no coordinate could be derived.
    pub dropped_without_geometry: usize,
    /// Later occurrences of an identifier already emitted.
    pub duplicates: usize,
    /// Malformed numeric tags left unset.
    pub invalid_values: usize,
}

/// Building-tagged elements of `response` with their resolved geometry.
///
/// Elements without a building tag (typically the `out skel` node and way
/// copies used for geometry) are skipped silently.
#[must_use]
pub fn raw_entities(response: &OverpassResponse) -> Vec<RawEntity> {
    let index = GeometryIndex::from_elements(&response.elements);
    response
        .elements
        .iter()
        .filter_map(|element| {
            let (id, tags) = identify(element)?;
            if !tags::is_building(tags) {
                return None;
            }
            Some(RawEntity::new(id, tags.clone(), index.resolve(element)))
        })
        .collect()
}

fn identify(element: &Element) -> Option<(ElementId, &Tags)> {
    match element {
        Element::Node { id, tags, .. } => Some((ElementId::new(EntityKind::Node, *id), tags)),
        Element::Way { id, tags, .. } => Some((ElementId::new(EntityKind::Way, *id), tags)),
        Element::Relation { id, tags, .. } => {
            Some((ElementId::new(EntityKind::Relation, *id), tags))
        }
        Element::Other => None,
    }
}

/// Deduplicate, extract and classify raw entities.
///
/// The first occurrence of an identifier wins. Entities without geometry are
/// dropped and counted.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use georisk_core::{ElementId, EntityKind, RawEntity, RiskLevel, Tags};
/// use georisk_data::normalize::normalize_entities;
///
/// let tags: Tags = [("building", "house")]
///     .into_iter()
///     .map(|(k, v)| (k.to_owned(), v.to_owned()))
///     .collect();
/// let id = ElementId::new(EntityKind::Way, 1);
/// let report = normalize_entities([
///     RawEntity::new(id, tags.clone(), Some(Coord { x: 36.8, y: -1.3 })),
///     RawEntity::new(id, tags, Some(Coord { x: 0.0, y: 0.0 })),
/// ]);
/// assert_eq!(report.collection.len(), 1);
/// assert_eq!(report.duplicates, 1);
/// assert_eq!(report.collection.features[0].risk, RiskLevel::Low);
/// ```
#[must_use]
pub fn normalize_entities(entities: impl IntoIterator<Item = RawEntity>) -> NormalizeReport {
    let mut report = NormalizeReport::default();
    let mut seen = HashSet::new();
    for entity in entities {
        if !seen.insert(entity.id) {
            debug!("Skipping duplicate {}", entity.id);
            report.duplicates += 1;
            continue;
        }
        let Some(location) = entity.geometry else {
            debug!("Dropping {} without resolvable geometry", entity.id);
            report.dropped_without_geometry += 1;
            continue;
        };
        let (feature, malformed) = extract(&entity, location);
        report.invalid_values += malformed;
        report.collection.features.push(feature);
    }
    report
}

/// Normalise a full Overpass response.
#[must_use]
pub fn normalize(response: &OverpassResponse) -> NormalizeReport {
    normalize_entities(raw_entities(response))
}

fn extract(entity: &RawEntity, location: geo::Coord<f64>) -> (Feature, usize) {
    let tags = &entity.tags;
    let height = tags::height(tags);
    let levels = tags::levels(tags);
    let year = tags::year_built(tags);

    let mut malformed = 0;
    for key in [malformed_key(&height), malformed_key(&levels), malformed_key(&year)]
        .into_iter()
        .flatten()
    {
        debug!("Ignoring malformed {key} on {}", entity.id);
        malformed += 1;
    }

    let building_type = tags::building_type(tags);
    let height_m = height.value();
    let levels = levels.value();
    let year_built = year.value();
    let risk = classify(&RiskInput {
        height_m,
        levels,
        building_type: Some(building_type.as_str()),
        year_built,
    });
    let feature = Feature {
        id: entity.id,
        name: tags::text(tags, tags::NAME_KEYS),
        building_type,
        height_m,
        levels,
        address: tags::address(tags),
        special_use: tags::text(tags, tags::USE_KEYS),
        year_built,
        risk,
        location,
    };
    (feature, malformed)
}

fn malformed_key<T>(parsed: &Parsed<T>) -> Option<&'static str> {
    match parsed {
        Parsed::Malformed { key } => Some(*key),
        Parsed::Absent | Parsed::Valid(_) => None,
    }
}

/// Express `feature` as the tags that normalise back to it.
///
/// Each field maps to the highest-priority tag key it is read from.
#[must_use]
pub fn to_raw_entity(feature: &Feature) -> RawEntity {
    let mut tags = Tags::new();
    tags.insert(tags::TYPE_KEYS[0].to_owned(), feature.building_type.clone());
    let mut put = |key: &str, value: Option<String>| {
        if let Some(value) = value {
            tags.insert(key.to_owned(), value);
        }
    };
    put(tags::NAME_KEYS[0], feature.name.clone());
    put(tags::HEIGHT_KEYS[0], feature.height_m.map(|h| h.to_string()));
    put(tags::LEVEL_KEYS[0], feature.levels.map(|n| n.to_string()));
    put(tags::FULL_ADDRESS_KEY, feature.address.clone());
    put(tags::USE_KEYS[0], feature.special_use.clone());
    put(
        tags::YEAR_KEYS[0],
        feature.year_built.map(|year| format!("{year:04}")),
    );
    RawEntity::new(feature.id, tags, Some(feature.location))
}
