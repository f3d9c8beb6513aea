//! Resolve Overpass elements to a single representative coordinate.

use std::collections::HashMap;

use geo::{Centroid, Coord, MultiPoint, Point};
use log::debug;

use crate::overpass::{Element, LatLon, Member};

/// Minimum resolved nodes for a way to count as a footprint.
pub(super) const MIN_FOOTPRINT_NODES: usize = 3;

/// Node positions and way node lists gathered from one response.
///
/// The first occurrence of an id wins. Later repeats (for example the
/// untagged `out skel` copy of a way) never replace earlier data.
#[derive(Debug, Default)]
pub(super) struct GeometryIndex<'a> {
    nodes: HashMap<i64, Coord<f64>>,
    ways: HashMap<i64, &'a [i64]>,
}

impl<'a> GeometryIndex<'a> {
    pub(super) fn from_elements(elements: &'a [Element]) -> Self {
        let mut index = Self::default();
        for element in elements {
            match element {
                Element::Node { id, lat, lon, .. } => match validated_coord(*lon, *lat) {
                    Some(coord) => {
                        index.nodes.entry(*id).or_insert(coord);
                    }
                    None => debug!("Ignoring node/{id} with invalid position ({lat}, {lon})"),
                },
                Element::Way { id, nodes, .. } if !nodes.is_empty() => {
                    index.ways.entry(*id).or_insert(nodes.as_slice());
                }
                _ => {}
            }
        }
        index
    }

    /// Representative coordinate for `element`, if one can be derived.
    pub(super) fn resolve(&self, element: &Element) -> Option<Coord<f64>> {
        match element {
            Element::Node { lat, lon, .. } => validated_coord(*lon, *lat),
            Element::Way { nodes, center, .. } => center
                .and_then(from_center)
                .or_else(|| self.footprint_centroid(nodes)),
            Element::Relation {
                members, center, ..
            } => center
                .and_then(from_center)
                .or_else(|| self.member_centroid(members)),
            Element::Other => None,
        }
    }

    /// Mean position of the resolved nodes of a way.
    ///
    /// Closed rings repeat their first node, which is kept in the mean.
    fn footprint_centroid(&self, refs: &[i64]) -> Option<Coord<f64>> {
        let points: Vec<Point<f64>> = refs
            .iter()
            .filter_map(|node_id| self.nodes.get(node_id).copied())
            .map(Point::from)
            .collect();
        if points.len() < MIN_FOOTPRINT_NODES {
            return None;
        }
        centroid(points)
    }

    /// Mean of the footprint centroids of member ways.
    fn member_centroid(&self, members: &[Member]) -> Option<Coord<f64>> {
        let points: Vec<Point<f64>> = members
            .iter()
            .filter(|member| member.kind == "way")
            .filter_map(|member| self.ways.get(&member.reference))
            .filter_map(|refs| self.footprint_centroid(refs))
            .map(Point::from)
            .collect();
        if points.is_empty() {
            return None;
        }
        centroid(points)
    }
}

fn centroid(points: Vec<Point<f64>>) -> Option<Coord<f64>> {
    MultiPoint::new(points).centroid().map(Coord::from)
}

fn from_center(center: LatLon) -> Option<Coord<f64>> {
    validated_coord(center.lon, center.lat)
}

fn validated_coord(lon: f64, lat: f64) -> Option<Coord<f64>> {
    let valid = lon.is_finite()
        && lat.is_finite()
        && (-180.0..=180.0).contains(&lon)
        && (-90.0..=90.0).contains(&lat);
    valid.then_some(Coord { x: lon, y: lat })
}
