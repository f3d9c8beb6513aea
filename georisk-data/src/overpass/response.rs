//! Serde model of the Overpass JSON output format.

use georisk_core::Tags;
use serde::{Deserialize, Serialize};

/// Top-level Overpass response body.
///
/// Only `elements` is interpreted; metadata such as `osm3s` and
/// `generator` is ignored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OverpassResponse {
    /// Elements in server output order.
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Runtime remark, set when the server aborted the query part-way.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

impl OverpassResponse {
    /// Response carrying `elements` and no remark.
    #[must_use]
    pub const fn new(elements: Vec<Element>) -> Self {
        Self {
            elements,
            remark: None,
        }
    }
}

/// Geographic position as emitted by Overpass (`center`, node positions).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

/// One Overpass output element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    /// A point.
    Node {
        /// OSM node id.
        id: i64,
        /// Latitude in decimal degrees.
        lat: f64,
        /// Longitude in decimal degrees.
        lon: f64,
        /// Tags, empty for `out skel` output.
        #[serde(default)]
        tags: Tags,
    },
    /// An ordered node list.
    Way {
        /// OSM way id.
        id: i64,
        /// Referenced node ids in order.
        #[serde(default)]
        nodes: Vec<i64>,
        /// Tags, empty for `out skel` output.
        #[serde(default)]
        tags: Tags,
        /// Server-computed centre, present with `out center`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        center: Option<LatLon>,
    },
    /// A member group.
    Relation {
        /// OSM relation id.
        id: i64,
        /// Members in order.
        #[serde(default)]
        members: Vec<Member>,
        /// Tags, empty for `out skel` output.
        #[serde(default)]
        tags: Tags,
        /// Server-computed centre, present with `out center`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        center: Option<LatLon>,
    },
    /// Any other element type (`area`, `count`, ...), ignored downstream.
    #[serde(other)]
    Other,
}

/// Relation member reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Member element type (`node`, `way`, `relation`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Member id.
    #[serde(rename = "ref")]
    pub reference: i64,
    /// Member role such as `outer` or `inner`.
    #[serde(default)]
    pub role: String,
}
