//! GeoJSON persistence for feature collections.
//!
//! Files are written through [`georisk_fs::write_atomic`], so a reader never
//! observes a partially written document.

use camino::{Utf8Path, Utf8PathBuf};
use geo::Coord;
use geojson::{GeoJson, Geometry, JsonObject, Value, feature::Id};
use georisk_core::{Feature, FeatureCollection, FeaturePropertiesError};
use log::info;
use thiserror::Error;

/// Errors raised while writing a collection.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The document could not be serialised.
    #[error("failed to serialise GeoJSON for {path}")]
    Serialize {
        /// Destination path.
        path: Utf8PathBuf,
        /// Serialiser error.
        #[source]
        source: serde_json::Error,
    },
    /// The document could not be persisted.
    #[error("failed to write {path}")]
    Io {
        /// Destination path.
        path: Utf8PathBuf,
        /// Filesystem error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while reading a collection back.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The file could not be read.
    #[error("failed to read {path}")]
    Io {
        /// Source path.
        path: Utf8PathBuf,
        /// Filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid GeoJSON.
    #[error("{path} is not valid GeoJSON")]
    Parse {
        /// Source path.
        path: Utf8PathBuf,
        /// Parser error.
        #[source]
        source: Box<geojson::Error>,
    },
    /// The document is GeoJSON but not a `FeatureCollection`.
    #[error("{path} does not hold a FeatureCollection")]
    NotACollection {
        /// Source path.
        path: Utf8PathBuf,
    },
    /// A feature lacks a point geometry.
    #[error("feature {index} in {path} has no point geometry")]
    Geometry {
        /// Source path.
        path: Utf8PathBuf,
        /// Position of the feature in the collection.
        index: usize,
    },
    /// A feature's properties do not describe a building.
    #[error("feature {index} in {path} has invalid properties")]
    Properties {
        /// Source path.
        path: Utf8PathBuf,
        /// Position of the feature in the collection.
        index: usize,
        /// Property error.
        #[source]
        source: FeaturePropertiesError,
    },
}

/// Convert features into a GeoJSON `FeatureCollection`.
///
/// Each feature carries its `id`, its flat property map and a `Point`
/// geometry in `[longitude, latitude]` order.
#[must_use]
pub fn to_geojson(collection: &FeatureCollection) -> geojson::FeatureCollection {
    geojson::FeatureCollection {
        bbox: None,
        features: collection.iter().map(to_geojson_feature).collect(),
        foreign_members: None,
    }
}

fn to_geojson_feature(feature: &Feature) -> geojson::Feature {
    let point = Value::Point(vec![feature.location.x, feature.location.y]);
    geojson::Feature {
        bbox: None,
        geometry: Some(Geometry::new(point)),
        id: Some(Id::String(feature.id.to_string())),
        properties: Some(feature.properties()),
        foreign_members: None,
    }
}

/// Render `collection` as pretty-printed GeoJSON text.
///
/// # Errors
///
/// Returns the serialiser error; this only happens for non-finite numbers,
/// which normalised features never carry.
pub fn render(collection: &FeatureCollection) -> Result<Vec<u8>, serde_json::Error> {
    let mut bytes = serde_json::to_vec_pretty(&to_geojson(collection))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Atomically write `collection` to `path`, creating parent directories.
///
/// Either the previous file (if any) or the complete new document is left
/// at `path`.
///
/// # Errors
///
/// Returns [`WriteError`] naming `path` when serialisation or any
/// filesystem step fails.
pub fn write_feature_collection(
    path: &Utf8Path,
    collection: &FeatureCollection,
) -> Result<(), WriteError> {
    let bytes = render(collection).map_err(|source| WriteError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    georisk_fs::write_atomic(path, &bytes).map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Saved {} features to {path}", collection.len());
    Ok(())
}

/// Read a collection written by [`write_feature_collection`].
///
/// # Errors
///
/// Returns [`ReadError`] when the file is unreadable, is not a GeoJSON
/// `FeatureCollection`, or holds a feature that does not describe a
/// building.
pub fn read_feature_collection(path: &Utf8Path) -> Result<FeatureCollection, ReadError> {
    let text = georisk_fs::read_to_string(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document = text.parse::<GeoJson>().map_err(|source| ReadError::Parse {
        path: path.to_path_buf(),
        source: Box::new(source),
    })?;
    let GeoJson::FeatureCollection(collection) = document else {
        return Err(ReadError::NotACollection {
            path: path.to_path_buf(),
        });
    };
    collection
        .features
        .iter()
        .enumerate()
        .map(|(index, feature)| from_geojson_feature(path, index, feature))
        .collect()
}

fn from_geojson_feature(
    path: &Utf8Path,
    index: usize,
    feature: &geojson::Feature,
) -> Result<Feature, ReadError> {
    let location = point_of(feature).ok_or_else(|| ReadError::Geometry {
        path: path.to_path_buf(),
        index,
    })?;
    let empty = JsonObject::new();
    let properties = feature.properties.as_ref().unwrap_or(&empty);
    Feature::from_properties(properties, location).map_err(|source| ReadError::Properties {
        path: path.to_path_buf(),
        index,
        source,
    })
}

fn point_of(feature: &geojson::Feature) -> Option<Coord<f64>> {
    match &feature.geometry.as_ref()?.value {
        Value::Point(position) => match position.as_slice() {
            [x, y, ..] => Some(Coord { x: *x, y: *y }),
            _ => None,
        },
        _ => None,
    }
}
