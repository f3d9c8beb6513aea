//! Shared fixtures for the georisk-data behavioural tests.

use camino::{Utf8Path, Utf8PathBuf};
use georisk_data::overpass::{OverpassResponse, TransportError};
use tempfile::TempDir;

/// Overpass output for a small slice of central Nairobi.
///
/// Two buildings resolve to a point; way 1002 references a node missing from
/// the response and cannot be placed.
const SAMPLE_RESPONSE: &str = r#"{
  "version": 0.6,
  "generator": "Overpass API",
  "elements": [
    {
      "type": "way",
      "id": 1001,
      "nodes": [1, 2, 3, 4, 1],
      "tags": {
        "building": "apartments",
        "name": "Ngara Flats",
        "building:levels": "8",
        "start_date": "1962"
      }
    },
    {
      "type": "way",
      "id": 1002,
      "nodes": [5, 6, 404],
      "tags": { "building": "yes" }
    },
    {
      "type": "node",
      "id": 7,
      "lat": -1.2921,
      "lon": 36.8219,
      "tags": { "building": "hut", "amenity": "kiosk" }
    },
    { "type": "node", "id": 1, "lat": -1.2900, "lon": 36.8100 },
    { "type": "node", "id": 2, "lat": -1.2900, "lon": 36.8120 },
    { "type": "node", "id": 3, "lat": -1.2880, "lon": 36.8120 },
    { "type": "node", "id": 4, "lat": -1.2880, "lon": 36.8100 },
    { "type": "node", "id": 5, "lat": -1.3000, "lon": 36.8300 },
    { "type": "node", "id": 6, "lat": -1.3000, "lon": 36.8310 }
  ]
}"#;

/// Decoded [`SAMPLE_RESPONSE`].
pub fn sample_response() -> OverpassResponse {
    serde_json::from_str(SAMPLE_RESPONSE)
        .unwrap_or_else(|err| panic!("sample response should decode: {err}"))
}

/// Transient upstream failure.
pub fn unavailable() -> TransportError {
    TransportError::Http {
        url: "stub://overpass".to_owned(),
        status: 503,
        message: "Service Unavailable".to_owned(),
    }
}

/// Non-retryable upstream failure.
pub fn rejected(status: u16) -> TransportError {
    TransportError::Http {
        url: "stub://overpass".to_owned(),
        status,
        message: "rejected".to_owned(),
    }
}

/// UTF-8 view of a temporary directory.
pub fn utf8_root(dir: &TempDir) -> Utf8PathBuf {
    Utf8Path::from_path(dir.path())
        .unwrap_or_else(|| panic!("temporary directory {:?} is not UTF-8", dir.path()))
        .to_path_buf()
}
