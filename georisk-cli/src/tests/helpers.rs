//! Stub sources and fixtures shared by the CLI tests.

use super::*;
use crate::scrape::{ScrapeConfig, SourceBuilder};
use camino::Utf8PathBuf;
use georisk_data::overpass::{
    OverpassResponse, OverpassSource, TransportError, test_support::ScriptedSource,
};
use std::cell::RefCell;
use tempfile::TempDir;

/// Two buildings inside central Nairobi, one of them a kiosk.
const KIOSK_RESPONSE: &str = r#"{
  "elements": [
    {
      "type": "node",
      "id": 7,
      "lat": -1.2921,
      "lon": 36.8219,
      "tags": { "building": "hut", "amenity": "kiosk" }
    },
    {
      "type": "node",
      "id": 8,
      "lat": -1.2925,
      "lon": 36.8222,
      "tags": { "building": "house", "start_date": "1985" }
    }
  ]
}"#;

pub(super) fn kiosk_response() -> OverpassResponse {
    serde_json::from_str(KIOSK_RESPONSE).expect("kiosk response should decode")
}

pub(super) fn unavailable() -> TransportError {
    TransportError::Http {
        url: "stub://overpass".to_owned(),
        status: 503,
        message: "Service Unavailable".to_owned(),
    }
}

/// How the stub upstream answers.
#[derive(Debug, Clone)]
pub(super) enum Upstream {
    Answers(OverpassResponse),
    Unavailable,
}

/// Builds scripted sources and remembers the configuration it was given.
#[derive(Debug)]
pub(super) struct StubSourceBuilder {
    upstream: Upstream,
    seen: RefCell<Option<ScrapeConfig>>,
}

impl StubSourceBuilder {
    pub(super) fn new(upstream: Upstream) -> Self {
        Self {
            upstream,
            seen: RefCell::new(None),
        }
    }

    pub(super) fn seen(&self) -> Option<ScrapeConfig> {
        self.seen.borrow().clone()
    }
}

impl SourceBuilder for StubSourceBuilder {
    fn build(&self, config: &ScrapeConfig) -> Result<Box<dyn OverpassSource>, CliError> {
        self.seen.replace(Some(config.clone()));
        let source = match &self.upstream {
            Upstream::Answers(response) => ScriptedSource::always(response.clone()),
            Upstream::Unavailable => ScriptedSource::new(vec![Err(unavailable()); 8]),
        };
        Ok(Box::new(source))
    }
}

pub(super) fn utf8_root(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir")
}
