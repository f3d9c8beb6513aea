//! Facade crate for the georisk building scraper.
//!
//! This crate re-exports the core domain types together with the scrape
//! pipeline entry points from `georisk-data`.

#![forbid(unsafe_code)]

pub use georisk_core::{
    Area, AreaRegistry, BoundingBox, ElementId, EntityKind, Feature, FeatureCollection,
    InvalidBoundsError, RawEntity, RiskInput, RiskLevel, classify,
};
pub use georisk_data::{
    BatchOptions, BatchRunner, BatchSummary, NormalizeReport, ScrapeError, ScrapeReport, Scraper,
    normalize, read_feature_collection, write_feature_collection,
};
