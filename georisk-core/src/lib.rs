//! Core domain types for the georisk building scraper.
//!
//! Responsibilities:
//! - Describe the regions to scrape ([`BoundingBox`], [`Area`],
//!   [`AreaRegistry`]).
//! - Describe upstream entities ([`RawEntity`], [`ElementId`]) and the
//!   normalised output ([`Feature`], [`FeatureCollection`]).
//! - Classify buildings by seismic risk through the ordered rule table in
//!   [`risk`].
//!
//! Boundaries:
//! - No I/O. Fetching, normalisation and persistence live in `georisk-data`.
//!
//! Invariants:
//! - Bounding boxes use `(south, west, north, east)` order while coordinates
//!   use `x = longitude`, `y = latitude`.
//! - Risk classification is a pure function of a [`RiskInput`].

mod area;
mod bounds;
mod entity;
mod feature;
pub mod risk;

pub use area::{Area, AreaRegistry, DEFAULT_FILE_SUFFIX, RegistryError};
pub use bounds::{BoundingBox, InvalidBoundsError, ParseBoundsError};
pub use entity::{ElementId, EntityKind, ParseElementIdError, RawEntity, Tags};
pub use feature::{
    ADDRESS_KEY, Feature, FeatureCollection, FeaturePropertiesError, HEIGHT_KEY, ID_KEY,
    LEVELS_KEY, NAME_KEY, RISK_KEY, TYPE_KEY, USE_KEY, YEAR_BUILT_KEY,
};
pub use risk::{RiskInput, RiskLevel, classify};
