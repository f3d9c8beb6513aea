//! Geographic bounding boxes in south/west/north/east order.
//!
//! A [`BoundingBox`] is a plain value so that registries and configuration
//! files can hold boxes that have not been checked yet. Validation happens
//! at the query boundary through [`BoundingBox::validate`].

use std::{fmt, str::FromStr};

use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const LATITUDE_LIMIT: f64 = 90.0;
const LONGITUDE_LIMIT: f64 = 180.0;

/// Rectangular WGS84 filter expressed in decimal degrees.
///
/// The field order mirrors the Overpass QL bounding-box order
/// `(south, west, north, east)`. Note that [`geo`] coordinates use the
/// opposite axis order (`x = longitude`, `y = latitude`).
///
/// # Examples
/// ```
/// use georisk_core::BoundingBox;
///
/// let nairobi = BoundingBox::new(-1.35, 36.70, -1.20, 36.95);
/// assert!(nairobi.validate().is_ok());
/// assert_eq!(nairobi.to_array(), [-1.35, 36.70, -1.20, 36.95]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern latitude edge.
    pub south: f64,
    /// Western longitude edge.
    pub west: f64,
    /// Northern latitude edge.
    pub north: f64,
    /// Eastern longitude edge.
    pub east: f64,
}

/// Reasons a [`BoundingBox`] cannot be used to query upstream data.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InvalidBoundsError {
    /// One of the edges is NaN or infinite.
    #[error("{edge} must be a finite number, got {value}")]
    NonFinite {
        /// Name of the offending edge.
        edge: &'static str,
        /// Value supplied for the edge.
        value: f64,
    },
    /// One of the edges lies outside the WGS84 range.
    #[error("{edge} {value} lies outside -{limit}..={limit}")]
    OutOfRange {
        /// Name of the offending edge.
        edge: &'static str,
        /// Value supplied for the edge.
        value: f64,
        /// Absolute limit for the edge.
        limit: f64,
    },
    /// The southern edge is not strictly below the northern edge.
    #[error("south ({south}) must be less than north ({north})")]
    LatitudeOrder {
        /// Southern edge.
        south: f64,
        /// Northern edge.
        north: f64,
    },
    /// The western edge is not strictly left of the eastern edge.
    #[error("west ({west}) must be less than east ({east})")]
    LongitudeOrder {
        /// Western edge.
        west: f64,
        /// Eastern edge.
        east: f64,
    },
}

/// Errors raised when parsing a `S,W,N,E` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseBoundsError {
    /// The input did not contain exactly four comma-separated values.
    #[error("expected four comma-separated values (south,west,north,east), found {found}")]
    Arity {
        /// Number of values found.
        found: usize,
    },
    /// One of the values is not a decimal number.
    #[error("{value:?} is not a decimal degree value")]
    Number {
        /// Offending input fragment.
        value: String,
    },
}

impl BoundingBox {
    /// Construct a box from its edges in `(south, west, north, east)` order.
    #[must_use]
    pub const fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Check the box is finite, within WGS84 and correctly ordered.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidBoundsError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), InvalidBoundsError> {
        let edges = [
            ("south", self.south, LATITUDE_LIMIT),
            ("west", self.west, LONGITUDE_LIMIT),
            ("north", self.north, LATITUDE_LIMIT),
            ("east", self.east, LONGITUDE_LIMIT),
        ];
        for (edge, value, limit) in edges {
            if !value.is_finite() {
                return Err(InvalidBoundsError::NonFinite { edge, value });
            }
            if !(-limit..=limit).contains(&value) {
                return Err(InvalidBoundsError::OutOfRange { edge, value, limit });
            }
        }
        if self.south >= self.north {
            return Err(InvalidBoundsError::LatitudeOrder {
                south: self.south,
                north: self.north,
            });
        }
        if self.west >= self.east {
            return Err(InvalidBoundsError::LongitudeOrder {
                west: self.west,
                east: self.east,
            });
        }
        Ok(())
    }

    /// Edges in `(south, west, north, east)` order.
    #[must_use]
    pub const fn to_array(&self) -> [f64; 4] {
        [self.south, self.west, self.north, self.east]
    }

    /// Convert to a [`geo::Rect`] with `x = longitude`, `y = latitude`.
    #[must_use]
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.west,
                y: self.south,
            },
            Coord {
                x: self.east,
                y: self.north,
            },
        )
    }

    /// Whether `coord` (`x = longitude`, `y = latitude`) lies inside the box.
    ///
    /// Edges are inclusive.
    #[must_use]
    pub fn contains(&self, coord: Coord<f64>) -> bool {
        (self.south..=self.north).contains(&coord.y) && (self.west..=self.east).contains(&coord.x)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.south, self.west, self.north, self.east
        )
    }
}

impl FromStr for BoundingBox {
    type Err = ParseBoundsError;

    /// Parse `S,W,N,E`. Ordering is not checked here; call
    /// [`BoundingBox::validate`] before use.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let values = input
            .split(',')
            .map(|part| {
                let trimmed = part.trim();
                trimmed.parse::<f64>().map_err(|_| ParseBoundsError::Number {
                    value: trimmed.to_owned(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        match values.as_slice() {
            [south, west, north, east] => Ok(Self::new(*south, *west, *north, *east)),
            other => Err(ParseBoundsError::Arity { found: other.len() }),
        }
    }
}
