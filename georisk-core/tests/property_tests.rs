//! Property-based tests for bounding boxes and risk classification.
//!
//! # Invariants tested
//!
//! - **Ordering:** a box validates exactly when `south < north` and
//!   `west < east` within the WGS84 range.
//! - **Parsing:** the `S,W,N,E` form parses back to the same edges.
//! - **Determinism:** classifying the same input twice yields the same level.

use georisk_core::{BoundingBox, InvalidBoundsError, RiskInput, classify};
use proptest::prelude::*;

fn latitude() -> impl Strategy<Value = f64> {
    -90.0_f64..=90.0
}

fn longitude() -> impl Strategy<Value = f64> {
    -180.0_f64..=180.0
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: ordered in-range boxes always validate.
    #[test]
    fn ordered_boxes_validate(
        a in latitude(),
        b in latitude(),
        c in longitude(),
        d in longitude(),
    ) {
        prop_assume!(a != b && c != d);
        let bounds = BoundingBox::new(a.min(b), c.min(d), a.max(b), c.max(d));
        prop_assert_eq!(bounds.validate(), Ok(()));
    }

    /// Property: swapping south and north is always rejected.
    #[test]
    fn inverted_latitudes_are_rejected(
        a in latitude(),
        b in latitude(),
        c in longitude(),
        d in longitude(),
    ) {
        prop_assume!(c != d);
        let bounds = BoundingBox::new(a.max(b), c.min(d), a.min(b), c.max(d));
        let is_latitude_order = matches!(
            bounds.validate(),
            Err(InvalidBoundsError::LatitudeOrder { .. })
        );
        prop_assert!(is_latitude_order);
    }

    /// Property: swapping west and east is always rejected.
    #[test]
    fn inverted_longitudes_are_rejected(
        a in latitude(),
        b in latitude(),
        c in longitude(),
        d in longitude(),
    ) {
        prop_assume!(a != b);
        let bounds = BoundingBox::new(a.min(b), c.max(d), a.max(b), c.min(d));
        let is_longitude_order = matches!(
            bounds.validate(),
            Err(InvalidBoundsError::LongitudeOrder { .. })
        );
        prop_assert!(is_longitude_order);
    }

    /// Property: the comma-separated form parses back losslessly.
    #[test]
    fn comma_form_parses_back(
        south in latitude(),
        west in longitude(),
        north in latitude(),
        east in longitude(),
    ) {
        let text = format!("{south},{west},{north},{east}");
        let parsed: BoundingBox = text.parse().expect("formatted box should parse");
        prop_assert_eq!(parsed, BoundingBox::new(south, west, north, east));
    }

    /// Property: classification is a pure function of its input.
    #[test]
    fn classification_is_deterministic(
        height in proptest::option::of(0.0_f64..300.0),
        levels in proptest::option::of(0_u32..100),
        year in proptest::option::of(1800_i32..2030),
        building_type in proptest::sample::select(vec!["yes", "house", "warehouse", "office"]),
    ) {
        let input = RiskInput {
            height_m: height,
            levels,
            building_type: Some(building_type),
            year_built: year,
        };
        prop_assert_eq!(classify(&input), classify(&input));
    }
}
