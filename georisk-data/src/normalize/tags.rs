//! Prioritised tag lookups and lenient value parsing.
//!
//! Every field reads an ordered list of candidate keys; the first key with a
//! non-blank value wins. A present but unparseable value leaves the field
//! unset and is reported as [`Parsed::Malformed`] so callers can count it.

use georisk_core::Tags;

pub(super) const NAME_KEYS: &[&str] = &["name", "name:en", "official_name"];
pub(super) const TYPE_KEYS: &[&str] = &["building", "building:part"];
pub(super) const HEIGHT_KEYS: &[&str] = &["height", "building:height", "est_height"];
pub(super) const LEVEL_KEYS: &[&str] = &["building:levels", "levels"];
pub(super) const USE_KEYS: &[&str] = &["amenity", "shop", "office", "healthcare"];
pub(super) const YEAR_KEYS: &[&str] = &["start_date", "construction_date", "building:year"];
pub(super) const FULL_ADDRESS_KEY: &str = "addr:full";
pub(super) const ADDRESS_PART_KEYS: &[&str] = &["addr:housenumber", "addr:street", "addr:city"];

/// Building type used when no type tag carries a value.
pub(super) const FALLBACK_TYPE: &str = "yes";

const METRES_PER_FOOT: f64 = 0.3048;

/// Outcome of reading a typed field from tags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Parsed<T> {
    /// No candidate key carried a value.
    Absent,
    /// The first present value parsed.
    Valid(T),
    /// The first present value did not parse.
    Malformed {
        key: &'static str,
    },
}

impl<T> Parsed<T> {
    pub(super) fn value(self) -> Option<T> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Absent | Self::Malformed { .. } => None,
        }
    }
}

/// Whether the tags mark the element as a building.
pub(super) fn is_building(tags: &Tags) -> bool {
    first_present(tags, TYPE_KEYS).is_some()
}

/// First candidate key with a non-blank value, and that value trimmed.
pub(super) fn first_present<'a>(
    tags: &'a Tags,
    keys: &[&'static str],
) -> Option<(&'static str, &'a str)> {
    keys.iter().find_map(|key| {
        tags.get(*key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(|value| (*key, value))
    })
}

pub(super) fn text(tags: &Tags, keys: &[&'static str]) -> Option<String> {
    first_present(tags, keys).map(|(_, value)| value.to_owned())
}

pub(super) fn building_type(tags: &Tags) -> String {
    text(tags, TYPE_KEYS).unwrap_or_else(|| FALLBACK_TYPE.to_owned())
}

fn parse_with<T>(
    tags: &Tags,
    keys: &[&'static str],
    parse: impl FnOnce(&str) -> Option<T>,
) -> Parsed<T> {
    match first_present(tags, keys) {
        None => Parsed::Absent,
        Some((key, value)) => parse(value).map_or(Parsed::Malformed { key }, Parsed::Valid),
    }
}

pub(super) fn height(tags: &Tags) -> Parsed<f64> {
    parse_with(tags, HEIGHT_KEYS, parse_height)
}

pub(super) fn levels(tags: &Tags) -> Parsed<u32> {
    parse_with(tags, LEVEL_KEYS, |value| value.parse::<u32>().ok())
}

pub(super) fn year_built(tags: &Tags) -> Parsed<i32> {
    parse_with(tags, YEAR_KEYS, parse_year)
}

/// `addr:full`, otherwise house number, street and city joined by `", "`.
pub(super) fn address(tags: &Tags) -> Option<String> {
    if let Some((_, full)) = first_present(tags, &[FULL_ADDRESS_KEY]) {
        return Some(full.to_owned());
    }
    let parts: Vec<&str> = ADDRESS_PART_KEYS
        .iter()
        .filter_map(|key| first_present(tags, &[*key]).map(|(_, value)| value))
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

/// Parse a height in metres, accepting `m` and `ft` style suffixes.
///
/// Returns `None` for negative, non-finite or non-numeric input.
pub(super) fn parse_height(raw: &str) -> Option<f64> {
    let lowered = raw.trim().to_ascii_lowercase();
    let (number, scale) = [
        ("metres", 1.0),
        ("meters", 1.0),
        ("m", 1.0),
        ("feet", METRES_PER_FOOT),
        ("ft", METRES_PER_FOOT),
        ("'", METRES_PER_FOOT),
    ]
    .into_iter()
    .find_map(|(suffix, scale)| lowered.strip_suffix(suffix).map(|rest| (rest, scale)))
    .unwrap_or((lowered.as_str(), 1.0));
    let value = number.trim().replace(',', ".").parse::<f64>().ok()? * scale;
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Leading four-digit year of a date such as `1962`, `1962-05-01` or `~1950s`.
pub(super) fn parse_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim().trim_start_matches('~');
    let digits = trimmed.get(..4)?;
    if !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    if trimmed.as_bytes().get(4).is_some_and(u8::is_ascii_digit) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[rstest]
    #[case("12", Some(12.0))]
    #[case("12.5 m", Some(12.5))]
    #[case("12,5", Some(12.5))]
    #[case("30 metres", Some(30.0))]
    #[case("0", Some(0.0))]
    #[case("100 ft", Some(30.48))]
    #[case("-3", None)]
    #[case("tall", None)]
    #[case("NaN", None)]
    #[case("inf", None)]
    #[case("", None)]
    fn parses_heights(#[case] raw: &str, #[case] expected: Option<f64>) {
        match (parse_height(raw), expected) {
            (Some(actual), Some(wanted)) => assert!((actual - wanted).abs() < 1e-9),
            (actual, wanted) => assert_eq!(actual, wanted),
        }
    }

    #[rstest]
    #[case("1962", Some(1962))]
    #[case("1962-05-01", Some(1962))]
    #[case("~1950s", Some(1950))]
    #[case("C19", None)]
    #[case("19621", None)]
    #[case("62", None)]
    fn parses_years(#[case] raw: &str, #[case] expected: Option<i32>) {
        assert_eq!(parse_year(raw), expected);
    }

    #[rstest]
    fn first_present_skips_blank_values() {
        let tags = tags(&[("name", "  "), ("name:en", "Kenyatta Centre")]);
        assert_eq!(
            first_present(&tags, NAME_KEYS),
            Some(("name:en", "Kenyatta Centre"))
        );
    }

    #[rstest]
    fn malformed_value_does_not_fall_through() {
        let tags = tags(&[("height", "very"), ("building:height", "20")]);
        assert_eq!(height(&tags), Parsed::Malformed { key: "height" });
        assert_eq!(height(&tags).value(), None);
    }

    #[rstest]
    #[case(&[("building:levels", "4")], Parsed::Valid(4))]
    #[case(&[("levels", "2")], Parsed::Valid(2))]
    #[case(&[("building:levels", "-1")], Parsed::Malformed { key: "building:levels" })]
    #[case(&[("building:levels", "2.5")], Parsed::Malformed { key: "building:levels" })]
    #[case(&[], Parsed::Absent)]
    fn reads_levels(#[case] pairs: &[(&str, &str)], #[case] expected: Parsed<u32>) {
        assert_eq!(levels(&tags(pairs)), expected);
    }

    #[rstest]
    fn address_prefers_full_form() {
        let tags = tags(&[
            ("addr:full", "Kenyatta Avenue, Nairobi"),
            ("addr:street", "Ignored"),
        ]);
        assert_eq!(address(&tags).as_deref(), Some("Kenyatta Avenue, Nairobi"));
    }

    #[rstest]
    fn address_joins_parts_in_order() {
        let tags = tags(&[
            ("addr:city", "Mombasa"),
            ("addr:housenumber", "7"),
            ("addr:street", "Moi Avenue"),
        ]);
        assert_eq!(address(&tags).as_deref(), Some("7, Moi Avenue, Mombasa"));
    }

    #[rstest]
    fn address_absent_without_parts() {
        assert_eq!(address(&tags(&[("building", "yes")])), None);
    }

    #[rstest]
    fn building_type_falls_back_to_yes() {
        assert_eq!(building_type(&tags(&[("building:part", "roof")])), "roof");
        assert_eq!(building_type(&tags(&[("building", " ")])), "yes");
    }
}
