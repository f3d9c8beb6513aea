//! Overpass QL query construction.

use std::fmt::{self, Write as _};

use georisk_core::{BoundingBox, EntityKind, InvalidBoundsError};

/// Tag key that marks an element as a building.
pub const PRIMARY_KEY: &str = "building";

/// Server-side execution limit declared in the query, in seconds.
pub const DEFAULT_SERVER_TIMEOUT_SECS: u32 = 60;

/// Element kinds selected when the caller does not choose.
pub const DEFAULT_KINDS: [EntityKind; 2] = [EntityKind::Way, EntityKind::Relation];

/// Settings shared by every query a scraper issues.
///
/// Kept separate from [`OverpassQuery`] so a single configuration can build
/// queries for many areas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    building_types: Vec<String>,
    kinds: Vec<EntityKind>,
    server_timeout_secs: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            building_types: Vec::new(),
            kinds: DEFAULT_KINDS.to_vec(),
            server_timeout_secs: DEFAULT_SERVER_TIMEOUT_SECS,
        }
    }
}

impl QueryOptions {
    /// Restrict results to the given `building=*` values.
    ///
    /// Empty or whitespace-only values are ignored.
    #[must_use]
    pub fn with_building_types<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.building_types = values
            .into_iter()
            .map(Into::into)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .collect();
        self
    }

    /// Select the given element kinds. An empty list restores the default.
    #[must_use]
    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = EntityKind>) -> Self {
        let mut selected: Vec<EntityKind> = kinds.into_iter().collect();
        selected.sort_unstable();
        selected.dedup();
        self.kinds = if selected.is_empty() {
            DEFAULT_KINDS.to_vec()
        } else {
            selected
        };
        self
    }

    /// Declare the server-side timeout, in seconds.
    #[must_use]
    pub const fn with_server_timeout(mut self, secs: u32) -> Self {
        self.server_timeout_secs = secs;
        self
    }

    /// Server-side timeout, in seconds.
    #[must_use]
    pub const fn server_timeout_secs(&self) -> u32 {
        self.server_timeout_secs
    }

    /// Validate `bounds` and render the query text.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidBoundsError`] when `bounds` is unordered, non-finite
    /// or outside the WGS84 range.
    pub fn build(&self, bounds: BoundingBox) -> Result<OverpassQuery, InvalidBoundsError> {
        bounds.validate()?;
        Ok(OverpassQuery {
            bounds,
            text: self.render(bounds),
        })
    }

    fn render(&self, bounds: BoundingBox) -> String {
        let filter = self.tag_filter();
        let bbox = format!(
            "({},{},{},{})",
            bounds.south, bounds.west, bounds.north, bounds.east
        );
        let mut text = format!("[out:json][timeout:{}];\n(\n", self.server_timeout_secs);
        for kind in &self.kinds {
            // Writing into a String cannot fail.
            let _infallible = writeln!(text, "  {kind}{filter}{bbox};");
        }
        text.push_str(");\nout body;\n>;\nout skel qt;");
        text
    }

    fn tag_filter(&self) -> String {
        if self.building_types.is_empty() {
            return format!("[\"{PRIMARY_KEY}\"]");
        }
        let alternatives = self
            .building_types
            .iter()
            .map(|value| escape_regex(value))
            .collect::<Vec<_>>()
            .join("|");
        format!("[\"{PRIMARY_KEY}\"~\"^({alternatives})$\"]")
    }
}

/// Escape a literal for use inside a quoted Overpass regular expression.
fn escape_regex(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '.' | '^' | '$' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}' => {
                escaped.push_str("\\\\");
                escaped.push(ch);
            }
            '\\' => escaped.push_str("\\\\\\\\"),
            '"' => escaped.push_str("\\\""),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// A validated Overpass QL query.
///
/// Only [`QueryOptions::build`] and [`OverpassQueryBuilder::build`] create
/// values of this type, so holding one proves the bounding box passed
/// validation.
///
/// # Examples
/// ```
/// use georisk_core::BoundingBox;
/// use georisk_data::overpass::OverpassQuery;
///
/// let query = OverpassQuery::builder(BoundingBox::new(-1.35, 36.7, -1.2, 36.95))
///     .build()
///     .expect("valid bounds");
/// assert!(query.as_str().contains("way[\"building\"](-1.35,36.7,-1.2,36.95);"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OverpassQuery {
    bounds: BoundingBox,
    text: String,
}

impl OverpassQuery {
    /// Start building a query for `bounds`.
    #[must_use]
    pub fn builder(bounds: BoundingBox) -> OverpassQueryBuilder {
        OverpassQueryBuilder {
            bounds,
            options: QueryOptions::default(),
        }
    }

    /// Bounding box the query filters on.
    #[must_use]
    pub const fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Overpass QL text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for OverpassQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Builder returned by [`OverpassQuery::builder`].
#[derive(Debug, Clone)]
pub struct OverpassQueryBuilder {
    bounds: BoundingBox,
    options: QueryOptions,
}

impl OverpassQueryBuilder {
    /// Replace every option at once.
    #[must_use]
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// See [`QueryOptions::with_building_types`].
    #[must_use]
    pub fn with_building_types<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = self.options.with_building_types(values);
        self
    }

    /// See [`QueryOptions::with_kinds`].
    #[must_use]
    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = EntityKind>) -> Self {
        self.options = self.options.with_kinds(kinds);
        self
    }

    /// See [`QueryOptions::with_server_timeout`].
    #[must_use]
    pub fn with_server_timeout(mut self, secs: u32) -> Self {
        self.options = self.options.with_server_timeout(secs);
        self
    }

    /// Validate the bounding box and render the query.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidBoundsError`] when the bounding box is invalid.
    pub fn build(self) -> Result<OverpassQuery, InvalidBoundsError> {
        self.options.build(self.bounds)
    }
}
