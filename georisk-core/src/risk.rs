//! Heuristic seismic risk classification.
//!
//! Classification is a pure function of a [`RiskInput`]. Rules in
//! [`RISK_RULES`] are evaluated top-down and the first match wins; when no
//! rule applies the result is [`RiskLevel::Unknown`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Buildings completed before this year predate modern seismic codes.
pub const PRE_CODE_YEAR: i32 = 1970;
/// Effective heights below this are treated as low-rise, in metres.
pub const LOW_RISE_MAX_M: f64 = 15.0;
/// Effective heights above this are treated as engineered high-rise, in metres.
pub const HIGH_RISE_MIN_M: f64 = 50.0;
/// Storey height used to estimate height from a level count, in metres.
pub const METRES_PER_LEVEL: f64 = 3.0;

const HEAVY_FRAME_TYPES: &[&str] = &["industrial", "warehouse"];
const SMALL_DWELLING_TYPES: &[&str] = &[
    "house",
    "detached",
    "bungalow",
    "hut",
    "cabin",
    "shed",
    "garage",
    "semidetached_house",
    "terrace",
];

/// Derived seismic risk category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    /// Low-rise or small dwelling.
    Low,
    /// Mid-rise or engineered high-rise.
    Moderate,
    /// Heavy frames or pre-code construction.
    ModerateHigh,
    /// Pre-code construction of mid-rise height or more.
    High,
    /// Not enough structural data to decide.
    Unknown,
}

impl RiskLevel {
    /// Wire representation (`low`, `moderate`, `moderate-high`, `high`, `unknown`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::ModerateHigh => "moderate-high",
            Self::High => "high",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`RiskLevel`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown risk level {0:?}")]
pub struct ParseRiskLevelError(pub String);

impl FromStr for RiskLevel {
    type Err = ParseRiskLevelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Self::Low),
            "moderate" => Ok(Self::Moderate),
            "moderate-high" => Ok(Self::ModerateHigh),
            "high" => Ok(Self::High),
            "unknown" => Ok(Self::Unknown),
            other => Err(ParseRiskLevelError(other.to_owned())),
        }
    }
}

/// Structural attributes consulted by the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RiskInput<'a> {
    /// Measured height in metres.
    pub height_m: Option<f64>,
    /// Number of above-ground storeys.
    pub levels: Option<u32>,
    /// OSM `building` value.
    pub building_type: Option<&'a str>,
    /// Year of construction.
    pub year_built: Option<i32>,
}

impl RiskInput<'_> {
    /// Measured height, or an estimate from the level count.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "height estimate multiplies storeys by a storey height"
    )]
    pub fn effective_height(&self) -> Option<f64> {
        self.height_m
            .or_else(|| self.levels.map(|levels| f64::from(levels) * METRES_PER_LEVEL))
    }

    fn type_is_one_of(&self, candidates: &[&str]) -> bool {
        self.building_type.is_some_and(|value| {
            candidates
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(value.trim()))
        })
    }

    fn built_before_codes(&self) -> bool {
        self.year_built.is_some_and(|year| year < PRE_CODE_YEAR)
    }
}

/// One row of the classification table.
#[derive(Debug, Clone, Copy)]
pub struct RiskRule {
    /// Short identifier used in logs and tests.
    pub name: &'static str,
    /// Condition under which the rule fires.
    pub applies: fn(&RiskInput<'_>) -> bool,
    /// Classification produced when the rule fires.
    pub level: RiskLevel,
}

/// Ordered rule table, evaluated top-down.
pub const RISK_RULES: &[RiskRule] = &[
    RiskRule {
        name: "pre-code-mid-rise",
        applies: pre_code_mid_rise,
        level: RiskLevel::High,
    },
    RiskRule {
        name: "engineered-high-rise",
        applies: engineered_high_rise,
        level: RiskLevel::Moderate,
    },
    RiskRule {
        name: "heavy-frame",
        applies: heavy_frame,
        level: RiskLevel::ModerateHigh,
    },
    RiskRule {
        name: "pre-code",
        applies: pre_code,
        level: RiskLevel::ModerateHigh,
    },
    RiskRule {
        name: "low-rise",
        applies: low_rise,
        level: RiskLevel::Low,
    },
    RiskRule {
        name: "mid-rise",
        applies: has_height,
        level: RiskLevel::Moderate,
    },
    RiskRule {
        name: "small-dwelling",
        applies: small_dwelling,
        level: RiskLevel::Low,
    },
];

fn pre_code_mid_rise(input: &RiskInput<'_>) -> bool {
    input.built_before_codes()
        && input
            .effective_height()
            .is_some_and(|height| height >= LOW_RISE_MAX_M)
}

fn heavy_frame(input: &RiskInput<'_>) -> bool {
    input.type_is_one_of(HEAVY_FRAME_TYPES)
}

fn engineered_high_rise(input: &RiskInput<'_>) -> bool {
    input
        .effective_height()
        .is_some_and(|height| height > HIGH_RISE_MIN_M)
}

fn pre_code(input: &RiskInput<'_>) -> bool {
    input.built_before_codes()
}

fn low_rise(input: &RiskInput<'_>) -> bool {
    input
        .effective_height()
        .is_some_and(|height| height < LOW_RISE_MAX_M)
}

fn has_height(input: &RiskInput<'_>) -> bool {
    input.effective_height().is_some()
}

fn small_dwelling(input: &RiskInput<'_>) -> bool {
    input.type_is_one_of(SMALL_DWELLING_TYPES)
}

/// First rule in [`RISK_RULES`] matching `input`.
#[must_use]
pub fn matching_rule(input: &RiskInput<'_>) -> Option<&'static RiskRule> {
    RISK_RULES.iter().find(|rule| (rule.applies)(input))
}

/// Classify `input` against [`RISK_RULES`].
///
/// # Examples
/// ```
/// use georisk_core::{RiskInput, RiskLevel, classify};
///
/// let warehouse = RiskInput {
///     building_type: Some("warehouse"),
///     ..RiskInput::default()
/// };
/// assert_eq!(classify(&warehouse), RiskLevel::ModerateHigh);
/// assert_eq!(classify(&RiskInput::default()), RiskLevel::Unknown);
/// ```
#[must_use]
pub fn classify(input: &RiskInput<'_>) -> RiskLevel {
    matching_rule(input).map_or(RiskLevel::Unknown, |rule| rule.level)
}
