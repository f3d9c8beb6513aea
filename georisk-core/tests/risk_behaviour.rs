//! Behavioural coverage for the seismic risk rule table.

use std::cell::{Cell, RefCell};

use georisk_core::{RiskInput, RiskLevel, classify};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

#[derive(Debug, Default)]
struct Building {
    building_type: String,
    height_m: Option<f64>,
    levels: Option<u32>,
    year_built: Option<i32>,
}

#[derive(Debug, Default)]
struct RiskWorld {
    building: RefCell<Building>,
    level: Cell<Option<RiskLevel>>,
}

#[fixture]
fn world() -> RiskWorld {
    RiskWorld::default()
}

fn unquote(value: &str) -> String {
    value.trim_matches('"').to_owned()
}

#[given("a building of type {kind} built in {year:i32} with {levels:u32} levels")]
fn given_levels(world: &RiskWorld, kind: String, year: i32, levels: u32) {
    *world.building.borrow_mut() = Building {
        building_type: unquote(&kind),
        levels: Some(levels),
        year_built: Some(year),
        ..Building::default()
    };
}

#[given("a building of type {kind} built in {year:i32} measuring {height:f64} metres")]
fn given_height(world: &RiskWorld, kind: String, year: i32, height: f64) {
    *world.building.borrow_mut() = Building {
        building_type: unquote(&kind),
        height_m: Some(height),
        year_built: Some(year),
        ..Building::default()
    };
}

#[given("a building of type {kind} with no further tags")]
fn given_bare(world: &RiskWorld, kind: String) {
    *world.building.borrow_mut() = Building {
        building_type: unquote(&kind),
        ..Building::default()
    };
}

#[when("the building is classified")]
fn when_classified(world: &RiskWorld) {
    let building = world.building.borrow();
    let input = RiskInput {
        height_m: building.height_m,
        levels: building.levels,
        building_type: Some(building.building_type.as_str()),
        year_built: building.year_built,
    };
    world.level.set(Some(classify(&input)));
}

#[then("the risk level is {expected}")]
fn then_level(world: &RiskWorld, expected: String) {
    let level: RiskLevel = expected.parse().expect("feature names a risk level");
    assert_eq!(world.level.get(), Some(level));
}

#[scenario(path = "tests/features/risk_classification.feature", index = 0)]
fn pre_code_mid_rise(world: RiskWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/risk_classification.feature", index = 1)]
fn warehouse_without_data(world: RiskWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/risk_classification.feature", index = 2)]
fn modern_tower(world: RiskWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/risk_classification.feature", index = 3)]
fn bungalow_without_data(world: RiskWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/risk_classification.feature", index = 4)]
fn generic_building_without_data(world: RiskWorld) {
    let _ = world;
}
