// trackmeas_sim/src/simulation/config/mod.rs

//! This module handles loading and validating all simulation configuration
//! from disk: the scenario file and the detector layer catalog it points to.

mod catalog;

pub mod structs;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;
use tracing::info;

use crate::error::SimError;
pub use catalog::{load_detector_catalog, DetectorCatalog};
pub use structs::{
    CutsEntry, DetectorConfig, LayerConfig, ScenarioConfig, SelectorConfig, SimulationConfig,
};

/// Prefix of environment variables overriding scenario values, e.g.
/// `TRACKMEAS_SIMULATION__EVENTS=10`.
pub const ENV_PREFIX: &str = "TRACKMEAS_";

/// The layered configuration sources of a scenario file.
pub fn scenario_figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Extracts and validates a scenario from any figment.
pub fn extract_scenario(figment: &Figment) -> Result<ScenarioConfig, SimError> {
    let scenario: ScenarioConfig = figment.extract()?;
    scenario.simulation.validate()?;
    Ok(scenario)
}

/// Loads the scenario at `path`. A relative detector catalog path is resolved
/// against the directory holding the scenario file.
pub fn load_scenario(path: &Path) -> Result<ScenarioConfig, SimError> {
    info!("Loading scenario from: {}", path.display());

    let mut scenario = extract_scenario(&scenario_figment(path))?;
    if scenario.detector.catalog.is_relative() {
        if let Some(parent) = path.parent() {
            scenario.detector.catalog = parent.join(&scenario.detector.catalog);
        }
    }
    Ok(scenario)
}
