// trackmeas_sim/src/lib.rs

use std::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

// This prelude is for convenience for other files WITHIN the trackmeas_sim crate.
pub mod prelude;

pub mod cli;
pub mod error;
// This module contains all the simulation-specific logic.
pub mod simulation;

use crate::cli::Cli;
use crate::error::SimError;
use crate::simulation::config::{load_detector_catalog, load_scenario};
use crate::simulation::pipeline::{RunSummary, Simulation};

/// Installs the global `tracing` subscriber. The filter is read from
/// `RUST_LOG` and defaults to `info`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();
}

/// Loads the scenario named on the command line, runs it and reports the summary.
pub fn run(cli: &Cli) -> Result<RunSummary, SimError> {
    let mut scenario = load_scenario(&cli.scenario)?;
    cli.apply_overrides(&mut scenario);
    let catalog = load_detector_catalog(&scenario.detector.catalog)?;

    info!(
        "Running {} events of {} tracks (seed {})",
        scenario.simulation.events, scenario.simulation.tracks_per_event, scenario.simulation.seed
    );
    let summary = Simulation::new(&scenario, &catalog)?.run()?;
    info!(
        "Processed {} events: {} measurements, {} selections, {} matched ({:.1}%), {} outliers, mean chi2 {:.3}",
        summary.events,
        summary.measurements,
        summary.selections,
        summary.matched,
        100.0 * summary.matching_efficiency(),
        summary.outliers,
        summary.mean_chi2
    );

    if let Some(path) = &cli.output {
        fs::write(path, toml::to_string_pretty(&summary)?)?;
        info!("Wrote run summary to {}", path.display());
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn scenario_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(
            &dir.path().join("scenarios/test.toml"),
            r#"
            [simulation]
            seed = 3
            events = 50
            tracks_per_event = 2
            momentum = [1.0, 5.0]
            eta_range = 1.0

            [detector]
            catalog = "../layers"
            prediction_sigmas = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
            "#,
        );
        write(
            &dir.path().join("layers/pixel.toml"),
            r#"
            volume = 1
            layer = 2
            radius = 30.0
            indices = ["loc0", "loc1"]
            resolutions = [0.01, 0.05]
            "#,
        );
        write(
            &dir.path().join("layers/strip.toml"),
            r#"
            volume = 2
            layer = 2
            radius = 300.0
            indices = ["loc0"]
            resolutions = [0.02]
            "#,
        );
        dir
    }

    #[test]
    fn test_run_applies_overrides_and_writes_summary() {
        let dir = scenario_dir();
        let output = dir.path().join("summary.toml");
        let cli = Cli {
            scenario: dir.path().join("scenarios/test.toml"),
            seed: Some(8),
            events: Some(4),
            output: Some(output.clone()),
        };

        let summary = run(&cli).unwrap();
        assert_eq!(summary.events, 4);
        assert_eq!(summary.tracks, 8);
        assert_eq!(summary.measurements, 16);

        let written: RunSummary = toml::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written, summary);
    }

    #[test]
    fn test_shipped_barrel_scenario_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../assets/scenarios/barrel.toml");
        let scenario = load_scenario(&path).unwrap();
        let catalog = load_detector_catalog(&scenario.detector.catalog).unwrap();

        assert_eq!(catalog.layers.len(), 6);
        assert!(catalog.layers.windows(2).all(|pair| pair[0].radius < pair[1].radius));
        scenario.selector.build().unwrap();
    }

    #[test]
    fn test_missing_scenario_fails() {
        let dir = TempDir::new().unwrap();
        let cli = Cli {
            scenario: dir.path().join("missing.toml"),
            seed: None,
            events: None,
            output: None,
        };
        assert!(matches!(run(&cli), Err(SimError::Config(_))));
    }
}
