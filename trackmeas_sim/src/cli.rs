use clap::Parser;
use std::path::PathBuf;

/// trackmeas_sim: a toy barrel detector exercising variable-size measurements.
///
/// This struct defines the command-line arguments of the simulation binary.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(short, long, default_value = "assets/scenarios/barrel.toml")]
    pub scenario: PathBuf,

    /// Override the scenario's random seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the scenario's number of events.
    #[arg(long)]
    pub events: Option<usize>,

    /// Write the run summary as TOML to this file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Applies the command-line overrides on top of a loaded scenario.
    pub fn apply_overrides(&self, scenario: &mut crate::simulation::config::ScenarioConfig) {
        if let Some(seed) = self.seed {
            scenario.simulation.seed = seed;
        }
        if let Some(events) = self.events {
            scenario.simulation.events = events;
        }
    }
}
