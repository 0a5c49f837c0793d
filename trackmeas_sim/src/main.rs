// trackmeas_sim/src/main.rs

use clap::Parser;
use trackmeas_sim::prelude::*;

fn main() -> Result<(), SimError> {
    // Parse CLI arguments first so --help works before logging is set up.
    let cli = Cli::parse();
    trackmeas_sim::init_logging();
    trackmeas_sim::run(&cli)?;
    Ok(())
}
