// trackmeas_sim/src/prelude.rs

// Re-export the entire trackmeas_core prelude so binaries can reach
// `Measurement`, `MeasurementSelector` and friends through one import.
pub use trackmeas_core::prelude::*;

// Re-export common simulation-specific types.
pub use crate::cli::Cli;
pub use crate::error::SimError;
pub use crate::simulation::config::structs::*;
pub use crate::simulation::config::{load_detector_catalog, load_scenario, DetectorCatalog};
pub use crate::simulation::core::prng::SimulationRng;
pub use crate::simulation::digitizer::{DigitizedEvent, Digitizer, LayerDigitizer};
pub use crate::simulation::generator::{TrackGenerator, TruthTrack};
pub use crate::simulation::pipeline::{RunSummary, Simulation};
