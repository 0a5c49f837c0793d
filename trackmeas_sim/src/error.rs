// trackmeas_sim/src/error.rs

use std::path::PathBuf;
use thiserror::Error;
use trackmeas_core::geometry::GeometryError;
use trackmeas_core::prelude::{GeometryIdentifier, MeasurementError, SelectionError};
use trackmeas_core::subspace::SubspaceError;

/// Reasons a [`crate::simulation::config::SimulationConfig`] is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum SimulationConfigError {
    #[error("tracks_per_event must be at least 1")]
    NoTracks,
    #[error("momentum range [{min}, {max}] must be finite, positive and ordered")]
    MomentumRange { min: f64, max: f64 },
    #[error("eta_range {0} must be finite and non-negative")]
    EtaRange(f64),
}

/// Reasons a [`crate::simulation::config::LayerConfig`] is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum LayerError {
    #[error("volume and layer ids must be non-zero")]
    UnsetId,
    #[error("radius {0} must be finite and positive")]
    Radius(f64),
    #[error("half_length {0} must be positive")]
    HalfLength(f64),
    #[error("invalid readout indices: {0}")]
    Indices(#[from] SubspaceError),
    #[error("{resolutions} resolutions given for {indices} indices")]
    ResolutionCount { resolutions: usize, indices: usize },
    #[error("resolution {0} must be finite and positive")]
    Resolution(f64),
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] figment::Error),

    #[error("invalid simulation settings: {0}")]
    InvalidSimulation(#[from] SimulationConfigError),

    #[error("detector catalog directory not found at {0:?}")]
    MissingCatalog(PathBuf),

    #[error("detector catalog at {0:?} contains no layers")]
    EmptyCatalog(PathBuf),

    #[error("failed to walk detector catalog: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid layer definition in {file:?}: {source}")]
    InvalidLayer {
        file: PathBuf,
        #[source]
        source: LayerError,
    },

    #[error("invalid layer {id}: {source}")]
    Layer {
        id: GeometryIdentifier,
        #[source]
        source: LayerError,
    },

    #[error("layer {0} is defined more than once")]
    DuplicateLayer(GeometryIdentifier),

    #[error("invalid smearing distribution: {0}")]
    Distribution(#[from] rand_distr::NormalError),

    #[error(transparent)]
    Measurement(#[from] MeasurementError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("failed to serialize run summary: {0}")]
    Summary(#[from] toml::ser::Error),

    #[error("failed to write run summary: {0}")]
    Io(#[from] std::io::Error),
}
