// trackmeas_sim/src/simulation/config/structs.rs

use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use trackmeas_core::prelude::*;
use trackmeas_core::subspace::check_subspace_indices;

use crate::error::{LayerError, SimError, SimulationConfigError};

// --- Top-Level Scenario ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub simulation: SimulationConfig,
    pub detector: DetectorConfig,
    #[serde(default)]
    pub selector: SelectorConfig,
}

// --- Event Generation ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub seed: u64,
    pub events: usize,
    pub tracks_per_event: usize,
    /// Momentum range `[min, max]` in GeV.
    pub momentum: [f64; 2],
    /// Tracks are generated uniformly in `|eta| <= eta_range`.
    pub eta_range: f64,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), SimulationConfigError> {
        let [min, max] = self.momentum;
        if self.tracks_per_event == 0 {
            return Err(SimulationConfigError::NoTracks);
        }
        if !(min > 0.0 && min <= max && max.is_finite()) {
            return Err(SimulationConfigError::MomentumRange { min, max });
        }
        if !(self.eta_range >= 0.0 && self.eta_range.is_finite()) {
            return Err(SimulationConfigError::EtaRange(self.eta_range));
        }
        Ok(())
    }
}

// --- Detector ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Directory holding one `*.toml` file per layer. Relative paths are
    /// resolved against the scenario file.
    pub catalog: PathBuf,
    /// Standard deviations of the predicted bound parameters used during
    /// selection, in `BoundIndices` order.
    pub prediction_sigmas: [f64; BOUND_SIZE],
}

impl DetectorConfig {
    pub fn prediction_covariance(&self) -> BoundSquareMatrix {
        BoundSquareMatrix::from_diagonal(&BoundVector::from(self.prediction_sigmas).map(|s| s * s))
    }
}

fn default_half_length() -> f64 {
    f64::INFINITY
}

/// A cylindrical barrel layer centred on the beam line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub volume: u32,
    pub layer: u32,
    pub radius: f64,
    /// Tracks crossing the cylinder beyond `|z| > half_length` leave no hit.
    #[serde(default = "default_half_length")]
    pub half_length: f64,
    /// The bound parameters this layer reads out.
    pub indices: Vec<BoundIndices>,
    /// One resolution per entry of `indices`.
    pub resolutions: Vec<f64>,
}

impl LayerConfig {
    pub fn geometry_id(&self) -> GeometryIdentifier {
        GeometryIdentifier::new(self.volume, self.layer, 0)
    }

    pub fn validate(&self) -> Result<(), LayerError> {
        if self.volume == 0 || self.layer == 0 {
            return Err(LayerError::UnsetId);
        }
        if !(self.radius > 0.0 && self.radius.is_finite()) {
            return Err(LayerError::Radius(self.radius));
        }
        if self.half_length.is_nan() || self.half_length <= 0.0 {
            return Err(LayerError::HalfLength(self.half_length));
        }

        let raw: Vec<u8> = self.indices.iter().map(|index| index.index()).collect();
        check_subspace_indices(&raw, BOUND_SIZE, BOUND_SIZE)?;

        if self.resolutions.len() != self.indices.len() {
            return Err(LayerError::ResolutionCount {
                resolutions: self.resolutions.len(),
                indices: self.indices.len(),
            });
        }
        if let Some(&sigma) = self
            .resolutions
            .iter()
            .find(|sigma| !(**sigma > 0.0 && sigma.is_finite()))
        {
            return Err(LayerError::Resolution(sigma));
        }
        Ok(())
    }

    /// Diagonal measurement covariance built from the resolutions.
    pub fn variances(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.resolutions.len(),
            self.resolutions.iter().map(|sigma| sigma * sigma),
        )
    }
}

// --- Selection ---
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
    #[serde(default)]
    pub cuts: Vec<CutsEntry>,
}

/// Cuts for one part of the detector. Zero (or missing) ids act as wildcards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutsEntry {
    #[serde(default)]
    pub volume: u32,
    #[serde(default)]
    pub layer: u32,
    #[serde(flatten)]
    pub cuts: MeasurementSelectorCuts,
}

impl SelectorConfig {
    /// Builds the selector, falling back to global default cuts when none
    /// are configured.
    pub fn build(&self) -> Result<MeasurementSelector, SimError> {
        if self.cuts.is_empty() {
            return Ok(MeasurementSelector::default());
        }
        let entries = self
            .cuts
            .iter()
            .map(|entry| {
                (
                    GeometryIdentifier::new(entry.volume, entry.layer, 0),
                    entry.cuts.clone(),
                )
            })
            .collect();
        let map = GeometryHierarchyMap::new(entries)?;
        Ok(MeasurementSelector::new(map)?)
    }
}
