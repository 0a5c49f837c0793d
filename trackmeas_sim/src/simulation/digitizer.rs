// trackmeas_sim/src/simulation/digitizer.rs

//! Conversion of truth crossings into smeared measurements.

use nalgebra::{DMatrix, DVector};
use rand_distr::{Distribution, Normal};
use trackmeas_core::indices::wrap_phi;
use trackmeas_core::prelude::*;

use crate::error::SimError;
use crate::simulation::config::LayerConfig;
use crate::simulation::core::prng::SimulationRng;
use crate::simulation::generator::TruthTrack;

/// The readout of a single barrel layer.
#[derive(Debug, Clone)]
pub struct LayerDigitizer {
    geometry_id: GeometryIdentifier,
    radius: f64,
    half_length: f64,
    indices: Vec<BoundIndices>,
    noise: Vec<Normal<f64>>,
    covariance: DMatrix<f64>,
}

impl LayerDigitizer {
    pub fn new(layer: &LayerConfig) -> Result<Self, SimError> {
        layer.validate().map_err(|source| SimError::Layer {
            id: layer.geometry_id(),
            source,
        })?;
        let noise = layer
            .resolutions
            .iter()
            .map(|&sigma| Normal::new(0.0, sigma))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            geometry_id: layer.geometry_id(),
            radius: layer.radius,
            half_length: layer.half_length,
            indices: layer.indices.clone(),
            noise,
            covariance: DMatrix::from_diagonal(&layer.variances()),
        })
    }

    pub fn geometry_id(&self) -> GeometryIdentifier {
        self.geometry_id
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn accepts(&self, track: &TruthTrack) -> bool {
        track.z_at(self.radius).abs() <= self.half_length
    }

    /// Smears the measured components of `truth`. The measurement's source
    /// link points at `slot`, its future position in the event container.
    pub fn digitize(
        &self,
        truth: &BoundVector,
        slot: u32,
        rng: &mut SimulationRng,
    ) -> Result<Measurement, SimError> {
        let values = DVector::from_iterator(
            self.indices.len(),
            self.indices.iter().zip(&self.noise).map(|(&index, noise)| {
                let value = truth[index.index() as usize] + noise.sample(&mut rng.0);
                if index == BoundIndices::Phi {
                    wrap_phi(value)
                } else {
                    value
                }
            }),
        );

        let source = IndexSourceLink::new(self.geometry_id, slot);
        Ok(Measurement::try_from_dynamic(
            source,
            &self.indices,
            &values,
            &self.covariance,
        )?)
    }
}

/// Measurements of one event together with their truth association.
#[derive(Debug, Clone, Default)]
pub struct DigitizedEvent {
    pub measurements: MeasurementContainer,
    /// The id of the track that produced each measurement, by container slot.
    pub truth: Vec<usize>,
}

impl DigitizedEvent {
    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Digitizer {
    layers: Vec<LayerDigitizer>,
}

impl Digitizer {
    pub fn new(layers: &[LayerConfig]) -> Result<Self, SimError> {
        let layers = layers
            .iter()
            .map(LayerDigitizer::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[LayerDigitizer] {
        &self.layers
    }

    /// Records every accepted crossing of every track, track by track and
    /// layer by layer from the inside out.
    pub fn digitize_event(
        &self,
        tracks: &[TruthTrack],
        rng: &mut SimulationRng,
    ) -> Result<DigitizedEvent, SimError> {
        let mut event = DigitizedEvent::default();
        for track in tracks {
            for layer in self.layers.iter().filter(|layer| layer.accepts(track)) {
                let truth = track.bound_parameters_at(layer.radius);
                let slot = event.measurements.len() as u32;
                event.measurements.push(layer.digitize(&truth, slot, rng)?);
                event.truth.push(track.id);
            }
        }
        Ok(event)
    }
}
