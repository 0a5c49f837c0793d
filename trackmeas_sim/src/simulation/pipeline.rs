// trackmeas_sim/src/simulation/pipeline.rs

//! The event loop: generate, digitize, then select measurements per
//! track and layer against the truth prediction.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use trackmeas_core::prelude::*;

use crate::error::SimError;
use crate::simulation::config::{DetectorCatalog, ScenarioConfig};
use crate::simulation::core::prng::SimulationRng;
use crate::simulation::digitizer::{DigitizedEvent, Digitizer};
use crate::simulation::generator::{TrackGenerator, TruthTrack};

/// Totals over a full run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub events: usize,
    pub tracks: usize,
    pub measurements: usize,
    /// Number of (track, layer) pairs a selection was run for.
    pub selections: usize,
    /// Selections whose best candidate was produced by the predicted track.
    pub matched: usize,
    /// Selections where no candidate passed the chi-square cut.
    pub outliers: usize,
    /// Mean chi-square of the best candidate over non-outlier selections.
    pub mean_chi2: f64,
}

impl RunSummary {
    pub fn matching_efficiency(&self) -> f64 {
        if self.selections == 0 {
            0.0
        } else {
            self.matched as f64 / self.selections as f64
        }
    }
}

pub struct Simulation {
    events: usize,
    tracks_per_event: usize,
    generator: TrackGenerator,
    digitizer: Digitizer,
    selector: MeasurementSelector,
    predicted_cov: BoundSquareMatrix,
    rng: SimulationRng,
}

impl Simulation {
    pub fn new(scenario: &ScenarioConfig, catalog: &DetectorCatalog) -> Result<Self, SimError> {
        scenario.simulation.validate()?;
        Ok(Self {
            events: scenario.simulation.events,
            tracks_per_event: scenario.simulation.tracks_per_event,
            generator: TrackGenerator::new(&scenario.simulation),
            digitizer: Digitizer::new(&catalog.layers)?,
            selector: scenario.selector.build()?,
            predicted_cov: scenario.detector.prediction_covariance(),
            rng: SimulationRng::new(scenario.simulation.seed),
        })
    }

    pub fn run(&mut self) -> Result<RunSummary, SimError> {
        let mut summary = RunSummary::default();
        let mut chi2_sum = 0.0;

        for event in 0..self.events {
            let tracks = self
                .generator
                .generate_event(self.tracks_per_event, &mut self.rng);
            let digitized = self.digitizer.digitize_event(&tracks, &mut self.rng)?;
            debug!(
                "Event {}: {} tracks, {} measurements",
                event,
                tracks.len(),
                digitized.len()
            );

            summary.events += 1;
            summary.tracks += tracks.len();
            summary.measurements += digitized.len();
            chi2_sum += self.select_event(&tracks, &digitized, &mut summary)?;
        }

        let accepted = summary.selections - summary.outliers;
        if accepted > 0 {
            summary.mean_chi2 = chi2_sum / accepted as f64;
        }
        Ok(summary)
    }

    /// Runs one selection per accepted (track, layer) pair. Returns the sum
    /// of the best non-outlier chi-squares.
    fn select_event(
        &self,
        tracks: &[TruthTrack],
        event: &DigitizedEvent,
        summary: &mut RunSummary,
    ) -> Result<f64, SimError> {
        let mut by_layer: HashMap<GeometryIdentifier, Vec<Measurement>> = HashMap::new();
        for measurement in &event.measurements {
            by_layer
                .entry(measurement.source_link().geometry_id())
                .or_default()
                .push(*measurement);
        }

        let mut chi2_sum = 0.0;
        for track in tracks {
            for layer in self.digitizer.layers() {
                if !layer.accepts(track) {
                    continue;
                }
                let Some(candidates) = by_layer.get(&layer.geometry_id()) else {
                    continue;
                };

                let predicted = track.bound_parameters_at(layer.radius());
                let selection = self
                    .selector
                    .select(candidates, &predicted, &self.predicted_cov)?;
                summary.selections += 1;

                if selection.is_outlier {
                    summary.outliers += 1;
                    continue;
                }
                let best = selection.candidates[0];
                chi2_sum += best.chi2;
                let slot = candidates[best.index].source_link().index as usize;
                if event.truth[slot] == track.id {
                    summary.matched += 1;
                }
            }
        }
        Ok(chi2_sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::config::{
        CutsEntry, DetectorConfig, LayerConfig, SelectorConfig, SimulationConfig,
    };
    use std::path::PathBuf;

    fn layer(layer: u32, radius: f64) -> LayerConfig {
        LayerConfig {
            volume: 1,
            layer,
            radius,
            half_length: f64::INFINITY,
            indices: vec![BoundIndices::Loc0, BoundIndices::Loc1],
            resolutions: vec![0.02, 0.1],
        }
    }

    fn catalog() -> DetectorCatalog {
        DetectorCatalog::new(vec![layer(6, 110.0), layer(2, 30.0), layer(4, 70.0)]).unwrap()
    }

    fn scenario(events: usize, tracks_per_event: usize) -> ScenarioConfig {
        ScenarioConfig {
            simulation: SimulationConfig {
                seed: 17,
                events,
                tracks_per_event,
                momentum: [1.0, 10.0],
                eta_range: 1.0,
            },
            detector: DetectorConfig {
                catalog: PathBuf::from("unused"),
                prediction_sigmas: [0.0; BOUND_SIZE],
            },
            selector: SelectorConfig::default(),
        }
    }

    #[test]
    fn test_single_track_events_always_match() {
        let summary = Simulation::new(&scenario(20, 1), &catalog())
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(summary.events, 20);
        assert_eq!(summary.tracks, 20);
        assert_eq!(summary.measurements, 60);
        assert_eq!(summary.selections, 60);
        assert_eq!(summary.matched, 60);
        assert_eq!(summary.outliers, 0);
        assert_eq!(summary.matching_efficiency(), 1.0);
    }

    #[test]
    fn test_mean_chi2_follows_measurement_dimension() {
        // With an exact prediction the best chi-square is the chi-square of
        // the smearing, whose mean is the measurement dimension.
        let summary = Simulation::new(&scenario(150, 1), &catalog())
            .unwrap()
            .run()
            .unwrap();
        assert!(
            (1.6..2.4).contains(&summary.mean_chi2),
            "mean chi2 = {}",
            summary.mean_chi2
        );
    }

    #[test]
    fn test_multi_track_events_select_per_track_and_layer() {
        let summary = Simulation::new(&scenario(5, 8), &catalog())
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(summary.tracks, 40);
        assert_eq!(summary.measurements, 120);
        assert_eq!(summary.selections, 120);
        assert!(summary.matched > 0);
        assert!(summary.matched <= summary.selections);
    }

    #[test]
    fn test_runs_are_reproducible() {
        let first = Simulation::new(&scenario(10, 4), &catalog())
            .unwrap()
            .run()
            .unwrap();
        let second = Simulation::new(&scenario(10, 4), &catalog())
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_tight_cuts_turn_every_selection_into_an_outlier() {
        let mut scenario = scenario(5, 2);
        scenario.selector = SelectorConfig {
            cuts: vec![CutsEntry {
                volume: 1,
                layer: 0,
                cuts: MeasurementSelectorCuts {
                    chi2_cut_off: vec![0.0],
                    ..Default::default()
                },
            }],
        };

        let summary = Simulation::new(&scenario, &catalog()).unwrap().run().unwrap();
        assert_eq!(summary.selections, 30);
        assert_eq!(summary.outliers, 30);
        assert_eq!(summary.matched, 0);
        assert_eq!(summary.mean_chi2, 0.0);
    }

    #[test]
    fn test_unvalidated_catalog_layer_is_rejected() {
        let mut broken = layer(8, 150.0);
        broken.resolutions.pop();
        let catalog = DetectorCatalog::new(vec![layer(2, 30.0), broken]).unwrap();

        assert!(matches!(
            Simulation::new(&scenario(1, 1), &catalog),
            Err(SimError::Layer { id, .. }) if id == GeometryIdentifier::new(1, 8, 0)
        ));
    }

    #[test]
    fn test_missing_cuts_for_a_layer_fail_the_run() {
        let mut scenario = scenario(1, 1);
        scenario.selector = SelectorConfig {
            cuts: vec![CutsEntry {
                volume: 2,
                layer: 0,
                cuts: MeasurementSelectorCuts::default(),
            }],
        };

        let result = Simulation::new(&scenario, &catalog()).unwrap().run();
        assert!(matches!(
            result,
            Err(SimError::Selection(SelectionError::NoCuts(_)))
        ));
    }
}
