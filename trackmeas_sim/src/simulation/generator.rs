// trackmeas_sim/src/simulation/generator.rs

//! Generation of truth tracks.
//!
//! Tracks are straight lines from the origin; there is no magnetic field, so
//! the bound state on a barrel layer follows directly from the direction.

use rand::Rng;
use rand_distr::Uniform;
use std::f64::consts::PI;
use trackmeas_core::prelude::BoundVector;

use crate::simulation::config::SimulationConfig;
use crate::simulation::core::prng::SimulationRng;

/// Speed of light in mm/ns.
pub const SPEED_OF_LIGHT: f64 = 299.792_458;

/// A generated particle, identified by its position within the event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruthTrack {
    pub id: usize,
    pub phi: f64,
    pub theta: f64,
    pub q_over_p: f64,
}

impl TruthTrack {
    pub fn eta(&self) -> f64 {
        -(self.theta / 2.0).tan().ln()
    }

    /// Longitudinal position where the track crosses a cylinder of `radius`.
    pub fn z_at(&self, radius: f64) -> f64 {
        radius * self.theta.cos() / self.theta.sin()
    }

    /// Bound parameters on a cylinder of `radius`:
    /// `(R * phi, z, phi, theta, q/p, path / c)`.
    pub fn bound_parameters_at(&self, radius: f64) -> BoundVector {
        let path = radius / self.theta.sin();
        BoundVector::new(
            radius * self.phi,
            self.z_at(radius),
            self.phi,
            self.theta,
            self.q_over_p,
            path / SPEED_OF_LIGHT,
        )
    }
}

#[derive(Debug, Clone)]
pub struct TrackGenerator {
    phi: Uniform<f64>,
    eta: Uniform<f64>,
    momentum: Uniform<f64>,
}

impl TrackGenerator {
    /// Expects a validated configuration.
    pub fn new(config: &SimulationConfig) -> Self {
        let [p_min, p_max] = config.momentum;
        Self {
            phi: Uniform::new(-PI, PI),
            eta: Uniform::new_inclusive(-config.eta_range, config.eta_range),
            momentum: Uniform::new_inclusive(p_min, p_max),
        }
    }

    pub fn generate(&self, id: usize, rng: &mut SimulationRng) -> TruthTrack {
        let phi = rng.0.sample(&self.phi);
        let eta: f64 = rng.0.sample(&self.eta);
        let p = rng.0.sample(&self.momentum);
        let charge = if rng.0.gen_bool(0.5) { 1.0 } else { -1.0 };
        TruthTrack {
            id,
            phi,
            theta: 2.0 * (-eta).exp().atan(),
            q_over_p: charge / p,
        }
    }

    pub fn generate_event(&self, count: usize, rng: &mut SimulationRng) -> Vec<TruthTrack> {
        (0..count).map(|id| self.generate(id, rng)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;
    use std::f64::consts::FRAC_PI_4;

    fn config(eta_range: f64) -> SimulationConfig {
        SimulationConfig {
            seed: 1,
            events: 1,
            tracks_per_event: 1,
            momentum: [0.5, 5.0],
            eta_range,
        }
    }

    #[test]
    fn test_bound_parameters_of_central_track() {
        let track = TruthTrack {
            id: 0,
            phi: 0.5,
            theta: FRAC_PI_2,
            q_over_p: -0.25,
        };
        let params = track.bound_parameters_at(10.0);

        assert_abs_diff_eq!(params[0], 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(params[1], 0.0, epsilon = 1e-12);
        assert_eq!(params[2], 0.5);
        assert_eq!(params[3], FRAC_PI_2);
        assert_eq!(params[4], -0.25);
        assert_abs_diff_eq!(params[5], 10.0 / SPEED_OF_LIGHT, epsilon = 1e-12);
    }

    #[test]
    fn test_bound_parameters_of_forward_track() {
        let track = TruthTrack {
            id: 0,
            phi: -1.0,
            theta: FRAC_PI_4,
            q_over_p: 1.0,
        };
        let params = track.bound_parameters_at(50.0);

        assert_abs_diff_eq!(params[1], 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(params[5], 50.0 * 2f64.sqrt() / SPEED_OF_LIGHT, epsilon = 1e-12);
        assert_abs_diff_eq!(track.eta(), (1.0 + 2f64.sqrt()).ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_generated_tracks_respect_ranges() {
        let generator = TrackGenerator::new(&config(1.5));
        let mut rng = SimulationRng::new(3);
        let tracks = generator.generate_event(500, &mut rng);

        assert_eq!(tracks.len(), 500);
        assert!(tracks.iter().enumerate().all(|(i, t)| t.id == i));
        for track in &tracks {
            assert!((-PI..PI).contains(&track.phi));
            assert!(track.eta().abs() <= 1.5 + 1e-9);
            let p = 1.0 / track.q_over_p.abs();
            assert!((0.5 - 1e-9..=5.0 + 1e-9).contains(&p));
        }
        assert!(tracks.iter().any(|t| t.q_over_p > 0.0));
        assert!(tracks.iter().any(|t| t.q_over_p < 0.0));
    }

    #[test]
    fn test_zero_eta_range_gives_central_tracks() {
        let generator = TrackGenerator::new(&config(0.0));
        let mut rng = SimulationRng::new(5);
        for track in generator.generate_event(10, &mut rng) {
            assert_abs_diff_eq!(track.theta, FRAC_PI_2, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let generator = TrackGenerator::new(&config(2.0));
        let a = generator.generate_event(20, &mut SimulationRng::new(9));
        let b = generator.generate_event(20, &mut SimulationRng::new(9));
        assert_eq!(a, b);
    }
}
