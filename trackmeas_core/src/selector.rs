// trackmeas_core/src/selector.rs

//! Chi-square based selection of compatible measurements.
//!
//! Given a predicted bound state on a surface and the measurements recorded
//! on it, the selector ranks the measurements by their chi-square distance to
//! the prediction and keeps the ones passing the cuts configured for that part
//! of the geometry.

use crate::geometry::{GeometryError, GeometryHierarchyMap, GeometryIdentifier};
use crate::indices::{BoundIndices, ParameterIndices, BOUND_SIZE};
use crate::measurement::BoundVariableMeasurement;
use crate::source_link::SourceLink;
use crate::subspace::FixedSubspaceHelper;
use nalgebra::{SMatrix, SVector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

pub type BoundVector = SVector<f64, BOUND_SIZE>;
pub type BoundSquareMatrix = SMatrix<f64, BOUND_SIZE, BOUND_SIZE>;

#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("no measurement candidates to select from")]
    NoCandidates,
    #[error("no selection cuts configured for {0}")]
    NoCuts(GeometryIdentifier),
    #[error("innovation covariance of a {0}-dimensional measurement is singular")]
    SingularCovariance(usize),
    #[error("cut list `{name}` has {len} entries, expected 1 or {expected}")]
    CutsLength {
        name: &'static str,
        len: usize,
        expected: usize,
    },
    #[error("eta bin edges must be ascending")]
    UnsortedEtaBins,
    #[error("the measurement count cut-off must be positive")]
    ZeroCountCut,
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Cuts applied to the candidates of one part of the geometry.
///
/// `eta_bins` are ascending edges on `|eta|`; a prediction falls into bin
/// `k` where `k` is the number of edges `<= |eta|`. Every cut list holds either
/// a single value used everywhere or one value per bin (`eta_bins.len() + 1`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementSelectorCuts {
    pub eta_bins: Vec<f64>,
    /// Candidates need a chi-square strictly below this value.
    pub chi2_cut_off: Vec<f64>,
    /// Maximum number of candidates kept.
    pub num_measurements_cut_off: Vec<usize>,
}

impl Default for MeasurementSelectorCuts {
    fn default() -> Self {
        Self {
            eta_bins: Vec::new(),
            chi2_cut_off: vec![f64::MAX],
            num_measurements_cut_off: vec![1],
        }
    }
}

impl MeasurementSelectorCuts {
    pub fn validate(&self) -> Result<(), SelectionError> {
        if self.eta_bins.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(SelectionError::UnsortedEtaBins);
        }
        let expected = self.eta_bins.len() + 1;
        check_cut_length("chi2_cut_off", self.chi2_cut_off.len(), expected)?;
        check_cut_length(
            "num_measurements_cut_off",
            self.num_measurements_cut_off.len(),
            expected,
        )?;
        if self.num_measurements_cut_off.contains(&0) {
            return Err(SelectionError::ZeroCountCut);
        }
        Ok(())
    }

    pub fn eta_bin(&self, eta: f64) -> usize {
        let abs_eta = eta.abs();
        self.eta_bins.iter().take_while(|edge| **edge <= abs_eta).count()
    }

    pub fn chi2_cut(&self, eta: f64) -> Option<f64> {
        variable_cut(&self.chi2_cut_off, self.eta_bin(eta))
    }

    pub fn count_cut(&self, eta: f64) -> Option<usize> {
        variable_cut(&self.num_measurements_cut_off, self.eta_bin(eta))
    }
}

fn check_cut_length(name: &'static str, len: usize, expected: usize) -> Result<(), SelectionError> {
    if len == 1 || len == expected {
        Ok(())
    } else {
        Err(SelectionError::CutsLength {
            name,
            len,
            expected,
        })
    }
}

fn variable_cut<T: Copy>(values: &[T], bin: usize) -> Option<T> {
    match values {
        [single] => Some(*single),
        _ => values.get(bin).copied(),
    }
}

/// Pseudorapidity of a bound state, from its polar angle.
pub fn predicted_eta(predicted: &BoundVector) -> f64 {
    let theta = predicted[BoundIndices::Theta.index() as usize];
    theta.cos().atanh()
}

/// A candidate that passed selection, identified by its position in the
/// candidate slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedCandidate {
    pub index: usize,
    pub chi2: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Selected candidates by ascending chi-square.
    pub candidates: Vec<SelectedCandidate>,
    /// Set when no candidate passed the chi-square cut. `candidates` then
    /// holds only the best one.
    pub is_outlier: bool,
}

#[derive(Debug, Clone)]
pub struct MeasurementSelector {
    config: GeometryHierarchyMap<MeasurementSelectorCuts>,
}

impl Default for MeasurementSelector {
    fn default() -> Self {
        Self {
            config: GeometryHierarchyMap::global(MeasurementSelectorCuts::default()),
        }
    }
}

impl MeasurementSelector {
    pub fn new(config: GeometryHierarchyMap<MeasurementSelectorCuts>) -> Result<Self, SelectionError> {
        for (_, cuts) in config.iter() {
            cuts.validate()?;
        }
        Ok(Self { config })
    }

    /// A selector applying the same cuts everywhere.
    pub fn with_cuts(cuts: MeasurementSelectorCuts) -> Result<Self, SelectionError> {
        Self::new(GeometryHierarchyMap::global(cuts))
    }

    pub fn config(&self) -> &GeometryHierarchyMap<MeasurementSelectorCuts> {
        &self.config
    }

    /// Chi-square distance between a measurement and a predicted bound state:
    /// `r^T (V + H P H^T)^-1 r` with `r` the residual of the measured
    /// components.
    pub fn calculate_chi2<S: SourceLink>(
        &self,
        measurement: &BoundVariableMeasurement<S>,
        predicted: &BoundVector,
        predicted_cov: &BoundSquareMatrix,
    ) -> Result<f64, SelectionError> {
        match measurement.size() {
            1 => fixed_chi2::<1, S>(measurement, predicted, predicted_cov),
            2 => fixed_chi2::<2, S>(measurement, predicted, predicted_cov),
            3 => fixed_chi2::<3, S>(measurement, predicted, predicted_cov),
            4 => fixed_chi2::<4, S>(measurement, predicted, predicted_cov),
            5 => fixed_chi2::<5, S>(measurement, predicted, predicted_cov),
            6 => fixed_chi2::<6, S>(measurement, predicted, predicted_cov),
            size => unreachable!("measurement size {size} outside 1..={BOUND_SIZE}"),
        }
    }

    /// Ranks `candidates` against the prediction and applies the cuts of the
    /// geometry element the first candidate belongs to. All candidates are
    /// expected to share that element.
    pub fn select<S: SourceLink>(
        &self,
        candidates: &[BoundVariableMeasurement<S>],
        predicted: &BoundVector,
        predicted_cov: &BoundSquareMatrix,
    ) -> Result<Selection, SelectionError> {
        let first = candidates.first().ok_or(SelectionError::NoCandidates)?;
        let geometry_id = first.source_link().geometry_id();
        let cuts = self
            .config
            .find(&geometry_id)
            .ok_or(SelectionError::NoCuts(geometry_id))?;

        let eta = predicted_eta(predicted);
        let chi2_cut = cuts
            .chi2_cut(eta)
            .ok_or(SelectionError::NoCuts(geometry_id))?;
        let count_cut = cuts
            .count_cut(eta)
            .ok_or(SelectionError::NoCuts(geometry_id))?;

        let mut ranked = candidates
            .iter()
            .enumerate()
            .map(|(index, measurement)| {
                self.calculate_chi2(measurement, predicted, predicted_cov)
                    .map(|chi2| SelectedCandidate { index, chi2 })
            })
            .collect::<Result<Vec<_>, _>>()?;
        ranked.sort_by(|a, b| a.chi2.total_cmp(&b.chi2));

        let passing = ranked.iter().take_while(|c| c.chi2 < chi2_cut).count();
        if passing == 0 {
            ranked.truncate(1);
            debug!(
                "No candidate on {} passed chi2 < {}; keeping best (chi2 = {}) as outlier",
                geometry_id, chi2_cut, ranked[0].chi2
            );
            return Ok(Selection {
                candidates: ranked,
                is_outlier: true,
            });
        }

        ranked.truncate(passing.min(count_cut));
        trace!(
            "Selected {} of {} candidates on {} (eta = {:.3})",
            ranked.len(),
            candidates.len(),
            geometry_id,
            eta
        );
        Ok(Selection {
            candidates: ranked,
            is_outlier: false,
        })
    }
}

fn fixed_chi2<const D: usize, S: SourceLink>(
    measurement: &BoundVariableMeasurement<S>,
    predicted: &BoundVector,
    predicted_cov: &BoundSquareMatrix,
) -> Result<f64, SelectionError> {
    let helper = FixedSubspaceHelper::<D, BOUND_SIZE>::from_raw(measurement.fixed_subspace_indices::<D>());

    let residual: SVector<f64, D> = measurement.fixed_residuals::<D, _>(predicted);
    let innovation_cov: SMatrix<f64, D, D> =
        measurement.fixed_covariance::<D>().clone_owned() + helper.project_matrix(predicted_cov);
    let inverse = innovation_cov
        .try_inverse()
        .ok_or(SelectionError::SingularCovariance(D))?;

    let weighted = inverse * residual;
    Ok(residual.dot(&weighted))
}
